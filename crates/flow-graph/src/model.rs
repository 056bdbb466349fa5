//! Core types for the flow graph

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use flowdeck_core_types::{EdgeId, FlowId, NodeId};
use serde::{Deserialize, Serialize};

use crate::errors::GraphError;

/// Canvas coordinate kept for the visual editor. Inert during execution.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Action catalogue understood by the remote automation backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ActionKind {
    /// Navigate to URL
    Navigate { url: String },

    /// Click element
    Click { selector: String },

    /// Type text into element
    TypeText {
        selector: String,
        text: String,
        #[serde(default)]
        submit: bool,
    },

    /// Select option in a dropdown
    Select { selector: String, option: String },

    /// Scroll the page or an element
    Scroll {
        #[serde(default)]
        selector: Option<String>,
        delta_y: i64,
    },

    /// Wait a fixed number of milliseconds
    Wait { ms: u64 },

    /// Capture a screenshot
    Screenshot {
        #[serde(default)]
        full_page: bool,
    },

    /// Extract text from an element into a named run variable
    ExtractText { selector: String, variable: String },

    /// Custom action (extensibility point)
    Custom {
        action_type: String,
        #[serde(default)]
        parameters: HashMap<String, serde_json::Value>,
    },
}

impl ActionKind {
    /// Wire name used in the backend's `/api/actions/{type}` path.
    pub fn type_name(&self) -> &str {
        match self {
            ActionKind::Navigate { .. } => "navigate",
            ActionKind::Click { .. } => "click",
            ActionKind::TypeText { .. } => "type_text",
            ActionKind::Select { .. } => "select",
            ActionKind::Scroll { .. } => "scroll",
            ActionKind::Wait { .. } => "wait",
            ActionKind::Screenshot { .. } => "screenshot",
            ActionKind::ExtractText { .. } => "extract_text",
            ActionKind::Custom { action_type, .. } => action_type,
        }
    }
}

/// A single action node on the canvas.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlowNode {
    /// Node identifier
    pub id: NodeId,

    /// Display label
    pub label: String,

    /// The action executed for this node
    pub action: ActionKind,

    /// Canvas position
    #[serde(default)]
    pub position: Point,

    /// Disabled nodes are skipped by the executor
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Free-form author notes
    #[serde(default)]
    pub notes: Option<String>,
}

fn default_enabled() -> bool {
    true
}

impl FlowNode {
    /// Create a new enabled node at the canvas origin.
    pub fn new(label: impl Into<String>, action: ActionKind) -> Self {
        Self {
            id: NodeId::new(),
            label: label.into(),
            action,
            position: Point::default(),
            enabled: true,
            notes: None,
        }
    }

    /// Set canvas position
    pub fn with_position(mut self, position: Point) -> Self {
        self.position = position;
        self
    }

    /// Set notes
    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    /// Mark disabled
    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }
}

/// Directed edge between two nodes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlowEdge {
    pub id: EdgeId,
    pub source: NodeId,
    pub target: NodeId,
}

/// Flow definition: an insertion-ordered node list plus directed edges.
///
/// Acyclicity is not enforced; `execution_order` falls back to insertion
/// order when a cycle is present.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlowGraph {
    /// Flow identifier
    pub id: FlowId,

    /// Flow name
    pub name: String,

    /// Flow description
    #[serde(default)]
    pub description: String,

    /// Nodes in insertion order
    pub nodes: Vec<FlowNode>,

    /// Directed edges
    pub edges: Vec<FlowEdge>,

    /// Creation time
    pub created_at: DateTime<Utc>,

    /// Last mutation time
    pub updated_at: DateTime<Utc>,
}

impl FlowGraph {
    /// Create a new empty flow.
    pub fn new(name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: FlowId::new(),
            name: name.into(),
            description: String::new(),
            nodes: Vec::new(),
            edges: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Set description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    /// Look up a node by id.
    pub fn node(&self, id: &NodeId) -> Option<&FlowNode> {
        self.nodes.iter().find(|n| &n.id == id)
    }

    /// Look up an edge by id.
    pub fn edge(&self, id: &EdgeId) -> Option<&FlowEdge> {
        self.edges.iter().find(|e| &e.id == id)
    }

    /// Add a node. Fails on a duplicate id.
    pub fn add_node(&mut self, node: FlowNode) -> Result<NodeId, GraphError> {
        if self.node(&node.id).is_some() {
            return Err(GraphError::DuplicateNode(node.id));
        }
        let id = node.id.clone();
        self.nodes.push(node);
        self.touch();
        Ok(id)
    }

    /// Remove a node and every edge touching it.
    pub fn remove_node(&mut self, id: &NodeId) -> Result<FlowNode, GraphError> {
        let idx = self
            .nodes
            .iter()
            .position(|n| &n.id == id)
            .ok_or_else(|| GraphError::UnknownNode(id.clone()))?;
        let node = self.nodes.remove(idx);
        self.edges.retain(|e| &e.source != id && &e.target != id);
        self.touch();
        Ok(node)
    }

    /// Replace a node's action.
    pub fn set_action(&mut self, id: &NodeId, action: ActionKind) -> Result<(), GraphError> {
        let node = self.node_mut(id)?;
        node.action = action;
        self.touch();
        Ok(())
    }

    /// Rename a node.
    pub fn set_label(&mut self, id: &NodeId, label: impl Into<String>) -> Result<(), GraphError> {
        let node = self.node_mut(id)?;
        node.label = label.into();
        self.touch();
        Ok(())
    }

    /// Move a node on the canvas.
    pub fn move_node(&mut self, id: &NodeId, position: Point) -> Result<(), GraphError> {
        let node = self.node_mut(id)?;
        node.position = position;
        self.touch();
        Ok(())
    }

    /// Enable or disable a node.
    pub fn set_enabled(&mut self, id: &NodeId, enabled: bool) -> Result<(), GraphError> {
        let node = self.node_mut(id)?;
        node.enabled = enabled;
        self.touch();
        Ok(())
    }

    fn node_mut(&mut self, id: &NodeId) -> Result<&mut FlowNode, GraphError> {
        self.nodes
            .iter_mut()
            .find(|n| &n.id == id)
            .ok_or_else(|| GraphError::UnknownNode(id.clone()))
    }

    /// Connect two nodes. Rejects self-loops, unknown endpoints, and
    /// duplicate (source, target) pairs.
    pub fn connect(&mut self, source: &NodeId, target: &NodeId) -> Result<EdgeId, GraphError> {
        if source == target {
            return Err(GraphError::SelfLoop(source.clone()));
        }
        if self.node(source).is_none() {
            return Err(GraphError::UnknownNode(source.clone()));
        }
        if self.node(target).is_none() {
            return Err(GraphError::UnknownNode(target.clone()));
        }
        if self
            .edges
            .iter()
            .any(|e| &e.source == source && &e.target == target)
        {
            return Err(GraphError::DuplicateEdge {
                from: source.clone(),
                target: target.clone(),
            });
        }
        let edge = FlowEdge {
            id: EdgeId::new(),
            source: source.clone(),
            target: target.clone(),
        };
        let id = edge.id.clone();
        self.edges.push(edge);
        self.touch();
        Ok(id)
    }

    /// Remove an edge by id.
    pub fn disconnect(&mut self, id: &EdgeId) -> Result<FlowEdge, GraphError> {
        let idx = self
            .edges
            .iter()
            .position(|e| &e.id == id)
            .ok_or_else(|| GraphError::UnknownEdge(id.clone()))?;
        let edge = self.edges.remove(idx);
        self.touch();
        Ok(edge)
    }

    /// Structural validation: unique node ids, edge endpoints exist, no
    /// self-loops, at most one edge per (source, target) pair.
    ///
    /// Cycles are deliberately not an error here; they only demote the
    /// execution order to insertion order.
    pub fn validate(&self) -> Result<(), GraphError> {
        let mut seen = HashSet::new();
        for node in &self.nodes {
            if !seen.insert(node.id.as_str()) {
                return Err(GraphError::DuplicateNode(node.id.clone()));
            }
        }

        let mut pairs = HashSet::new();
        for edge in &self.edges {
            if edge.source == edge.target {
                return Err(GraphError::SelfLoop(edge.source.clone()));
            }
            if self.node(&edge.source).is_none() {
                return Err(GraphError::UnknownNode(edge.source.clone()));
            }
            if self.node(&edge.target).is_none() {
                return Err(GraphError::UnknownNode(edge.target.clone()));
            }
            if !pairs.insert((edge.source.as_str(), edge.target.as_str())) {
                return Err(GraphError::DuplicateEdge {
                    from: edge.source.clone(),
                    target: edge.target.clone(),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nav(label: &str) -> FlowNode {
        FlowNode::new(
            label,
            ActionKind::Navigate {
                url: "https://example.com".into(),
            },
        )
    }

    #[test]
    fn add_and_remove_node_drops_incident_edges() {
        let mut graph = FlowGraph::new("test");
        let a = graph.add_node(nav("a")).unwrap();
        let b = graph.add_node(nav("b")).unwrap();
        graph.connect(&a, &b).unwrap();

        graph.remove_node(&b).unwrap();
        assert!(graph.edges.is_empty());
        assert_eq!(graph.nodes.len(), 1);
    }

    #[test]
    fn connect_rejects_self_loop_and_duplicates() {
        let mut graph = FlowGraph::new("test");
        let a = graph.add_node(nav("a")).unwrap();
        let b = graph.add_node(nav("b")).unwrap();

        assert!(matches!(
            graph.connect(&a, &a),
            Err(GraphError::SelfLoop(_))
        ));
        graph.connect(&a, &b).unwrap();
        assert!(matches!(
            graph.connect(&a, &b),
            Err(GraphError::DuplicateEdge { .. })
        ));
    }

    #[test]
    fn connect_rejects_unknown_endpoint() {
        let mut graph = FlowGraph::new("test");
        let a = graph.add_node(nav("a")).unwrap();
        let ghost = NodeId::new();
        assert!(matches!(
            graph.connect(&a, &ghost),
            Err(GraphError::UnknownNode(_))
        ));
    }

    #[test]
    fn validate_catches_dangling_edge() {
        let mut graph = FlowGraph::new("test");
        let a = graph.add_node(nav("a")).unwrap();
        let b = graph.add_node(nav("b")).unwrap();
        graph.connect(&a, &b).unwrap();
        graph.nodes.retain(|n| n.id != b);

        assert!(matches!(
            graph.validate(),
            Err(GraphError::UnknownNode(_))
        ));
    }

    #[test]
    fn action_type_names_match_wire_format() {
        assert_eq!(
            ActionKind::TypeText {
                selector: "#q".into(),
                text: "hi".into(),
                submit: false,
            }
            .type_name(),
            "type_text"
        );
        assert_eq!(
            ActionKind::Custom {
                action_type: "hover".into(),
                parameters: HashMap::new(),
            }
            .type_name(),
            "hover"
        );
    }

    #[test]
    fn graph_round_trips_through_json() {
        let mut graph = FlowGraph::new("roundtrip");
        let a = graph.add_node(nav("a")).unwrap();
        let b = graph
            .add_node(FlowNode::new(
                "b",
                ActionKind::Click {
                    selector: "#go".into(),
                },
            ))
            .unwrap();
        graph.connect(&a, &b).unwrap();

        let json = serde_json::to_string(&graph).unwrap();
        let back: FlowGraph = serde_json::from_str(&json).unwrap();
        assert_eq!(back.nodes.len(), 2);
        assert_eq!(back.edges.len(), 1);
        assert!(back.validate().is_ok());
    }
}
