use chrono::{DateTime, Utc};
use flowdeck_core_types::{FlowId, ProjectId};
use flow_graph::FlowGraph;
use serde::{Deserialize, Serialize};

/// A project grouping related flows.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Project {
    pub id: ProjectId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Project {
    pub fn new(name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: ProjectId::new(),
            name: name.into(),
            description: String::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

/// A stored flow: the graph plus its owning project.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FlowDoc {
    pub project: ProjectId,
    pub graph: FlowGraph,
    pub saved_at: DateTime<Utc>,
}

impl FlowDoc {
    pub fn new(project: ProjectId, graph: FlowGraph) -> Self {
        Self {
            project,
            graph,
            saved_at: Utc::now(),
        }
    }

    pub fn id(&self) -> &FlowId {
        &self.graph.id
    }
}
