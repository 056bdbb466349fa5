//! Graph algorithms backing execution ordering and editor lints

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};

use flowdeck_core_types::NodeId;
use tracing::debug;

use crate::model::FlowGraph;

impl FlowGraph {
    /// True when the directed edge set contains at least one cycle.
    pub fn has_cycle(&self) -> bool {
        !self.nodes.is_empty() && self.kahn_order().is_none()
    }

    /// The order nodes execute in.
    ///
    /// Kahn's algorithm over the DAG, with ties broken by node insertion
    /// order so repeated runs of the same flow are deterministic. When a
    /// cycle is present the whole graph falls back to plain insertion order
    /// instead of failing; acyclicity is an editor lint, not an execution
    /// precondition.
    pub fn execution_order(&self) -> Vec<NodeId> {
        match self.kahn_order() {
            Some(order) => order,
            None => {
                debug!(flow = %self.id, "cycle detected, using insertion order");
                self.nodes.iter().map(|n| n.id.clone()).collect()
            }
        }
    }

    /// Kahn's algorithm. Returns `None` when a cycle prevents a complete
    /// topological order.
    fn kahn_order(&self) -> Option<Vec<NodeId>> {
        let n = self.nodes.len();
        let slot: HashMap<&str, usize> = self
            .nodes
            .iter()
            .enumerate()
            .map(|(i, node)| (node.id.as_str(), i))
            .collect();

        let mut indegree = vec![0usize; n];
        let mut adjacency: Vec<Vec<usize>> = vec![Vec::new(); n];
        for edge in &self.edges {
            let (Some(&from), Some(&to)) = (slot.get(edge.source.as_str()), slot.get(edge.target.as_str()))
            else {
                // Dangling edges are a validation error; ignore them here so
                // ordering stays total over the node set.
                continue;
            };
            adjacency[from].push(to);
            indegree[to] += 1;
        }

        // Min-heap on insertion index keeps ties deterministic.
        let mut ready: BinaryHeap<Reverse<usize>> = indegree
            .iter()
            .enumerate()
            .filter(|(_, d)| **d == 0)
            .map(|(i, _)| Reverse(i))
            .collect();

        let mut order = Vec::with_capacity(n);
        while let Some(Reverse(i)) = ready.pop() {
            order.push(self.nodes[i].id.clone());
            for &next in &adjacency[i] {
                indegree[next] -= 1;
                if indegree[next] == 0 {
                    ready.push(Reverse(next));
                }
            }
        }

        (order.len() == n).then_some(order)
    }

    /// Undirected connected components over the node set.
    ///
    /// Components are returned in order of their earliest node, and nodes
    /// within a component keep insertion order. More than one component
    /// usually means the author left an orphaned subgraph on the canvas.
    pub fn connected_components(&self) -> Vec<Vec<NodeId>> {
        let n = self.nodes.len();
        let slot: HashMap<&str, usize> = self
            .nodes
            .iter()
            .enumerate()
            .map(|(i, node)| (node.id.as_str(), i))
            .collect();

        let mut parent: Vec<usize> = (0..n).collect();
        fn find(parent: &mut Vec<usize>, i: usize) -> usize {
            if parent[i] != i {
                let root = find(parent, parent[i]);
                parent[i] = root;
            }
            parent[i]
        }

        for edge in &self.edges {
            if let (Some(&a), Some(&b)) = (slot.get(edge.source.as_str()), slot.get(edge.target.as_str())) {
                let (ra, rb) = (find(&mut parent, a), find(&mut parent, b));
                if ra != rb {
                    // Union by insertion index so the earliest node roots
                    // its component.
                    let (lo, hi) = if ra < rb { (ra, rb) } else { (rb, ra) };
                    parent[hi] = lo;
                }
            }
        }

        let mut groups: HashMap<usize, Vec<NodeId>> = HashMap::new();
        for i in 0..n {
            let root = find(&mut parent, i);
            groups.entry(root).or_default().push(self.nodes[i].id.clone());
        }

        let mut roots: Vec<usize> = groups.keys().copied().collect();
        roots.sort_unstable();
        roots
            .into_iter()
            .filter_map(|root| groups.remove(&root))
            .collect()
    }

    /// Nodes with no incoming edges, in insertion order.
    pub fn roots(&self) -> Vec<NodeId> {
        self.nodes
            .iter()
            .filter(|n| !self.edges.iter().any(|e| e.target == n.id))
            .map(|n| n.id.clone())
            .collect()
    }

    /// Nodes with no outgoing edges, in insertion order.
    pub fn leaves(&self) -> Vec<NodeId> {
        self.nodes
            .iter()
            .filter(|n| !self.edges.iter().any(|e| e.source == n.id))
            .map(|n| n.id.clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use crate::model::{ActionKind, FlowGraph, FlowNode};
    use flowdeck_core_types::NodeId;

    fn wait(label: &str) -> FlowNode {
        FlowNode::new(label, ActionKind::Wait { ms: 1 })
    }

    fn label_of(graph: &FlowGraph, id: &NodeId) -> String {
        graph.node(id).unwrap().label.clone()
    }

    #[test]
    fn chain_orders_topologically() {
        let mut graph = FlowGraph::new("chain");
        let a = graph.add_node(wait("a")).unwrap();
        let b = graph.add_node(wait("b")).unwrap();
        let c = graph.add_node(wait("c")).unwrap();
        // Wire in reverse of insertion to prove edges win over insertion.
        graph.connect(&c, &b).unwrap();
        graph.connect(&b, &a).unwrap();

        let order: Vec<String> = graph
            .execution_order()
            .iter()
            .map(|id| label_of(&graph, id))
            .collect();
        assert_eq!(order, vec!["c", "b", "a"]);
        assert!(!graph.has_cycle());
    }

    #[test]
    fn diamond_breaks_ties_by_insertion_order() {
        let mut graph = FlowGraph::new("diamond");
        let top = graph.add_node(wait("top")).unwrap();
        let left = graph.add_node(wait("left")).unwrap();
        let right = graph.add_node(wait("right")).unwrap();
        let bottom = graph.add_node(wait("bottom")).unwrap();
        graph.connect(&top, &left).unwrap();
        graph.connect(&top, &right).unwrap();
        graph.connect(&left, &bottom).unwrap();
        graph.connect(&right, &bottom).unwrap();

        let order: Vec<String> = graph
            .execution_order()
            .iter()
            .map(|id| label_of(&graph, id))
            .collect();
        // left was inserted before right, so it must run first.
        assert_eq!(order, vec!["top", "left", "right", "bottom"]);
    }

    #[test]
    fn cycle_falls_back_to_insertion_order() {
        let mut graph = FlowGraph::new("cycle");
        let a = graph.add_node(wait("a")).unwrap();
        let b = graph.add_node(wait("b")).unwrap();
        let c = graph.add_node(wait("c")).unwrap();
        graph.connect(&a, &b).unwrap();
        graph.connect(&b, &c).unwrap();
        graph.connect(&c, &a).unwrap();

        assert!(graph.has_cycle());
        let order: Vec<String> = graph
            .execution_order()
            .iter()
            .map(|id| label_of(&graph, id))
            .collect();
        assert_eq!(order, vec!["a", "b", "c"]);
    }

    #[test]
    fn order_covers_every_node_exactly_once() {
        let mut graph = FlowGraph::new("partial-cycle");
        let a = graph.add_node(wait("a")).unwrap();
        let b = graph.add_node(wait("b")).unwrap();
        let _lone = graph.add_node(wait("lone")).unwrap();
        graph.connect(&a, &b).unwrap();
        graph.connect(&b, &a).unwrap();

        let order = graph.execution_order();
        assert_eq!(order.len(), graph.nodes.len());
    }

    #[test]
    fn connected_components_split_orphans() {
        let mut graph = FlowGraph::new("components");
        let a = graph.add_node(wait("a")).unwrap();
        let b = graph.add_node(wait("b")).unwrap();
        let c = graph.add_node(wait("c")).unwrap();
        let d = graph.add_node(wait("d")).unwrap();
        graph.connect(&a, &b).unwrap();
        graph.connect(&c, &d).unwrap();

        let components = graph.connected_components();
        assert_eq!(components.len(), 2);
        assert_eq!(components[0], vec![a, b]);
        assert_eq!(components[1], vec![c, d]);
    }

    #[test]
    fn single_component_when_fully_wired() {
        let mut graph = FlowGraph::new("wired");
        let a = graph.add_node(wait("a")).unwrap();
        let b = graph.add_node(wait("b")).unwrap();
        let c = graph.add_node(wait("c")).unwrap();
        graph.connect(&a, &b).unwrap();
        graph.connect(&b, &c).unwrap();

        assert_eq!(graph.connected_components().len(), 1);
    }

    #[test]
    fn roots_and_leaves() {
        let mut graph = FlowGraph::new("edges");
        let a = graph.add_node(wait("a")).unwrap();
        let b = graph.add_node(wait("b")).unwrap();
        let c = graph.add_node(wait("c")).unwrap();
        graph.connect(&a, &b).unwrap();
        graph.connect(&b, &c).unwrap();

        assert_eq!(graph.roots(), vec![a]);
        assert_eq!(graph.leaves(), vec![c]);
    }

    #[test]
    fn empty_graph_has_empty_order() {
        let graph = FlowGraph::new("empty");
        assert!(graph.execution_order().is_empty());
        assert!(!graph.has_cycle());
        assert!(graph.connected_components().is_empty());
    }
}
