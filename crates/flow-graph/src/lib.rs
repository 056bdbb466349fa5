//! Flow graph model
//!
//! The data model behind the Flowdeck editor canvas: action nodes joined by
//! directed edges, plus the graph algorithms the executor and the editor
//! lints rely on (execution ordering, connected components).

pub mod algo;
pub mod errors;
pub mod model;

pub use errors::GraphError;
pub use model::{ActionKind, FlowEdge, FlowGraph, FlowNode, Point};
