//! Graph model error types

use flowdeck_core_types::{EdgeId, NodeId};
use thiserror::Error;

/// Errors raised by graph mutations and validation.
#[derive(Debug, Error, Clone)]
pub enum GraphError {
    /// A node with this id already exists
    #[error("duplicate node id: {0}")]
    DuplicateNode(NodeId),

    /// Referenced node does not exist
    #[error("unknown node: {0}")]
    UnknownNode(NodeId),

    /// Referenced edge does not exist
    #[error("unknown edge: {0}")]
    UnknownEdge(EdgeId),

    /// Edge connects a node to itself
    #[error("self-loop on node {0}")]
    SelfLoop(NodeId),

    /// An edge between the same pair already exists
    #[error("duplicate edge {from} -> {target}")]
    DuplicateEdge { from: NodeId, target: NodeId },

    /// Structural validation failed
    #[error("invalid graph: {0}")]
    Invalid(String),
}
