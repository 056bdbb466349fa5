//! Identifier newtypes and the shared error stub used across the
//! Flowdeck workspace crates.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Minimal error carried across crate boundaries where a caller must not
/// be coupled to a store's own error enum.
#[derive(Debug, Error, Clone)]
pub enum FlowdeckError {
    #[error("{message}")]
    Message { message: String },
}

impl FlowdeckError {
    pub fn new(message: impl Into<String>) -> Self {
        Self::Message {
            message: message.into(),
        }
    }
}

macro_rules! string_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
        pub struct $name(pub String);

        impl $name {
            pub fn new() -> Self {
                Self(Uuid::new_v4().to_string())
            }

            pub fn from_string(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

string_id!(
    /// A project grouping one or more flows.
    ProjectId
);
string_id!(
    /// A single flow (node graph) within a project.
    FlowId
);
string_id!(
    /// A node on the flow canvas.
    NodeId
);
string_id!(
    /// A directed edge between two nodes.
    EdgeId
);
string_id!(
    /// One execution of a flow.
    RunId
);

/// Content-addressed screenshot identifier. Unlike the uuid-backed ids this
/// one is derived from the blob hash, so it only wraps the string form.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct ShotId(pub String);

impl ShotId {
    pub fn from_string(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ShotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_unique() {
        assert_ne!(NodeId::new(), NodeId::new());
        assert_ne!(RunId::new(), RunId::new());
    }

    #[test]
    fn id_round_trips_through_json() {
        let id = FlowId::new();
        let json = serde_json::to_string(&id).unwrap();
        let back: FlowId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, back);
    }
}
