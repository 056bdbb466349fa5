use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Document store location and limits.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DocStoreConfig {
    /// Data root; `projects/`, `flows/` and `revisions/` live under it
    pub root: PathBuf,

    /// Revisions retained per flow, oldest pruned first
    pub max_revisions: usize,
}

impl Default for DocStoreConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("./flowdeck-data"),
            max_revisions: 20,
        }
    }
}
