use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Storage knobs for the screenshot store.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ShotStoreConfig {
    /// Root directory for blobs
    pub root: PathBuf,

    /// Seconds a shot is retained before the sweep may remove it
    pub ttl_sec: u64,

    /// Upper bound on total blob bytes; the sweep evicts oldest-first past it
    pub max_total_bytes: u64,
}

impl Default for ShotStoreConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("./shots"),
            ttl_sec: 7 * 24 * 3600,
            max_total_bytes: 256 * 1024 * 1024,
        }
    }
}
