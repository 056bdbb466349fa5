use chrono::{DateTime, Utc};
use flowdeck_core_types::{NodeId, RunId, ShotId};
use serde::{Deserialize, Serialize};

/// Encoded image format as reported by the backend.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShotFormat {
    Png,
    Jpeg,
}

impl ShotFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ShotFormat::Png => "png",
            ShotFormat::Jpeg => "jpg",
        }
    }
}

/// Screenshot blob persisted on disk.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Shot {
    pub id: ShotId,
    pub run: RunId,
    pub node: NodeId,
    pub format: ShotFormat,
    pub bytes: Vec<u8>,
    pub captured_at: DateTime<Utc>,
    pub ttl_at: DateTime<Utc>,
}

/// Counters returned by a sweep pass.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SweepStats {
    /// Shots removed because their TTL elapsed
    pub expired: usize,
    /// Shots removed to get back under the byte quota
    pub evicted: usize,
    /// Total blob bytes reclaimed
    pub bytes_freed: u64,
}
