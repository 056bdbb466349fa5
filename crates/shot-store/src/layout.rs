use std::path::PathBuf;

use chrono::{DateTime, Utc};

use crate::config::ShotStoreConfig;

/// Blob path: `<root>/YYYY/MM/DD/<id>.json`. Date buckets keep directories
/// small and make coarse manual cleanup possible.
pub fn shot_path(cfg: &ShotStoreConfig, captured_at: DateTime<Utc>, id: &str) -> PathBuf {
    let mut path = cfg.root.clone();
    path.push(captured_at.format("%Y/%m/%d").to_string());
    path.push(format!("{id}.json"));
    path
}
