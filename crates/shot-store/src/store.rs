//! Fs-backed shot store with an in-memory index

use std::collections::{HashMap, VecDeque};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use flowdeck_core_types::{NodeId, RunId, ShotId};
use parking_lot::RwLock;
use tracing::{debug, warn};

use crate::config::ShotStoreConfig;
use crate::errors::{ShotErrKind, ShotError};
use crate::hash::content_id;
use crate::layout::shot_path;
use crate::metrics::ShotMetrics;
use crate::model::{Shot, ShotFormat, SweepStats};

pub type ShotResult<T> = Result<T, ShotError>;

/// Storage facade used by the executor and the CLI.
#[async_trait]
pub trait ShotStore: Send + Sync {
    /// Persist a screenshot, deduplicating identical bytes by content hash.
    async fn put(
        &self,
        run: &RunId,
        node: &NodeId,
        format: ShotFormat,
        bytes: Vec<u8>,
    ) -> ShotResult<ShotId>;

    async fn get(&self, id: &ShotId) -> ShotResult<Shot>;

    /// Shot ids captured during a run, in capture order.
    async fn refs_by_run(&self, run: &RunId) -> ShotResult<Vec<ShotId>>;

    /// Remove expired shots, then evict oldest-first until under quota.
    async fn sweep(&self) -> ShotResult<SweepStats>;
}

struct ShotEntry {
    path: PathBuf,
    blob_bytes: u64,
    ttl_at: DateTime<Utc>,
    run: RunId,
}

#[derive(Default)]
struct ShotIndex {
    shots: HashMap<String, ShotEntry>,
    runs: HashMap<String, Vec<ShotId>>,
    /// Eviction order, oldest first
    order: VecDeque<String>,
    total_bytes: u64,
}

impl ShotIndex {
    fn insert(&mut self, id: &ShotId, entry: ShotEntry) {
        self.total_bytes += entry.blob_bytes;
        self.runs
            .entry(entry.run.0.clone())
            .or_default()
            .push(id.clone());
        self.shots.insert(id.0.clone(), entry);
        self.order.push_back(id.0.clone());
    }

    fn remove(&mut self, id: &str) -> Option<ShotEntry> {
        let entry = self.shots.remove(id)?;
        self.total_bytes = self.total_bytes.saturating_sub(entry.blob_bytes);
        self.order.retain(|o| o != id);
        if let Some(refs) = self.runs.get_mut(&entry.run.0) {
            refs.retain(|r| r.0 != id);
        }
        Some(entry)
    }
}

/// Filesystem-backed [`ShotStore`].
pub struct FsShotStore {
    cfg: ShotStoreConfig,
    metrics: ShotMetrics,
    index: RwLock<ShotIndex>,
}

impl FsShotStore {
    /// Open the store, rebuilding the index from the on-disk layout.
    /// Unreadable blobs are skipped with a warning rather than failing the
    /// open.
    pub fn open(cfg: ShotStoreConfig) -> ShotResult<Self> {
        fs::create_dir_all(&cfg.root)?;
        let store = Self {
            cfg,
            metrics: ShotMetrics::default(),
            index: RwLock::new(ShotIndex::default()),
        };
        store.scan()?;
        Ok(store)
    }

    pub fn metrics(&self) -> &ShotMetrics {
        &self.metrics
    }

    fn scan(&self) -> ShotResult<()> {
        let mut found: Vec<(Shot, PathBuf, u64)> = Vec::new();
        collect_blobs(&self.cfg.root, &mut found)?;
        found.sort_by_key(|(shot, _, _)| shot.captured_at);

        let mut index = self.index.write();
        for (shot, path, size) in found {
            let id = shot.id.clone();
            index.insert(
                &id,
                ShotEntry {
                    path,
                    blob_bytes: size,
                    ttl_at: shot.ttl_at,
                    run: shot.run,
                },
            );
        }
        debug!(shots = index.shots.len(), "shot store index rebuilt");
        Ok(())
    }

    fn ttl(&self) -> ChronoDuration {
        ChronoDuration::seconds(self.cfg.ttl_sec as i64)
    }
}

fn collect_blobs(dir: &Path, out: &mut Vec<(Shot, PathBuf, u64)>) -> ShotResult<()> {
    if !dir.exists() {
        return Ok(());
    }
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if path.is_dir() {
            collect_blobs(&path, out)?;
        } else if path.extension().is_some_and(|e| e == "json") {
            match fs::read(&path).map_err(ShotError::from).and_then(|data| {
                serde_json::from_slice::<Shot>(&data)
                    .map_err(|_| ShotError::new(ShotErrKind::Corrupt))
                    .map(|shot| (shot, data.len() as u64))
            }) {
                Ok((shot, size)) => out.push((shot, path, size)),
                Err(err) => {
                    warn!(path = %path.display(), error = %err, "skipping unreadable shot blob");
                }
            }
        }
    }
    Ok(())
}

fn write_atomic(path: &Path, data: &[u8]) -> ShotResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let tmp = path.with_extension("tmp");
    let mut file = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(&tmp)?;
    file.write_all(data)?;
    file.sync_all()?;
    fs::rename(tmp, path)?;
    Ok(())
}

#[async_trait]
impl ShotStore for FsShotStore {
    async fn put(
        &self,
        run: &RunId,
        node: &NodeId,
        format: ShotFormat,
        bytes: Vec<u8>,
    ) -> ShotResult<ShotId> {
        let id = ShotId::from_string(content_id("shot", &bytes));

        {
            let mut index = self.index.write();
            if index.shots.contains_key(id.as_str()) {
                // Same pixels seen before; just bind them to this run too.
                let refs = index.runs.entry(run.0.clone()).or_default();
                if !refs.contains(&id) {
                    refs.push(id.clone());
                }
                self.metrics.record_dedup_hit();
                return Ok(id);
            }
        }

        let captured_at = Utc::now();
        let shot = Shot {
            id: id.clone(),
            run: run.clone(),
            node: node.clone(),
            format,
            bytes,
            captured_at,
            ttl_at: captured_at + self.ttl(),
        };
        let data = serde_json::to_vec(&shot)
            .map_err(|e| ShotError::new(ShotErrKind::Internal(e.to_string())))?;
        let path = shot_path(&self.cfg, captured_at, id.as_str());
        write_atomic(&path, &data)?;

        let mut index = self.index.write();
        index.insert(
            &id,
            ShotEntry {
                path,
                blob_bytes: data.len() as u64,
                ttl_at: shot.ttl_at,
                run: run.clone(),
            },
        );
        self.metrics.record_put();
        Ok(id)
    }

    async fn get(&self, id: &ShotId) -> ShotResult<Shot> {
        let path = {
            let index = self.index.read();
            index
                .shots
                .get(id.as_str())
                .map(|entry| entry.path.clone())
                .ok_or_else(|| ShotError::new(ShotErrKind::NotFound))?
        };
        let data = fs::read(&path)?;
        serde_json::from_slice(&data).map_err(|_| ShotError::new(ShotErrKind::Corrupt))
    }

    async fn refs_by_run(&self, run: &RunId) -> ShotResult<Vec<ShotId>> {
        let index = self.index.read();
        Ok(index.runs.get(&run.0).cloned().unwrap_or_default())
    }

    async fn sweep(&self) -> ShotResult<SweepStats> {
        let now = Utc::now();
        let mut stats = SweepStats::default();
        let mut index = self.index.write();

        let expired: Vec<String> = index
            .shots
            .iter()
            .filter(|(_, entry)| entry.ttl_at <= now)
            .map(|(id, _)| id.clone())
            .collect();
        for id in expired {
            if let Some(entry) = index.remove(&id) {
                remove_blob(&entry.path);
                stats.expired += 1;
                stats.bytes_freed += entry.blob_bytes;
            }
        }

        while index.total_bytes > self.cfg.max_total_bytes {
            let Some(oldest) = index.order.front().cloned() else {
                break;
            };
            if let Some(entry) = index.remove(&oldest) {
                remove_blob(&entry.path);
                stats.evicted += 1;
                stats.bytes_freed += entry.blob_bytes;
            }
        }

        self.metrics.record_swept(stats.expired + stats.evicted);
        debug!(
            expired = stats.expired,
            evicted = stats.evicted,
            "shot sweep finished"
        );
        Ok(stats)
    }
}

fn remove_blob(path: &Path) {
    let _ = fs::remove_file(path);
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn store_with(ttl_sec: u64, max_total_bytes: u64) -> (FsShotStore, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let cfg = ShotStoreConfig {
            root: dir.path().to_path_buf(),
            ttl_sec,
            max_total_bytes,
        };
        (FsShotStore::open(cfg).unwrap(), dir)
    }

    #[tokio::test]
    async fn put_then_get_round_trips() {
        let (store, _dir) = store_with(3600, u64::MAX);
        let run = RunId::new();
        let node = NodeId::new();

        let id = store
            .put(&run, &node, ShotFormat::Png, vec![1, 2, 3, 4])
            .await
            .unwrap();
        let shot = store.get(&id).await.unwrap();
        assert_eq!(shot.bytes, vec![1, 2, 3, 4]);
        assert_eq!(shot.run, run);
        assert_eq!(shot.format, ShotFormat::Png);
    }

    #[tokio::test]
    async fn identical_bytes_dedupe_to_one_blob() {
        let (store, _dir) = store_with(3600, u64::MAX);
        let run_a = RunId::new();
        let run_b = RunId::new();
        let node = NodeId::new();

        let first = store
            .put(&run_a, &node, ShotFormat::Png, vec![9; 64])
            .await
            .unwrap();
        let second = store
            .put(&run_b, &node, ShotFormat::Png, vec![9; 64])
            .await
            .unwrap();
        assert_eq!(first, second);
        assert_eq!(store.metrics().dedup_hits(), 1);
        assert_eq!(store.refs_by_run(&run_b).await.unwrap(), vec![first]);
    }

    #[tokio::test]
    async fn refs_by_run_preserves_capture_order() {
        let (store, _dir) = store_with(3600, u64::MAX);
        let run = RunId::new();
        let node = NodeId::new();

        let a = store
            .put(&run, &node, ShotFormat::Png, vec![1])
            .await
            .unwrap();
        let b = store
            .put(&run, &node, ShotFormat::Png, vec![2])
            .await
            .unwrap();
        assert_eq!(store.refs_by_run(&run).await.unwrap(), vec![a, b]);
    }

    #[tokio::test]
    async fn sweep_removes_expired_shots() {
        let (store, _dir) = store_with(0, u64::MAX);
        let run = RunId::new();
        let node = NodeId::new();

        let id = store
            .put(&run, &node, ShotFormat::Jpeg, vec![5; 16])
            .await
            .unwrap();
        let stats = store.sweep().await.unwrap();
        assert_eq!(stats.expired, 1);
        assert!(matches!(
            store.get(&id).await.unwrap_err().kind(),
            ShotErrKind::NotFound
        ));
    }

    #[tokio::test]
    async fn sweep_evicts_oldest_past_quota() {
        let (store, _dir) = store_with(3600, 1);
        let run = RunId::new();
        let node = NodeId::new();

        let old = store
            .put(&run, &node, ShotFormat::Png, vec![1; 32])
            .await
            .unwrap();
        let newer = store
            .put(&run, &node, ShotFormat::Png, vec![2; 32])
            .await
            .unwrap();

        let stats = store.sweep().await.unwrap();
        assert!(stats.evicted >= 1);
        assert!(store.get(&old).await.is_err());
        // At quota 1 byte everything goes, including the newer shot.
        assert!(store.get(&newer).await.is_err());
    }

    #[tokio::test]
    async fn reopen_rebuilds_index_from_disk() {
        let dir = tempdir().unwrap();
        let cfg = ShotStoreConfig {
            root: dir.path().to_path_buf(),
            ttl_sec: 3600,
            max_total_bytes: u64::MAX,
        };
        let run = RunId::new();
        let node = NodeId::new();
        let id = {
            let store = FsShotStore::open(cfg.clone()).unwrap();
            store
                .put(&run, &node, ShotFormat::Png, vec![7; 8])
                .await
                .unwrap()
        };

        let reopened = FsShotStore::open(cfg).unwrap();
        let shot = reopened.get(&id).await.unwrap();
        assert_eq!(shot.bytes, vec![7; 8]);
        assert_eq!(reopened.refs_by_run(&run).await.unwrap(), vec![id]);
    }
}
