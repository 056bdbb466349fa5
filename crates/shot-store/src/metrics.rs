use std::sync::atomic::{AtomicU64, Ordering};

/// Cheap counters exposed for diagnostics; no exporter wiring.
#[derive(Debug, Default)]
pub struct ShotMetrics {
    puts: AtomicU64,
    dedup_hits: AtomicU64,
    swept: AtomicU64,
}

impl ShotMetrics {
    pub fn record_put(&self) {
        self.puts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_dedup_hit(&self) {
        self.dedup_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_swept(&self, removed: usize) {
        self.swept.fetch_add(removed as u64, Ordering::Relaxed);
    }

    pub fn puts(&self) -> u64 {
        self.puts.load(Ordering::Relaxed)
    }

    pub fn dedup_hits(&self) -> u64 {
        self.dedup_hits.load(Ordering::Relaxed)
    }

    pub fn swept(&self) -> u64 {
        self.swept.load(Ordering::Relaxed)
    }
}
