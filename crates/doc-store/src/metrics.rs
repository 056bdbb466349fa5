use std::sync::atomic::{AtomicU64, Ordering};

/// Cheap counters exposed for diagnostics; no exporter wiring.
#[derive(Debug, Default)]
pub struct DocMetrics {
    writes: AtomicU64,
    deletes: AtomicU64,
    corrupt_skipped: AtomicU64,
}

impl DocMetrics {
    pub fn record_write(&self) {
        self.writes.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_delete(&self) {
        self.deletes.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_corrupt_skipped(&self) {
        self.corrupt_skipped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn writes(&self) -> u64 {
        self.writes.load(Ordering::Relaxed)
    }

    pub fn deletes(&self) -> u64 {
        self.deletes.load(Ordering::Relaxed)
    }

    pub fn corrupt_skipped(&self) -> u64 {
        self.corrupt_skipped.load(Ordering::Relaxed)
    }
}
