//! Bounded undo/redo stack with delta compression

use std::collections::VecDeque;
use std::marker::PhantomData;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::trace;

use crate::diff::{apply, diff, DiffOp};
use crate::errors::HistoryError;

/// Tuning knobs for the history stack.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct HistoryConfig {
    /// Maximum retained states; the oldest are evicted beyond this.
    pub capacity: usize,

    /// A full keyframe is stored every this-many delta entries, bounding
    /// how many deltas a reconstruction has to replay.
    pub keyframe_interval: usize,

    /// With compression off every entry is a keyframe.
    pub compress: bool,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            capacity: 100,
            keyframe_interval: 8,
            compress: true,
        }
    }
}

#[derive(Clone, Debug)]
enum HistoryEntry {
    Keyframe(Value),
    Delta(Vec<DiffOp>),
}

/// Summary counters reported by `stats()`.
#[derive(Clone, Debug, Default, serde::Serialize)]
pub struct HistoryStats {
    pub entries: usize,
    pub keyframes: usize,
    pub deltas: usize,
    pub delta_ops: usize,
    /// Serialized size of every state stored as a full snapshot.
    pub snapshot_bytes: usize,
    /// Serialized size of what is actually stored.
    pub stored_bytes: usize,
}

/// Undo/redo history over any serializable state.
///
/// `entries[0..=cursor]` is the undo past, everything after `cursor` is the
/// redo future. The bottom entry is always a keyframe so every position is
/// reconstructible.
pub struct History<T> {
    cfg: HistoryConfig,
    entries: VecDeque<HistoryEntry>,
    cursor: usize,
    _state: PhantomData<T>,
}

impl<T> History<T>
where
    T: Serialize + DeserializeOwned,
{
    pub fn new(cfg: HistoryConfig) -> Self {
        Self {
            cfg,
            entries: VecDeque::new(),
            cursor: 0,
            _state: PhantomData,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    pub fn can_redo(&self) -> bool {
        !self.entries.is_empty() && self.cursor + 1 < self.entries.len()
    }

    /// Record a new state as the current position. Any redo future is
    /// discarded, and the oldest entries are evicted beyond capacity.
    pub fn record(&mut self, state: &T) -> Result<(), HistoryError> {
        let value = serde_json::to_value(state).map_err(|e| HistoryError::Codec(e.to_string()))?;

        if self.entries.is_empty() {
            self.entries.push_back(HistoryEntry::Keyframe(value));
            self.cursor = 0;
            return Ok(());
        }

        // Dropping the redo tail keeps the delta chain linear.
        self.entries.truncate(self.cursor + 1);

        let entry = if self.cfg.compress && self.deltas_since_keyframe() < self.cfg.keyframe_interval {
            let current = self.value_at(self.cursor)?;
            let ops = diff(&current, &value);
            trace!(ops = ops.len(), "recording delta entry");
            HistoryEntry::Delta(ops)
        } else {
            HistoryEntry::Keyframe(value)
        };
        self.entries.push_back(entry);
        self.cursor += 1;

        while self.entries.len() > self.cfg.capacity.max(1) {
            self.evict_front()?;
        }
        Ok(())
    }

    /// Step back one state. Returns `None` at the bottom of the stack.
    pub fn undo(&mut self) -> Result<Option<T>, HistoryError> {
        if !self.can_undo() {
            return Ok(None);
        }
        self.cursor -= 1;
        self.state_at(self.cursor).map(Some)
    }

    /// Step forward one state. Returns `None` when nothing was undone.
    pub fn redo(&mut self) -> Result<Option<T>, HistoryError> {
        if !self.can_redo() {
            return Ok(None);
        }
        self.cursor += 1;
        self.state_at(self.cursor).map(Some)
    }

    /// The state at the current cursor, if any state was recorded.
    pub fn current(&self) -> Result<Option<T>, HistoryError> {
        if self.entries.is_empty() {
            return Ok(None);
        }
        self.state_at(self.cursor).map(Some)
    }

    pub fn stats(&self) -> HistoryStats {
        let mut stats = HistoryStats {
            entries: self.entries.len(),
            ..HistoryStats::default()
        };
        for (i, entry) in self.entries.iter().enumerate() {
            match entry {
                HistoryEntry::Keyframe(value) => {
                    stats.keyframes += 1;
                    stats.stored_bytes += json_len(value);
                }
                HistoryEntry::Delta(ops) => {
                    stats.deltas += 1;
                    stats.delta_ops += ops.len();
                    stats.stored_bytes += ops
                        .iter()
                        .map(|op| serde_json::to_vec(op).map(|v| v.len()).unwrap_or(0))
                        .sum::<usize>();
                }
            }
            if let Ok(value) = self.value_at(i) {
                stats.snapshot_bytes += json_len(&value);
            }
        }
        stats
    }

    fn deltas_since_keyframe(&self) -> usize {
        let mut count = 0;
        for entry in self.entries.iter().take(self.cursor + 1).rev() {
            match entry {
                HistoryEntry::Keyframe(_) => break,
                HistoryEntry::Delta(_) => count += 1,
            }
        }
        count
    }

    /// Reconstruct the raw JSON value at `index` by replaying deltas forward
    /// from the nearest keyframe at or before it.
    fn value_at(&self, index: usize) -> Result<Value, HistoryError> {
        let mut base = None;
        let mut start = 0;
        for i in (0..=index).rev() {
            if let HistoryEntry::Keyframe(value) = &self.entries[i] {
                base = Some(value.clone());
                start = i;
                break;
            }
        }
        let mut value = base.ok_or_else(|| {
            HistoryError::Internal("delta chain without a keyframe".into())
        })?;
        for i in start + 1..=index {
            match &self.entries[i] {
                HistoryEntry::Keyframe(v) => value = v.clone(),
                HistoryEntry::Delta(ops) => value = apply(&value, ops)?,
            }
        }
        Ok(value)
    }

    fn state_at(&self, index: usize) -> Result<T, HistoryError> {
        let value = self.value_at(index)?;
        serde_json::from_value(value).map_err(|e| HistoryError::Codec(e.to_string()))
    }

    /// Drop the oldest entry, promoting the new bottom to a keyframe first
    /// so the chain stays reconstructible.
    fn evict_front(&mut self) -> Result<(), HistoryError> {
        if self.entries.len() < 2 {
            return Ok(());
        }
        if matches!(self.entries[1], HistoryEntry::Delta(_)) {
            let promoted = self.value_at(1)?;
            self.entries[1] = HistoryEntry::Keyframe(promoted);
        }
        self.entries.pop_front();
        self.cursor = self.cursor.saturating_sub(1);
        Ok(())
    }
}

fn json_len(value: &Value) -> usize {
    serde_json::to_vec(value).map(|v| v.len()).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    struct State {
        name: String,
        items: Vec<u32>,
    }

    fn state(name: &str, items: &[u32]) -> State {
        State {
            name: name.into(),
            items: items.to_vec(),
        }
    }

    #[test]
    fn undo_redo_round_trip() {
        let mut history = History::new(HistoryConfig::default());
        let a = state("a", &[1]);
        let b = state("b", &[1, 2]);
        let c = state("c", &[1, 2, 3]);
        history.record(&a).unwrap();
        history.record(&b).unwrap();
        history.record(&c).unwrap();

        assert_eq!(history.undo().unwrap(), Some(b.clone()));
        assert_eq!(history.undo().unwrap(), Some(a.clone()));
        assert_eq!(history.undo().unwrap(), None);
        assert_eq!(history.redo().unwrap(), Some(b));
        assert_eq!(history.redo().unwrap(), Some(c));
        assert_eq!(history.redo().unwrap(), None);
    }

    #[test]
    fn record_clears_redo_future() {
        let mut history = History::new(HistoryConfig::default());
        history.record(&state("a", &[])).unwrap();
        history.record(&state("b", &[])).unwrap();
        history.undo().unwrap();

        history.record(&state("b2", &[9])).unwrap();
        assert!(!history.can_redo());
        assert_eq!(history.current().unwrap(), Some(state("b2", &[9])));
        assert_eq!(history.undo().unwrap(), Some(state("a", &[])));
    }

    #[test]
    fn keyframe_interval_inserts_keyframes() {
        let cfg = HistoryConfig {
            capacity: 100,
            keyframe_interval: 3,
            compress: true,
        };
        let mut history = History::new(cfg);
        for i in 0..10u32 {
            history.record(&state(&format!("s{i}"), &[i])).unwrap();
        }
        let stats = history.stats();
        assert!(stats.keyframes >= 3, "stats: {stats:?}");
        assert!(stats.deltas > 0);
    }

    #[test]
    fn compression_off_stores_only_keyframes() {
        let cfg = HistoryConfig {
            capacity: 10,
            keyframe_interval: 4,
            compress: false,
        };
        let mut history = History::new(cfg);
        for i in 0..5u32 {
            history.record(&state("s", &[i])).unwrap();
        }
        let stats = history.stats();
        assert_eq!(stats.deltas, 0);
        assert_eq!(stats.keyframes, 5);
    }

    #[test]
    fn capacity_evicts_oldest_but_stays_reconstructible() {
        let cfg = HistoryConfig {
            capacity: 4,
            keyframe_interval: 10,
            compress: true,
        };
        let mut history = History::new(cfg);
        for i in 0..20u32 {
            history.record(&state(&format!("s{i}"), &[i])).unwrap();
        }
        assert_eq!(history.len(), 4);

        // Walk all the way down; every reconstruction must succeed.
        let mut seen = Vec::new();
        while let Some(s) = history.undo().unwrap() {
            seen.push(s.name);
        }
        assert_eq!(seen, vec!["s18", "s17", "s16"]);
    }

    #[test]
    fn deep_undo_after_eviction_returns_promoted_keyframe() {
        let cfg = HistoryConfig {
            capacity: 3,
            keyframe_interval: 100,
            compress: true,
        };
        let mut history = History::new(cfg);
        history.record(&state("a", &[1])).unwrap();
        history.record(&state("b", &[1, 2])).unwrap();
        history.record(&state("c", &[1, 2, 3])).unwrap();
        history.record(&state("d", &[1, 2, 3, 4])).unwrap();

        assert_eq!(history.undo().unwrap(), Some(state("c", &[1, 2, 3])));
        assert_eq!(history.undo().unwrap(), Some(state("b", &[1, 2])));
        assert_eq!(history.undo().unwrap(), None);
    }

    #[test]
    fn stats_show_delta_savings_for_small_edits() {
        let mut items: Vec<u32> = (0..200).collect();
        let mut history = History::new(HistoryConfig::default());
        history.record(&state("big", &items)).unwrap();
        for i in 0..5 {
            items[0] = i;
            history.record(&state("big", &items)).unwrap();
        }
        let stats = history.stats();
        assert!(
            stats.stored_bytes < stats.snapshot_bytes,
            "stats: {stats:?}"
        );
    }
}
