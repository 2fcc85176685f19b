//! Linear undo/redo history over whole timeline snapshots.
//!
//! Every mutation of the editing state goes through [`TimelineHistory`] in one
//! of two ways:
//!
//! - **recorded**: the previous `present` is pushed onto `past`, `future` is
//!   cleared and `revision` is bumped. Used when a gesture is committed.
//! - **live**: `present` is replaced in place and nothing else changes. Used for
//!   continuous feedback while a pointer is down so the undo stack does not grow
//!   on every pointer move.
//!
//! ```ignore
//! let mut history = TimelineHistory::new(snapshot);
//! history.record(|s| nudge(s));
//! history.undo();
//! history.redo();
//! ```

use tracing::debug;

use crate::domain::model::TimelineSnapshot;

/// Default maximum number of undo steps kept.
pub const DEFAULT_HISTORY_LIMIT: usize = 200;

#[derive(Debug, Clone, PartialEq)]
pub struct TimelineHistory {
    past: Vec<TimelineSnapshot>,
    present: TimelineSnapshot,
    future: Vec<TimelineSnapshot>,
    revision: u64,
    /// Maximum depth of `past`; 0 disables the limit.
    limit: usize,
}

impl Default for TimelineHistory {
    fn default() -> Self {
        Self::new(TimelineSnapshot::default())
    }
}

impl TimelineHistory {
    pub fn new(present: TimelineSnapshot) -> Self {
        Self::with_limit(present, DEFAULT_HISTORY_LIMIT)
    }

    pub fn with_limit(present: TimelineSnapshot, limit: usize) -> Self {
        Self {
            past: Vec::new(),
            present,
            future: Vec::new(),
            revision: 0,
            limit,
        }
    }

    pub fn present(&self) -> &TimelineSnapshot {
        &self.present
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn can_undo(&self) -> bool {
        !self.past.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.future.is_empty()
    }

    pub fn undo_depth(&self) -> usize {
        self.past.len()
    }

    pub fn redo_depth(&self) -> usize {
        self.future.len()
    }

    /// Apply `mutate` to the present and make the previous present undoable.
    pub fn record<F>(&mut self, mutate: F)
    where
        F: FnOnce(TimelineSnapshot) -> TimelineSnapshot,
    {
        let previous = self.present.clone();
        self.present = mutate(previous.clone());
        self.past.push(previous);
        self.future.clear();
        self.revision += 1;

        if self.limit > 0 && self.past.len() > self.limit {
            let overflow = self.past.len() - self.limit;
            self.past.drain(..overflow);
        }

        debug!(
            revision = self.revision,
            undo_depth = self.past.len(),
            "History entry recorded"
        );
    }

    /// Apply `mutate`, recording it only when `record_history` is set.
    pub fn update<F>(&mut self, mutate: F, record_history: bool)
    where
        F: FnOnce(TimelineSnapshot) -> TimelineSnapshot,
    {
        if record_history {
            self.record(mutate);
        } else {
            let present = std::mem::take(&mut self.present);
            self.present = mutate(present);
        }
    }

    /// Step back one recorded mutation. Returns false when there is nothing to undo.
    pub fn undo(&mut self) -> bool {
        let Some(previous) = self.past.pop() else {
            return false;
        };
        let current = std::mem::replace(&mut self.present, previous);
        self.future.push(current);
        self.revision += 1;
        debug!(
            revision = self.revision,
            undo_remaining = self.past.len(),
            "Undo"
        );
        true
    }

    /// Re-apply the most recently undone mutation.
    pub fn redo(&mut self) -> bool {
        let Some(next) = self.future.pop() else {
            return false;
        };
        let current = std::mem::replace(&mut self.present, next);
        self.past.push(current);
        self.revision += 1;
        debug!(
            revision = self.revision,
            redo_remaining = self.future.len(),
            "Redo"
        );
        true
    }

    /// Install `snapshot` as the only state. Loading is never undoable.
    pub fn replace_snapshot(&mut self, snapshot: TimelineSnapshot) {
        self.past.clear();
        self.future.clear();
        self.present = snapshot;
        self.revision += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::ClipSegment;

    fn snapshot_with(ids: &[&str]) -> TimelineSnapshot {
        TimelineSnapshot::with_clips(
            ids.iter()
                .enumerate()
                .map(|(i, id)| ClipSegment::new(*id, *id, i as f64, i as f64 + 1.0))
                .collect(),
        )
    }

    fn push_clip(id: &'static str) -> impl FnOnce(TimelineSnapshot) -> TimelineSnapshot {
        move |mut s| {
            s.clips.push(ClipSegment::new(id, id, 20.0, 21.0));
            s
        }
    }

    #[test]
    fn test_record_then_undo_restores_snapshot() {
        let original = snapshot_with(&["a", "b"]);
        let mut history = TimelineHistory::new(original.clone());

        history.record(push_clip("c"));
        assert_eq!(history.present().clips.len(), 3);
        assert!(history.can_undo());
        assert_eq!(history.revision(), 1);

        assert!(history.undo());
        assert_eq!(history.present(), &original);
        assert!(history.can_redo());
    }

    #[test]
    fn test_undo_redo_is_observably_a_no_op() {
        let mut history = TimelineHistory::new(snapshot_with(&["a"]));
        history.record(push_clip("b"));
        let before = history.present().clone();

        history.undo();
        history.redo();
        assert_eq!(history.present(), &before);
    }

    #[test]
    fn test_record_clears_future() {
        let mut history = TimelineHistory::new(snapshot_with(&["a"]));
        history.record(push_clip("b"));
        history.undo();
        assert!(history.can_redo());

        history.record(push_clip("c"));
        assert!(!history.can_redo());
        assert_eq!(history.present().clips[1].id, "c");
    }

    #[test]
    fn test_live_update_does_not_touch_stacks() {
        let mut history = TimelineHistory::new(snapshot_with(&["a"]));
        history.update(push_clip("b"), false);

        assert_eq!(history.present().clips.len(), 2);
        assert!(!history.can_undo());
        assert_eq!(history.revision(), 0);

        history.update(push_clip("c"), true);
        assert_eq!(history.undo_depth(), 1);
        assert_eq!(history.revision(), 1);
    }

    #[test]
    fn test_undo_and_redo_on_empty_stacks_are_no_ops() {
        let original = snapshot_with(&["a"]);
        let mut history = TimelineHistory::new(original.clone());
        assert!(!history.undo());
        assert!(!history.redo());
        assert_eq!(history.present(), &original);
        assert_eq!(history.revision(), 0);
    }

    #[test]
    fn test_replace_snapshot_resets_history() {
        let mut history = TimelineHistory::new(snapshot_with(&["a"]));
        history.record(push_clip("b"));
        history.record(push_clip("c"));
        history.undo();

        let loaded = snapshot_with(&["x", "y"]);
        history.replace_snapshot(loaded.clone());
        assert_eq!(history.present(), &loaded);
        assert!(!history.can_undo());
        assert!(!history.can_redo());
    }

    #[test]
    fn test_limit_drops_oldest_entries() {
        let mut history = TimelineHistory::with_limit(snapshot_with(&["a"]), 2);
        history.record(push_clip("b"));
        history.record(push_clip("c"));
        history.record(push_clip("d"));
        assert_eq!(history.undo_depth(), 2);

        history.undo();
        history.undo();
        assert!(!history.undo());
        assert_eq!(history.present().clips.len(), 2);
    }
}
