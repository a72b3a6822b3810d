//! Undo/redo over full timeline snapshots.
//!
//! The history is an ordered list of snapshots with a cursor pointing at the
//! snapshot matching the current model. Undo and redo move the cursor and
//! hand back the snapshot the model should be replaced with.

use crate::id::SegmentId;
use crate::timeline::Timeline;

/// Snapshot-based undo stack.
#[derive(Debug, Clone)]
pub struct History {
    snapshots: Vec<Timeline>,
    cursor: usize,
    max_depth: usize,
}

impl History {
    /// Start a history whose first entry is `initial`.
    pub fn new(initial: Timeline, max_depth: usize) -> Self {
        Self {
            snapshots: vec![initial],
            cursor: 0,
            max_depth: max_depth.max(1),
        }
    }

    /// Record the state after a committed change. Any redo tail is dropped
    /// and the oldest snapshots are evicted beyond the depth limit.
    pub fn record(&mut self, snapshot: Timeline) {
        self.snapshots.truncate(self.cursor + 1);
        self.snapshots.push(snapshot);
        let overflow = self.snapshots.len().saturating_sub(self.max_depth + 1);
        if overflow > 0 {
            self.snapshots.drain(..overflow);
        }
        self.cursor = self.snapshots.len() - 1;
    }

    /// Step back. Returns the snapshot to restore.
    pub fn undo(&mut self) -> Option<&Timeline> {
        if !self.can_undo() {
            return None;
        }
        self.cursor -= 1;
        self.snapshots.get(self.cursor)
    }

    /// Step forward. Returns the snapshot to restore.
    pub fn redo(&mut self) -> Option<&Timeline> {
        if !self.can_redo() {
            return None;
        }
        self.cursor += 1;
        self.snapshots.get(self.cursor)
    }

    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    pub fn can_redo(&self) -> bool {
        self.cursor + 1 < self.snapshots.len()
    }

    /// Snapshot matching the current model.
    pub fn current(&self) -> Option<&Timeline> {
        self.snapshots.get(self.cursor)
    }

    /// Number of undo steps available.
    pub fn undo_depth(&self) -> usize {
        self.cursor
    }

    /// Replace the snapshot matching the current model, e.g. after the store
    /// resolved fields of a change that was already recorded.
    pub fn amend(&mut self, snapshot: Timeline) {
        if let Some(current) = self.snapshots.get_mut(self.cursor) {
            *current = snapshot;
        }
    }

    /// Rename a segment in every snapshot that holds it. Returns how many
    /// snapshots were rewritten.
    pub fn reassign_id(&mut self, old: &SegmentId, new: &SegmentId) -> usize {
        self.snapshots
            .iter_mut()
            .filter(|snapshot| snapshot.segment(old).is_some())
            .filter_map(|snapshot| snapshot.reassign_id(old, new.clone()).ok())
            .count()
    }

    /// Drop every snapshot and start over from `initial`.
    pub fn reset(&mut self, initial: Timeline) {
        self.snapshots.clear();
        self.snapshots.push(initial);
        self.cursor = 0;
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new(Timeline::default(), 100)
    }
}
