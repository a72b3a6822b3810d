//! Debounced write queue.
//!
//! Committed edits schedule a write under a key naming what to write.
//! Scheduling an already pending key pushes its deadline back, so a burst
//! of edits collapses into one write. Each write class has its own window.
//! The queue never fires on its own; the caller polls [`PendingWrites::take_due`]
//! with the current instant.

use montage_core::config::PersistenceConfig;
use montage_timeline::{SegmentId, TransitionId};
use std::time::{Duration, Instant};

/// Independent debounce classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WriteClass {
    Segment,
    Filters,
    Transition,
}

/// What a pending write will send.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum WriteKey {
    /// Segment placement and properties
    Segment(SegmentId),
    /// Segment filter chain
    Filters(SegmentId),
    Transition(TransitionId),
}

impl WriteKey {
    pub fn class(&self) -> WriteClass {
        match self {
            Self::Segment(_) => WriteClass::Segment,
            Self::Filters(_) => WriteClass::Filters,
            Self::Transition(_) => WriteClass::Transition,
        }
    }

    pub fn segment(&self) -> Option<&SegmentId> {
        match self {
            Self::Segment(id) | Self::Filters(id) => Some(id),
            Self::Transition(_) => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PendingWrites {
    segment_window: Duration,
    filter_window: Duration,
    transition_window: Duration,
    /// Pending keys in first-scheduled order with their deadlines
    entries: Vec<(WriteKey, Instant)>,
}

impl PendingWrites {
    pub fn new(config: &PersistenceConfig) -> Self {
        Self {
            segment_window: config.segment_debounce(),
            filter_window: config.filter_debounce(),
            transition_window: config.transition_debounce(),
            entries: Vec::new(),
        }
    }

    pub fn window(&self, class: WriteClass) -> Duration {
        match class {
            WriteClass::Segment => self.segment_window,
            WriteClass::Filters => self.filter_window,
            WriteClass::Transition => self.transition_window,
        }
    }

    /// Schedule `key`, coalescing with a pending write of the same key.
    /// Returns the deadline.
    pub fn schedule(&mut self, key: WriteKey, now: Instant) -> Instant {
        let due = now + self.window(key.class());
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = due,
            None => self.entries.push((key, due)),
        }
        due
    }

    /// Remove and return every key whose deadline has passed.
    pub fn take_due(&mut self, now: Instant) -> Vec<WriteKey> {
        let mut due = Vec::new();
        self.entries.retain(|(key, deadline)| {
            if *deadline <= now {
                due.push(key.clone());
                false
            } else {
                true
            }
        });
        due
    }

    /// Remove and return every pending key.
    pub fn drain(&mut self) -> Vec<WriteKey> {
        self.entries.drain(..).map(|(key, _)| key).collect()
    }

    pub fn cancel(&mut self, key: &WriteKey) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(k, _)| k != key);
        self.entries.len() != before
    }

    /// Drop every pending write of `segment`. Returns how many were dropped.
    pub fn cancel_for(&mut self, segment: &SegmentId) -> usize {
        let before = self.entries.len();
        self.entries.retain(|(key, _)| key.segment() != Some(segment));
        before - self.entries.len()
    }

    /// Re-key pending writes of `old` to `new`.
    pub fn retarget(&mut self, old: &SegmentId, new: &SegmentId) {
        for (key, _) in &mut self.entries {
            match key {
                WriteKey::Segment(id) | WriteKey::Filters(id) if id == old => *id = new.clone(),
                _ => {}
            }
        }
    }

    pub fn is_pending(&self, key: &WriteKey) -> bool {
        self.entries.iter().any(|(k, _)| k == key)
    }

    /// Earliest deadline.
    pub fn next_due(&self) -> Option<Instant> {
        self.entries.iter().map(|(_, due)| *due).min()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for PendingWrites {
    fn default() -> Self {
        Self::new(&PersistenceConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn test_coalesces_within_window() {
        let mut pending = PendingWrites::default();
        let t0 = Instant::now();
        let id = SegmentId::canonical("a");
        pending.schedule(WriteKey::Segment(id.clone()), t0);
        pending.schedule(WriteKey::Segment(id.clone()), t0 + ms(400));
        assert_eq!(pending.len(), 1);

        // Deadline moved to 400 + 800
        assert!(pending.take_due(t0 + ms(1000)).is_empty());
        assert_eq!(pending.take_due(t0 + ms(1200)), vec![WriteKey::Segment(id)]);
        assert!(pending.is_empty());
    }

    #[test]
    fn test_classes_independent() {
        let mut pending = PendingWrites::default();
        let t0 = Instant::now();
        let id = SegmentId::canonical("a");
        let transition = TransitionId::new();
        pending.schedule(WriteKey::Filters(id.clone()), t0);
        pending.schedule(WriteKey::Segment(id.clone()), t0);
        pending.schedule(WriteKey::Transition(transition), t0);

        assert_eq!(pending.take_due(t0 + ms(500)), vec![WriteKey::Filters(id.clone())]);
        assert_eq!(pending.take_due(t0 + ms(800)), vec![WriteKey::Segment(id)]);
        assert_eq!(pending.next_due(), Some(t0 + ms(1000)));
        assert_eq!(pending.take_due(t0 + ms(1000)), vec![WriteKey::Transition(transition)]);
    }

    #[test]
    fn test_cancel_for_segment() {
        let mut pending = PendingWrites::default();
        let t0 = Instant::now();
        let a = SegmentId::canonical("a");
        let b = SegmentId::canonical("b");
        pending.schedule(WriteKey::Segment(a.clone()), t0);
        pending.schedule(WriteKey::Filters(a.clone()), t0);
        pending.schedule(WriteKey::Segment(b.clone()), t0);
        assert_eq!(pending.cancel_for(&a), 2);
        assert!(pending.is_pending(&WriteKey::Segment(b.clone())));
        assert!(pending.cancel(&WriteKey::Segment(b)));
        assert!(pending.is_empty());
    }

    #[test]
    fn test_retarget() {
        let mut pending = PendingWrites::default();
        let t0 = Instant::now();
        let local = SegmentId::provisional();
        let canonical = SegmentId::canonical("c1");
        pending.schedule(WriteKey::Segment(local.clone()), t0);
        pending.retarget(&local, &canonical);
        assert!(pending.is_pending(&WriteKey::Segment(canonical)));
        assert!(!pending.is_pending(&WriteKey::Segment(local)));
    }
}
