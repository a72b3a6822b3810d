//! Editing session.
//!
//! Owns the timeline, its undo history and the manipulation engine, and
//! turns every committed edit into store writes. Edits always land in the
//! local model first; the store catches up through the pending-write queue,
//! except for keyframe edits and undo snapshots, which are written
//! immediately.

use montage_core::{round_time, EditorConfig, Filter, Keyframe, KeyframeToggle};
use montage_edit::{DragPreview, ManipulationEngine, ResizeEdge, ResizePreview, SessionOutcome};
use montage_timeline::{
    Crop, History, LayerIndex, Property, RemovedSegment, Segment, SegmentId, Timeline, TimelineError,
    TimelineFile, Transition, TransitionId,
};
use std::collections::BTreeSet;
use std::time::Instant;
use tracing::{debug, info, warn};

use crate::error::SyncResult;
use crate::pending::{PendingWrites, WriteKey};
use crate::retry::RetryPolicy;
use crate::store::{CreatedSegment, ProjectStore, SegmentUpdate};

/// A failure the user has to be told about.
#[derive(Debug, Clone, PartialEq)]
pub struct Notice {
    pub segment: Option<SegmentId>,
    pub message: String,
}

/// Result of sending one pending write.
enum Write {
    Sent,
    /// Target not confirmed by the store yet
    Deferred,
    /// Target gone or never going to be confirmed
    Dropped,
}

pub struct EditorSession<S: ProjectStore> {
    store: S,
    timeline: Timeline,
    history: History,
    engine: ManipulationEngine,
    pending: PendingWrites,
    retry: RetryPolicy,
    /// Segments kept locally after the store refused to create them
    flagged: BTreeSet<SegmentId>,
    notices: Vec<Notice>,
    selected: Option<SegmentId>,
}

impl<S: ProjectStore> EditorSession<S> {
    /// Hydrate the timeline from `store` and start a session on it.
    pub fn open(mut store: S, config: &EditorConfig) -> SyncResult<Self> {
        let project = store.hydrate()?;
        let timeline = Timeline::hydrate(project.segments, project.transitions)?;
        info!(
            segments = timeline.segment_count(),
            transitions = timeline.transitions().len(),
            "Editor session opened"
        );
        Ok(Self {
            history: History::new(timeline.clone(), config.history.max_depth),
            timeline,
            engine: ManipulationEngine::new(&config.snapping),
            pending: PendingWrites::new(&config.persistence),
            retry: RetryPolicy::from_config(&config.persistence),
            store,
            flagged: BTreeSet::new(),
            notices: Vec::new(),
            selected: None,
        })
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn engine(&self) -> &ManipulationEngine {
        &self.engine
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn pending(&self) -> &PendingWrites {
        &self.pending
    }

    /// Whether the store refused to create this segment.
    pub fn is_flagged(&self, id: &SegmentId) -> bool {
        self.flagged.contains(id)
    }

    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }

    pub fn drain_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    fn notify(&mut self, segment: Option<SegmentId>, message: String) {
        warn!(segment = ?segment, %message, "User notice");
        self.notices.push(Notice { segment, message });
    }

    fn record(&mut self) {
        self.history.record(self.timeline.clone());
    }

    /// Schedule a write for a committed edit and snapshot it for undo.
    fn commit(&mut self, key: WriteKey, now: Instant) {
        self.pending.schedule(key, now);
        self.record();
    }

    // ── Hydrate ────────────────────────────────────────────────

    /// Rebuild the model from the store. Pending writes, the pointer session
    /// and the undo history are dropped.
    pub fn rehydrate(&mut self) -> SyncResult<()> {
        let project = self.store.hydrate()?;
        let timeline = Timeline::hydrate(project.segments, project.transitions)?;
        self.engine.cancel();
        let dropped = self.pending.drain().len();
        self.timeline.restore(timeline);
        self.history.reset(self.timeline.clone());
        info!(segments = self.timeline.segment_count(), dropped, "Rehydrated from store");
        Ok(())
    }

    // ── Creation ───────────────────────────────────────────────

    /// Insert a new segment and create it in the store.
    ///
    /// Returns the id the segment ends up with: canonical once the store
    /// confirmed it, still provisional when the create failed.
    pub fn create_segment(&mut self, segment: Segment) -> SyncResult<SegmentId> {
        let id = segment.id.clone();
        self.timeline.add_segment(segment)?;
        self.record();
        self.persist_new(id)
    }

    fn persist_new(&mut self, id: SegmentId) -> SyncResult<SegmentId> {
        let segment = self
            .timeline
            .segment(&id)
            .cloned()
            .ok_or_else(|| TimelineError::SegmentNotFound(id.clone()))?;

        match self.store.create_segment(&segment) {
            Ok(created) => self.reconcile(&id, created),
            Err(err) => {
                self.flagged.insert(id.clone());
                if err.is_retryable() {
                    warn!(segment = %id, error = %err, "Segment create failed, rehydrating");
                    self.rehydrate_keeping(segment);
                } else {
                    self.notify(Some(id.clone()), format!("Could not save new {} segment: {}", segment.kind(), err));
                }
                Ok(id)
            }
        }
    }

    /// Swap a provisional id for the canonical one and take over the fields
    /// the store resolved.
    fn reconcile(&mut self, local: &SegmentId, created: CreatedSegment) -> SyncResult<SegmentId> {
        let canonical = SegmentId::canonical(created.id.clone());
        self.timeline.reassign_id(local, canonical.clone())?;
        self.engine.retarget(local, &canonical);
        self.pending.retarget(local, &canonical);
        self.flagged.remove(local);
        if self.selected.as_ref() == Some(local) {
            self.selected = Some(canonical.clone());
        }

        if let Err(err) = self.timeline.update_segment(&canonical, |segment| created.apply(segment)) {
            warn!(segment = %canonical, error = %err, "Store-resolved fields rejected, keeping local placement");
        }
        let snapshots = self.history.reassign_id(local, &canonical);
        self.history.amend(self.timeline.clone());
        debug!(from = %local, to = %canonical, snapshots, "Segment confirmed by store");
        Ok(canonical)
    }

    /// Rehydrate after a failed create, putting the optimistic segment and
    /// its transitions back if the store does not know them.
    ///
    /// Pending writes are flushed first so edits to other segments reach the
    /// store before it is re-read. When the segment no longer fits the
    /// hydrated timeline the local model is kept as it was.
    fn rehydrate_keeping(&mut self, segment: Segment) {
        let local = self.timeline.clone();
        let transitions: Vec<Transition> = local.transitions_for(&segment.id).cloned().collect();
        let flushed = self.flush_all(Instant::now());
        debug!(segment = %segment.id, flushed, "Flushed pending writes before rehydrate");

        if let Err(err) = self.rehydrate() {
            warn!(error = %err, "Rehydrate failed, keeping local model");
            return;
        }
        if self.timeline.segment(&segment.id).is_some() {
            return;
        }

        let id = segment.id.clone();
        let kept = self.timeline.add_segment(segment).and_then(|()| {
            for transition in transitions {
                self.timeline.add_transition(transition)?;
            }
            Ok(())
        });
        if let Err(err) = kept {
            warn!(segment = %id, error = %err, "Flagged segment no longer fits the stored timeline, keeping local model");
            self.timeline.restore(local);
        }
        self.history.reset(self.timeline.clone());
    }

    // ── Pointer sessions ───────────────────────────────────────

    pub fn begin_drag(&mut self, id: &SegmentId, pointer_time: f64) -> SyncResult<()> {
        Ok(self.engine.begin_drag(&self.timeline, id, pointer_time)?)
    }

    pub fn move_drag(
        &mut self,
        pointer_time: f64,
        target_layer: Option<LayerIndex>,
        playhead: f64,
    ) -> SyncResult<DragPreview> {
        Ok(self.engine.move_drag(&self.timeline, pointer_time, target_layer, playhead)?)
    }

    pub fn begin_resize(&mut self, id: &SegmentId, edge: ResizeEdge) -> SyncResult<()> {
        Ok(self.engine.begin_resize(&self.timeline, id, edge)?)
    }

    pub fn move_resize(&mut self, pointer_time: f64, playhead: f64) -> SyncResult<ResizePreview> {
        Ok(self.engine.move_resize(&self.timeline, pointer_time, playhead)?)
    }

    /// Close the pointer session; a committed placement is scheduled for
    /// writing and recorded for undo.
    pub fn end_pointer(&mut self, now: Instant) -> SyncResult<SessionOutcome> {
        let outcome = self.engine.end(&mut self.timeline)?;
        if outcome.is_committed() {
            self.commit(WriteKey::Segment(outcome.segment().clone()), now);
        }
        Ok(outcome)
    }

    pub fn cancel_pointer(&mut self) -> Option<SegmentId> {
        self.engine.cancel()
    }

    /// Split a segment at timeline time `at` and create the right-hand
    /// sibling in the store. Returns the sibling's id.
    pub fn split(&mut self, id: &SegmentId, at: f64, now: Instant) -> SyncResult<SegmentId> {
        let right = self.engine.split(&mut self.timeline, id, at)?;
        self.commit(WriteKey::Segment(id.clone()), now);
        let moved: Vec<TransitionId> = self.timeline.transitions_for(&right).map(|t| t.id).collect();
        for transition in moved {
            self.pending.schedule(WriteKey::Transition(transition), now);
        }
        self.persist_new(right)
    }

    // ── Segment edits ──────────────────────────────────────────

    /// Set the static value of a property.
    pub fn set_property(&mut self, id: &SegmentId, property: Property, value: f64, now: Instant) -> SyncResult<()> {
        self.timeline
            .update_segment(id, |segment| segment.set_static_value(property, value))?;
        self.commit(WriteKey::Segment(id.clone()), now);
        Ok(())
    }

    pub fn set_crop(&mut self, id: &SegmentId, crop: Crop, now: Instant) -> SyncResult<()> {
        self.timeline.update_segment(id, |segment| segment.crop = crop)?;
        self.commit(WriteKey::Segment(id.clone()), now);
        Ok(())
    }

    /// Change the playback speed of a video segment; its duration follows.
    pub fn set_speed(&mut self, id: &SegmentId, speed: f64, now: Instant) -> SyncResult<()> {
        self.timeline
            .try_update_segment(id, |segment| segment.set_speed(speed))?;
        self.commit(WriteKey::Segment(id.clone()), now);
        Ok(())
    }

    pub fn set_filters(&mut self, id: &SegmentId, filters: Vec<Filter>, now: Instant) -> SyncResult<()> {
        self.timeline.update_segment(id, |segment| segment.filters = filters)?;
        self.commit(WriteKey::Filters(id.clone()), now);
        Ok(())
    }

    /// Delete a segment with its transitions, locally and in the store.
    pub fn delete_segment(&mut self, id: &SegmentId) -> SyncResult<RemovedSegment> {
        let removed = self.timeline.remove_segment(id)?;
        self.release(id);
        for transition in &removed.transitions {
            self.pending.cancel(&WriteKey::Transition(transition.id));
        }
        self.flagged.remove(id);
        if self.selected.as_ref() == Some(id) {
            self.selected = None;
        }
        self.record();

        if let Some(canonical) = id.as_canonical() {
            for transition in &removed.transitions {
                if let Err(err) = self.store.delete_transition(transition.id) {
                    warn!(transition = %transition.id, error = %err, "Transition delete failed");
                }
            }
            if let Err(err) = self.store.delete_segment(canonical) {
                warn!(segment = %id, error = %err, "Segment delete failed");
            }
        }
        info!(segment = %id, transitions = removed.transitions.len(), "Segment deleted");
        Ok(removed)
    }

    // ── Transitions ────────────────────────────────────────────

    /// Attach a transition, replacing any transition on the same edge.
    pub fn add_transition(&mut self, transition: Transition, now: Instant) -> SyncResult<TransitionId> {
        let id = transition.id;
        if let Some(replaced) = self.timeline.add_transition(transition)? {
            if replaced.id != id {
                self.pending.cancel(&WriteKey::Transition(replaced.id));
                self.delete_remote_transition(&replaced);
            }
        }
        self.commit(WriteKey::Transition(id), now);
        Ok(id)
    }

    pub fn update_transition(
        &mut self,
        id: TransitionId,
        edit: impl FnOnce(&mut Transition),
        now: Instant,
    ) -> SyncResult<()> {
        self.timeline.update_transition(id, edit)?;
        self.commit(WriteKey::Transition(id), now);
        Ok(())
    }

    pub fn remove_transition(&mut self, id: TransitionId) -> SyncResult<Transition> {
        let removed = self.timeline.remove_transition(id)?;
        self.pending.cancel(&WriteKey::Transition(id));
        self.record();
        self.delete_remote_transition(&removed);
        Ok(removed)
    }

    fn delete_remote_transition(&mut self, transition: &Transition) {
        if transition.segment_id.is_provisional() {
            return;
        }
        if let Err(err) = self.store.delete_transition(transition.id) {
            warn!(transition = %transition.id, error = %err, "Transition delete failed");
        }
    }

    // ── Keyframes ──────────────────────────────────────────────

    pub fn add_keyframe(
        &mut self,
        id: &SegmentId,
        property: Property,
        time: f64,
        value: f64,
        now: Instant,
    ) -> SyncResult<()> {
        self.timeline.add_keyframe(id, property, time, value)?;
        self.record();
        self.push_keyframe(id, property, Keyframe::new(round_time(time), value), now);
        Ok(())
    }

    /// Change the value of the keyframe at `time`.
    pub fn update_keyframe(
        &mut self,
        id: &SegmentId,
        property: Property,
        time: f64,
        value: f64,
        now: Instant,
    ) -> SyncResult<()> {
        self.timeline.update_keyframe(id, property, time, value)?;
        self.record();
        self.push_keyframe(id, property, Keyframe::new(round_time(time), value), now);
        Ok(())
    }

    /// Remove a keyframe. When the store refuses, the removal is rolled
    /// back and the error returned.
    pub fn remove_keyframe(
        &mut self,
        id: &SegmentId,
        property: Property,
        time: f64,
        now: Instant,
    ) -> SyncResult<Keyframe> {
        let before = self.timeline.clone();
        let removed = self.timeline.remove_keyframe(id, property, time)?;
        self.finish_removal(id, property, removed, before, now)?;
        Ok(removed)
    }

    /// Insert a keyframe at `time` holding the current value, or remove the
    /// one already there.
    pub fn toggle_keyframe(
        &mut self,
        id: &SegmentId,
        property: Property,
        time: f64,
        now: Instant,
    ) -> SyncResult<KeyframeToggle> {
        let before = self.timeline.clone();
        let toggle = self.timeline.toggle_keyframe(id, property, time)?;
        match toggle {
            KeyframeToggle::Inserted(keyframe) => {
                self.record();
                self.push_keyframe(id, property, keyframe, now);
            }
            KeyframeToggle::Removed(keyframe) => self.finish_removal(id, property, keyframe, before, now)?,
        }
        Ok(toggle)
    }

    /// Keyframe writes are immediate and best-effort. Unconfirmed segments
    /// get a full segment write once they have a canonical id.
    fn push_keyframe(&mut self, id: &SegmentId, property: Property, keyframe: Keyframe, now: Instant) {
        let Some(canonical) = id.as_canonical() else {
            self.pending.schedule(WriteKey::Segment(id.clone()), now);
            return;
        };
        if let Err(err) = self.store.put_keyframe(canonical, property, keyframe) {
            warn!(segment = %id, %property, time = keyframe.time, error = %err, "Keyframe write failed");
        }
    }

    fn finish_removal(
        &mut self,
        id: &SegmentId,
        property: Property,
        keyframe: Keyframe,
        before: Timeline,
        now: Instant,
    ) -> SyncResult<()> {
        let Some(canonical) = id.as_canonical() else {
            self.commit(WriteKey::Segment(id.clone()), now);
            return Ok(());
        };
        match self.store.remove_keyframe(canonical, property, keyframe.time) {
            Ok(()) => {
                self.record();
                Ok(())
            }
            Err(err) => {
                self.timeline.restore(before);
                self.notify(
                    Some(id.clone()),
                    format!("Could not remove {} keyframe at {:.3}s: {}", property, keyframe.time, err),
                );
                Err(err.into())
            }
        }
    }

    // ── Undo / redo ────────────────────────────────────────────

    /// Step back one snapshot. Returns `false` when there is nothing to undo.
    pub fn undo(&mut self) -> SyncResult<bool> {
        let Some(snapshot) = self.history.undo().cloned() else {
            return Ok(false);
        };
        self.apply_snapshot(snapshot, "undo")?;
        Ok(true)
    }

    /// Step forward one snapshot. Returns `false` when there is nothing to
    /// redo.
    pub fn redo(&mut self) -> SyncResult<bool> {
        let Some(snapshot) = self.history.redo().cloned() else {
            return Ok(false);
        };
        self.apply_snapshot(snapshot, "redo")?;
        Ok(true)
    }

    /// Replace the model and write the snapshot to the store with retry.
    /// The local change stands even when every attempt fails.
    fn apply_snapshot(&mut self, snapshot: Timeline, action: &str) -> SyncResult<()> {
        let encoded = TimelineFile::new(snapshot.clone()).to_json()?;
        self.engine.cancel();
        self.timeline.restore(snapshot);

        let store = &mut self.store;
        match self.retry.run(|| store.write_snapshot(&encoded)) {
            Ok(()) => debug!(action, revision = self.timeline.revision(), "Snapshot written"),
            Err(err) => self.notify(None, format!("Could not save {action}: {err}")),
        }
        Ok(())
    }

    // ── Write-through ──────────────────────────────────────────

    /// Send every write whose debounce window has passed. Returns how many
    /// writes reached the store.
    pub fn flush_due(&mut self, now: Instant) -> usize {
        let due = self.pending.take_due(now);
        self.send(due, now)
    }

    /// Send every pending write regardless of its deadline.
    pub fn flush_all(&mut self, now: Instant) -> usize {
        let all = self.pending.drain();
        self.send(all, now)
    }

    fn send(&mut self, keys: Vec<WriteKey>, now: Instant) -> usize {
        let mut sent = 0;
        for key in keys {
            match self.write(&key) {
                Ok(Write::Sent) => sent += 1,
                Ok(Write::Deferred) => {
                    self.pending.schedule(key, now);
                }
                Ok(Write::Dropped) => debug!(?key, "Pending write dropped"),
                Err(err) => warn!(?key, error = %err, "Autosave write failed"),
            }
        }
        sent
    }

    fn write(&mut self, key: &WriteKey) -> SyncResult<Write> {
        match key {
            WriteKey::Segment(id) | WriteKey::Filters(id) => {
                let Some(segment) = self.timeline.segment(id) else {
                    return Ok(Write::Dropped);
                };
                if id.is_provisional() {
                    return Ok(self.unconfirmed(id));
                }
                let update = match key {
                    WriteKey::Filters(_) => SegmentUpdate::filters(segment)?,
                    _ => SegmentUpdate::from_segment(segment)?,
                };
                self.store.update_segment(&update)?;
            }
            WriteKey::Transition(tid) => {
                let Some(transition) = self.timeline.transition(*tid).cloned() else {
                    return Ok(Write::Dropped);
                };
                if transition.segment_id.is_provisional() {
                    return Ok(self.unconfirmed(&transition.segment_id));
                }
                self.store.put_transition(&transition)?;
            }
        }
        Ok(Write::Sent)
    }

    fn unconfirmed(&self, id: &SegmentId) -> Write {
        if self.flagged.contains(id) {
            Write::Dropped
        } else {
            Write::Deferred
        }
    }

    // ── Selection and teardown ─────────────────────────────────

    /// Select a segment, releasing the previous selection.
    pub fn select(&mut self, id: &SegmentId) -> SyncResult<()> {
        if self.timeline.segment(id).is_none() {
            return Err(TimelineError::SegmentNotFound(id.clone()).into());
        }
        if self.selected.as_ref() != Some(id) {
            self.deselect();
            self.selected = Some(id.clone());
        }
        Ok(())
    }

    pub fn selected(&self) -> Option<&SegmentId> {
        self.selected.as_ref()
    }

    /// Deselect the current segment, dropping its pointer session and any
    /// pending writes that reference it.
    pub fn deselect(&mut self) -> Option<SegmentId> {
        let id = self.selected.take()?;
        self.release(&id);
        Some(id)
    }

    fn release(&mut self, id: &SegmentId) {
        let cleared = self.engine.clear_for(id);
        let mut dropped = self.pending.cancel_for(id);
        let transitions: Vec<TransitionId> = self.timeline.transitions_for(id).map(|t| t.id).collect();
        for transition in transitions {
            if self.pending.cancel(&WriteKey::Transition(transition)) {
                dropped += 1;
            }
        }
        debug!(segment = %id, cleared, dropped, "Released segment");
    }

    /// End the session. The pointer session and every pending write are
    /// dropped; the store is handed back.
    pub fn close(mut self) -> S {
        self.engine.cancel();
        let dropped = self.pending.drain().len();
        info!(dropped, "Editor session closed");
        self.store
    }
}
