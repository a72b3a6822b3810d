//! The timeline aggregate: layers, segments and transitions.

use montage_core::{round_time, Keyframe, KeyframeToggle};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

use crate::error::{TimelineError, TimelineResult};
use crate::id::{LayerIndex, SegmentId, TransitionId};
use crate::layer::Layer;
use crate::segment::{Property, Segment};
use crate::transition::{Boundary, Transition};
use crate::validate;

/// A segment taken out of the timeline together with the transitions that
/// were attached to it.
#[derive(Debug, Clone, PartialEq)]
pub struct RemovedSegment {
    pub segment: Segment,
    pub transitions: Vec<Transition>,
}

/// Authoritative timeline model.
///
/// Every mutation validates a modified copy before swapping it in, so a
/// rejected call leaves the timeline exactly as it was. Each successful
/// mutation bumps the revision counter.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(try_from = "TimelineData", into = "TimelineData")]
pub struct Timeline {
    layers: BTreeMap<LayerIndex, Layer>,
    transitions: Vec<Transition>,
    revision: u64,
}

impl PartialEq for Timeline {
    fn eq(&self, other: &Self) -> bool {
        self.layers == other.layers && self.transitions == other.transitions
    }
}

impl Timeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a timeline from segments on their declared layers.
    pub fn from_parts(
        segments: impl IntoIterator<Item = Segment>,
        transitions: impl IntoIterator<Item = Transition>,
    ) -> TimelineResult<Self> {
        let mut timeline = Self::new();
        for segment in segments {
            timeline.add_segment(segment)?;
        }
        for transition in transitions {
            timeline.add_transition(transition)?;
        }
        timeline.revision = 0;
        Ok(timeline)
    }

    /// Rebuild a timeline from a full store read.
    ///
    /// Declared layer numbers are compacted in order: visual layers become
    /// `0..n` and audio layers `-1..-m`, nearest to zero first.
    pub fn hydrate(
        segments: impl IntoIterator<Item = Segment>,
        transitions: impl IntoIterator<Item = Transition>,
    ) -> TimelineResult<Self> {
        let mut segments: Vec<Segment> = segments.into_iter().collect();
        let declared: BTreeSet<LayerIndex> = segments.iter().map(|s| s.layer).collect();

        let visual = declared.iter().filter(|l| l.is_visual());
        let audio = declared.iter().rev().filter(|l| l.is_audio());
        let mut remap = BTreeMap::new();
        for (n, layer) in visual.enumerate() {
            remap.insert(*layer, LayerIndex::visual(n as u32));
        }
        for (n, layer) in audio.enumerate() {
            remap.insert(*layer, LayerIndex::audio(n as u32));
        }

        for segment in &mut segments {
            if let Some(layer) = remap.get(&segment.layer) {
                segment.layer = *layer;
            }
        }
        let timeline = Self::from_parts(segments, transitions)?;
        debug!(
            segments = timeline.segment_count(),
            layers = timeline.layers.len(),
            "Hydrated timeline"
        );
        Ok(timeline)
    }

    /// Replace the whole model, e.g. with an undo snapshot.
    pub fn restore(&mut self, snapshot: Timeline) {
        let revision = self.revision + 1;
        *self = snapshot;
        self.revision = revision;
    }

    /// Counter bumped on every successful mutation.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    fn bump(&mut self) {
        self.revision += 1;
    }

    // ── Queries ────────────────────────────────────────────────

    /// Layers in ascending index order (audio layers first).
    pub fn layers(&self) -> impl Iterator<Item = &Layer> {
        self.layers.values()
    }

    pub fn layer(&self, index: LayerIndex) -> Option<&Layer> {
        self.layers.get(&index)
    }

    /// Every segment, layer by layer in ascending index order.
    pub fn segments(&self) -> impl Iterator<Item = &Segment> {
        self.layers.values().flat_map(|layer| layer.segments().iter())
    }

    pub fn segment(&self, id: &SegmentId) -> Option<&Segment> {
        self.layers.values().find_map(|layer| layer.find(id))
    }

    pub fn segment_count(&self) -> usize {
        self.layers.values().map(Layer::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.segment_count() == 0
    }

    /// End of the last segment on any layer.
    pub fn duration(&self) -> f64 {
        self.layers.values().map(Layer::end_time).fold(0.0, f64::max)
    }

    pub fn transitions(&self) -> &[Transition] {
        &self.transitions
    }

    pub fn transition(&self, id: TransitionId) -> Option<&Transition> {
        self.transitions.iter().find(|t| t.id == id)
    }

    /// Transitions attached to a segment.
    pub fn transitions_for<'a>(&'a self, segment: &'a SegmentId) -> impl Iterator<Item = &'a Transition> {
        self.transitions.iter().filter(move |t| &t.segment_id == segment)
    }

    /// Check `segment` against the other segments of its target layer.
    pub fn validate_overlap(&self, segment: &Segment) -> TimelineResult<()> {
        match self.layers.get(&segment.layer) {
            Some(layer) => validate::validate_overlap(layer, segment),
            None => Ok(()),
        }
    }

    // ── Segments ───────────────────────────────────────────────

    pub fn add_segment(&mut self, segment: Segment) -> TimelineResult<()> {
        segment.validate()?;
        if self.segment(&segment.id).is_some() {
            return Err(TimelineError::DuplicateSegment(segment.id));
        }
        self.validate_overlap(&segment)?;

        debug!(segment = %segment.id, layer = %segment.layer, start = segment.start_time, "Add segment");
        self.layers
            .entry(segment.layer)
            .or_insert_with(|| Layer::new(segment.layer))
            .insert(segment)?;
        self.bump();
        Ok(())
    }

    /// Remove a segment and every transition attached to it.
    pub fn remove_segment(&mut self, id: &SegmentId) -> TimelineResult<RemovedSegment> {
        let layer = self
            .segment(id)
            .map(|segment| segment.layer)
            .ok_or_else(|| TimelineError::SegmentNotFound(id.clone()))?;
        let segment = self
            .layers
            .get_mut(&layer)
            .and_then(|l| l.remove(id))
            .ok_or_else(|| TimelineError::SegmentNotFound(id.clone()))?;
        self.prune_layer(layer);

        let (transitions, kept): (Vec<Transition>, Vec<Transition>) = std::mem::take(&mut self.transitions)
            .into_iter()
            .partition(|t| &t.segment_id == id);
        self.transitions = kept;

        debug!(segment = %id, transitions = transitions.len(), "Remove segment");
        self.bump();
        Ok(RemovedSegment {
            segment,
            transitions,
        })
    }

    /// Apply a fallible edit to a copy of a segment, validate it against the
    /// rest of the timeline and swap it in.
    fn modify_segment<R>(
        &mut self,
        id: &SegmentId,
        edit: impl FnOnce(&mut Segment) -> TimelineResult<R>,
    ) -> TimelineResult<R> {
        let current = self
            .segment(id)
            .ok_or_else(|| TimelineError::SegmentNotFound(id.clone()))?;
        let old_layer = current.layer;
        let mut candidate = current.clone();

        let result = edit(&mut candidate)?;
        if &candidate.id != id {
            return Err(TimelineError::InvalidData(format!(
                "segment {} cannot be renamed through an update",
                id
            )));
        }
        candidate.validate()?;
        self.validate_overlap(&candidate)?;

        if let Some(layer) = self.layers.get_mut(&old_layer) {
            layer.remove(id);
        }
        let new_layer = candidate.layer;
        self.layers
            .entry(new_layer)
            .or_insert_with(|| Layer::new(new_layer))
            .insert(candidate)?;
        if new_layer != old_layer {
            self.prune_layer(old_layer);
        }
        self.reanchor_transitions(id);
        self.bump();
        Ok(result)
    }

    /// Drop a layer once its last segment is gone, so the model matches its
    /// serialized form.
    fn prune_layer(&mut self, index: LayerIndex) {
        if self.layers.get(&index).is_some_and(Layer::is_empty) {
            self.layers.remove(&index);
        }
    }

    /// Update a segment in place. The segment id must not change.
    pub fn update_segment(&mut self, id: &SegmentId, edit: impl FnOnce(&mut Segment)) -> TimelineResult<()> {
        self.modify_segment(id, |segment| {
            edit(segment);
            Ok(())
        })
    }

    /// Update a segment with an edit that can itself reject the change.
    pub fn try_update_segment<R>(
        &mut self,
        id: &SegmentId,
        edit: impl FnOnce(&mut Segment) -> TimelineResult<R>,
    ) -> TimelineResult<R> {
        self.modify_segment(id, edit)
    }

    /// Place a segment at `start_time` on `layer`.
    pub fn move_segment(&mut self, id: &SegmentId, layer: LayerIndex, start_time: f64) -> TimelineResult<()> {
        self.update_segment(id, |segment| {
            segment.layer = layer;
            segment.start_time = round_time(start_time);
        })
    }

    /// Split a segment at timeline time `at`.
    ///
    /// The original keeps the left part and `right_id` names the new right
    /// sibling. Outgoing transitions move to the right sibling.
    pub fn split_segment(&mut self, id: &SegmentId, at: f64, right_id: SegmentId) -> TimelineResult<()> {
        let current = self
            .segment(id)
            .ok_or_else(|| TimelineError::SegmentNotFound(id.clone()))?;
        if self.segment(&right_id).is_some() {
            return Err(TimelineError::DuplicateSegment(right_id));
        }

        let mut left = current.clone();
        let right = left.split_off(at - current.start_time, right_id)?;
        left.validate()?;
        right.validate()?;

        let layer = self
            .layers
            .get_mut(&left.layer)
            .ok_or_else(|| TimelineError::SegmentNotFound(id.clone()))?;
        layer.remove(id);
        layer.insert(left.clone())?;
        layer.insert(right.clone())?;

        for transition in &mut self.transitions {
            if &transition.segment_id != id {
                continue;
            }
            match transition.boundary {
                Boundary::Start => transition.reanchor(&left),
                Boundary::End => transition.reanchor(&right),
            }
        }

        debug!(segment = %id, sibling = %right.id, at, "Split segment");
        self.bump();
        Ok(())
    }

    /// Replace a provisional id with the canonical one, re-targeting
    /// attached transitions.
    pub fn reassign_id(&mut self, old: &SegmentId, new: SegmentId) -> TimelineResult<()> {
        if old == &new {
            return Ok(());
        }
        if self.segment(&new).is_some() {
            return Err(TimelineError::DuplicateSegment(new));
        }
        let segment = self
            .layers
            .values_mut()
            .find_map(|layer| layer.find_mut(old))
            .ok_or_else(|| TimelineError::SegmentNotFound(old.clone()))?;
        segment.id = new.clone();

        for transition in self.transitions.iter_mut().filter(|t| &t.segment_id == old) {
            transition.segment_id = new.clone();
        }
        debug!(from = %old, to = %new, "Reassigned segment id");
        self.bump();
        Ok(())
    }

    /// Recompute the placement of transitions attached to a segment.
    pub fn reanchor_transitions(&mut self, id: &SegmentId) {
        let Some(segment) = self.segment(id).cloned() else {
            return;
        };
        for transition in self.transitions.iter_mut().filter(|t| &t.segment_id == id) {
            transition.reanchor(&segment);
        }
    }

    // ── Transitions ────────────────────────────────────────────

    /// Attach a transition. A transition already on the same segment edge,
    /// or with the same id, is replaced and returned.
    pub fn add_transition(&mut self, mut transition: Transition) -> TimelineResult<Option<Transition>> {
        transition.validate()?;
        let segment = self
            .segment(&transition.segment_id)
            .ok_or_else(|| TimelineError::SegmentNotFound(transition.segment_id.clone()))?;
        transition.reanchor(segment);

        let existing = self.transitions.iter().position(|t| {
            t.id == transition.id
                || (t.segment_id == transition.segment_id && t.boundary == transition.boundary)
        });
        let replaced = existing.map(|idx| self.transitions.remove(idx));

        debug!(transition = %transition.id, segment = %transition.segment_id, kind = %transition.kind, "Add transition");
        self.transitions.push(transition);
        self.bump();
        Ok(replaced)
    }

    pub fn remove_transition(&mut self, id: TransitionId) -> TimelineResult<Transition> {
        let idx = self
            .transitions
            .iter()
            .position(|t| t.id == id)
            .ok_or(TimelineError::TransitionNotFound(id))?;
        self.bump();
        Ok(self.transitions.remove(idx))
    }

    pub fn update_transition(&mut self, id: TransitionId, edit: impl FnOnce(&mut Transition)) -> TimelineResult<()> {
        let idx = self
            .transitions
            .iter()
            .position(|t| t.id == id)
            .ok_or(TimelineError::TransitionNotFound(id))?;
        let mut candidate = self.transitions[idx].clone();
        edit(&mut candidate);
        candidate.id = id;
        candidate.validate()?;
        let segment = self
            .segment(&candidate.segment_id)
            .ok_or_else(|| TimelineError::SegmentNotFound(candidate.segment_id.clone()))?;
        candidate.reanchor(segment);

        self.transitions[idx] = candidate;
        self.bump();
        Ok(())
    }

    // ── Keyframes ──────────────────────────────────────────────

    pub fn add_keyframe(&mut self, id: &SegmentId, property: Property, time: f64, value: f64) -> TimelineResult<()> {
        self.modify_segment(id, |segment| segment.add_keyframe(property, time, value))
    }

    pub fn update_keyframe(&mut self, id: &SegmentId, property: Property, time: f64, value: f64) -> TimelineResult<()> {
        self.modify_segment(id, |segment| segment.update_keyframe(property, time, value))
    }

    pub fn remove_keyframe(&mut self, id: &SegmentId, property: Property, time: f64) -> TimelineResult<Keyframe> {
        self.modify_segment(id, |segment| segment.remove_keyframe(property, time))
    }

    pub fn toggle_keyframe(&mut self, id: &SegmentId, property: Property, time: f64) -> TimelineResult<KeyframeToggle> {
        self.modify_segment(id, |segment| segment.toggle_keyframe(property, time))
    }
}

// ── Serialized form ─────────────────────────────────────────────

/// Flat wire form: the layer structure is rebuilt from each segment's layer.
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TimelineData {
    segments: Vec<Segment>,
    #[serde(default)]
    transitions: Vec<Transition>,
}

impl TryFrom<TimelineData> for Timeline {
    type Error = TimelineError;

    fn try_from(data: TimelineData) -> TimelineResult<Self> {
        Timeline::from_parts(data.segments, data.transitions)
    }
}

impl From<Timeline> for TimelineData {
    fn from(timeline: Timeline) -> Self {
        Self {
            segments: timeline.segments().cloned().collect(),
            transitions: timeline.transitions,
        }
    }
}
