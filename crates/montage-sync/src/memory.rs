//! In-process project store.
//!
//! Behaves like the remote store for the operations the session uses:
//! canonical id assignment, partial field replacement, keyframe edits and
//! snapshot storage. Failures can be queued to exercise error paths.

use montage_core::Keyframe;
use montage_timeline::{Property, Segment, SegmentId, Transition, TransitionId};
use serde_json::Value;
use std::collections::{BTreeMap, VecDeque};
use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::store::{CreatedSegment, ProjectData, ProjectStore, SegmentUpdate, UpdateEndpoint};

/// Record of one store request.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreCall {
    Create,
    Update { endpoint: UpdateEndpoint, id: String },
    DeleteSegment(String),
    PutTransition(TransitionId),
    DeleteTransition(TransitionId),
    PutKeyframe { segment: String, property: Property, time: f64 },
    RemoveKeyframe { segment: String, property: Property, time: f64 },
    Hydrate,
    Snapshot,
}

#[derive(Debug, Default)]
pub struct InMemoryStore {
    segments: BTreeMap<String, Segment>,
    transitions: Vec<Transition>,
    snapshots: Vec<Vec<u8>>,
    next_id: u64,
    failures: VecDeque<StoreError>,
    calls: Vec<StoreCall>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store seeded with an existing project. Segments without a canonical
    /// id are assigned one.
    pub fn with_project(project: ProjectData) -> Self {
        let mut store = Self::new();
        for segment in project.segments {
            let id = match segment.id.as_canonical() {
                Some(id) => id.to_string(),
                None => store.allocate_id(),
            };
            store.segments.insert(id.clone(), segment.with_id(SegmentId::canonical(id)));
        }
        store.transitions = project.transitions;
        store
    }

    /// Make the next request fail with `error`. Queued failures are used up
    /// in order, one per request.
    pub fn fail_next(&mut self, error: StoreError) {
        self.failures.push_back(error);
    }

    pub fn calls(&self) -> &[StoreCall] {
        &self.calls
    }

    pub fn clear_calls(&mut self) {
        self.calls.clear();
    }

    pub fn segment(&self, id: &str) -> Option<&Segment> {
        self.segments.get(id)
    }

    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    pub fn transitions(&self) -> &[Transition] {
        &self.transitions
    }

    pub fn snapshots(&self) -> &[Vec<u8>] {
        &self.snapshots
    }

    fn allocate_id(&mut self) -> String {
        self.next_id += 1;
        format!("seg-{}", self.next_id)
    }

    fn request(&mut self, call: StoreCall) -> StoreResult<()> {
        debug!(?call, "Store request");
        self.calls.push(call);
        match self.failures.pop_front() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn segment_mut(&mut self, id: &str) -> StoreResult<&mut Segment> {
        self.segments
            .get_mut(id)
            .ok_or_else(|| StoreError::not_found(format!("Segment {id}")))
    }
}

/// Shallow merge: nested objects are merged one level down, everything
/// else is replaced.
fn merge_fields(target: &mut serde_json::Map<String, Value>, fields: &serde_json::Map<String, Value>) {
    for (key, value) in fields {
        match (target.get_mut(key), value) {
            (Some(Value::Object(existing)), Value::Object(update)) => {
                for (k, v) in update {
                    existing.insert(k.clone(), v.clone());
                }
            }
            _ => {
                target.insert(key.clone(), value.clone());
            }
        }
    }
}

impl ProjectStore for InMemoryStore {
    fn create_segment(&mut self, segment: &Segment) -> StoreResult<CreatedSegment> {
        self.request(StoreCall::Create)?;
        let id = self.allocate_id();
        let stored = segment.clone().with_id(SegmentId::canonical(id.clone()));
        let created = CreatedSegment::echo(id.clone(), &stored);
        self.segments.insert(id, stored);
        Ok(created)
    }

    fn update_segment(&mut self, update: &SegmentUpdate) -> StoreResult<()> {
        self.request(StoreCall::Update {
            endpoint: update.endpoint,
            id: update.id.clone(),
        })?;
        let segment = self.segment_mut(&update.id)?;
        let internal = |e: serde_json::Error| StoreError::from_status(500, e.to_string());

        let Value::Object(mut current) = serde_json::to_value(&*segment).map_err(internal)? else {
            return Err(StoreError::from_status(500, "stored segment is not an object"));
        };
        merge_fields(&mut current, &update.fields);
        *segment = serde_json::from_value(Value::Object(current)).map_err(|e| StoreError::Client {
            status: 422,
            message: e.to_string(),
        })?;
        Ok(())
    }

    fn delete_segment(&mut self, id: &str) -> StoreResult<()> {
        self.request(StoreCall::DeleteSegment(id.to_string()))?;
        self.segments
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| StoreError::not_found(format!("Segment {id}")))
    }

    fn put_transition(&mut self, transition: &Transition) -> StoreResult<()> {
        self.request(StoreCall::PutTransition(transition.id))?;
        let Some(segment) = transition.segment_id.as_canonical() else {
            return Err(StoreError::Client {
                status: 422,
                message: format!("Transition {} references unsaved segment", transition.id),
            });
        };
        if !self.segments.contains_key(segment) {
            return Err(StoreError::not_found(format!("Segment {segment}")));
        }
        self.transitions.retain(|t| t.id != transition.id);
        self.transitions.push(transition.clone());
        Ok(())
    }

    fn delete_transition(&mut self, id: TransitionId) -> StoreResult<()> {
        self.request(StoreCall::DeleteTransition(id))?;
        let before = self.transitions.len();
        self.transitions.retain(|t| t.id != id);
        if self.transitions.len() == before {
            return Err(StoreError::not_found(format!("Transition {id}")));
        }
        Ok(())
    }

    fn put_keyframe(&mut self, segment: &str, property: Property, keyframe: Keyframe) -> StoreResult<()> {
        self.request(StoreCall::PutKeyframe {
            segment: segment.to_string(),
            property,
            time: keyframe.time,
        })?;
        self.segment_mut(segment)?
            .keyframes
            .entry(property)
            .or_default()
            .set(keyframe.time, keyframe.value);
        Ok(())
    }

    fn remove_keyframe(&mut self, segment: &str, property: Property, time: f64) -> StoreResult<()> {
        self.request(StoreCall::RemoveKeyframe {
            segment: segment.to_string(),
            property,
            time,
        })?;
        self.segment_mut(segment)?
            .keyframes
            .get_mut(&property)
            .and_then(|track| track.remove(time))
            .map(|_| ())
            .ok_or_else(|| StoreError::not_found(format!("Keyframe {property}@{time}")))
    }

    fn hydrate(&mut self) -> StoreResult<ProjectData> {
        self.request(StoreCall::Hydrate)?;
        Ok(ProjectData {
            segments: self.segments.values().cloned().collect(),
            transitions: self.transitions.clone(),
        })
    }

    fn write_snapshot(&mut self, snapshot: &[u8]) -> StoreResult<()> {
        self.request(StoreCall::Snapshot)?;
        self.snapshots.push(snapshot.to_vec());
        Ok(())
    }
}
