//! Contract with the remote project store.

use montage_core::{Keyframe, MontageError};
use montage_timeline::{
    Crop, Property, Segment, SegmentKind, SourceTrim, Transform, Transition, TransitionId,
};
use serde_json::{Map, Value};

use crate::error::{StoreResult, SyncError, SyncResult};

/// Request/response boundary to the project store.
///
/// Segments are addressed by canonical id. The store is the only durable
/// copy of the project; the editing session is its sole writer.
pub trait ProjectStore {
    /// Create a segment and return its canonical id with the fields the
    /// store resolved.
    fn create_segment(&mut self, segment: &Segment) -> StoreResult<CreatedSegment>;

    /// Replace the fields present in `update`.
    fn update_segment(&mut self, update: &SegmentUpdate) -> StoreResult<()>;

    fn delete_segment(&mut self, id: &str) -> StoreResult<()>;

    /// Create or replace a transition.
    fn put_transition(&mut self, transition: &Transition) -> StoreResult<()>;

    fn delete_transition(&mut self, id: TransitionId) -> StoreResult<()>;

    /// Insert or replace one keyframe of one property.
    fn put_keyframe(&mut self, segment: &str, property: Property, keyframe: Keyframe) -> StoreResult<()>;

    fn remove_keyframe(&mut self, segment: &str, property: Property, time: f64) -> StoreResult<()>;

    /// Full project read.
    fn hydrate(&mut self) -> StoreResult<ProjectData>;

    /// Store a serialized timeline as the current undo snapshot.
    fn write_snapshot(&mut self, snapshot: &[u8]) -> StoreResult<()>;
}

/// Everything a hydrate returns.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProjectData {
    pub segments: Vec<Segment>,
    pub transitions: Vec<Transition>,
}

/// Store response to a create.
#[derive(Debug, Clone, PartialEq)]
pub struct CreatedSegment {
    pub id: String,
    pub start_time: f64,
    pub duration: f64,
    pub transform: Transform,
    pub crop: Crop,
}

impl CreatedSegment {
    /// Response echoing `segment` under a new id.
    pub fn echo(id: impl Into<String>, segment: &Segment) -> Self {
        Self {
            id: id.into(),
            start_time: segment.start_time,
            duration: segment.duration,
            transform: segment.transform,
            crop: segment.crop,
        }
    }

    /// Overwrite the store-resolved fields of `segment`. The source window
    /// is stretched to match a changed duration.
    pub fn apply(&self, segment: &mut Segment) {
        segment.set_bounds(self.start_time, self.duration);
        segment.transform = self.transform;
        segment.crop = self.crop;
        if let (Some(trim), Some(factor)) = (segment.source_trim(), segment.trim_factor()) {
            let start = trim.start_within_source;
            segment.set_source_trim(SourceTrim::new(start, start + segment.duration * factor));
        }
    }
}

/// Which update endpoint a segment kind goes through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UpdateEndpoint {
    /// Video segments
    Segment,
    Image,
    Text,
    Audio,
}

impl UpdateEndpoint {
    pub fn for_kind(kind: SegmentKind) -> Self {
        match kind {
            SegmentKind::Video => Self::Segment,
            SegmentKind::Image => Self::Image,
            SegmentKind::Text => Self::Text,
            SegmentKind::Audio => Self::Audio,
        }
    }

    pub fn path(self) -> &'static str {
        match self {
            Self::Segment => "update-segment",
            Self::Image => "update-image",
            Self::Text => "update-text",
            Self::Audio => "update-audio",
        }
    }
}

/// Full-field replacement of one segment.
///
/// Keyframes travel as the complete per-property map. Properties driven by
/// keyframes leave their static field out so the store keeps its copy.
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentUpdate {
    pub endpoint: UpdateEndpoint,
    pub id: String,
    pub fields: Map<String, Value>,
}

impl SegmentUpdate {
    pub fn from_segment(segment: &Segment) -> SyncResult<Self> {
        let id = segment
            .id
            .as_canonical()
            .ok_or_else(|| SyncError::Provisional(segment.id.clone()))?
            .to_string();

        let value = serde_json::to_value(segment)
            .map_err(|e| MontageError::Serialization(format!("Failed to encode segment {}: {}", id, e)))?;
        let Value::Object(mut fields) = value else {
            return Err(MontageError::Serialization(format!("Segment {} did not encode to an object", id)).into());
        };
        fields.remove("id");

        for property in Property::ALL.into_iter().filter(|p| segment.is_animated(*p)) {
            let section = match property {
                Property::Volume => "content",
                _ => "transform",
            };
            if let Some(Value::Object(section)) = fields.get_mut(section) {
                section.remove(property.name());
            }
        }

        Ok(Self {
            endpoint: UpdateEndpoint::for_kind(segment.kind()),
            id,
            fields,
        })
    }

    /// Update carrying only the filter chain.
    pub fn filters(segment: &Segment) -> SyncResult<Self> {
        let mut update = Self::from_segment(segment)?;
        let filters = update.fields.remove("filters").unwrap_or(Value::Array(Vec::new()));
        update.fields = Map::new();
        update.fields.insert("filters".to_string(), filters);
        Ok(update)
    }

    /// Static field of `property` as sent, if present.
    pub fn static_field(&self, property: Property) -> Option<&Value> {
        let section = match property {
            Property::Volume => "content",
            _ => "transform",
        };
        self.fields.get(section)?.get(property.name())
    }
}
