//! Montage Timeline - Timeline data model
//!
//! Implements the authoritative timeline structure:
//! - Layers holding non-overlapping segments (visual layers >= 0, audio < 0)
//! - Segments of video, image, text and audio content
//! - Transitions anchored to a segment edge
//! - Per-property keyframes
//! - Snapshot undo/redo history and versioned serialization

pub mod error;
pub mod history;
pub mod id;
pub mod layer;
pub mod segment;
pub mod serialization;
pub mod timeline;
pub mod transition;
pub mod validate;

pub use error::{CropAxis, TimelineError, TimelineResult};
pub use history::History;
pub use id::{LayerIndex, SegmentId, TransitionId};
pub use layer::Layer;
pub use segment::{
    AudioContent, Crop, ImageContent, Property, Segment, SegmentContent, SegmentKind,
    SourceTrim, TextContent, Transform, VideoContent,
};
pub use serialization::TimelineFile;
pub use timeline::{RemovedSegment, Timeline};
pub use transition::{Boundary, Direction, Transition, TransitionKind};
pub use validate::{validate_crop, validate_overlap, validate_speed};
