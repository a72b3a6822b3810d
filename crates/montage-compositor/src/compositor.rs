//! Frame compositor: turns the timeline at one instant into an ordered list
//! of render descriptors.
//!
//! For every visual layer, bottom to top, the segment covering the query
//! time is resolved: keyframed properties are evaluated at the segment's
//! local time, active transitions are folded in, transform filters are
//! absorbed into placement and the remaining filters are forwarded to the
//! renderer in chain order.

use glam::Vec2;
use montage_core::{round_time, EditorConfig, Filter, FilterKind, Insets, Rect, Transform2D};
use montage_effects::{evaluate_transitions, TransitionRegistry};
use montage_timeline::{
    LayerIndex, Property, Segment, SegmentContent, SegmentId, TextContent, Timeline,
};
use smallvec::SmallVec;
use tracing::warn;

use crate::media::MediaLocator;

/// What the renderer should draw for an element.
#[derive(Debug, Clone, PartialEq)]
pub enum RenderContent {
    Video {
        url: String,
        /// Position in the source media, seconds
        source_time: f64,
    },
    Image {
        url: String,
    },
    Text(TextContent),
}

/// Resolved description of one visible element.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderDescriptor {
    pub segment: SegmentId,
    pub layer: LayerIndex,
    /// Seconds since the segment start
    pub local_time: f64,
    pub content: RenderContent,
    /// Unrotated on-canvas box, intrinsic size times scale
    pub bounds: Rect,
    /// Maps element points (origin at the element centre, intrinsic pixels)
    /// onto the canvas. Flips show up as negative scale.
    pub transform: Transform2D,
    pub opacity: f32,
    /// Crop insets in percent of the element size
    pub crop: Insets,
    /// Transition reveal region in percent of the element size
    pub clip: Option<Insets>,
    /// Renderer-side filters in chain order
    pub filters: SmallVec<[Filter; 4]>,
}

/// Per-frame compositor.
pub struct Compositor {
    canvas: Vec2,
    transitions: TransitionRegistry,
    media: MediaLocator,
}

impl Compositor {
    pub fn new(config: &EditorConfig, project_id: impl Into<String>) -> Self {
        Self {
            canvas: Vec2::new(config.canvas.width as f32, config.canvas.height as f32),
            transitions: TransitionRegistry::new(),
            media: MediaLocator::from_config(&config.media, project_id),
        }
    }

    pub fn canvas(&self) -> Vec2 {
        self.canvas
    }

    pub fn media(&self) -> &MediaLocator {
        &self.media
    }

    /// Elements visible at `time`, in draw order (lowest layer first).
    pub fn visible_at(&self, timeline: &Timeline, time: f64) -> Vec<RenderDescriptor> {
        timeline
            .layers()
            .filter(|layer| layer.index().is_visual())
            .filter_map(|layer| layer.segment_at(time))
            .filter_map(|segment| self.describe(timeline, segment, time))
            .collect()
    }

    /// Resolve one segment at `time`. `None` for audio segments and for
    /// elements that cannot be composed.
    pub fn describe(&self, timeline: &Timeline, segment: &Segment, time: f64) -> Option<RenderDescriptor> {
        let content = match &segment.content {
            SegmentContent::Video(video) => RenderContent::Video {
                url: self.media.locate(&video.media),
                source_time: round_time(
                    video.start_within_source + (time - segment.start_time) * video.speed,
                ),
            },
            SegmentContent::Image(image) => RenderContent::Image {
                url: self.media.locate(&image.media),
            },
            SegmentContent::Text(text) => RenderContent::Text(text.clone()),
            SegmentContent::Audio(_) => return None,
        };

        let crop = segment.crop.to_insets();
        if !crop.is_valid() {
            warn!(segment = %segment.id, ?crop, "Invalid crop, element skipped");
            return None;
        }

        let local_time = time - segment.start_time;
        let value = |property| segment.value_at(property, local_time) as f32;
        let delta = evaluate_transitions(
            &self.transitions,
            timeline.transitions_for(&segment.id),
            time,
            self.canvas,
        );

        let offset = Vec2::new(value(Property::PositionX), value(Property::PositionY)) + delta.offset;
        let scale = delta.scale.unwrap_or_else(|| value(Property::Scale));
        let opacity = delta.opacity.unwrap_or_else(|| value(Property::Opacity)).clamp(0.0, 1.0);
        let mut rotation = delta.rotation.unwrap_or_else(|| value(Property::Rotation));

        let mut flip = Vec2::ONE;
        let mut filters = SmallVec::new();
        for filter in &segment.filters {
            match filter.kind() {
                FilterKind::Rotate => rotation += filter.value as f32,
                FilterKind::FlipHorizontal if filter.value != 0.0 => flip.x = -flip.x,
                FilterKind::FlipVertical if filter.value != 0.0 => flip.y = -flip.y,
                FilterKind::FlipHorizontal | FilterKind::FlipVertical => {}
                _ => filters.push(filter.clone()),
            }
        }

        let (width, height) = segment.intrinsic_size();
        let center = self.canvas * 0.5 + offset;
        let size = Vec2::new(width, height) * scale.abs();

        Some(RenderDescriptor {
            segment: segment.id.clone(),
            layer: segment.layer,
            local_time: round_time(local_time),
            content,
            bounds: Rect::from_center_size(center, size),
            transform: Transform2D::from_trs(center, rotation.to_radians(), flip * scale),
            opacity,
            crop,
            clip: delta.clip,
            filters,
        })
    }
}
