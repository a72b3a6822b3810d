//! Segment types for the timeline.

use montage_core::keyframe::KEYFRAME_TIME_TOLERANCE;
use montage_core::{
    round_time, Filter, Insets, Keyframe, KeyframeToggle, KeyframeTrack, TimeRange, TIME_EPSILON,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::error::{TimelineError, TimelineResult};
use crate::id::{LayerIndex, SegmentId};
use crate::validate;

/// Kind of segment content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SegmentKind {
    Video,
    Image,
    Text,
    Audio,
}

impl SegmentKind {
    pub fn is_audio(self) -> bool {
        self == Self::Audio
    }

    pub fn is_visual(self) -> bool {
        !self.is_audio()
    }

    /// Whether segments of this kind play a window of a source file.
    pub fn has_source_window(self) -> bool {
        matches!(self, Self::Video | Self::Audio)
    }
}

impl fmt::Display for SegmentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Video => "video",
            Self::Image => "image",
            Self::Text => "text",
            Self::Audio => "audio",
        };
        f.write_str(name)
    }
}

/// An animatable segment property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Property {
    PositionX,
    PositionY,
    Scale,
    Rotation,
    Opacity,
    Volume,
}

impl Property {
    pub const ALL: [Property; 6] = [
        Property::PositionX,
        Property::PositionY,
        Property::Scale,
        Property::Rotation,
        Property::Opacity,
        Property::Volume,
    ];

    /// Wire name of the property.
    pub fn name(self) -> &'static str {
        match self {
            Self::PositionX => "positionX",
            Self::PositionY => "positionY",
            Self::Scale => "scale",
            Self::Rotation => "rotation",
            Self::Opacity => "opacity",
            Self::Volume => "volume",
        }
    }

    /// Whether segments of `kind` carry this property.
    pub fn applies_to(self, kind: SegmentKind) -> bool {
        match self {
            Self::Volume => kind.has_source_window(),
            _ => kind.is_visual(),
        }
    }
}

impl fmt::Display for Property {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Static placement of a visual segment.
///
/// Position is an offset in canvas pixels from the canvas centre. Rotation
/// is in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Transform {
    pub position_x: f64,
    pub position_y: f64,
    pub scale: f64,
    pub rotation: f64,
    pub opacity: f64,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position_x: 0.0,
            position_y: 0.0,
            scale: 1.0,
            rotation: 0.0,
            opacity: 1.0,
        }
    }
}

/// Crop insets, each a percentage of the element's own size.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Crop {
    pub left: f64,
    pub right: f64,
    pub top: f64,
    pub bottom: f64,
}

impl Crop {
    pub fn new(left: f64, right: f64, top: f64, bottom: f64) -> Self {
        Self {
            left,
            right,
            top,
            bottom,
        }
    }

    pub fn is_none(&self) -> bool {
        self.left == 0.0 && self.right == 0.0 && self.top == 0.0 && self.bottom == 0.0
    }

    pub fn validate(&self) -> TimelineResult<()> {
        validate::validate_crop(self)
    }

    pub fn to_insets(&self) -> Insets {
        Insets::new(
            self.left as f32,
            self.right as f32,
            self.top as f32,
            self.bottom as f32,
        )
    }
}

/// Window of the source media a segment plays.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceTrim {
    pub start_within_source: f64,
    pub end_within_source: f64,
}

impl SourceTrim {
    pub fn new(start_within_source: f64, end_within_source: f64) -> Self {
        Self {
            start_within_source,
            end_within_source,
        }
    }

    /// Length of the source window in seconds.
    pub fn len(&self) -> f64 {
        self.end_within_source - self.start_within_source
    }

    pub fn is_empty(&self) -> bool {
        self.len() <= 0.0
    }
}

// ── Content ────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoContent {
    /// Media filename within the project
    pub media: String,
    pub start_within_source: f64,
    pub end_within_source: f64,
    /// Playback rate, 1.0 is normal
    pub speed: f64,
    /// Intrinsic pixel size
    pub width: u32,
    pub height: u32,
    pub volume: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageContent {
    pub media: String,
    pub width: u32,
    pub height: u32,
    /// Keep the image's aspect ratio when resized on canvas
    #[serde(default = "default_true")]
    pub lock_aspect: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextContent {
    pub content: String,
    pub font_family: String,
    pub font_size: f64,
    pub color: String,
    #[serde(default)]
    pub background_color: Option<String>,
    #[serde(default)]
    pub border_color: Option<String>,
    #[serde(default)]
    pub border_width: f64,
    /// Size of the text box in canvas pixels
    pub box_width: f64,
    pub box_height: f64,
}

impl Default for TextContent {
    fn default() -> Self {
        Self {
            content: String::new(),
            font_family: "Inter".to_string(),
            font_size: 48.0,
            color: "#ffffff".to_string(),
            background_color: None,
            border_color: None,
            border_width: 0.0,
            box_width: 600.0,
            box_height: 120.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AudioContent {
    pub media: String,
    pub start_within_source: f64,
    pub end_within_source: f64,
    pub volume: f64,
}

fn default_true() -> bool {
    true
}

/// Kind-specific segment payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SegmentContent {
    Video(VideoContent),
    Image(ImageContent),
    Text(TextContent),
    Audio(AudioContent),
}

impl SegmentContent {
    pub fn kind(&self) -> SegmentKind {
        match self {
            Self::Video(_) => SegmentKind::Video,
            Self::Image(_) => SegmentKind::Image,
            Self::Text(_) => SegmentKind::Text,
            Self::Audio(_) => SegmentKind::Audio,
        }
    }
}

// ── Segment ────────────────────────────────────────────────────

/// A time-bounded element on one layer of the timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Segment {
    pub id: SegmentId,
    pub layer: LayerIndex,
    /// Start on the timeline in seconds
    pub start_time: f64,
    /// Duration on the timeline in seconds
    pub duration: f64,
    #[serde(default)]
    pub transform: Transform,
    #[serde(default)]
    pub crop: Crop,
    /// Keyframes per property, times relative to the segment start
    #[serde(default)]
    pub keyframes: BTreeMap<Property, KeyframeTrack>,
    /// Ordered filter chain
    #[serde(default)]
    pub filters: Vec<Filter>,
    pub content: SegmentContent,
}

impl Segment {
    fn with_content(layer: LayerIndex, start_time: f64, duration: f64, content: SegmentContent) -> Self {
        Self {
            id: SegmentId::provisional(),
            layer,
            start_time: round_time(start_time),
            duration: round_time(duration),
            transform: Transform::default(),
            crop: Crop::default(),
            keyframes: BTreeMap::new(),
            filters: Vec::new(),
            content,
        }
    }

    /// Create a video segment at normal speed playing the source from
    /// `start_within_source`.
    pub fn video(
        media: impl Into<String>,
        layer: LayerIndex,
        start_time: f64,
        duration: f64,
        start_within_source: f64,
        (width, height): (u32, u32),
    ) -> Self {
        let start_within_source = round_time(start_within_source);
        Self::with_content(
            layer,
            start_time,
            duration,
            SegmentContent::Video(VideoContent {
                media: media.into(),
                start_within_source,
                end_within_source: round_time(start_within_source + duration),
                speed: 1.0,
                width,
                height,
                volume: 1.0,
            }),
        )
    }

    /// Create an image segment.
    pub fn image(
        media: impl Into<String>,
        layer: LayerIndex,
        start_time: f64,
        duration: f64,
        (width, height): (u32, u32),
    ) -> Self {
        Self::with_content(
            layer,
            start_time,
            duration,
            SegmentContent::Image(ImageContent {
                media: media.into(),
                width,
                height,
                lock_aspect: true,
            }),
        )
    }

    /// Create a text segment with the default style.
    pub fn text(content: impl Into<String>, layer: LayerIndex, start_time: f64, duration: f64) -> Self {
        Self::with_content(
            layer,
            start_time,
            duration,
            SegmentContent::Text(TextContent {
                content: content.into(),
                ..TextContent::default()
            }),
        )
    }

    /// Create an audio segment playing the source from `start_within_source`.
    pub fn audio(
        media: impl Into<String>,
        layer: LayerIndex,
        start_time: f64,
        duration: f64,
        start_within_source: f64,
    ) -> Self {
        let start_within_source = round_time(start_within_source);
        Self::with_content(
            layer,
            start_time,
            duration,
            SegmentContent::Audio(AudioContent {
                media: media.into(),
                start_within_source,
                end_within_source: round_time(start_within_source + duration),
                volume: 1.0,
            }),
        )
    }

    pub fn with_id(mut self, id: SegmentId) -> Self {
        self.id = id;
        self
    }

    pub fn kind(&self) -> SegmentKind {
        self.content.kind()
    }

    pub fn end_time(&self) -> f64 {
        self.start_time + self.duration
    }

    pub fn range(&self) -> TimeRange {
        TimeRange::new(self.start_time, self.duration)
    }

    /// Media filename, for segments backed by a file.
    pub fn media(&self) -> Option<&str> {
        match &self.content {
            SegmentContent::Video(v) => Some(&v.media),
            SegmentContent::Image(i) => Some(&i.media),
            SegmentContent::Audio(a) => Some(&a.media),
            SegmentContent::Text(_) => None,
        }
    }

    /// Source window, for video and audio segments.
    pub fn source_trim(&self) -> Option<SourceTrim> {
        match &self.content {
            SegmentContent::Video(v) => Some(SourceTrim::new(v.start_within_source, v.end_within_source)),
            SegmentContent::Audio(a) => Some(SourceTrim::new(a.start_within_source, a.end_within_source)),
            _ => None,
        }
    }

    /// Replace the source window. Ignored for segments without one.
    pub fn set_source_trim(&mut self, trim: SourceTrim) {
        match &mut self.content {
            SegmentContent::Video(v) => {
                v.start_within_source = round_time(trim.start_within_source);
                v.end_within_source = round_time(trim.end_within_source);
            }
            SegmentContent::Audio(a) => {
                a.start_within_source = round_time(trim.start_within_source);
                a.end_within_source = round_time(trim.end_within_source);
            }
            _ => {}
        }
    }

    /// Playback speed of video segments.
    pub fn speed(&self) -> Option<f64> {
        match &self.content {
            SegmentContent::Video(v) => Some(v.speed),
            _ => None,
        }
    }

    /// Seconds of source consumed per second of timeline.
    ///
    /// Video segments play at their speed; audio always plays at 1.0.
    /// `None` for segments without a source window.
    pub fn trim_factor(&self) -> Option<f64> {
        match &self.content {
            SegmentContent::Video(v) => Some(v.speed),
            SegmentContent::Audio(_) => Some(1.0),
            _ => None,
        }
    }

    /// Intrinsic size in canvas pixels before scaling. Audio has no size.
    pub fn intrinsic_size(&self) -> (f32, f32) {
        match &self.content {
            SegmentContent::Video(v) => (v.width as f32, v.height as f32),
            SegmentContent::Image(i) => (i.width as f32, i.height as f32),
            SegmentContent::Text(t) => (t.box_width as f32, t.box_height as f32),
            SegmentContent::Audio(_) => (0.0, 0.0),
        }
    }

    /// Whether `time` on the timeline falls within this segment.
    pub fn contains(&self, time: f64) -> bool {
        self.range().contains(time)
    }

    // ── Properties ─────────────────────────────────────────────

    /// Value of a property ignoring keyframes.
    pub fn static_value(&self, property: Property) -> f64 {
        match property {
            Property::PositionX => self.transform.position_x,
            Property::PositionY => self.transform.position_y,
            Property::Scale => self.transform.scale,
            Property::Rotation => self.transform.rotation,
            Property::Opacity => self.transform.opacity,
            Property::Volume => match &self.content {
                SegmentContent::Video(v) => v.volume,
                SegmentContent::Audio(a) => a.volume,
                _ => 1.0,
            },
        }
    }

    pub fn set_static_value(&mut self, property: Property, value: f64) {
        match property {
            Property::PositionX => self.transform.position_x = value,
            Property::PositionY => self.transform.position_y = value,
            Property::Scale => self.transform.scale = value,
            Property::Rotation => self.transform.rotation = value,
            Property::Opacity => self.transform.opacity = value,
            Property::Volume => match &mut self.content {
                SegmentContent::Video(v) => v.volume = value,
                SegmentContent::Audio(a) => a.volume = value,
                _ => {}
            },
        }
    }

    /// Effective value of a property at `local_time` seconds into the
    /// segment. Keyframes override the static value when any exist.
    pub fn value_at(&self, property: Property, local_time: f64) -> f64 {
        let fallback = self.static_value(property);
        match self.keyframes.get(&property) {
            Some(track) => track.value_or(local_time, fallback),
            None => fallback,
        }
    }

    /// Whether a property is driven by keyframes. A single keyframe already
    /// overrides the static value.
    pub fn is_animated(&self, property: Property) -> bool {
        !self.keyframes_for(property).is_empty()
    }

    /// Keyframes of one property, empty when none were ever set.
    pub fn keyframes_for(&self, property: Property) -> &[Keyframe] {
        self.keyframes
            .get(&property)
            .map_or(&[], KeyframeTrack::keyframes)
    }

    // ── Keyframes ──────────────────────────────────────────────

    fn check_keyframe(&self, property: Property, time: f64) -> TimelineResult<()> {
        if !property.applies_to(self.kind()) {
            return Err(TimelineError::PropertyNotApplicable {
                property,
                kind: self.kind(),
            });
        }
        if time < -TIME_EPSILON || time > self.duration + TIME_EPSILON {
            return Err(TimelineError::KeyframeOutOfRange {
                time,
                duration: self.duration,
            });
        }
        Ok(())
    }

    /// Add a keyframe, replacing any keyframe at the same time.
    pub fn add_keyframe(&mut self, property: Property, time: f64, value: f64) -> TimelineResult<()> {
        self.check_keyframe(property, time)?;
        self.keyframes
            .entry(property)
            .or_default()
            .set(round_time(time), value);
        Ok(())
    }

    /// Change the value of an existing keyframe.
    pub fn update_keyframe(&mut self, property: Property, time: f64, value: f64) -> TimelineResult<()> {
        let updated = self
            .keyframes
            .get_mut(&property)
            .map_or(false, |track| track.update(time, value));
        if updated {
            Ok(())
        } else {
            Err(TimelineError::KeyframeNotFound { property, time })
        }
    }

    /// Remove the keyframe at `time`. Removing the last keyframe of a
    /// property leaves an empty track and the static value applies again.
    pub fn remove_keyframe(&mut self, property: Property, time: f64) -> TimelineResult<Keyframe> {
        self.keyframes
            .get_mut(&property)
            .and_then(|track| track.remove(time))
            .ok_or(TimelineError::KeyframeNotFound { property, time })
    }

    /// Insert a keyframe holding the current effective value, or remove the
    /// one already at `time`.
    pub fn toggle_keyframe(&mut self, property: Property, time: f64) -> TimelineResult<KeyframeToggle> {
        self.check_keyframe(property, time)?;
        let current = self.value_at(property, time);
        Ok(self
            .keyframes
            .entry(property)
            .or_default()
            .toggle(round_time(time), current))
    }

    // ── Retiming ───────────────────────────────────────────────

    /// Move the segment's edges on the timeline.
    ///
    /// Keyframes stay attached to the content: moving the start edge by
    /// `d` shifts every keyframe by `-d`, and keyframes falling outside the
    /// new duration are dropped.
    pub fn set_bounds(&mut self, start_time: f64, duration: f64) {
        let shift = self.start_time - start_time;
        self.start_time = round_time(start_time);
        self.duration = round_time(duration);
        if shift.abs() > KEYFRAME_TIME_TOLERANCE {
            for track in self.keyframes.values_mut() {
                *track = KeyframeTrack::from_keyframes(track.keyframes().iter().map(|kf| Keyframe {
                    time: round_time(kf.time + shift),
                    ..*kf
                }));
            }
        }
        let duration = self.duration;
        for track in self.keyframes.values_mut() {
            track.retain_within(duration);
        }
    }

    /// Change playback speed, keeping the source window and recomputing
    /// the timeline duration.
    pub fn set_speed(&mut self, speed: f64) -> TimelineResult<()> {
        validate::validate_speed(speed)?;
        let SegmentContent::Video(video) = &mut self.content else {
            return Err(TimelineError::InvalidData(format!(
                "{} segments have no playback speed",
                self.kind()
            )));
        };
        let window = video.end_within_source - video.start_within_source;
        video.speed = speed;
        let duration = round_time(window / speed);
        self.set_bounds(self.start_time, duration);
        Ok(())
    }

    /// Split at `offset` seconds into the segment.
    ///
    /// `self` keeps the left part; the returned segment holds the right part
    /// and carries `right_id`. The source window is divided at
    /// `offset x trim factor` and keyframes are split so both halves keep
    /// the boundary value.
    pub fn split_off(&mut self, offset: f64, right_id: SegmentId) -> TimelineResult<Segment> {
        let offset = round_time(offset);
        if offset < crate::validate::MIN_SPLIT_MARGIN - TIME_EPSILON
            || self.duration - offset < crate::validate::MIN_SPLIT_MARGIN - TIME_EPSILON
        {
            return Err(TimelineError::SplitAtEdge {
                segment: self.id.clone(),
                at: self.start_time + offset,
            });
        }

        let mut right = self.clone();
        right.id = right_id;
        right.start_time = round_time(self.start_time + offset);
        right.duration = round_time(self.duration - offset);
        self.duration = offset;

        if let (Some(trim), Some(factor)) = (self.source_trim(), self.trim_factor()) {
            let cut = round_time(trim.start_within_source + offset * factor);
            self.set_source_trim(SourceTrim::new(trim.start_within_source, cut));
            right.set_source_trim(SourceTrim::new(cut, trim.end_within_source));
        }

        right.keyframes = self
            .keyframes
            .iter_mut()
            .map(|(property, track)| (*property, track.split_at(offset)))
            .collect();

        Ok(right)
    }

    /// Check every per-segment constraint.
    pub fn validate(&self) -> TimelineResult<()> {
        validate::validate_segment(self)
    }
}
