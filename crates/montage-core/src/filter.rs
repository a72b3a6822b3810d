//! Filter descriptions attached to segments.
//!
//! A segment carries an ordered filter chain. Transform filters change how
//! the element is placed on the canvas and are folded in by the compositor;
//! every other filter is forwarded to the rendering backend untouched.

use serde::{Deserialize, Serialize};

/// One entry of a segment's filter chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Filter {
    pub name: String,
    pub value: f64,
}

impl Filter {
    pub fn new(name: impl Into<String>, value: f64) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }

    /// Classify this filter by name.
    pub fn kind(&self) -> FilterKind {
        FilterKind::from_name(&self.name)
    }

    /// Whether this filter changes placement rather than pixels.
    pub fn is_transform(&self) -> bool {
        matches!(
            self.kind(),
            FilterKind::Rotate | FilterKind::FlipHorizontal | FilterKind::FlipVertical
        )
    }
}

/// Known filter kinds.
///
/// Values are percentages where 100 is the identity (brightness, contrast,
/// saturate) or the full effect (grayscale, sepia, invert); `rotate` is in
/// degrees and the flips are on when non-zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterKind {
    Brightness,
    Contrast,
    Saturate,
    Grayscale,
    Sepia,
    Invert,
    Rotate,
    FlipHorizontal,
    FlipVertical,
    /// Passed through to the renderer by name.
    Other,
}

impl FilterKind {
    pub fn from_name(name: &str) -> Self {
        match name {
            "brightness" => Self::Brightness,
            "contrast" => Self::Contrast,
            "saturate" | "saturation" => Self::Saturate,
            "grayscale" => Self::Grayscale,
            "sepia" => Self::Sepia,
            "invert" => Self::Invert,
            "rotate" => Self::Rotate,
            "flipHorizontal" | "flipH" => Self::FlipHorizontal,
            "flipVertical" | "flipV" => Self::FlipVertical,
            _ => Self::Other,
        }
    }
}
