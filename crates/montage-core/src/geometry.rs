//! Geometric primitives for on-canvas placement.

use bytemuck::{Pod, Zeroable};
use glam::{Affine2, Mat3, Vec2 as GlamVec2};
use serde::{Deserialize, Serialize};

/// 2D vector.
pub type Vec2 = GlamVec2;

/// Axis-aligned rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize, Pod, Zeroable)]
#[repr(C)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    /// Create a new rectangle.
    #[inline]
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Create a rectangle from center and size.
    pub fn from_center_size(center: Vec2, size: Vec2) -> Self {
        Self {
            x: center.x - size.x * 0.5,
            y: center.y - size.y * 0.5,
            width: size.x,
            height: size.y,
        }
    }

    /// Size as a vector.
    #[inline]
    pub fn size(self) -> Vec2 {
        Vec2::new(self.width, self.height)
    }
}

/// Per-edge insets in percent of the owning element's size (0..=100).
///
/// Used both for crop rectangles and for the reveal region of wipe
/// transitions.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize, Pod, Zeroable)]
#[repr(C)]
pub struct Insets {
    pub left: f32,
    pub right: f32,
    pub top: f32,
    pub bottom: f32,
}

impl Insets {
    /// No inset on any edge.
    pub const NONE: Self = Self::new(0.0, 0.0, 0.0, 0.0);

    /// Create new insets.
    #[inline]
    pub const fn new(left: f32, right: f32, top: f32, bottom: f32) -> Self {
        Self {
            left,
            right,
            top,
            bottom,
        }
    }

    /// Whether every edge lies in `[0, 100]` and opposite edges leave a
    /// non-empty region.
    pub fn is_valid(self) -> bool {
        let in_range = |v: f32| (0.0..=100.0).contains(&v);
        in_range(self.left)
            && in_range(self.right)
            && in_range(self.top)
            && in_range(self.bottom)
            && self.left + self.right < 100.0
            && self.top + self.bottom < 100.0
    }

    /// Whether no edge is inset.
    pub fn is_none(self) -> bool {
        self == Self::NONE
    }
}

/// Placement of an element on the canvas: translation to its center,
/// rotation in radians, then per-axis scale.
///
/// A negative scale component mirrors the element along that axis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform2D {
    translation: [f32; 2],
    rotation: f32,
    scale: [f32; 2],
}

impl Transform2D {
    pub fn from_trs(translation: Vec2, rotation: f32, scale: Vec2) -> Self {
        Self {
            translation: translation.to_array(),
            rotation,
            scale: scale.to_array(),
        }
    }

    pub fn translation(&self) -> Vec2 {
        Vec2::from_array(self.translation)
    }

    /// Rotation in radians.
    pub fn rotation(&self) -> f32 {
        self.rotation
    }

    pub fn scale(&self) -> Vec2 {
        Vec2::from_array(self.scale)
    }

    /// Composed matrix for the renderer, mapping element-local points
    /// (origin at the element center) to canvas points.
    pub fn matrix(&self) -> Mat3 {
        Affine2::from_scale_angle_translation(self.scale(), self.rotation, self.translation()).into()
    }
}

impl Default for Transform2D {
    fn default() -> Self {
        Self::from_trs(Vec2::ZERO, 0.0, Vec2::ONE)
    }
}
