//! Montage Core - Foundation types for the timeline engine
//!
//! This crate provides the fundamental types used throughout Montage:
//! - Time ranges and time rounding
//! - Geometric primitives (rects, insets, 2D transforms)
//! - Keyframe interpolation
//! - Filter descriptions and CPU frame buffers
//! - Editor configuration

pub mod config;
pub mod error;
pub mod filter;
pub mod frame;
pub mod geometry;
pub mod keyframe;
pub mod time;

pub use config::EditorConfig;
pub use error::{MontageError, Result};
pub use filter::{Filter, FilterKind};
pub use frame::FrameBuffer;
pub use geometry::{Insets, Rect, Transform2D, Vec2};
pub use keyframe::{Interpolation, Keyframe, KeyframeToggle, KeyframeTrack};
pub use time::{round_time, TimeRange, MIN_SEGMENT_DURATION, TIME_EPSILON};
