//! Montage Compositor - what to draw, where, at a given time
//!
//! The compositor reads the timeline together with the keyframe and
//! transition engines and produces renderer-agnostic descriptors. It never
//! touches pixels; a rendering backend consumes the descriptors.

pub mod audio;
pub mod compositor;
pub mod media;

pub use audio::{AudioInstruction, AudioTransport, TransportStatus};
pub use compositor::{Compositor, RenderContent, RenderDescriptor};
pub use media::MediaLocator;
