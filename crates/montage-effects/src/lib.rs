//! Montage Effects - transition evaluation and filter backends
//!
//! Transitions map a progress value to per-field deltas (opacity, scale,
//! rotation, offset, clip) that the compositor folds into each element.
//! Filter backends execute a segment's filter chain on a frame.

pub mod filter;
pub mod transition;
pub mod transitions;

pub use filter::{CpuFilterBackend, FilterBackend};
pub use transition::{evaluate_transitions, EffectContext, EffectDelta, TransitionEffect, TransitionRegistry};
