//! Montage Edit - pointer-driven timeline manipulation
//!
//! Resolves drag, resize and split gestures against the no-overlap rule and
//! snap anchors, and commits the result to the timeline model. At most one
//! pointer session is open at a time.

pub mod error;
pub mod session;
pub mod snapping;
pub mod source;

pub use error::{EditError, EditResult, SessionKind};
pub use session::{DragPreview, ManipulationEngine, ResizePreview, Session, SessionOutcome};
pub use snapping::{
    Placement, PlacementBounds, ResizeEdge, ResizeResult, SnapEdge, SnapIndicator, SnapKind,
    SnapPoint, SnapResolver,
};
pub use source::SourceDurationCache;
