//! Montage Sync - persistence boundary of the editing session
//!
//! The timeline is mutated locally first. This crate turns committed
//! mutations into writes against a [`ProjectStore`]: debounced per write
//! class for routine edits, immediate with bounded retry for undo
//! snapshots.

pub mod error;
pub mod memory;
pub mod pending;
pub mod retry;
pub mod session;
pub mod store;

pub use error::{StoreError, StoreResult, SyncError, SyncResult};
pub use memory::{InMemoryStore, StoreCall};
pub use pending::{PendingWrites, WriteClass, WriteKey};
pub use retry::RetryPolicy;
pub use session::{EditorSession, Notice};
pub use store::{CreatedSegment, ProjectData, ProjectStore, SegmentUpdate, UpdateEndpoint};
