use montage_core::MontageError;
use montage_edit::EditError;
use montage_timeline::{SegmentId, TimelineError};
use thiserror::Error;

/// Failure reported by the project store.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    /// The request was rejected (4xx); retrying will not help.
    #[error("Store rejected the request ({status}): {message}")]
    Client { status: u16, message: String },

    #[error("Store failed ({status}): {message}")]
    Server { status: u16, message: String },

    #[error("Store unreachable: {0}")]
    Transport(String),
}

impl StoreError {
    /// Classify an HTTP-style status code.
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        if (400..500).contains(&status) {
            Self::Client { status, message }
        } else {
            Self::Server { status, message }
        }
    }

    pub fn not_found(what: impl std::fmt::Display) -> Self {
        Self::Client {
            status: 404,
            message: format!("{what} not found"),
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Client { status, .. } | Self::Server { status, .. } => Some(*status),
            Self::Transport(_) => None,
        }
    }

    pub fn is_retryable(&self) -> bool {
        !matches!(self, Self::Client { .. })
    }
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

#[derive(Error, Debug)]
pub enum SyncError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Timeline(#[from] TimelineError),

    #[error(transparent)]
    Edit(#[from] EditError),

    #[error("Segment {0} has not been confirmed by the store yet")]
    Provisional(SegmentId),

    #[error(transparent)]
    Core(#[from] MontageError),
}

pub type SyncResult<T> = std::result::Result<T, SyncError>;
