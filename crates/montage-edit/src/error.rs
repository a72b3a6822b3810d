use montage_timeline::TimelineError;
use std::fmt;
use thiserror::Error;

/// Kind of pointer session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionKind {
    Drag,
    Resize,
}

impl fmt::Display for SessionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Drag => f.write_str("drag"),
            Self::Resize => f.write_str("resize"),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EditError {
    #[error("A {0} session is already open")]
    SessionActive(SessionKind),

    #[error("No manipulation session is open")]
    NoSession,

    #[error("The open session is not a {0} session")]
    WrongSession(SessionKind),

    #[error(transparent)]
    Timeline(#[from] TimelineError),
}

pub type EditResult<T> = std::result::Result<T, EditError>;
