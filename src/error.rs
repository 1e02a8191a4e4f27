use thiserror::Error;

use crate::state::{StateKind, StatePhase};

/// Faults that abort the current frame.
///
/// Missing assets and operations on already-removed entities are recovered
/// where they happen and never surface here.
#[derive(Debug, Error)]
pub enum GameError {
    /// Raised inside an event handler or collision callback. There is no
    /// isolation between handlers: the first one to fail stops the frame.
    #[error("handler for {event} failed: {reason}")]
    Handler { event: String, reason: String },

    #[error("{state:?} state expected phase {expected:?}, found {found:?}")]
    Phase {
        state: StateKind,
        expected: StatePhase,
        found: StatePhase,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl GameError {
    pub fn handler(event: impl std::fmt::Debug, reason: impl Into<String>) -> Self {
        GameError::Handler {
            event: format!("{event:?}"),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, GameError>;
