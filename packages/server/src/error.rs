//! Error types for the meeting server.

use thiserror::Error;

/// Server-specific errors
#[derive(Debug, Error)]
pub enum ServerError {
    /// Binding or serving failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid `--attendee` value
    #[error("Invalid attendee '{value}': {reason}")]
    InvalidAttendee { value: String, reason: &'static str },
}
