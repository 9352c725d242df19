//! Error types for the meeting client.

use thiserror::Error;

/// Client-specific errors
#[derive(Debug, Error)]
pub enum ClientError {
    /// A required setting is empty
    #[error("Missing {0}")]
    MissingSetting(&'static str),

    /// Base address is not a WebSocket URL
    #[error("Invalid server URL '{0}': expected ws:// or wss://")]
    InvalidUrl(String),

    /// A setting that becomes a URL path segment contains reserved characters
    #[error("Invalid {name} '{value}': must not contain '/', '?', '#', '%' or whitespace")]
    InvalidPathSegment { name: &'static str, value: String },

    /// Terminal input could not be set up
    #[error("Terminal error: {0}")]
    Terminal(String),
}
