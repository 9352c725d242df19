//! Development meeting server.
//!
//! Serves one meeting over the same protocol the client speaks: transcript,
//! presence, polls and administrative commands over WebSocket.

// layers
pub mod domain;
pub mod infrastructure;
pub mod ui;
pub mod usecase;

pub mod config;
pub mod error;

pub use config::ServerConfig;
pub use error::ServerError;
pub use ui::Server;
