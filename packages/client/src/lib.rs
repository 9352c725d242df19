//! Realtime meeting client: chat transcript, attendee presence and live polls
//! over a single WebSocket connection.
//!
//! Layers follow the usual split:
//!
//! - [`domain`]: pure state and reconciliation rules
//! - [`usecase`]: the client reducer, admin commands and the session loop
//! - [`infrastructure`]: WebSocket transport and wire conversions
//! - [`ui`]: terminal rendering and input

pub mod config;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod ui;
pub mod usecase;

pub use config::ClientConfig;
pub use error::ClientError;
pub use ui::run_client;
