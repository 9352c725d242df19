//! UseCase layer of the meeting client.

pub mod commands;
pub mod meeting_client;
pub mod scheduler;
pub mod session;

pub use meeting_client::{ClientSettings, CloseReaction, ConnectAttempt, MeetingClient};
pub use scheduler::ReconnectScheduler;
pub use session::{MeetingSession, UserCommand};
