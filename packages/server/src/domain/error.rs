//! Errors of the meeting domain.

use agora_shared::protocol::close_code;
use thiserror::Error;

/// A rejected connection or command.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MeetingError {
    #[error("Unknown meeting '{0}'")]
    UnknownMeeting(String),

    #[error("Invalid key")]
    InvalidKey,

    #[error("You are not allowed to rejoin this meeting")]
    Banned,

    #[error("Only meeting administrators can do that")]
    NotAdministrator,

    #[error("The meeting is not open")]
    MeetingClosed,

    #[error("The meeting is already open")]
    AlreadyOpen,

    #[error("Message is empty")]
    EmptyMessage,

    #[error("There is no poll running")]
    NoPoll,

    #[error("A poll is already running")]
    PollRunning,

    #[error("That poll has already closed")]
    QuestionMismatch,

    #[error("Poll has no option {0}")]
    InvalidOption(usize),

    #[error("Invalid poll: {0}")]
    InvalidPoll(&'static str),

    #[error("Attendee {0} is not connected")]
    UnknownAttendee(i64),

    #[error("You cannot disconnect yourself")]
    CannotKickSelf,
}

impl MeetingError {
    /// Close code used when this error refuses a connection.
    pub fn close_code(&self) -> u16 {
        match self {
            MeetingError::Banned => close_code::BANNED,
            _ => close_code::INVALID_KEY,
        }
    }
}
