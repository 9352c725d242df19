//! Errors for locally rejected user commands.

use thiserror::Error;

use super::value_object::AttendeeId;

/// A user command that was blocked before anything was sent.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("Must specify a question!")]
    EmptyQuestion,

    #[error("Must provide at least two options (got {found})")]
    TooFewAnswers { found: usize },

    #[error("Must specify a time above zero (got {0})")]
    NegativeDuration(i64),

    #[error("Poll time must be a whole number of minutes (got '{0}')")]
    InvalidDuration(String),

    #[error("Not connected to the meeting")]
    NotConnected,

    #[error("There is no poll running")]
    NoActivePoll,

    #[error("Poll has no option {0}")]
    InvalidOption(usize),

    #[error("Option {0} cannot be voted for right now")]
    VoteLocked(usize),

    #[error("Only meeting administrators can do that")]
    NotAdministrator,

    #[error("Attendee {0} is yourself")]
    CannotKickSelf(AttendeeId),

    #[error("Unknown command '{0}', type /help for a list of commands")]
    UnknownCommand(String),

    #[error("Usage: {0}")]
    Usage(&'static str),
}
