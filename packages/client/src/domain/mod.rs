//! Domain layer of the meeting client.
//!
//! Everything in here is synchronous and free of I/O: the reconciliation
//! rules operate on plain values so they can be tested without a socket or a
//! terminal.

pub mod command;
pub mod confirm;
pub mod connection;
pub mod error;
pub mod meeting;
pub mod poll;
pub mod roster;
pub mod transcript;
pub mod transport;
pub mod value_object;
pub mod view;

pub use command::{NewPollDraft, ValidatedPoll};
pub use confirm::Confirm;
pub use connection::{
    CloseKind, CloseOutcome, ConnectionMachine, ConnectionPhase, ConnectionPolicy,
    ConnectionTarget,
};
pub use error::CommandError;
pub use meeting::{ControlsMode, MeetingStatus};
pub use poll::{Poll, PollPanel};
pub use roster::{Attendee, Roster};
pub use transcript::{ScrollHint, Transcript, TranscriptEntry, TranscriptRow};
pub use transport::{ConnectionHandle, Connector, OutboundFrame, TransportEvent};
pub use value_object::{AttendeeId, MessageId};
pub use view::{
    AdminMarks, AttendeeRow, ControlsView, PollControlsView, PollOptionView, PollView, Renderer,
    StatusLevel, StatusLine, ViewUpdate,
};
