//! Domain layer of the meeting server.

pub mod error;
pub mod meeting;

pub use error::MeetingError;
pub use meeting::{ATTENDEE_COLORS, Attendee, Audience, Effect, Meeting};
