//! UseCase layer of the meeting server.

pub mod connect_attendee;
pub mod context;
pub mod disconnect_attendee;
pub mod handle_command;

pub use connect_attendee::ConnectAttendeeUseCase;
pub use context::MeetingContext;
pub use disconnect_attendee::DisconnectAttendeeUseCase;
pub use handle_command::HandleCommandUseCase;
