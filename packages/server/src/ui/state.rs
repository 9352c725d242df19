//! Server state shared by the handlers.

use crate::usecase::{ConnectAttendeeUseCase, DisconnectAttendeeUseCase, HandleCommandUseCase};

/// Shared application state
pub struct AppState {
    /// ConnectAttendeeUseCase（参加者接続のユースケース）
    pub connect_attendee_usecase: ConnectAttendeeUseCase,
    /// DisconnectAttendeeUseCase（参加者切断のユースケース）
    pub disconnect_attendee_usecase: DisconnectAttendeeUseCase,
    /// HandleCommandUseCase（コマンド処理のユースケース）
    pub handle_command_usecase: HandleCommandUseCase,
}
