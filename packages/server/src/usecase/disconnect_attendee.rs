//! UseCase: 参加者の切断処理

use crate::infrastructure::ConnectionId;

use super::context::MeetingContext;

/// 参加者切断のユースケース
pub struct DisconnectAttendeeUseCase {
    context: MeetingContext,
}

impl DisconnectAttendeeUseCase {
    pub fn new(context: MeetingContext) -> Self {
        Self { context }
    }

    /// 参加者切断を実行
    ///
    /// 別の接続に置き換えられていた場合は何もしない。
    ///
    /// # Returns
    ///
    /// 参加者が会議から退出した場合は `true`
    pub async fn execute(&self, attendee: i64, connection: ConnectionId) -> bool {
        let mut meeting = self.context.meeting.lock().await;
        if !self
            .context
            .pusher
            .unregister_client(attendee, connection)
            .await
        {
            tracing::debug!(
                "Connection {} of attendee {} was already replaced",
                connection,
                attendee
            );
            return false;
        }

        let effects = meeting.leave(attendee);
        self.context.dispatch(effects).await;
        tracing::info!("Attendee {} left", attendee);
        true
    }
}
