//! UseCase: クライアントからのコマンド処理
//!
//! 受信したテキストを `OutboundCommand` として解釈し、会議に適用する。
//! 拒否されたコマンドには送信者だけに error イベントを返す。

use agora_shared::protocol::OutboundCommand;

use crate::domain::Attendee;

use super::context::{MeetingContext, reply_error};

/// コマンド処理のユースケース
pub struct HandleCommandUseCase {
    context: MeetingContext,
}

impl HandleCommandUseCase {
    pub fn new(context: MeetingContext) -> Self {
        Self { context }
    }

    /// コマンド処理を実行
    ///
    /// # Arguments
    ///
    /// * `sender` - 送信した参加者
    /// * `text` - 受信したテキストフレーム
    pub async fn execute(&self, sender: &Attendee, text: &str) {
        let command: OutboundCommand = match serde_json::from_str(text) {
            Ok(command) => command,
            Err(e) => {
                tracing::warn!("Invalid command from attendee {}: {}", sender.id, e);
                reply_error(&self.context.pusher, sender.id, "Invalid command".to_string()).await;
                return;
            }
        };
        tracing::debug!("Attendee {} sent {:?}", sender.id, command);

        let mut meeting = self.context.meeting.lock().await;
        match meeting.handle(sender, command, self.context.clock.now_millis()) {
            Ok(effects) => self.context.dispatch(effects).await,
            Err(e) => {
                tracing::info!("Rejected command from attendee {}: {}", sender.id, e);
                reply_error(&self.context.pusher, sender.id, e.to_string()).await;
            }
        }
    }
}
