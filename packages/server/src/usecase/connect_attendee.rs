//! UseCase: 参加者の接続処理
//!
//! キーを検証し、接続を登録して参加者を出席にしてから、新しい接続に
//! 現在の会議の状態 (status, since 以降のエントリ, 本人を含む参加者一覧, 投票) を送る。
//! 初めての参加であれば他の参加者に adduser を通知する。

use agora_shared::protocol::InboundEvent;

use crate::{
    domain::{Attendee, Audience, MeetingError},
    infrastructure::{ConnectionId, PusherChannel},
};

use super::context::MeetingContext;

/// 参加者接続のユースケース
pub struct ConnectAttendeeUseCase {
    context: MeetingContext,
}

impl ConnectAttendeeUseCase {
    pub fn new(context: MeetingContext) -> Self {
        Self { context }
    }

    /// 参加者接続を実行
    ///
    /// # Arguments
    ///
    /// * `meeting_id` - 接続パスの会議 ID
    /// * `key` - アクセスキー
    /// * `since` - クライアントが適用済みの最大エントリ ID
    /// * `channel` - クライアントへの送信用チャンネル
    ///
    /// # Returns
    ///
    /// * `Ok((Attendee, ConnectionId))` - 接続成功
    /// * `Err(MeetingError)` - 不明な会議・キー、または禁止されたキー
    pub async fn execute(
        &self,
        meeting_id: &str,
        key: &str,
        since: i64,
        channel: PusherChannel,
    ) -> Result<(Attendee, ConnectionId), MeetingError> {
        let mut meeting = self.context.meeting.lock().await;
        let attendee = meeting.authorize(meeting_id, key)?;

        let connection = self
            .context
            .pusher
            .register_client(attendee.id, channel)
            .await;

        let effects = meeting.join(&attendee);
        self.context.dispatch(effects).await;

        for event in meeting.greeting(since) {
            if let InboundEvent::Messages(entries) = &event {
                tracing::debug!(
                    "Replaying {} entries after {} to attendee {}",
                    entries.len(),
                    since,
                    attendee.id
                );
            }
            self.context
                .pusher
                .push(Audience::Only(attendee.id), &event)
                .await;
        }

        tracing::info!(
            "Attendee {} ({}) connected to meeting {}",
            attendee.id,
            attendee.name,
            meeting_id
        );
        Ok((attendee, connection))
    }
}
