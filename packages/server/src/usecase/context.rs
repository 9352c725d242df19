//! 会議の状態と配信先をまとめた共有コンテキスト

use std::sync::Arc;

use agora_shared::time::Clock;
use tokio::sync::Mutex;

use crate::{
    domain::{Audience, Effect, Meeting},
    infrastructure::WebSocketMessagePusher,
};

/// 全てのユースケースが共有する状態
#[derive(Clone)]
pub struct MeetingContext {
    /// 会議の集約
    pub meeting: Arc<Mutex<Meeting>>,
    /// 接続中のクライアントへの配信
    pub pusher: Arc<WebSocketMessagePusher>,
    /// エントリの時刻を決める時計
    pub clock: Arc<dyn Clock>,
}

impl MeetingContext {
    pub fn new(meeting: Meeting, clock: Arc<dyn Clock>) -> Self {
        Self {
            meeting: Arc::new(Mutex::new(meeting)),
            pusher: Arc::new(WebSocketMessagePusher::new()),
            clock,
        }
    }

    /// Effect を実行する
    ///
    /// 呼び出し側は会議のロックを保持したまま呼ぶ。配信順が状態変更の順と一致する。
    pub async fn dispatch(&self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::ClosePollAfter { generation, delay } => {
                    let context = self.clone();
                    tokio::spawn(async move {
                        tokio::time::sleep(delay).await;
                        let mut meeting = context.meeting.lock().await;
                        let effects = meeting.close_poll(generation, context.clock.now_millis());
                        if !effects.is_empty() {
                            tracing::info!("Poll {} closed after {:?}", generation, delay);
                        }
                        deliver(&context.pusher, effects).await;
                    });
                }
                other => deliver(&self.pusher, vec![other]).await,
            }
        }
    }
}

async fn deliver(pusher: &WebSocketMessagePusher, effects: Vec<Effect>) {
    for effect in effects {
        match effect {
            Effect::Deliver { audience, event } => pusher.push(audience, &event).await,
            Effect::Close { attendee, code } => {
                pusher.close(attendee, code, "Disconnected by an administrator").await
            }
            Effect::ClosePollAfter { generation, .. } => {
                tracing::warn!("Nested poll timer {} ignored", generation);
            }
        }
    }
}

/// 送信者だけにエラーを返す
pub(crate) async fn reply_error(pusher: &WebSocketMessagePusher, attendee: i64, message: String) {
    pusher
        .push(
            Audience::Only(attendee),
            &agora_shared::protocol::InboundEvent::Error(message),
        )
        .await;
}
