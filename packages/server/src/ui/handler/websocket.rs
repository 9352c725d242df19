//! WebSocket connection handlers.

use std::sync::Arc;

use axum::{
    extract::{
        Path, State,
        ws::{CloseFrame, Message, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
};
use futures_util::{sink::SinkExt, stream::StreamExt};
use tokio::sync::mpsc;

use crate::{infrastructure::ServerFrame, ui::state::AppState};

/// `GET /ws/{meeting}/{key}/{since}`
///
/// The upgrade always succeeds; rejected keys are refused with a close code
/// so the client can tell them apart from network failures.
pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    Path((meeting, key, since)): Path<(String, String, i64)>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state, meeting, key, since))
}

/// Spawns a task that forwards frames from the rx channel to the WebSocket sender.
///
/// # Arguments
///
/// * `rx` - Channel receiver for frames addressed to this client
/// * `sender` - WebSocket sink of this client
///
/// # Returns
///
/// A `JoinHandle` for the spawned task
fn pusher_loop(
    mut rx: mpsc::UnboundedReceiver<ServerFrame>,
    mut sender: futures_util::stream::SplitSink<WebSocket, Message>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(frame) = rx.recv().await {
            match frame {
                ServerFrame::Text(text) => {
                    if sender.send(Message::Text(text.into())).await.is_err() {
                        break;
                    }
                }
                ServerFrame::Close { code, reason } => {
                    let _ = sender
                        .send(Message::Close(Some(CloseFrame {
                            code,
                            reason: reason.into(),
                        })))
                        .await;
                    break;
                }
            }
        }
    })
}

async fn handle_socket(
    mut socket: WebSocket,
    state: Arc<AppState>,
    meeting: String,
    key: String,
    since: i64,
) {
    let (tx, rx) = mpsc::unbounded_channel();

    let (attendee, connection) = match state
        .connect_attendee_usecase
        .execute(&meeting, &key, since, tx)
        .await
    {
        Ok(accepted) => accepted,
        Err(e) => {
            tracing::warn!("Refusing connection to meeting {}: {}", meeting, e);
            let _ = socket
                .send(Message::Close(Some(CloseFrame {
                    code: e.close_code(),
                    reason: e.to_string().into(),
                })))
                .await;
            return;
        }
    };

    let (sender, mut receiver) = socket.split();
    let mut send_task = pusher_loop(rx, sender);

    let state_clone = state.clone();
    let sender_attendee = attendee.clone();
    let mut recv_task = tokio::spawn(async move {
        while let Some(msg) = receiver.next().await {
            let msg = match msg {
                Ok(msg) => msg,
                Err(e) => {
                    tracing::warn!("WebSocket error: {}", e);
                    break;
                }
            };

            match msg {
                Message::Text(text) => {
                    state_clone
                        .handle_command_usecase
                        .execute(&sender_attendee, text.as_str())
                        .await;
                }
                Message::Close(_) => {
                    tracing::info!("Attendee {} requested close", sender_attendee.id);
                    break;
                }
                _ => {}
            }
        }
    });

    // If any one of the tasks completes, abort the other
    tokio::select! {
        _ = &mut recv_task => send_task.abort(),
        _ = &mut send_task => recv_task.abort(),
    };

    state
        .disconnect_attendee_usecase
        .execute(attendee.id, connection)
        .await;
}
