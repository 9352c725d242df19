//! Delivery of events to connected WebSocket clients.

use std::{
    collections::HashMap,
    sync::atomic::{AtomicU64, Ordering},
};

use agora_shared::protocol::{InboundEvent, close_code};
use tokio::sync::{Mutex, mpsc};

use crate::domain::Audience;

/// What the per-connection writer task sends next.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerFrame {
    Text(String),
    /// Send a close frame and stop writing
    Close { code: u16, reason: String },
}

/// Channel feeding one connection's writer task
pub type PusherChannel = mpsc::UnboundedSender<ServerFrame>;

/// Identifies one accepted socket; an attendee reconnecting gets a new one
pub type ConnectionId = u64;

struct ClientSlot {
    connection: ConnectionId,
    channel: PusherChannel,
}

/// Pushes events to attendees over their WebSocket connections.
///
/// Holds at most one connection per attendee; a second connection replaces
/// the first, which is closed with [`close_code::REPLACED`].
pub struct WebSocketMessagePusher {
    clients: Mutex<HashMap<i64, ClientSlot>>,
    next_connection: AtomicU64,
}

impl Default for WebSocketMessagePusher {
    fn default() -> Self {
        Self::new()
    }
}

impl WebSocketMessagePusher {
    pub fn new() -> Self {
        Self {
            clients: Mutex::new(HashMap::new()),
            next_connection: AtomicU64::new(1),
        }
    }

    /// Register the channel of a new connection for `attendee`.
    pub async fn register_client(&self, attendee: i64, channel: PusherChannel) -> ConnectionId {
        let connection = self.next_connection.fetch_add(1, Ordering::Relaxed);
        let previous = self
            .clients
            .lock()
            .await
            .insert(attendee, ClientSlot { connection, channel });

        if let Some(previous) = previous {
            tracing::info!("Attendee {} connected again, closing the old connection", attendee);
            let _ = previous.channel.send(ServerFrame::Close {
                code: close_code::REPLACED,
                reason: "Connected from another client".to_string(),
            });
        }
        connection
    }

    /// Remove `connection` if it is still the attendee's current one.
    ///
    /// Returns `false` when it was already replaced.
    pub async fn unregister_client(&self, attendee: i64, connection: ConnectionId) -> bool {
        let mut clients = self.clients.lock().await;
        match clients.get(&attendee) {
            Some(slot) if slot.connection == connection => {
                clients.remove(&attendee);
                true
            }
            _ => false,
        }
    }

    pub async fn connected_count(&self) -> usize {
        self.clients.lock().await.len()
    }

    /// Send one event to the given audience.
    pub async fn push(&self, audience: Audience, event: &InboundEvent) {
        let text = match event.encode() {
            Ok(text) => text,
            Err(e) => {
                tracing::error!("Failed to encode {} event: {}", event.kind(), e);
                return;
            }
        };

        let clients = self.clients.lock().await;
        let targets = clients.iter().filter(|(id, _)| match audience {
            Audience::Everyone => true,
            Audience::EveryoneExcept(excluded) => **id != excluded,
            Audience::Only(target) => **id == target,
        });
        for (id, slot) in targets {
            if slot.channel.send(ServerFrame::Text(text.clone())).is_err() {
                tracing::debug!("Attendee {} is gone, dropping {} event", id, event.kind());
            }
        }
    }

    /// Ask the attendee's connection to close.
    pub async fn close(&self, attendee: i64, code: u16, reason: &str) {
        if let Some(slot) = self.clients.lock().await.get(&attendee) {
            let _ = slot.channel.send(ServerFrame::Close {
                code,
                reason: reason.to_string(),
            });
        }
    }
}
