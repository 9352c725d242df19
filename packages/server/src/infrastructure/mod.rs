//! Infrastructure layer of the meeting server.

pub mod message_pusher;

pub use message_pusher::{ConnectionId, PusherChannel, ServerFrame, WebSocketMessagePusher};
