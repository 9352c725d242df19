//! Infrastructure layer: wire DTO conversions and the WebSocket transport.

pub mod dto;
pub mod websocket;

pub use websocket::WebSocketConnector;
