//! Transport interface used by the session.
//!
//! The session never touches sockets directly: a [`Connector`] opens a
//! connection, reports its lifecycle through [`TransportEvent`]s and hands
//! back a [`ConnectionHandle`] for outbound frames.

use tokio::sync::mpsc;

/// Lifecycle and data events of one connection, in delivery order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    Opened,
    Frame(String),
    /// Always the last event of a connection
    Closed { code: u16 },
}

/// Frames going out on a connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundFrame {
    Text(String),
    /// Close the connection from this side
    Close,
}

/// Sending half of a live connection.
#[derive(Debug, Clone)]
pub struct ConnectionHandle {
    outbound: mpsc::UnboundedSender<OutboundFrame>,
}

impl ConnectionHandle {
    pub fn new(outbound: mpsc::UnboundedSender<OutboundFrame>) -> Self {
        Self { outbound }
    }

    /// Queue a text frame. Returns `false` if the connection is gone.
    pub fn send_text(&self, text: String) -> bool {
        self.outbound.send(OutboundFrame::Text(text)).is_ok()
    }

    pub fn close(&self) {
        // The connection may already be gone; nothing left to close then
        let _ = self.outbound.send(OutboundFrame::Close);
    }
}

/// Opens connections.
pub trait Connector: Send {
    /// Start connecting to `url`. Events of the new connection are delivered
    /// on `events`, ending with [`TransportEvent::Closed`].
    fn open(&self, url: &str, events: mpsc::UnboundedSender<TransportEvent>) -> ConnectionHandle;
}
