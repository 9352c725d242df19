//! WebSocket transport built on tokio-tungstenite.

use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::{
    connect_async,
    tungstenite::protocol::{CloseFrame, Message, frame::coding::CloseCode},
};

use agora_shared::protocol::close_code;

use crate::domain::{ConnectionHandle, Connector, OutboundFrame, TransportEvent};

/// Opens meeting connections over WebSocket.
///
/// Each connection runs in its own task that forwards received text frames
/// and finally reports the close code. A failed handshake or a dropped link
/// is reported as abnormal closure (1006).
#[derive(Debug, Clone, Copy, Default)]
pub struct WebSocketConnector;

impl Connector for WebSocketConnector {
    fn open(&self, url: &str, events: mpsc::UnboundedSender<TransportEvent>) -> ConnectionHandle {
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        tokio::spawn(connection_loop(url.to_string(), outbound_rx, events));
        ConnectionHandle::new(outbound_tx)
    }
}

async fn connection_loop(
    url: String,
    mut outbound: mpsc::UnboundedReceiver<OutboundFrame>,
    events: mpsc::UnboundedSender<TransportEvent>,
) {
    tracing::info!("Connecting to {}", url);

    let ws_stream = match connect_async(&url).await {
        Ok((ws_stream, _response)) => ws_stream,
        Err(e) => {
            tracing::warn!("Failed to connect to {}: {}", url, e);
            let _ = events.send(TransportEvent::Closed {
                code: close_code::ABNORMAL,
            });
            return;
        }
    };

    if events.send(TransportEvent::Opened).is_err() {
        // Nobody is listening anymore
        return;
    }

    let (mut write, mut read) = ws_stream.split();
    let mut code = close_code::ABNORMAL;

    loop {
        tokio::select! {
            message = read.next() => match message {
                Some(Ok(Message::Text(text))) => {
                    tracing::debug!("Received frame: {}", text.as_str());
                    let _ = events.send(TransportEvent::Frame(text.as_str().to_owned()));
                }
                Some(Ok(Message::Close(frame))) => {
                    code = frame
                        .map(|frame| u16::from(frame.code))
                        .unwrap_or(close_code::NO_STATUS);
                    tracing::info!("Server closed the connection ({})", code);
                    break;
                }
                Some(Ok(Message::Binary(data))) => {
                    tracing::debug!("Ignoring {} bytes of binary data", data.len());
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    tracing::warn!("WebSocket read error: {}", e);
                    break;
                }
                None => {
                    tracing::warn!("WebSocket stream ended without close frame");
                    break;
                }
            },
            frame = outbound.recv() => match frame {
                Some(OutboundFrame::Text(text)) => {
                    if let Err(e) = write.send(Message::Text(text.into())).await {
                        tracing::warn!("Failed to send message: {}", e);
                        break;
                    }
                }
                Some(OutboundFrame::Close) | None => {
                    let close = CloseFrame {
                        code: CloseCode::Normal,
                        reason: "".into(),
                    };
                    if let Err(e) = write.send(Message::Close(Some(close))).await {
                        tracing::debug!("Failed to send close frame: {}", e);
                    }
                    code = close_code::NORMAL;
                    break;
                }
            },
        }
    }

    let _ = write.close().await;
    let _ = events.send(TransportEvent::Closed { code });
}
