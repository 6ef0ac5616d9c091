//! WebSocket transport
//!
//! Each channel is a spawned task that owns the socket. Outbound frames reach
//! it over an mpsc channel; inbound frames and lifecycle changes go back to
//! the controller as [`ChannelEvent`]s.
//!
//! ```text
//! +------------+  Frame   +-------------+  ws  +----------+
//! | Controller | -------> | socket task | <--> | TouchFree|
//! |            | <------- |             |      | service  |
//! +------------+  events  +-------------+      +----------+
//! ```

use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, info, warn};

use crate::channel::{ChannelEvent, ChannelEventSender, Frame, MessageChannel, Transport};
use crate::error::ClientError;

#[derive(Debug, Default, Clone, Copy)]
pub struct WebSocketTransport;

impl Transport for WebSocketTransport {
    fn open(&self, url: &str, events: ChannelEventSender) -> Box<dyn MessageChannel> {
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(run_socket(url.to_string(), events, rx));
        Box::new(WebSocketChannel { outbound: tx })
    }
}

enum Outbound {
    Frame(Frame),
    Close,
}

struct WebSocketChannel {
    outbound: mpsc::UnboundedSender<Outbound>,
}

impl MessageChannel for WebSocketChannel {
    fn send(&mut self, frame: Frame) -> Result<(), ClientError> {
        self.outbound
            .send(Outbound::Frame(frame))
            .map_err(|_| ClientError::ChannelClosed)
    }

    fn close(&mut self) {
        let _ = self.outbound.send(Outbound::Close);
    }
}

async fn run_socket(
    url: String,
    events: ChannelEventSender,
    mut outbound: mpsc::UnboundedReceiver<Outbound>,
) {
    let connection_id = events.connection_id();
    debug!(%url, connection_id, "Opening WebSocket");

    let stream = match connect_async(url.as_str()).await {
        Ok((stream, _response)) => stream,
        Err(e) => {
            warn!(%url, error = %e, "Failed to connect to the TouchFree service");
            events.send(ChannelEvent::Closed {
                reason: Some(e.to_string()),
            });
            return;
        }
    };

    info!(%url, connection_id, "WebSocket open");
    if !events.send(ChannelEvent::Opened) {
        return;
    }

    let (mut sink, mut source) = stream.split();
    let reason = loop {
        tokio::select! {
            out = outbound.recv() => match out {
                Some(Outbound::Frame(frame)) => {
                    let message = match frame {
                        Frame::Text(text) => Message::Text(text.into()),
                        Frame::Binary(bytes) => Message::Binary(bytes.into()),
                    };
                    if let Err(e) = sink.send(message).await {
                        break Some(e.to_string());
                    }
                }
                // Close requested, or the channel handle was dropped
                Some(Outbound::Close) | None => {
                    let _ = sink.send(Message::Close(None)).await;
                    let _ = sink.close().await;
                    break Some("closed by client".to_string());
                }
            },
            inbound = source.next() => match inbound {
                Some(Ok(Message::Text(text))) => {
                    if !events.send(ChannelEvent::Text(text.as_str().to_owned())) {
                        break None;
                    }
                }
                Some(Ok(Message::Binary(bytes))) => {
                    if !events.send(ChannelEvent::Binary(bytes.to_vec())) {
                        break None;
                    }
                }
                Some(Ok(Message::Close(frame))) => {
                    break frame.map(|f| f.reason.as_str().to_owned());
                }
                // Ping/pong are answered by tungstenite
                Some(Ok(_)) => {}
                Some(Err(e)) => break Some(e.to_string()),
                None => break None,
            },
        }
    };

    info!(connection_id, reason = reason.as_deref().unwrap_or("none"), "WebSocket closed");
    events.send(ChannelEvent::Closed { reason });
}
