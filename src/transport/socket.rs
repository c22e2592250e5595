//! Socket Seam
//!
//! The transport worker never touches a WebSocket directly. It asks a
//! [`Connector`] to open a socket and gets back a pair of channels: one for
//! frames to write, one for lifecycle events and frames read. Opening is
//! non-blocking; the outcome arrives later as [`SocketEvent::Opened`] or as
//! an error followed by [`SocketEvent::Closed`].

use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::Message;

/// Close code for a clean, caller-requested shutdown
pub const NORMAL_CLOSURE: u16 = 1000;

/// Close code reported when the connection dropped without a close frame
pub const ABNORMAL_CLOSURE: u16 = 1006;

/// Instructions from the worker to an open socket
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SocketCommand {
    /// Write a text frame
    Text(String),
    /// Send a close frame and stop
    Close { code: u16, reason: String },
}

/// What happened on the socket
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SocketEvent {
    /// Handshake completed
    Opened,
    /// A text frame arrived
    Text(String),
    /// Transport-level failure; a `Closed` event follows
    Error(String),
    /// The socket is gone
    Closed { code: u16, reason: String },
}

impl SocketEvent {
    pub(crate) fn abnormal_close(reason: impl Into<String>) -> Self {
        Self::Closed {
            code: ABNORMAL_CLOSURE,
            reason: reason.into(),
        }
    }
}

/// The worker's side of one socket
#[derive(Debug)]
pub struct SocketHandle {
    pub outgoing: mpsc::UnboundedSender<SocketCommand>,
    pub incoming: mpsc::UnboundedReceiver<SocketEvent>,
}

/// Opens sockets for the transport worker
pub trait Connector: Send + Sync + 'static {
    /// Start connecting to `url`; the result is reported on the handle
    fn open(&self, url: &str) -> SocketHandle;
}

/// [`Connector`] backed by `tokio-tungstenite`
#[derive(Debug, Default, Clone)]
pub struct WsConnector;

impl Connector for WsConnector {
    fn open(&self, url: &str) -> SocketHandle {
        let (out_tx, out_rx) = mpsc::unbounded_channel();
        let (in_tx, in_rx) = mpsc::unbounded_channel();

        tokio::spawn(pump_socket(url.to_string(), out_rx, in_tx));

        SocketHandle {
            outgoing: out_tx,
            incoming: in_rx,
        }
    }
}

/// Drive one WebSocket until either side closes it
async fn pump_socket(
    url: String,
    mut commands: mpsc::UnboundedReceiver<SocketCommand>,
    events: mpsc::UnboundedSender<SocketEvent>,
) {
    let stream = match tokio_tungstenite::connect_async(url.as_str()).await {
        Ok((stream, _response)) => stream,
        Err(e) => {
            tracing::debug!(url = %url, error = %e, "WebSocket connect failed");
            let _ = events.send(SocketEvent::Error(e.to_string()));
            let _ = events.send(SocketEvent::abnormal_close("connect failed"));
            return;
        }
    };

    if events.send(SocketEvent::Opened).is_err() {
        return;
    }

    let (mut sink, mut stream) = stream.split();

    loop {
        tokio::select! {
            command = commands.recv() => match command {
                Some(SocketCommand::Text(text)) => {
                    if let Err(e) = sink.send(Message::Text(text)).await {
                        let _ = events.send(SocketEvent::Error(e.to_string()));
                        let _ = events.send(SocketEvent::abnormal_close("write failed"));
                        return;
                    }
                }
                Some(SocketCommand::Close { code, reason }) => {
                    let frame = CloseFrame {
                        code: CloseCode::from(code),
                        reason: reason.clone().into(),
                    };
                    let _ = sink.send(Message::Close(Some(frame))).await;
                    let _ = sink.close().await;
                    let _ = events.send(SocketEvent::Closed { code, reason });
                    return;
                }
                None => {
                    // Worker dropped the handle
                    let _ = sink.close().await;
                    return;
                }
            },
            message = stream.next() => match message {
                Some(Ok(Message::Text(text))) => {
                    if events.send(SocketEvent::Text(text)).is_err() {
                        return;
                    }
                }
                Some(Ok(Message::Close(frame))) => {
                    let (code, reason) = frame
                        .map(|cf| (u16::from(cf.code), cf.reason.to_string()))
                        .unwrap_or((1005, String::new()));
                    let _ = events.send(SocketEvent::Closed { code, reason });
                    return;
                }
                Some(Ok(_)) => {
                    // Binary, ping/pong and raw frames are not part of the protocol
                }
                Some(Err(e)) => {
                    let _ = events.send(SocketEvent::Error(e.to_string()));
                    let _ = events.send(SocketEvent::abnormal_close("read failed"));
                    return;
                }
                None => {
                    let _ = events.send(SocketEvent::abnormal_close("stream ended"));
                    return;
                }
            },
        }
    }
}
