//! Transport Channel
//!
//! Owns the live socket to the messaging endpoint and keeps it alive
//! across disconnects.
//!
//! ## Architecture
//!
//! - **TransportChannel**: handle to a worker task that owns the socket
//! - **Frames**: wire format and payload validation
//! - **Events**: commands in, events out, all plain serializable values
//! - **Connector**: seam between the worker and the actual WebSocket
//!
//! ## Connection lifecycle
//!
//! ```text
//! Disconnected --init--> Connecting --open--> Connected --close 1000--> Disconnected
//!                            ^                    |
//!                            |              unclean close
//!                            |                    v
//!                            +----retry----- Reconnecting --budget spent--> Failed
//! ```
//!
//! With no endpoint configured the worker runs in demo mode instead,
//! reporting itself connected and synthesizing a message every 30 seconds.

mod backoff;
mod channel;
mod demo;
mod error;
mod events;
mod frames;
mod socket;

pub use backoff::ReconnectPolicy;
pub use channel::TransportChannel;
pub use demo::{demo_chat_id, DEMO_CHAT_COUNT};
pub use error::{TransportError, TransportResult};
pub use events::{
    ChannelCommand, ChannelConfig, ChannelEvent, ChannelOverrides, ConnectionState, ErrorCode,
};
pub use frames::{
    parse_server_frame, ClientFrame, FrameError, InboundFrame, MessageFrame, OutboundFrame,
    RawFrame, ServerFrame,
};
pub use socket::{
    Connector, SocketCommand, SocketEvent, SocketHandle, WsConnector, ABNORMAL_CLOSURE,
    NORMAL_CLOSURE,
};

#[cfg(test)]
pub(crate) use socket::testing;
