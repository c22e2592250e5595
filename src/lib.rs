//! # Parley
//!
//! Transport and event-distribution core of a real-time messaging client.
//!
//! ## Features
//!
//! - **Resilient transport**: a WebSocket worker task with bounded,
//!   linearly backed-off reconnects and a demo mode for offline use
//! - **Validated fan-out**: inbound frames are checked once and delivered
//!   to every subscriber, with each subscriber's failure isolated
//! - **Simulated traffic**: delayed replies and unsolicited messages that
//!   can be paused, resumed and stopped cleanly
//!
//! ## Modules
//!
//! - [`transport`]: socket ownership, reconnection and wire frames
//! - [`hub`]: validation, subscriber fan-out and the event bus
//! - [`simulator`]: synthetic replies and auto-sent messages
//! - [`store`]: persistence collaborators the simulator writes through
//! - [`timer`]: cancellable one-shot and periodic tasks
//! - [`config`]: TOML and environment configuration
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use parley::hub::{EventHub, HubConfig};
//! use parley::simulator::{ResponseSimulator, SimulatorConfig};
//! use parley::store::MemoryStore;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() {
//!     let store = Arc::new(MemoryStore::seeded("me").await);
//!     let hub = EventHub::new(HubConfig::default());
//!
//!     let _subscription = hub
//!         .subscribe(|frame| {
//!             println!("{}: {}", frame.sender_name, frame.text);
//!             Ok(())
//!         })
//!         .await;
//!
//!     // No endpoint configured, so the transport runs in demo mode
//!     hub.start_listening(None).await;
//!
//!     let simulator = ResponseSimulator::new(
//!         hub.bus(),
//!         store.clone(),
//!         store.clone(),
//!         SimulatorConfig::default(),
//!     );
//!     simulator.start().await;
//!
//!     tokio::signal::ctrl_c().await.ok();
//!     simulator.stop().await;
//!     hub.stop_listening().await;
//! }
//! ```

pub mod config;
pub mod hub;
pub mod simulator;
pub mod store;
pub mod timer;
pub mod transport;

// Re-export top-level types for convenience
pub use config::{Config, ConfigError, LoggingConfig};

pub use hub::{BusEvent, EventBus, EventHub, HubConfig, HubError, HubStatus, Subscription};

pub use simulator::{ResponseSimulator, SimulatorConfig};

pub use store::{ChatStore, ChatSummary, MemoryStore, MessageReceiver, StoreError, StoreResult};

pub use transport::{
    ChannelConfig, ChannelEvent, ChannelOverrides, ConnectionState, FrameError, MessageFrame,
    RawFrame, TransportChannel, TransportError,
};
