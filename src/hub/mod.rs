//! Event Distribution
//!
//! The hub sits between the transport channel and everything that cares
//! about incoming messages:
//!
//! ```text
//! TransportChannel ──events──┐
//!                            ├─▶ validate ─▶ subscriber 1..n
//! EventBus (posted frames) ──┘
//! ```
//!
//! The same [`EventBus`] carries the `NewMessage` notification that the
//! response simulator reacts to.

pub mod bus;
pub mod distributor;

pub use bus::{BusEvent, EventBus};
pub use distributor::{
    EventHub, Handler, HubConfig, HubError, HubStatus, Subscription, SubscriptionId,
};
