//! Response Simulator
//!
//! Stands in for the people on the other end of each conversation. It
//! listens for `NewMessage` events on the hub's bus and answers the local
//! user's messages after a short random delay, and it periodically drops
//! unsolicited messages into random chats. Every generated message goes
//! through the same persistence use case and bus notification as real
//! traffic.

pub mod engine;
pub mod phrases;
pub mod sender;

pub use engine::{ResponseSimulator, SimulatorConfig};
pub use sender::{resolve_sender, SyntheticSender};
