//! Event Bus
//!
//! Typed publish/subscribe channel owned by the hub. It carries two kinds
//! of traffic: raw frames posted by embedding contexts (the ambient
//! channel), and the application-wide "new message" notification that
//! the UI and the response simulator both listen to.

use serde_json::Value;
use tokio::sync::broadcast;

use crate::transport::MessageFrame;

/// Traffic carried on the bus
#[derive(Debug, Clone, PartialEq)]
pub enum BusEvent {
    /// An unchecked frame posted from another context
    Posted(Value),
    /// A message was sent locally or received and persisted
    NewMessage(MessageFrame),
}

/// Broadcast bus shared by the hub, the simulator and the UI
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<BusEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Post a raw frame on the ambient channel
    ///
    /// Returns the number of listeners that will see it.
    pub fn post(&self, frame: Value) -> usize {
        self.tx.send(BusEvent::Posted(frame)).unwrap_or(0)
    }

    /// Announce a new message to every listener
    pub fn publish_new_message(&self, frame: MessageFrame) -> usize {
        tracing::trace!(
            chat_id = %frame.chat_id,
            message_id = %frame.message_id,
            "Publishing new message"
        );
        self.tx.send(BusEvent::NewMessage(frame)).unwrap_or(0)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<BusEvent> {
        self.tx.subscribe()
    }

    /// Number of live receivers
    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_publish_without_listeners() {
        let bus = EventBus::default();
        assert_eq!(bus.post(json!({})), 0);
        assert_eq!(bus.receiver_count(), 0);
    }

    #[tokio::test]
    async fn test_listeners_see_both_kinds() {
        let bus = EventBus::new(8);
        let mut rx = bus.subscribe();

        bus.post(json!({"chatId": "c1"}));
        let frame = MessageFrame::compose("c1", "hi", "me", "Me");
        assert_eq!(bus.publish_new_message(frame.clone()), 1);

        assert_eq!(rx.recv().await.unwrap(), BusEvent::Posted(json!({"chatId": "c1"})));
        assert_eq!(rx.recv().await.unwrap(), BusEvent::NewMessage(frame));
    }
}
