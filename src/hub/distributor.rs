//! Event Distribution Hub
//!
//! Owns the transport channel, validates every incoming message frame
//! and fans it out to registered subscribers. Frames arrive from two
//! sources: the transport worker's event stream, and raw frames posted on
//! the bus by other contexts.

use serde::Serialize;
use std::collections::BTreeMap;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use thiserror::Error;
use tokio::sync::{broadcast, mpsc, Mutex, RwLock};
use tokio::task::JoinHandle;

use super::bus::{BusEvent, EventBus};
use crate::transport::{
    ChannelConfig, ChannelEvent, ChannelOverrides, Connector, ConnectionState, FrameError,
    InboundFrame, OutboundFrame, RawFrame, TransportChannel, TransportError, WsConnector,
};

/// Unique identifier for a subscription
pub type SubscriptionId = u64;

/// Callback invoked with every validated frame
pub type Handler = Arc<dyn Fn(&InboundFrame) -> anyhow::Result<()> + Send + Sync>;

type Registry = Arc<RwLock<BTreeMap<SubscriptionId, Handler>>>;

/// Configuration for the event hub
#[derive(Debug, Clone)]
pub struct HubConfig {
    /// Settings handed to the transport channel on `start_listening`
    pub channel: ChannelConfig,
    /// Capacity of the event bus
    pub bus_capacity: usize,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            channel: ChannelConfig::default(),
            bus_capacity: 256,
        }
    }
}

/// Point-in-time view of the hub
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct HubStatus {
    pub listening: bool,
    pub connection_state: ConnectionState,
    pub subscribers: usize,
    /// Most recent error reported by the transport
    pub last_error: Option<String>,
}

impl HubStatus {
    pub fn is_connected(&self) -> bool {
        self.connection_state == ConnectionState::Connected
    }
}

/// Tasks alive while the hub is listening
struct Listening {
    channel: TransportChannel,
    ambient: JoinHandle<()>,
    pump: JoinHandle<()>,
}

/// Validates frames and hands them to every subscriber
#[derive(Clone)]
struct Fanout {
    subscribers: Registry,
    enable_logging: Arc<AtomicBool>,
}

impl Fanout {
    async fn ingest(&self, raw: RawFrame) -> Result<usize, FrameError> {
        match raw.validate() {
            Ok(frame) => Ok(self.deliver(&frame).await),
            Err(e) => {
                self.reject(&e);
                Err(e)
            }
        }
    }

    fn reject(&self, error: &FrameError) {
        if self.enable_logging.load(Ordering::Relaxed) {
            tracing::warn!(error = %error, "Dropping invalid frame");
        }
    }

    /// Invoke each subscriber once, returning how many succeeded
    async fn deliver(&self, frame: &InboundFrame) -> usize {
        // Snapshot so handlers may subscribe or unsubscribe without deadlocking
        let handlers: Vec<(SubscriptionId, Handler)> = self
            .subscribers
            .read()
            .await
            .iter()
            .map(|(id, handler)| (*id, Arc::clone(handler)))
            .collect();

        let mut delivered = 0;
        for (id, handler) in handlers {
            match std::panic::catch_unwind(AssertUnwindSafe(|| handler(frame))) {
                Ok(Ok(())) => delivered += 1,
                Ok(Err(e)) => {
                    tracing::warn!(subscription = id, error = %e, "Subscriber failed");
                }
                Err(_) => {
                    tracing::error!(subscription = id, "Subscriber panicked");
                }
            }
        }

        tracing::trace!(
            chat_id = %frame.chat_id,
            message_id = %frame.message_id,
            delivered,
            "Frame distributed"
        );
        delivered
    }
}

/// Central dispatcher between the transport and the rest of the client
pub struct EventHub {
    config: RwLock<HubConfig>,
    subscribers: Registry,
    next_id: AtomicU64,
    enable_logging: Arc<AtomicBool>,
    bus: EventBus,
    connector: Arc<dyn Connector>,
    listening: Mutex<Option<Listening>>,
    status: Arc<RwLock<HubStatus>>,
}

impl EventHub {
    /// Create a hub that connects over real WebSockets
    pub fn new(config: HubConfig) -> Self {
        Self::with_connector(config, Arc::new(WsConnector))
    }

    /// Create a hub that opens sockets through `connector`
    pub fn with_connector(config: HubConfig, connector: Arc<dyn Connector>) -> Self {
        Self {
            enable_logging: Arc::new(AtomicBool::new(config.channel.enable_logging)),
            bus: EventBus::new(config.bus_capacity),
            config: RwLock::new(config),
            subscribers: Arc::new(RwLock::new(BTreeMap::new())),
            next_id: AtomicU64::new(1),
            connector,
            listening: Mutex::new(None),
            status: Arc::new(RwLock::new(HubStatus::default())),
        }
    }

    fn fanout(&self) -> Fanout {
        Fanout {
            subscribers: Arc::clone(&self.subscribers),
            enable_logging: Arc::clone(&self.enable_logging),
        }
    }

    /// Begin receiving frames from both sources
    ///
    /// Calling this while already listening does nothing. If the
    /// transport cannot be initialized the hub keeps listening on the bus
    /// alone.
    pub async fn start_listening(&self, overrides: Option<ChannelOverrides>) {
        let mut listening = self.listening.lock().await;
        if listening.is_some() {
            tracing::debug!("Hub already listening");
            return;
        }

        let channel_config = {
            let mut config = self.config.write().await;
            if let Some(overrides) = overrides {
                config.channel.merge(overrides);
            }
            self.enable_logging
                .store(config.channel.enable_logging, Ordering::Relaxed);
            config.channel.clone()
        };

        let fanout = self.fanout();
        let ambient = tokio::spawn(listen_ambient(self.bus.subscribe(), fanout.clone()));

        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let channel = TransportChannel::spawn(Arc::clone(&self.connector), events_tx);
        let demo = channel_config.is_demo();
        if let Err(e) = channel.init(channel_config) {
            tracing::warn!(error = %e, "Transport unavailable, listening on the bus only");
        }
        let pump = tokio::spawn(pump_channel_events(events_rx, fanout, Arc::clone(&self.status)));

        self.status.write().await.listening = true;
        *listening = Some(Listening {
            channel,
            ambient,
            pump,
        });
        tracing::info!(demo, "Hub listening");
    }

    /// Stop both sources and tear the transport down
    pub async fn stop_listening(&self) {
        let Some(active) = self.listening.lock().await.take() else {
            return;
        };

        active.ambient.abort();
        let _ = active.ambient.await;
        let _ = active.channel.disconnect();
        active.channel.shutdown().await;
        // The pump ends once the worker drops its event sender
        if let Err(e) = active.pump.await {
            tracing::warn!(error = %e, "Event pump ended abnormally");
        }

        let mut status = self.status.write().await;
        status.listening = false;
        status.connection_state = ConnectionState::Disconnected;
        tracing::info!("Hub stopped listening");
    }

    pub async fn is_listening(&self) -> bool {
        self.listening.lock().await.is_some()
    }

    /// Register a handler for validated frames
    pub async fn subscribe<F>(&self, handler: F) -> Subscription
    where
        F: Fn(&InboundFrame) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.subscribers.write().await.insert(id, Arc::new(handler));
        tracing::debug!(subscription = id, "Subscriber registered");

        Subscription {
            id,
            registry: Arc::downgrade(&self.subscribers),
        }
    }

    pub async fn subscriber_count(&self) -> usize {
        self.subscribers.read().await.len()
    }

    /// Validate a frame and deliver it to every subscriber
    ///
    /// Returns how many subscribers handled the frame without failing.
    pub async fn emit(&self, frame: impl Into<RawFrame>) -> Result<usize, FrameError> {
        self.fanout().ingest(frame.into()).await
    }

    /// Forward an outbound frame to the transport
    pub async fn send_through_channel(&self, frame: OutboundFrame) -> Result<(), HubError> {
        let listening = self.listening.lock().await;
        let active = listening.as_ref().ok_or(HubError::NotListening)?;
        active.channel.send(frame)?;
        Ok(())
    }

    /// Ask the transport to ping the remote
    pub async fn healthcheck(&self) -> Result<(), HubError> {
        let listening = self.listening.lock().await;
        let active = listening.as_ref().ok_or(HubError::NotListening)?;
        active.channel.healthcheck()?;
        Ok(())
    }

    /// Announce a new message on the bus
    pub fn publish_new_message(&self, frame: InboundFrame) -> usize {
        self.bus.publish_new_message(frame)
    }

    /// Handle to the hub's event bus
    pub fn bus(&self) -> EventBus {
        self.bus.clone()
    }

    pub async fn status(&self) -> HubStatus {
        let mut status = self.status.read().await.clone();
        status.subscribers = self.subscribers.read().await.len();
        status
    }
}

/// Handle returned by [`EventHub::subscribe`]
pub struct Subscription {
    id: SubscriptionId,
    registry: Weak<RwLock<BTreeMap<SubscriptionId, Handler>>>,
}

impl Subscription {
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    /// Remove the handler; returns false if it was already gone
    pub async fn unsubscribe(self) -> bool {
        let Some(registry) = self.registry.upgrade() else {
            return false;
        };
        let removed = registry.write().await.remove(&self.id).is_some();
        if removed {
            tracing::debug!(subscription = self.id, "Subscriber removed");
        }
        removed
    }
}

/// Errors that can occur in hub operations
#[derive(Error, Debug)]
pub enum HubError {
    #[error("Hub is not listening")]
    NotListening,

    #[error(transparent)]
    Transport(#[from] TransportError),
}

async fn listen_ambient(mut rx: broadcast::Receiver<BusEvent>, fanout: Fanout) {
    loop {
        match rx.recv().await {
            // Rejections are logged by the fanout
            Ok(BusEvent::Posted(value)) => match RawFrame::from_value(value) {
                Ok(raw) => {
                    let _ = fanout.ingest(raw).await;
                }
                Err(e) => fanout.reject(&e),
            },
            Ok(BusEvent::NewMessage(_)) => {}
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "Ambient listener lagged behind the bus");
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}

async fn pump_channel_events(
    mut rx: mpsc::UnboundedReceiver<ChannelEvent>,
    fanout: Fanout,
    status: Arc<RwLock<HubStatus>>,
) {
    while let Some(event) = rx.recv().await {
        match event {
            ChannelEvent::Message { payload } => {
                fanout.deliver(&payload).await;
            }
            ChannelEvent::ConnectionStatus { connected } => {
                tracing::info!(connected, "Connection status changed");
                let mut status = status.write().await;
                status.connection_state = match (connected, status.connection_state) {
                    (true, _) => ConnectionState::Connected,
                    // A refused retry stays in the reconnect cycle
                    (false, ConnectionState::Reconnecting) => ConnectionState::Reconnecting,
                    (false, _) => ConnectionState::Disconnected,
                };
            }
            ChannelEvent::Reconnecting {
                attempt,
                max_attempts,
            } => {
                tracing::warn!(attempt, max_attempts, "Reconnecting");
                status.write().await.connection_state = ConnectionState::Reconnecting;
            }
            ChannelEvent::ConnectionFailed { attempts } => {
                tracing::error!(attempts, "Connection failed, giving up");
                let mut status = status.write().await;
                status.connection_state = ConnectionState::Failed;
                status.last_error = Some(format!("gave up after {} attempts", attempts));
            }
            ChannelEvent::Error { code, message } => {
                tracing::warn!(%code, %message, "Transport error");
                status.write().await.last_error = Some(format!("{}: {}", code, message));
            }
            ChannelEvent::AuthSuccess => tracing::info!("Authenticated"),
            ChannelEvent::MessageSent {
                message_id,
                timestamp,
            } => {
                tracing::debug!(%message_id, timestamp, "Message sent");
            }
            ChannelEvent::Pong => tracing::debug!("Pong"),
            ephemeral @ (ChannelEvent::Typing { .. }
            | ChannelEvent::Presence { .. }
            | ChannelEvent::ReadReceipt { .. }) => {
                tracing::trace!(event = ?ephemeral, "Ephemeral event");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::testing::ScriptedConnector;
    use crate::transport::MessageFrame;
    use serde_json::json;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    fn frame_json(message_id: &str) -> serde_json::Value {
        json!({
            "chatId": "c1", "messageId": message_id, "text": "hi",
            "senderId": "u2", "senderName": "Bo", "time": "10:00"
        })
    }

    fn endpoint_config() -> HubConfig {
        HubConfig {
            channel: ChannelConfig {
                endpoint_url: "ws://remote.test/socket".to_string(),
                reconnect_base_delay_ms: 10,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    fn counting(
        counter: &Arc<AtomicUsize>,
    ) -> impl Fn(&InboundFrame) -> anyhow::Result<()> + Send + Sync + 'static {
        let counter = Arc::clone(counter);
        move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    async fn recv_frame(rx: &mut mpsc::UnboundedReceiver<InboundFrame>) -> InboundFrame {
        tokio::time::timeout(Duration::from_secs(60), rx.recv())
            .await
            .expect("timed out waiting for frame")
            .expect("frame channel closed")
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_listening_is_idempotent() {
        let (connector, _peers) = ScriptedConnector::accepting();
        let hub = EventHub::with_connector(endpoint_config(), connector.clone());

        hub.start_listening(None).await;
        hub.start_listening(None).await;
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert_eq!(hub.bus().receiver_count(), 1);
        assert_eq!(connector.opens(), 1);
        let status = hub.status().await;
        assert!(status.listening);
        assert!(status.is_connected());

        hub.stop_listening().await;
        hub.stop_listening().await;
        assert!(!hub.status().await.listening);
    }

    #[tokio::test]
    async fn test_emit_validates_before_delivery() {
        let hub = EventHub::with_connector(HubConfig::default(), ScriptedConnector::accepting().0);
        let counter = Arc::new(AtomicUsize::new(0));
        let _sub = hub.subscribe(counting(&counter)).await;

        let mut incomplete = RawFrame::from_value(frame_json("m1")).unwrap();
        incomplete.sender_name = None;
        assert_eq!(
            hub.emit(incomplete).await,
            Err(FrameError::MissingField("senderName"))
        );
        assert_eq!(counter.load(Ordering::SeqCst), 0);

        let frame = MessageFrame::compose("c1", "hello", "u2", "Bo");
        assert_eq!(hub.emit(frame).await, Ok(1));
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failing_subscribers_are_isolated() {
        let hub = EventHub::with_connector(HubConfig::default(), ScriptedConnector::accepting().0);
        let counter = Arc::new(AtomicUsize::new(0));

        let _failing = hub.subscribe(|_| anyhow::bail!("handler rejected frame")).await;
        let _panicking = hub.subscribe(|_| panic!("handler blew up")).await;
        let _healthy = hub.subscribe(counting(&counter)).await;

        let frame = MessageFrame::compose("c1", "hello", "u2", "Bo");
        assert_eq!(hub.emit(frame.clone()).await, Ok(1));
        assert_eq!(hub.emit(frame).await, Ok(1));
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_unsubscribe_removes_only_that_handler() {
        let hub = EventHub::with_connector(HubConfig::default(), ScriptedConnector::accepting().0);
        let first = Arc::new(AtomicUsize::new(0));
        let second = Arc::new(AtomicUsize::new(0));

        let sub = hub.subscribe(counting(&first)).await;
        let _other = hub.subscribe(counting(&second)).await;
        assert_eq!(hub.subscriber_count().await, 2);

        assert!(sub.unsubscribe().await);
        hub.emit(MessageFrame::compose("c1", "x", "u2", "Bo"))
            .await
            .unwrap();

        assert_eq!(first.load(Ordering::SeqCst), 0);
        assert_eq!(second.load(Ordering::SeqCst), 1);
        assert_eq!(hub.status().await.subscribers, 1);
    }

    #[tokio::test]
    async fn test_send_requires_listening() {
        let hub = EventHub::with_connector(HubConfig::default(), ScriptedConnector::accepting().0);
        let frame = MessageFrame::compose("c1", "x", "me", "Me");
        assert!(matches!(
            hub.send_through_channel(frame).await,
            Err(HubError::NotListening)
        ));
        assert!(matches!(hub.healthcheck().await, Err(HubError::NotListening)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_channel_frames_reach_subscribers() {
        let (connector, mut peers) = ScriptedConnector::accepting();
        let hub = EventHub::with_connector(endpoint_config(), connector);
        let (tx, mut rx) = mpsc::unbounded_channel();
        let _sub = hub
            .subscribe(move |frame| {
                tx.send(frame.clone())?;
                Ok(())
            })
            .await;

        hub.start_listening(None).await;
        let mut peer = peers.recv().await.unwrap();

        peer.send_text(r#"{"type":"TYPING","payload":{"chatId":"c1"}}"#);
        peer.send_text(json!({"type": "MESSAGE", "payload": frame_json("m7")}).to_string());
        assert_eq!(recv_frame(&mut rx).await.message_id, "m7");
        assert!(rx.try_recv().is_err());

        let outbound = MessageFrame::compose("c1", "reply", "me", "Me");
        hub.send_through_channel(outbound.clone()).await.unwrap();
        let written = peer.next_text().await.unwrap();
        assert!(written.contains(&outbound.message_id));

        hub.stop_listening().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_posted_frames_survive_transport_failure() {
        let (connector, _peers) = ScriptedConnector::refusing();
        let hub = EventHub::with_connector(endpoint_config(), connector);
        let (tx, mut rx) = mpsc::unbounded_channel();
        let _sub = hub
            .subscribe(move |frame| {
                tx.send(frame.clone())?;
                Ok(())
            })
            .await;

        hub.start_listening(None).await;
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(hub.status().await.connection_state, ConnectionState::Failed);

        let bus = hub.bus();
        bus.post(json!({"chatId": "c1", "text": "partial"}));
        bus.post(frame_json("m9"));
        assert_eq!(recv_frame(&mut rx).await.message_id, "m9");
        assert!(rx.try_recv().is_err());

        hub.stop_listening().await;
        assert_eq!(bus.post(frame_json("m10")), 0);
    }

    /// Log sink shared between the test and a scoped subscriber
    #[derive(Clone, Default)]
    struct CapturedLogs(Arc<std::sync::Mutex<Vec<u8>>>);

    impl CapturedLogs {
        fn install(&self) -> tracing::subscriber::DefaultGuard {
            let sink = self.clone();
            let subscriber = tracing_subscriber::fmt()
                .with_writer(move || sink.clone())
                .with_ansi(false)
                .with_max_level(tracing::Level::TRACE)
                .finish();
            tracing::subscriber::set_default(subscriber)
        }

        fn count(&self, needle: &str) -> usize {
            String::from_utf8_lossy(&self.0.lock().unwrap())
                .matches(needle)
                .count()
        }
    }

    impl std::io::Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    async fn post_rejected_then_valid(enable_logging: bool) -> CapturedLogs {
        let logs = CapturedLogs::default();
        let _guard = logs.install();

        let mut config = endpoint_config();
        config.channel.enable_logging = enable_logging;
        let hub = EventHub::with_connector(config, ScriptedConnector::accepting().0);
        let (tx, mut rx) = mpsc::unbounded_channel();
        let _sub = hub
            .subscribe(move |frame| {
                tx.send(frame.clone())?;
                Ok(())
            })
            .await;
        hub.start_listening(None).await;

        let bus = hub.bus();
        bus.post(json!("not a frame"));
        bus.post(json!({"chatId": "c1", "text": "partial"}));
        bus.post(frame_json("m11"));
        // The bus is ordered, so both rejections were handled first
        assert_eq!(recv_frame(&mut rx).await.message_id, "m11");
        assert!(rx.try_recv().is_err());

        hub.stop_listening().await;
        logs
    }

    #[tokio::test(start_paused = true)]
    async fn test_posted_rejections_logged_once_when_enabled() {
        let logs = post_rejected_then_valid(true).await;
        assert_eq!(logs.count("Dropping invalid frame"), 2);
        assert_eq!(logs.count("Malformed frame"), 1);
        assert_eq!(logs.count("Missing required field"), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_posted_rejections_silent_when_logging_disabled() {
        let logs = post_rejected_then_valid(false).await;
        assert_eq!(logs.count("Dropping invalid frame"), 0);
        assert_eq!(logs.count("Malformed frame"), 0);
        assert_eq!(logs.count("Missing required field"), 0);
    }

    async fn replay(events: Vec<ChannelEvent>) -> HubStatus {
        let status = Arc::new(RwLock::new(HubStatus::default()));
        let fanout = Fanout {
            subscribers: Arc::new(RwLock::new(BTreeMap::new())),
            enable_logging: Arc::new(AtomicBool::new(false)),
        };
        let (tx, rx) = mpsc::unbounded_channel();
        for event in events {
            tx.send(event).unwrap();
        }
        drop(tx);
        pump_channel_events(rx, fanout, Arc::clone(&status)).await;
        let snapshot = status.read().await.clone();
        snapshot
    }

    #[tokio::test]
    async fn test_refused_retry_keeps_reconnecting_state() {
        let status = replay(vec![
            ChannelEvent::ConnectionStatus { connected: false },
            ChannelEvent::Reconnecting {
                attempt: 1,
                max_attempts: 5,
            },
            ChannelEvent::ConnectionStatus { connected: false },
        ])
        .await;
        assert_eq!(status.connection_state, ConnectionState::Reconnecting);

        let status = replay(vec![
            ChannelEvent::Reconnecting {
                attempt: 1,
                max_attempts: 5,
            },
            ChannelEvent::ConnectionStatus { connected: true },
            ChannelEvent::ConnectionStatus { connected: false },
        ])
        .await;
        assert_eq!(status.connection_state, ConnectionState::Disconnected);
    }

    #[tokio::test(start_paused = true)]
    async fn test_status_stays_reconnecting_between_attempts() {
        let (connector, _peers) = ScriptedConnector::refusing();
        let mut config = endpoint_config();
        config.channel.reconnect_base_delay_ms = 1_000;
        let hub = EventHub::with_connector(config, connector.clone());

        hub.start_listening(None).await;
        // Attempts fire at 1s, 3s, 6s and 10s; sample across them
        let mut seen = Vec::new();
        for _ in 0..28 {
            tokio::time::sleep(Duration::from_millis(500)).await;
            seen.push(hub.status().await.connection_state);
        }

        assert!(connector.opens() > 2);
        assert!(seen.iter().all(|state| *state == ConnectionState::Reconnecting));

        hub.stop_listening().await;
        assert_eq!(
            hub.status().await.connection_state,
            ConnectionState::Disconnected
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_demo_frames_reach_subscribers() {
        let (connector, _peers) = ScriptedConnector::accepting();
        let hub = EventHub::with_connector(HubConfig::default(), connector);
        let (tx, mut rx) = mpsc::unbounded_channel();
        let _sub = hub
            .subscribe(move |frame| {
                tx.send(frame.clone())?;
                Ok(())
            })
            .await;

        hub.start_listening(Some(ChannelOverrides {
            enable_demo: Some(true),
            ..Default::default()
        }))
        .await;

        let frame = recv_frame(&mut rx).await;
        assert!(frame.chat_id.starts_with("demo-chat-"));
        hub.healthcheck().await.unwrap();

        hub.stop_listening().await;
    }
}
