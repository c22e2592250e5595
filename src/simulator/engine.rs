//! Response Simulator
//!
//! Generates believable inbound traffic with no live counterpart: a
//! delayed reply to every locally-sent message, plus unsolicited messages
//! dropped into random conversations on a fixed interval.

use rand::seq::IndexedRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, Mutex};

use super::phrases::{random_phrase, reply_text};
use super::sender::{pool_sender, resolve_sender, SyntheticSender};
use crate::hub::{BusEvent, EventBus};
use crate::store::{ChatStore, MessageReceiver, StoreResult};
use crate::timer::{TimerHandle, TimerSet};
use crate::transport::MessageFrame;

/// Configuration for the response simulator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulatorConfig {
    /// Messages from this sender are treated as locally originated
    pub local_user_id: String,
    pub min_delay_ms: u64,
    pub max_delay_ms: u64,
    pub auto_send_interval_ms: u64,
    pub auto_send_enabled: bool,
    pub start_paused: bool,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            local_user_id: "me".to_string(),
            min_delay_ms: 1000,
            max_delay_ms: 3000,
            auto_send_interval_ms: 30_000,
            auto_send_enabled: true,
            start_paused: false,
        }
    }
}

impl SimulatorConfig {
    /// Uniform draw from the reply window
    pub fn reply_delay(&self) -> Duration {
        let low = self.min_delay_ms.min(self.max_delay_ms);
        let high = self.min_delay_ms.max(self.max_delay_ms);
        Duration::from_millis(rand::rng().random_range(low..=high))
    }

    pub fn auto_send_interval(&self) -> Duration {
        Duration::from_millis(self.auto_send_interval_ms)
    }
}

/// Long-lived tasks owned by a started simulator
#[derive(Default)]
struct Tasks {
    listener: Option<TimerHandle>,
    auto_send: Option<TimerHandle>,
}

struct Inner {
    bus: EventBus,
    chats: Arc<dyn ChatStore>,
    receiver: Arc<dyn MessageReceiver>,
    config: SimulatorConfig,
    paused: AtomicBool,
    tasks: Mutex<Tasks>,
    reply_timers: TimerSet,
}

/// Traffic generator driven by "new message" events on the bus
#[derive(Clone)]
pub struct ResponseSimulator {
    inner: Arc<Inner>,
}

impl ResponseSimulator {
    pub fn new(
        bus: EventBus,
        chats: Arc<dyn ChatStore>,
        receiver: Arc<dyn MessageReceiver>,
        config: SimulatorConfig,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                bus,
                chats,
                receiver,
                paused: AtomicBool::new(config.start_paused),
                config,
                tasks: Mutex::new(Tasks::default()),
                reply_timers: TimerSet::new(),
            }),
        }
    }

    /// Attach to the bus and start the auto-send timer
    ///
    /// A second call replaces the first call's listener and timer rather
    /// than adding to them.
    pub async fn start(&self) {
        let mut tasks = self.inner.tasks.lock().await;
        if let Some(stale) = tasks.listener.take() {
            stale.cancel();
        }
        if let Some(stale) = tasks.auto_send.take() {
            stale.cancel();
        }

        // Subscribe before spawning so nothing published after start() is missed
        let rx = self.inner.bus.subscribe();
        tasks.listener = Some(TimerHandle::spawn(listen(Arc::clone(&self.inner), rx)));

        if self.inner.config.auto_send_enabled {
            let inner = Arc::clone(&self.inner);
            tasks.auto_send = Some(TimerHandle::every(
                self.inner.config.auto_send_interval(),
                move || {
                    let inner = Arc::clone(&inner);
                    async move { inner.auto_send().await }
                },
            ));
        }

        tracing::info!(
            auto_send = self.inner.config.auto_send_enabled,
            paused = self.is_paused(),
            "Response simulator started"
        );
    }

    /// Detach from the bus and cancel every pending timer
    pub async fn stop(&self) {
        let mut tasks = self.inner.tasks.lock().await;
        if let Some(listener) = tasks.listener.take() {
            listener.cancel();
        }
        if let Some(auto_send) = tasks.auto_send.take() {
            auto_send.cancel();
        }
        let cancelled = self.inner.reply_timers.cancel_all().await;
        tracing::info!(cancelled_replies = cancelled, "Response simulator stopped");
    }

    pub async fn is_running(&self) -> bool {
        self.inner.tasks.lock().await.listener.is_some()
    }

    pub fn pause(&self) {
        self.inner.paused.store(true, Ordering::SeqCst);
        tracing::debug!("Response simulator paused");
    }

    pub fn resume(&self) {
        self.inner.paused.store(false, Ordering::SeqCst);
        tracing::debug!("Response simulator resumed");
    }

    /// Flip the pause flag, returning whether the simulator is now paused
    pub fn toggle(&self) -> bool {
        let paused = !self.inner.paused.fetch_xor(true, Ordering::SeqCst);
        tracing::debug!(paused, "Response simulator toggled");
        paused
    }

    pub fn is_paused(&self) -> bool {
        self.inner.is_paused()
    }

    /// Replies scheduled but not yet delivered
    pub async fn pending_replies(&self) -> usize {
        self.inner.reply_timers.len().await
    }
}

impl Inner {
    fn is_paused(&self) -> bool {
        self.paused.load(Ordering::SeqCst)
    }

    async fn on_new_message(self: &Arc<Self>, frame: MessageFrame) {
        if frame.sender_id != self.config.local_user_id {
            return;
        }
        if self.is_paused() {
            tracing::debug!(chat_id = %frame.chat_id, "Paused, not replying");
            return;
        }

        let delay = self.config.reply_delay();
        tracing::debug!(
            chat_id = %frame.chat_id,
            delay_ms = delay.as_millis() as u64,
            "Scheduling reply"
        );
        let inner = Arc::clone(self);
        self.reply_timers
            .schedule(delay, async move { inner.reply_to(frame).await })
            .await;
    }

    async fn reply_to(&self, original: MessageFrame) {
        // Pausing after scheduling still suppresses the reply
        if self.is_paused() {
            tracing::debug!(chat_id = %original.chat_id, "Paused, dropping reply");
            return;
        }

        let sender = self.sender_for(&original.chat_id).await;
        let reply = MessageFrame::compose(
            &original.chat_id,
            reply_text(&original.text),
            sender.id,
            sender.name,
        );
        if let Err(e) = self.deliver(reply, false).await {
            tracing::error!(chat_id = %original.chat_id, error = %e, "Failed to deliver reply");
        }
    }

    async fn auto_send(&self) {
        if self.is_paused() {
            tracing::trace!("Paused, skipping auto-send");
            return;
        }
        if let Err(e) = self.try_auto_send().await {
            tracing::error!(error = %e, "Auto-send failed");
        }
    }

    async fn try_auto_send(&self) -> StoreResult<()> {
        let chats = self.chats.list_chats().await?;
        let chat = chats.choose(&mut rand::rng()).cloned();
        let Some(chat) = chat else {
            tracing::debug!("No chats to auto-send into");
            return Ok(());
        };

        let sender = resolve_sender(&chat, &self.config.local_user_id);
        let frame = MessageFrame::compose(&chat.id, random_phrase(), sender.id, sender.name);
        self.deliver(frame, true).await
    }

    async fn sender_for(&self, chat_id: &str) -> SyntheticSender {
        match self.chats.get_chat(chat_id).await {
            Ok(Some(chat)) => resolve_sender(&chat, &self.config.local_user_id),
            Ok(None) => pool_sender(),
            Err(e) => {
                tracing::warn!(chat_id, error = %e, "Chat lookup failed, using fallback sender");
                pool_sender()
            }
        }
    }

    /// Persist a generated message and announce it
    async fn deliver(&self, frame: MessageFrame, count_unread: bool) -> StoreResult<()> {
        let stored = self.receiver.receive_message(frame).await?;
        if count_unread {
            self.chats.increment_unread(&stored.chat_id).await?;
        }
        tracing::debug!(
            chat_id = %stored.chat_id,
            sender = %stored.sender_name,
            "Synthetic message delivered"
        );
        self.bus.publish_new_message(stored);
        Ok(())
    }
}

async fn listen(inner: Arc<Inner>, mut rx: broadcast::Receiver<BusEvent>) {
    loop {
        match rx.recv().await {
            Ok(BusEvent::NewMessage(frame)) => inner.on_new_message(frame).await,
            Ok(BusEvent::Posted(_)) => {}
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "Simulator lagged behind the bus");
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}
