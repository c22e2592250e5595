//! Transport Channel
//!
//! Owns the socket connection inside its own task. Callers hold a
//! [`TransportChannel`] handle and talk to the worker through commands;
//! everything the worker has to say comes back as [`ChannelEvent`]s.
//!
//! The worker is a single `select!` loop over four sources: commands, the
//! current socket, the pending reconnect timer and the demo ticker. Timers
//! are plain optional fields, so cancelling one is just clearing it.

use chrono::Utc;
use std::pin::Pin;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, Interval, Sleep};

use super::demo;
use super::error::{TransportError, TransportResult};
use super::events::{ChannelCommand, ChannelConfig, ChannelEvent, ConnectionState, ErrorCode};
use super::frames::{parse_server_frame, ClientFrame, OutboundFrame, ServerFrame};
use super::socket::{Connector, SocketCommand, SocketEvent, SocketHandle, NORMAL_CLOSURE};

/// Handle to a running transport worker
pub struct TransportChannel {
    commands: mpsc::UnboundedSender<ChannelCommand>,
    task: JoinHandle<()>,
}

impl TransportChannel {
    /// Spawn a worker that reports on `events`
    pub fn spawn(connector: Arc<dyn Connector>, events: mpsc::UnboundedSender<ChannelEvent>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let worker = ChannelWorker::new(connector, events);
        let task = tokio::spawn(worker.run(rx));

        Self { commands: tx, task }
    }

    /// Connect (or start demo mode) with the given settings
    pub fn init(&self, config: ChannelConfig) -> TransportResult<()> {
        self.command(ChannelCommand::Init { config })
    }

    /// Send a chat message to the remote
    pub fn send(&self, frame: OutboundFrame) -> TransportResult<()> {
        self.command(ChannelCommand::Send { frame })
    }

    /// Close the connection and forget reconnect state
    pub fn disconnect(&self) -> TransportResult<()> {
        self.command(ChannelCommand::Disconnect)
    }

    /// Send a `PING`
    pub fn healthcheck(&self) -> TransportResult<()> {
        self.command(ChannelCommand::Healthcheck)
    }

    /// Whether the worker task is still alive
    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }

    /// Stop the worker and wait for it to exit
    pub async fn shutdown(self) {
        let _ = self.commands.send(ChannelCommand::Shutdown);
        if let Err(e) = self.task.await {
            tracing::warn!(error = %e, "Transport worker exited abnormally");
        }
    }

    fn command(&self, command: ChannelCommand) -> TransportResult<()> {
        self.commands
            .send(command)
            .map_err(|_| TransportError::WorkerGone)
    }
}

/// One unit of work for the worker loop
enum Step {
    Command(Option<ChannelCommand>),
    Socket(Option<SocketEvent>),
    Reconnect,
    DemoTick,
}

struct ChannelWorker {
    connector: Arc<dyn Connector>,
    events: mpsc::UnboundedSender<ChannelEvent>,
    config: Option<ChannelConfig>,
    state: ConnectionState,
    attempts: u32,
    socket: Option<SocketHandle>,
    reconnect: Option<Pin<Box<Sleep>>>,
    demo: Option<Interval>,
}

impl ChannelWorker {
    fn new(connector: Arc<dyn Connector>, events: mpsc::UnboundedSender<ChannelEvent>) -> Self {
        Self {
            connector,
            events,
            config: None,
            state: ConnectionState::Disconnected,
            attempts: 0,
            socket: None,
            reconnect: None,
            demo: None,
        }
    }

    async fn run(mut self, mut commands: mpsc::UnboundedReceiver<ChannelCommand>) {
        loop {
            let step = tokio::select! {
                command = commands.recv() => Step::Command(command),
                event = next_socket_event(&mut self.socket) => Step::Socket(event),
                () = wait_for(&mut self.reconnect) => Step::Reconnect,
                () = next_tick(&mut self.demo) => Step::DemoTick,
            };

            match step {
                Step::Command(None) | Step::Command(Some(ChannelCommand::Shutdown)) => {
                    self.teardown();
                    break;
                }
                Step::Command(Some(command)) => self.handle_command(command),
                Step::Socket(Some(event)) => self.handle_socket_event(event),
                Step::Socket(None) => {
                    self.handle_socket_event(SocketEvent::abnormal_close("socket task ended"))
                }
                Step::Reconnect => {
                    self.reconnect = None;
                    self.retry();
                }
                Step::DemoTick => self.dispatch(&demo::synthesize_frame()),
            }
        }

        tracing::debug!("Transport worker stopped");
    }

    fn handle_command(&mut self, command: ChannelCommand) {
        match command {
            ChannelCommand::Init { config } => self.init(config),
            ChannelCommand::Send { frame } => self.send(frame),
            ChannelCommand::Disconnect => self.disconnect(),
            ChannelCommand::Healthcheck => self.healthcheck(),
            ChannelCommand::Shutdown => self.teardown(),
        }
    }

    fn init(&mut self, config: ChannelConfig) {
        self.reconnect = None;
        self.demo = None;
        self.drop_socket();

        let demo_mode = config.is_demo();
        let enable_demo = config.enable_demo;
        let url = config.endpoint_url.clone();
        let demo_interval = config.demo_interval();
        self.config = Some(config);

        if demo_mode {
            if enable_demo {
                self.start_demo(demo_interval);
            } else {
                tracing::warn!("No endpoint configured and demo mode disabled; transport idle");
                self.state = ConnectionState::Disconnected;
            }
            return;
        }

        self.open_socket(&url);
    }

    fn open_socket(&mut self, url: &str) {
        tracing::info!(url = %url, attempt = self.attempts, "Connecting");
        self.state = ConnectionState::Connecting;
        self.socket = Some(self.connector.open(url));
    }

    fn start_demo(&mut self, period: std::time::Duration) {
        tracing::info!(interval_ms = period.as_millis() as u64, "Starting demo mode");
        self.state = ConnectionState::Connected;
        self.attempts = 0;
        self.demo = Some(tokio::time::interval_at(Instant::now() + period, period));
        self.emit(ChannelEvent::ConnectionStatus { connected: true });
    }

    fn retry(&mut self) {
        let Some(url) = self.config.as_ref().map(|c| c.endpoint_url.clone()) else {
            return;
        };
        self.open_socket(&url);
    }

    fn send(&mut self, frame: OutboundFrame) {
        if self.state != ConnectionState::Connected {
            self.emit(ChannelEvent::error(
                ErrorCode::NotConnected,
                "Cannot send message: not connected",
            ));
            return;
        }

        let message_id = frame.message_id.clone();

        if self.socket.is_some() {
            let text = match (ClientFrame::Message { payload: frame }).to_text() {
                Ok(text) => text,
                Err(e) => {
                    self.emit(ChannelEvent::error(ErrorCode::WsError, e.to_string()));
                    return;
                }
            };
            if !self.write(text) {
                self.emit(ChannelEvent::error(
                    ErrorCode::NotConnected,
                    "Cannot send message: socket closed",
                ));
                return;
            }
        }
        // Demo mode has no socket; the send is acknowledged locally

        self.emit(ChannelEvent::MessageSent {
            message_id,
            timestamp: Utc::now().timestamp_millis(),
        });
    }

    fn healthcheck(&mut self) {
        if self.state != ConnectionState::Connected {
            self.emit(ChannelEvent::error(
                ErrorCode::NotConnected,
                "Cannot ping: not connected",
            ));
            return;
        }

        if self.socket.is_none() {
            // Demo mode answers its own ping
            self.dispatch(r#"{"type":"PONG"}"#);
            return;
        }

        match ClientFrame::Ping.to_text() {
            Ok(text) => {
                self.write(text);
            }
            Err(e) => self.emit(ChannelEvent::error(ErrorCode::WsError, e.to_string())),
        }
    }

    fn disconnect(&mut self) {
        self.reconnect = None;
        self.demo = None;

        if let Some(socket) = self.socket.take() {
            let _ = socket.outgoing.send(SocketCommand::Close {
                code: NORMAL_CLOSURE,
                reason: "Client disconnect".to_string(),
            });
        }

        self.config = None;
        self.attempts = 0;
        self.state = ConnectionState::Disconnected;
        tracing::info!("Disconnected");
        self.emit(ChannelEvent::ConnectionStatus { connected: false });
    }

    fn teardown(&mut self) {
        if self.socket.is_some() || self.demo.is_some() || self.reconnect.is_some() {
            self.disconnect();
        }
    }

    fn handle_socket_event(&mut self, event: SocketEvent) {
        match event {
            SocketEvent::Opened => self.on_open(),
            SocketEvent::Text(text) => self.dispatch(&text),
            SocketEvent::Error(message) => {
                tracing::warn!(error = %message, "WebSocket error");
                self.emit(ChannelEvent::error(ErrorCode::WsError, message));
            }
            SocketEvent::Closed { code, reason } => self.on_close(code, &reason),
        }
    }

    fn on_open(&mut self) {
        tracing::info!("Connected");
        self.state = ConnectionState::Connected;
        self.attempts = 0;
        self.emit(ChannelEvent::ConnectionStatus { connected: true });

        let token = self
            .config
            .as_ref()
            .and_then(|c| c.auth_token.clone())
            .filter(|t| !t.is_empty());
        if let Some(token) = token {
            match (ClientFrame::Auth { token }).to_text() {
                Ok(text) => {
                    self.write(text);
                }
                Err(e) => self.emit(ChannelEvent::error(ErrorCode::WsError, e.to_string())),
            }
        }
    }

    fn on_close(&mut self, code: u16, reason: &str) {
        self.socket = None;
        self.emit(ChannelEvent::ConnectionStatus { connected: false });

        if code == NORMAL_CLOSURE {
            tracing::info!(code, reason = %reason, "Connection closed");
            self.state = ConnectionState::Disconnected;
            return;
        }

        let policy = self
            .config
            .as_ref()
            .map(ChannelConfig::reconnect_policy)
            .unwrap_or_default();

        match policy.next_attempt(self.attempts) {
            Some(attempt) => {
                self.attempts = attempt;
                self.state = ConnectionState::Reconnecting;
                let delay = policy.delay_for(attempt);
                tracing::warn!(
                    code,
                    attempt,
                    max_attempts = policy.max_attempts,
                    delay_ms = delay.as_millis() as u64,
                    "Connection lost, scheduling reconnect"
                );
                self.emit(ChannelEvent::Reconnecting {
                    attempt,
                    max_attempts: policy.max_attempts,
                });
                self.reconnect = Some(Box::pin(tokio::time::sleep(delay)));
            }
            None => {
                tracing::error!(attempts = self.attempts, "Reconnect attempts exhausted");
                self.state = ConnectionState::Failed;
                self.emit(ChannelEvent::ConnectionFailed {
                    attempts: self.attempts,
                });
            }
        }
    }

    /// Parse one inbound text frame and forward what it carries
    fn dispatch(&mut self, text: &str) {
        let frame = match parse_server_frame(text) {
            Ok(Some(frame)) => frame,
            Ok(None) => {
                tracing::trace!("Dropping frame of unknown type");
                return;
            }
            Err(e) => {
                if self.logging_enabled() {
                    tracing::debug!(error = %e, "Dropping invalid frame");
                }
                return;
            }
        };

        let event = match frame {
            ServerFrame::Message(payload) => ChannelEvent::Message { payload },
            ServerFrame::AuthSuccess => ChannelEvent::AuthSuccess,
            ServerFrame::AuthFailed { reason } => ChannelEvent::error(
                ErrorCode::AuthFailed,
                reason.unwrap_or_else(|| "Authentication failed".to_string()),
            ),
            ServerFrame::Typing(payload) => ChannelEvent::Typing { payload },
            ServerFrame::Presence(payload) => ChannelEvent::Presence { payload },
            ServerFrame::ReadReceipt(payload) => ChannelEvent::ReadReceipt { payload },
            ServerFrame::Pong => ChannelEvent::Pong,
        };
        self.emit(event);
    }

    fn write(&mut self, text: String) -> bool {
        match &self.socket {
            Some(socket) => socket.outgoing.send(SocketCommand::Text(text)).is_ok(),
            None => false,
        }
    }

    fn drop_socket(&mut self) {
        if let Some(socket) = self.socket.take() {
            let _ = socket.outgoing.send(SocketCommand::Close {
                code: NORMAL_CLOSURE,
                reason: "Reinitializing".to_string(),
            });
        }
    }

    fn logging_enabled(&self) -> bool {
        self.config.as_ref().map_or(true, |c| c.enable_logging)
    }

    fn emit(&self, event: ChannelEvent) {
        let _ = self.events.send(event);
    }
}

async fn next_socket_event(socket: &mut Option<SocketHandle>) -> Option<SocketEvent> {
    match socket {
        Some(socket) => socket.incoming.recv().await,
        None => std::future::pending().await,
    }
}

async fn wait_for(timer: &mut Option<Pin<Box<Sleep>>>) {
    match timer {
        Some(sleep) => sleep.as_mut().await,
        None => std::future::pending().await,
    }
}

async fn next_tick(interval: &mut Option<Interval>) {
    match interval {
        Some(interval) => {
            interval.tick().await;
        }
        None => std::future::pending().await,
    }
}
