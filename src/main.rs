//! Parley
//!
//! Terminal front end for the messaging transport. Lines typed on stdin
//! are sent to the current chat; simulated replies, demo traffic and
//! anything the endpoint delivers are printed as they arrive.
//!
//! Run with: cargo run -- [--endpoint wss://...] [--token ...]
//!
//! Commands:
//! - `/chats`: list conversations
//! - `/chat <id>`: switch the current conversation
//! - `/pause`, `/resume`, `/toggle`: control the response simulator
//! - `/status`: show the hub status
//! - `/ping`: send a healthcheck
//! - `/quit`: exit (Ctrl-C also works)

use clap::Parser;
use parley::config::{generate_default_config, Config, LoggingConfig};
use parley::hub::{BusEvent, EventHub};
use parley::simulator::ResponseSimulator;
use parley::store::{ChatStore, MemoryStore, MessageReceiver};
use parley::transport::{demo_chat_id, MessageFrame};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::{broadcast, mpsc};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "parley")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Real-time messaging client with a built-in response simulator")]
struct Cli {
    /// Path to a TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// WebSocket endpoint (overrides config)
    #[arg(long)]
    endpoint: Option<String>,

    /// Auth token sent once connected
    #[arg(long)]
    token: Option<String>,

    /// Start with the response simulator paused
    #[arg(long)]
    paused: bool,

    /// Print a default config file and exit
    #[arg(long)]
    print_config: bool,
}

/// What the terminal is currently looking at
struct Session {
    chat_id: String,
    local_user_id: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    if cli.print_config {
        print!("{}", generate_default_config());
        return Ok(());
    }

    let mut config = match &cli.config {
        Some(path) => Config::load_with_env(path)?,
        None => Config::load_default(),
    };
    if let Some(endpoint) = cli.endpoint {
        config.transport.endpoint_url = endpoint;
    }
    if let Some(token) = cli.token {
        config.transport.auth_token = Some(token);
    }
    if cli.paused {
        config.simulator.start_paused = true;
    }

    init_logging(&config.logging);
    tracing::info!("Starting Parley v{}", env!("CARGO_PKG_VERSION"));

    let store = Arc::new(MemoryStore::seeded(&config.simulator.local_user_id).await);
    let hub = Arc::new(EventHub::new(config.hub_config()));
    let simulator = ResponseSimulator::new(
        hub.bus(),
        store.clone(),
        store.clone(),
        config.simulator_config(),
    );

    // Handlers run synchronously; persistence happens on the main loop
    let (inbound_tx, mut inbound_rx) = mpsc::unbounded_channel();
    let subscription = hub
        .subscribe(move |frame| {
            inbound_tx.send(frame.clone())?;
            Ok(())
        })
        .await;

    let mut feed = hub.bus().subscribe();
    hub.start_listening(None).await;
    simulator.start().await;

    let mut session = Session {
        chat_id: demo_chat_id(1),
        local_user_id: config.simulator.local_user_id.clone(),
    };
    println!("Chatting in {} (type /chats to list, /quit to exit)", session.chat_id);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                tracing::info!("Received Ctrl-C");
                break;
            }
            Some(frame) = inbound_rx.recv() => {
                receive_inbound(&store, &hub, frame).await;
            }
            event = feed.recv() => match event {
                Ok(BusEvent::NewMessage(frame)) => render(&frame, &session),
                Ok(BusEvent::Posted(_)) => {}
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Message feed lagged");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },
            line = lines.next_line(), if stdin_open => match line? {
                Some(line) => {
                    if !handle_line(line.trim(), &mut session, &store, &hub, &simulator).await? {
                        break;
                    }
                }
                None => {
                    tracing::debug!("stdin closed, waiting for Ctrl-C");
                    stdin_open = false;
                }
            },
        }
    }

    tracing::info!("Shutting down...");
    subscription.unsubscribe().await;
    simulator.stop().await;
    hub.stop_listening().await;
    tracing::info!("Parley shutdown complete");
    Ok(())
}

fn init_logging(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("parley={}", logging.level)));
    let registry = tracing_subscriber::registry().with(filter);

    if logging.is_json() {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

/// Persist a frame delivered by the hub and announce it
async fn receive_inbound(store: &MemoryStore, hub: &EventHub, frame: MessageFrame) {
    let chat_id = frame.chat_id.clone();
    let stored = match store.receive_message(frame).await {
        Ok(stored) => stored,
        Err(e) => {
            tracing::warn!(%chat_id, error = %e, "Dropping inbound message");
            return;
        }
    };
    if let Err(e) = store.increment_unread(&chat_id).await {
        tracing::warn!(%chat_id, error = %e, "Failed to bump unread count");
    }
    hub.publish_new_message(stored);
}

fn render(frame: &MessageFrame, session: &Session) {
    let marker = if frame.chat_id == session.chat_id { ">" } else { " " };
    println!(
        "{} [{}] {}: {}",
        marker, frame.chat_id, frame.sender_name, frame.text
    );
}

/// Returns false when the user asked to quit
async fn handle_line(
    line: &str,
    session: &mut Session,
    store: &MemoryStore,
    hub: &EventHub,
    simulator: &ResponseSimulator,
) -> anyhow::Result<bool> {
    if line.is_empty() {
        return Ok(true);
    }

    let mut parts = line.splitn(2, ' ');
    match (parts.next().unwrap_or_default(), parts.next().map(str::trim)) {
        ("/quit", _) => return Ok(false),
        ("/pause", _) => {
            simulator.pause();
            println!("Simulator paused");
        }
        ("/resume", _) => {
            simulator.resume();
            println!("Simulator resumed");
        }
        ("/toggle", _) => {
            let paused = simulator.toggle();
            println!("Simulator {}", if paused { "paused" } else { "resumed" });
        }
        ("/status", _) => {
            let status = hub.status().await;
            println!("{}", serde_json::to_string_pretty(&status)?);
        }
        ("/ping", _) => {
            if let Err(e) = hub.healthcheck().await {
                println!("Healthcheck failed: {}", e);
            }
        }
        ("/chats", _) => {
            for chat in store.list_chats().await? {
                println!(
                    "{} {:<14} {:<16} unread={} last={}",
                    if chat.id == session.chat_id { "*" } else { " " },
                    chat.id,
                    chat.name,
                    chat.unread_count,
                    chat.last_message.as_deref().unwrap_or("-"),
                );
            }
        }
        ("/chat", Some(chat_id)) if !chat_id.is_empty() => {
            if store.get_chat(chat_id).await?.is_some() {
                session.chat_id = chat_id.to_string();
                println!("Chatting in {}", session.chat_id);
            } else {
                println!("No such chat: {}", chat_id);
            }
        }
        (command, _) if command.starts_with('/') => {
            println!("Unknown command: {}", command);
        }
        _ => send_local(line, session, store, hub).await?,
    }
    Ok(true)
}

/// Persist a locally typed message, announce it and hand it to the transport
async fn send_local(
    text: &str,
    session: &Session,
    store: &MemoryStore,
    hub: &EventHub,
) -> anyhow::Result<()> {
    let frame = MessageFrame::compose(&session.chat_id, text, &session.local_user_id, "Me");
    let stored = store.receive_message(frame).await?;
    hub.publish_new_message(stored.clone());

    if let Err(e) = hub.send_through_channel(stored).await {
        tracing::warn!(error = %e, "Message kept locally, transport did not accept it");
    }
    Ok(())
}
