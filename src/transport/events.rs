//! Channel Messages
//!
//! Everything that crosses the boundary between the transport worker and
//! the rest of the process. Both directions carry owned, serializable
//! values only.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

use super::backoff::ReconnectPolicy;
use super::frames::{InboundFrame, OutboundFrame};

/// Lifecycle of the transport's socket connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
    Reconnecting,
    /// Reconnect attempts exhausted; only an explicit `init` leaves this state
    Failed,
}

/// Connection-level error codes reported as events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Transport-level socket failure
    WsError,
    /// Send or healthcheck attempted without a connection
    NotConnected,
    /// Remote rejected the auth token
    AuthFailed,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::WsError => "WS_ERROR",
            Self::NotConnected => "NOT_CONNECTED",
            Self::AuthFailed => "AUTH_FAILED",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Events emitted by the transport worker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChannelEvent {
    ConnectionStatus {
        connected: bool,
    },
    /// A validated inbound chat message
    Message {
        payload: InboundFrame,
    },
    AuthSuccess,
    Typing {
        payload: Value,
    },
    Presence {
        payload: Value,
    },
    ReadReceipt {
        payload: Value,
    },
    Pong,
    /// Local acknowledgment that a frame was handed to the socket
    #[serde(rename_all = "camelCase")]
    MessageSent {
        message_id: String,
        timestamp: i64,
    },
    Error {
        code: ErrorCode,
        message: String,
    },
    #[serde(rename_all = "camelCase")]
    Reconnecting {
        attempt: u32,
        max_attempts: u32,
    },
    ConnectionFailed {
        attempts: u32,
    },
}

impl ChannelEvent {
    pub(crate) fn error(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::Error {
            code,
            message: message.into(),
        }
    }

    /// Whether this event is a status report rather than remote traffic
    pub fn is_status(&self) -> bool {
        matches!(
            self,
            Self::ConnectionStatus { .. }
                | Self::Error { .. }
                | Self::Reconnecting { .. }
                | Self::ConnectionFailed { .. }
                | Self::MessageSent { .. }
        )
    }
}

/// Transport settings handed to `init`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelConfig {
    /// WebSocket endpoint; empty selects demo mode
    pub endpoint_url: String,
    /// Token sent in an `AUTH` frame once the socket opens
    pub auth_token: Option<String>,
    /// Synthesize traffic when no endpoint is configured
    pub enable_demo: bool,
    pub max_reconnect_attempts: u32,
    pub reconnect_base_delay_ms: u64,
    pub demo_interval_ms: u64,
    /// Log frames dropped by validation
    pub enable_logging: bool,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            endpoint_url: String::new(),
            auth_token: None,
            enable_demo: true,
            max_reconnect_attempts: ReconnectPolicy::DEFAULT_MAX_ATTEMPTS,
            reconnect_base_delay_ms: ReconnectPolicy::DEFAULT_BASE_DELAY_MS,
            demo_interval_ms: 30_000,
            enable_logging: true,
        }
    }
}

impl ChannelConfig {
    /// Whether `init` should run in demo mode
    pub fn is_demo(&self) -> bool {
        self.endpoint_url.trim().is_empty()
    }

    pub fn reconnect_policy(&self) -> ReconnectPolicy {
        ReconnectPolicy::new(
            Duration::from_millis(self.reconnect_base_delay_ms),
            self.max_reconnect_attempts,
        )
    }

    pub fn demo_interval(&self) -> Duration {
        Duration::from_millis(self.demo_interval_ms.max(1))
    }

    /// Apply caller-supplied overrides on top of this config
    pub fn merge(&mut self, overrides: ChannelOverrides) {
        if let Some(url) = overrides.endpoint_url {
            self.endpoint_url = url;
        }
        if let Some(token) = overrides.auth_token {
            self.auth_token = Some(token).filter(|t| !t.is_empty());
        }
        if let Some(enable_demo) = overrides.enable_demo {
            self.enable_demo = enable_demo;
        }
        if let Some(enable_logging) = overrides.enable_logging {
            self.enable_logging = enable_logging;
        }
    }
}

/// Partial channel settings supplied to `start_listening`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelOverrides {
    pub endpoint_url: Option<String>,
    pub auth_token: Option<String>,
    pub enable_demo: Option<bool>,
    pub enable_logging: Option<bool>,
}

/// Commands sent to the transport worker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum ChannelCommand {
    Init { config: ChannelConfig },
    Send { frame: OutboundFrame },
    Disconnect,
    Healthcheck,
    Shutdown,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_wire_names() {
        let json = serde_json::to_string(&ChannelEvent::Reconnecting {
            attempt: 2,
            max_attempts: 5,
        })
        .unwrap();
        assert_eq!(
            json,
            r#"{"type":"RECONNECTING","attempt":2,"maxAttempts":5}"#
        );

        let json = serde_json::to_string(&ChannelEvent::error(ErrorCode::NotConnected, "offline"))
            .unwrap();
        assert!(json.contains("\"type\":\"ERROR\""));
        assert!(json.contains("\"code\":\"NOT_CONNECTED\""));

        let json = serde_json::to_string(&ChannelEvent::MessageSent {
            message_id: "m-1".to_string(),
            timestamp: 1,
        })
        .unwrap();
        assert!(json.contains("\"messageId\":\"m-1\""));
    }

    #[test]
    fn test_status_events_are_classified() {
        assert!(ChannelEvent::ConnectionStatus { connected: true }.is_status());
        assert!(ChannelEvent::ConnectionFailed { attempts: 5 }.is_status());
        assert!(!ChannelEvent::Pong.is_status());
        assert!(!ChannelEvent::AuthSuccess.is_status());
    }

    #[test]
    fn test_config_merge() {
        let mut config = ChannelConfig::default();
        assert!(config.is_demo());

        config.merge(ChannelOverrides {
            endpoint_url: Some("ws://localhost:9000".to_string()),
            auth_token: Some("t0k".to_string()),
            ..Default::default()
        });
        assert!(!config.is_demo());
        assert_eq!(config.auth_token.as_deref(), Some("t0k"));
        assert!(config.enable_demo);

        config.merge(ChannelOverrides {
            auth_token: Some(String::new()),
            ..Default::default()
        });
        assert_eq!(config.auth_token, None);
        assert_eq!(config.endpoint_url, "ws://localhost:9000");
    }
}
