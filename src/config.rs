//! Configuration System
//!
//! Handles loading configuration from files and environment variables.
//! Supports TOML config files and environment variable overrides.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::hub::HubConfig;
use crate::simulator::SimulatorConfig;
use crate::transport::{ChannelConfig, ReconnectPolicy};

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub transport: TransportConfig,

    #[serde(default)]
    pub simulator: SimulatorSection,

    #[serde(default)]
    pub hub: HubSection,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Transport channel configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransportConfig {
    /// WebSocket endpoint; leave empty for demo mode
    #[serde(default)]
    pub endpoint_url: String,

    #[serde(default)]
    pub auth_token: Option<String>,

    #[serde(default = "default_true")]
    pub enable_demo: bool,

    #[serde(default = "default_max_reconnect_attempts")]
    pub max_reconnect_attempts: u32,

    #[serde(default = "default_reconnect_base_delay")]
    pub reconnect_base_delay_ms: u64,

    #[serde(default = "default_demo_interval")]
    pub demo_interval_ms: u64,
}

fn default_true() -> bool {
    true
}

fn default_max_reconnect_attempts() -> u32 {
    ReconnectPolicy::DEFAULT_MAX_ATTEMPTS
}

fn default_reconnect_base_delay() -> u64 {
    ReconnectPolicy::DEFAULT_BASE_DELAY_MS
}

fn default_demo_interval() -> u64 {
    30_000 // 30 seconds
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            endpoint_url: String::new(),
            auth_token: None,
            enable_demo: true,
            max_reconnect_attempts: default_max_reconnect_attempts(),
            reconnect_base_delay_ms: default_reconnect_base_delay(),
            demo_interval_ms: default_demo_interval(),
        }
    }
}

/// Response simulator configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulatorSection {
    #[serde(default = "default_local_user")]
    pub local_user_id: String,

    #[serde(default = "default_min_delay")]
    pub min_delay_ms: u64,

    #[serde(default = "default_max_delay")]
    pub max_delay_ms: u64,

    #[serde(default = "default_auto_send_interval")]
    pub auto_send_interval_ms: u64,

    #[serde(default = "default_true")]
    pub auto_send_enabled: bool,

    #[serde(default)]
    pub start_paused: bool,
}

fn default_local_user() -> String {
    "me".to_string()
}

fn default_min_delay() -> u64 {
    1000
}

fn default_max_delay() -> u64 {
    3000
}

fn default_auto_send_interval() -> u64 {
    30_000
}

impl Default for SimulatorSection {
    fn default() -> Self {
        Self {
            local_user_id: default_local_user(),
            min_delay_ms: default_min_delay(),
            max_delay_ms: default_max_delay(),
            auto_send_interval_ms: default_auto_send_interval(),
            auto_send_enabled: true,
            start_paused: false,
        }
    }
}

/// Event hub configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HubSection {
    /// Log frames rejected by validation
    #[serde(default = "default_true")]
    pub enable_logging: bool,

    #[serde(default = "default_bus_capacity")]
    pub bus_capacity: usize,
}

fn default_bus_capacity() -> usize {
    256
}

impl Default for HubSection {
    fn default() -> Self {
        Self {
            enable_logging: true,
            bus_capacity: default_bus_capacity(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl LoggingConfig {
    pub fn is_json(&self) -> bool {
        self.format.eq_ignore_ascii_case("json")
    }
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        let config: Config = toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        Ok(config)
    }

    /// Load configuration from environment variables only
    pub fn from_env() -> Self {
        let mut config = Config::default();
        config.apply_env_overrides();
        config
    }

    /// Load configuration with environment variable overrides
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load from default locations or environment
    pub fn load_default() -> Self {
        let config_paths = [
            dirs::config_dir().map(|p| p.join("parley").join("config.toml")),
            Some(PathBuf::from("/etc/parley/config.toml")),
            Some(PathBuf::from("./config.toml")),
        ];

        for path_opt in config_paths.iter().flatten() {
            if path_opt.exists() {
                match Self::load_with_env(path_opt) {
                    Ok(config) => {
                        tracing::info!("Loaded config from {:?}", path_opt);
                        return config;
                    }
                    Err(e) => {
                        tracing::warn!("Failed to load config from {:?}: {}", path_opt, e);
                    }
                }
            }
        }

        // Fall back to environment-only config
        tracing::info!("Using default config with environment overrides");
        Self::from_env()
    }

    /// Apply environment variable overrides to an existing config
    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        // Transport overrides
        if let Some(url) = lookup("PARLEY_ENDPOINT_URL") {
            self.transport.endpoint_url = url;
        }
        if let Some(token) = lookup("PARLEY_AUTH_TOKEN") {
            self.transport.auth_token = Some(token).filter(|t| !t.is_empty());
        }
        if let Some(demo) = lookup("PARLEY_ENABLE_DEMO").and_then(|v| parse_bool(&v)) {
            self.transport.enable_demo = demo;
        }

        // Simulator overrides
        if let Some(paused) = lookup("PARLEY_START_PAUSED").and_then(|v| parse_bool(&v)) {
            self.simulator.start_paused = paused;
        }

        // Logging overrides
        if let Some(level) = lookup("PARLEY_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(format) = lookup("PARLEY_LOG_FORMAT") {
            self.logging.format = format;
        }
    }

    /// Settings for the transport channel
    pub fn channel_config(&self) -> ChannelConfig {
        ChannelConfig {
            endpoint_url: self.transport.endpoint_url.clone(),
            auth_token: self.transport.auth_token.clone(),
            enable_demo: self.transport.enable_demo,
            max_reconnect_attempts: self.transport.max_reconnect_attempts,
            reconnect_base_delay_ms: self.transport.reconnect_base_delay_ms,
            demo_interval_ms: self.transport.demo_interval_ms,
            enable_logging: self.hub.enable_logging,
        }
    }

    pub fn hub_config(&self) -> HubConfig {
        HubConfig {
            channel: self.channel_config(),
            bus_capacity: self.hub.bus_capacity,
        }
    }

    pub fn simulator_config(&self) -> SimulatorConfig {
        SimulatorConfig {
            local_user_id: self.simulator.local_user_id.clone(),
            min_delay_ms: self.simulator.min_delay_ms,
            max_delay_ms: self.simulator.max_delay_ms,
            auto_send_interval_ms: self.simulator.auto_send_interval_ms,
            auto_send_enabled: self.simulator.auto_send_enabled,
            start_paused: self.simulator.start_paused,
        }
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {error}")]
    Io { path: PathBuf, error: String },

    #[error("Failed to parse config file {path:?}: {error}")]
    Parse { path: PathBuf, error: String },
}

/// Generate a default config file content
pub fn generate_default_config() -> String {
    r#"# Parley Configuration
#
# Environment variables override these settings:
# - PARLEY_ENDPOINT_URL
# - PARLEY_AUTH_TOKEN
# - PARLEY_ENABLE_DEMO
# - PARLEY_START_PAUSED
# - PARLEY_LOG_LEVEL
# - PARLEY_LOG_FORMAT

[transport]
# WebSocket endpoint; leave empty to run in demo mode
endpoint_url = ""

# Token sent in an AUTH frame once connected
# auth_token = ""

# Synthesize traffic when no endpoint is configured
enable_demo = true

# Reconnect attempts before giving up
max_reconnect_attempts = 5

# Attempt n waits n times this long (ms)
reconnect_base_delay_ms = 2000

# Interval between synthesized demo messages (ms)
demo_interval_ms = 30000

[simulator]
# Messages from this user get simulated replies
local_user_id = "me"

# Reply delay window (ms)
min_delay_ms = 1000
max_delay_ms = 3000

# Unsolicited message interval (ms)
auto_send_interval_ms = 30000
auto_send_enabled = true

# Start with replies and auto-send suspended
start_paused = false

[hub]
# Log frames rejected by validation
enable_logging = true

# Capacity of the event bus
bus_capacity = 256

[logging]
# Log level: trace, debug, info, warn, error
level = "info"

# Log format: pretty (for development) or json (for production)
format = "pretty"
"#
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn test_generated_config_matches_defaults() {
        let parsed: Config = toml::from_str(&generate_default_config()).unwrap();
        let defaults = Config::default();

        assert_eq!(parsed.channel_config(), defaults.channel_config());
        assert_eq!(parsed.simulator_config(), defaults.simulator_config());
        assert_eq!(parsed.hub.bus_capacity, defaults.hub.bus_capacity);
        assert_eq!(parsed.logging.level, "info");
        assert!(parsed.channel_config().is_demo());
    }

    #[test]
    fn test_load_partial_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[transport]
endpoint_url = "wss://chat.example.com/socket"
auth_token = "secret"

[simulator]
start_paused = true
"#
        )
        .unwrap();

        let config = Config::load(file.path()).unwrap();
        let channel = config.channel_config();
        assert_eq!(channel.endpoint_url, "wss://chat.example.com/socket");
        assert_eq!(channel.auth_token.as_deref(), Some("secret"));
        assert_eq!(channel.max_reconnect_attempts, 5);
        assert_eq!(channel.reconnect_base_delay_ms, 2000);
        assert!(config.simulator.start_paused);
        assert_eq!(config.simulator.max_delay_ms, 3000);
        assert_eq!(config.logging.format, "pretty");
    }

    #[test]
    fn test_load_errors() {
        let missing = Config::load(Path::new("/nonexistent/parley.toml"));
        assert!(matches!(missing, Err(ConfigError::Io { .. })));

        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[transport\nendpoint_url = 3").unwrap();
        assert!(matches!(
            Config::load(file.path()),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn test_overrides() {
        let vars: HashMap<&str, &str> = [
            ("PARLEY_ENDPOINT_URL", "ws://localhost:9000"),
            ("PARLEY_AUTH_TOKEN", ""),
            ("PARLEY_ENABLE_DEMO", "off"),
            ("PARLEY_START_PAUSED", "yes"),
            ("PARLEY_LOG_FORMAT", "json"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config.transport.auth_token = Some("stale".to_string());
        config.apply_overrides(|key| vars.get(key).map(|v| v.to_string()));

        assert_eq!(config.transport.endpoint_url, "ws://localhost:9000");
        assert_eq!(config.transport.auth_token, None);
        assert!(!config.transport.enable_demo);
        assert!(config.simulator.start_paused);
        assert!(config.logging.is_json());
        assert_eq!(config.logging.level, "info");
    }
}
