//! Configuration management for session-pager.
//!
//! Configuration is loaded with the following priority (highest to lowest):
//! 1. Command-line arguments
//! 2. Environment variables
//! 3. Configuration file (JSON)
//! 4. Default values

use std::net::IpAddr;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::api::ServerConfig;
use crate::cli::Args;
use crate::session::{StoreConfig, DEFAULT_PAGE_SIZE, DEFAULT_TTL, MAX_TTL};

/// Application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Server configuration.
    pub server: ServerSection,
    /// Session policy.
    pub sessions: SessionsSection,
    /// Logging configuration.
    pub logging: LoggingSection,
}

/// Server configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSection {
    /// Host address to bind to.
    pub host: String,
    /// Port to listen on.
    pub port: u16,
    /// Enable graceful shutdown.
    pub graceful_shutdown: bool,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            graceful_shutdown: true,
        }
    }
}

/// Session policy section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionsSection {
    /// Session lifetime in seconds.
    pub ttl_secs: u64,
    /// Records per page.
    pub page_size: usize,
    /// Milliseconds between prune passes.
    pub prune_interval_ms: u64,
}

impl Default for SessionsSection {
    fn default() -> Self {
        Self {
            ttl_secs: DEFAULT_TTL.as_secs(),
            page_size: DEFAULT_PAGE_SIZE,
            prune_interval_ms: 1000,
        }
    }
}

/// Logging configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Log level (error, warn, info, debug, trace) or a full filter directive.
    pub level: String,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Apply environment variable overrides.
    ///
    /// Unparseable numeric values are ignored with a warning.
    pub fn apply_env(&mut self) {
        self.apply_env_from(|key| std::env::var(key).ok());
    }

    /// Apply overrides from an arbitrary variable source (for testing).
    pub fn apply_env_from<F>(&mut self, var: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = var("SESSION_PAGER_HOST") {
            self.server.host = host;
        }

        parse_env(&var, "SESSION_PAGER_PORT", &mut self.server.port);
        parse_env(&var, "SESSION_PAGER_TTL_SECS", &mut self.sessions.ttl_secs);
        parse_env(&var, "SESSION_PAGER_PAGE_SIZE", &mut self.sessions.page_size);
        parse_env(
            &var,
            "SESSION_PAGER_PRUNE_INTERVAL_MS",
            &mut self.sessions.prune_interval_ms,
        );

        if let Some(level) = var("SESSION_PAGER_LOG_LEVEL") {
            self.logging.level = level;
        } else if let Some(level) = var("RUST_LOG") {
            self.logging.level = level;
        }
    }

    /// Apply CLI argument overrides.
    pub fn apply_args(&mut self, args: &Args) {
        if let Some(host) = args.host {
            self.server.host = host.to_string();
        }
        if let Some(port) = args.port {
            self.server.port = port;
        }
        if let Some(ttl) = args.ttl_secs {
            self.sessions.ttl_secs = ttl;
        }
        if let Some(size) = args.page_size {
            self.sessions.page_size = size;
        }
        if let Some(interval) = args.prune_interval_ms {
            self.sessions.prune_interval_ms = interval;
        }
        if let Some(ref level) = args.log_level {
            self.logging.level = level.clone();
        }
    }

    /// Load configuration with full priority chain.
    ///
    /// Priority: CLI args > env vars > config file > defaults
    pub fn load(args: &Args) -> Result<Self, ConfigError> {
        let mut config = match args.config {
            Some(ref path) => Config::from_file(path)?,
            None => Config::default(),
        };

        config.apply_env();
        config.apply_args(args);
        config.validate()?;

        Ok(config)
    }

    /// Reject values the store cannot honor.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sessions.ttl_secs == 0 || self.sessions.ttl_secs > MAX_TTL.as_secs() {
            return Err(ConfigError::Invalid(format!(
                "sessions.ttl_secs must be between 1 and {}",
                MAX_TTL.as_secs()
            )));
        }
        if self.sessions.page_size == 0 {
            return Err(ConfigError::Invalid(
                "sessions.page_size must be at least 1".into(),
            ));
        }
        if self.sessions.prune_interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "sessions.prune_interval_ms must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// Convert to ServerConfig for the API server.
    pub fn to_server_config(&self) -> Result<ServerConfig, ConfigError> {
        let host: IpAddr = self
            .server
            .host
            .parse()
            .map_err(|_| ConfigError::InvalidHost(self.server.host.clone()))?;

        let mut server_config = ServerConfig::new(host.to_string(), self.server.port);
        if !self.server.graceful_shutdown {
            server_config = server_config.without_graceful_shutdown();
        }

        Ok(server_config)
    }

    /// Session policy for the store.
    pub fn to_store_config(&self) -> StoreConfig {
        StoreConfig::new(
            Duration::from_secs(self.sessions.ttl_secs),
            self.sessions.page_size,
        )
    }

    pub fn prune_interval(&self) -> Duration {
        Duration::from_millis(self.sessions.prune_interval_ms)
    }

    /// Get the log level filter string.
    pub fn log_filter(&self) -> &str {
        &self.logging.level
    }
}

fn parse_env<F, T>(var: &F, key: &str, target: &mut T)
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    if let Some(raw) = var(key) {
        match raw.trim().parse() {
            Ok(value) => *target = value,
            Err(_) => tracing::warn!("ignoring unparseable {}={:?}", key, raw),
        }
    }
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// IO error reading config file.
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    /// JSON parsing error.
    #[error("failed to parse config file: {0}")]
    Json(#[from] serde_json::Error),
    /// Invalid host address.
    #[error("invalid host address: {0}")]
    InvalidHost(String),
    /// Out-of-range value.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}
