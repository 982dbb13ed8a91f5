//! Client configuration with YAML support

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{GdetectError, Result};
use crate::types::WaitForOptions;

/// Client configuration
///
/// Can be loaded from YAML or JSON, or constructed programmatically:
///
/// ```yaml
/// connection:
///   endpoint: "https://gdetect.example.com"
///   token: "abcdef01-23456789-abcdef01-23456789-abcdef01"
///   insecure: false
///
/// timeouts:
///   request_ms: 30000
///   connect_ms: 10000
///
/// wait:
///   pull_ms: 1000
///   timeout_ms: 180000
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Connection settings
    pub connection: ConnectionConfig,

    /// Transport timeouts, used when the client builds its own HTTP client
    #[serde(default)]
    pub timeouts: TimeoutsConfig,

    /// Wait loop defaults
    #[serde(default)]
    pub wait: WaitConfig,
}

/// Connection configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionConfig {
    /// Base URL of the service
    pub endpoint: String,

    /// API token
    pub token: String,

    /// Skip TLS certificate verification
    #[serde(default)]
    pub insecure: bool,
}

/// Timeout configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeoutsConfig {
    /// Per-request timeout in milliseconds (default: 30s)
    #[serde(default = "default_request_timeout")]
    pub request_ms: u64,

    /// Connect timeout in milliseconds (default: 10s)
    #[serde(default = "default_connect_timeout")]
    pub connect_ms: u64,
}

impl Default for TimeoutsConfig {
    fn default() -> Self {
        Self {
            request_ms: default_request_timeout(),
            connect_ms: default_connect_timeout(),
        }
    }
}

/// Wait loop configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaitConfig {
    /// Poll interval in milliseconds (default: 1s)
    #[serde(default = "default_pull_interval")]
    pub pull_ms: u64,

    /// Overall wait deadline in milliseconds (default: 3 minutes)
    #[serde(default = "default_wait_timeout")]
    pub timeout_ms: u64,
}

impl Default for WaitConfig {
    fn default() -> Self {
        Self {
            pull_ms: default_pull_interval(),
            timeout_ms: default_wait_timeout(),
        }
    }
}

fn default_request_timeout() -> u64 {
    30_000 // 30 seconds
}

fn default_connect_timeout() -> u64 {
    10_000 // 10 seconds
}

fn default_pull_interval() -> u64 {
    1_000 // 1 second
}

fn default_wait_timeout() -> u64 {
    180_000 // 3 minutes
}

impl ClientConfig {
    /// Load configuration from a YAML file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| GdetectError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).map_err(|e| GdetectError::Config(e.to_string()))
    }

    /// Parse configuration from JSON string
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| GdetectError::Config(e.to_string()))
    }

    /// Serialize configuration to YAML
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).map_err(|e| GdetectError::Config(e.to_string()))
    }

    /// Create a builder for programmatic configuration
    pub fn builder(endpoint: impl Into<String>, token: impl Into<String>) -> ClientConfigBuilder {
        ClientConfigBuilder::new(endpoint, token)
    }

    /// Per-request timeout
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.timeouts.request_ms)
    }

    /// Connect timeout
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.timeouts.connect_ms)
    }

    /// Wait options seeded with the configured poll interval and deadline
    pub fn wait_options(&self) -> WaitForOptions {
        WaitForOptions::new()
            .with_pull_time(Duration::from_millis(self.wait.pull_ms))
            .with_timeout(Duration::from_millis(self.wait.timeout_ms))
    }
}

/// Builder for ClientConfig
pub struct ClientConfigBuilder {
    config: ClientConfig,
}

impl ClientConfigBuilder {
    /// Create a new builder with the given endpoint and token
    pub fn new(endpoint: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            config: ClientConfig {
                connection: ConnectionConfig {
                    endpoint: endpoint.into(),
                    token: token.into(),
                    insecure: false,
                },
                timeouts: TimeoutsConfig::default(),
                wait: WaitConfig::default(),
            },
        }
    }

    /// Skip TLS certificate verification
    pub fn insecure(mut self, insecure: bool) -> Self {
        self.config.connection.insecure = insecure;
        self
    }

    /// Set request timeout in milliseconds
    pub fn request_timeout_ms(mut self, ms: u64) -> Self {
        self.config.timeouts.request_ms = ms;
        self
    }

    /// Set connect timeout in milliseconds
    pub fn connect_timeout_ms(mut self, ms: u64) -> Self {
        self.config.timeouts.connect_ms = ms;
        self
    }

    /// Set poll interval in milliseconds
    pub fn pull_ms(mut self, ms: u64) -> Self {
        self.config.wait.pull_ms = ms;
        self
    }

    /// Set overall wait deadline in milliseconds
    pub fn wait_timeout_ms(mut self, ms: u64) -> Self {
        self.config.wait.timeout_ms = ms;
        self
    }

    /// Build the configuration
    pub fn build(self) -> ClientConfig {
        self.config
    }
}
