//! Client configuration.

use serde::Deserialize;
use std::time::Duration;

/// Everything the client needs to reach and drive one controller.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Controller address, e.g. `http://192.168.1.20`, without a trailing `/`.
    pub base_url: String,

    /// Short label for the machine.
    pub nickname: String,

    pub http: HttpConfig,

    /// Polling used after tool loads and unloads.
    pub tool_change: PollConfig,

    /// Polling used after relative and absolute moves.
    pub moves: PollConfig,

    pub objects: ObjectNames,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost".to_string(),
            nickname: "Default".to_string(),
            http: HttpConfig::default(),
            tool_change: PollConfig {
                interval_ms: 2_000,
                timeout_ms: 300_000,
            },
            moves: PollConfig {
                interval_ms: 250,
                timeout_ms: 5_000,
            },
            objects: ObjectNames::default(),
        }
    }
}

impl ClientConfig {
    /// Default configuration pointed at `base_url`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    pub fn with_nickname(mut self, nickname: impl Into<String>) -> Self {
        self.nickname = nickname.into();
        self
    }

    /// Base URL with any trailing slashes removed.
    pub fn base_url(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }
}

/// HTTP timeouts and connection retries.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub connect_timeout_ms: u64,
    pub response_timeout_ms: u64,
    /// Extra attempts made when the connection itself fails.
    pub connect_retries: u32,
    /// First retry delay; doubled on each further attempt.
    pub retry_backoff_ms: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            connect_timeout_ms: 2_000,
            response_timeout_ms: 10_000,
            connect_retries: 3,
            retry_backoff_ms: 400,
        }
    }
}

impl HttpConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn response_timeout(&self) -> Duration {
        Duration::from_millis(self.response_timeout_ms)
    }

    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }
}

/// Fixed-step idle polling.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct PollConfig {
    pub interval_ms: u64,
    pub timeout_ms: u64,
}

impl PollConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Printer object names used for tool discovery and tool state.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ObjectNames {
    /// Prefix shared by every tool object; tool `n` is `{prefix}{n}`.
    pub tool_prefix: String,
    /// Object reporting the currently loaded tool.
    pub toolhead: String,
    /// Property of `toolhead` holding the current tool index.
    pub current_tool: String,
}

impl Default for ObjectNames {
    fn default() -> Self {
        Self {
            tool_prefix: "tool ".to_string(),
            toolhead: "toollock".to_string(),
            current_tool: "tool_current".to_string(),
        }
    }
}

impl ObjectNames {
    /// Object name for tool `index`.
    pub fn tool(&self, index: usize) -> String {
        format!("{}{index}", self.tool_prefix)
    }

    /// Whether a listed object is a tool (case-insensitive prefix plus a name).
    pub fn is_tool(&self, object: &str) -> bool {
        let object = object.to_lowercase();
        let prefix = self.tool_prefix.to_lowercase();
        object.len() > prefix.len() && object.starts_with(&prefix)
    }
}
