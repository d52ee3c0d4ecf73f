//! Configuration loading from moonraker.toml.

use moonraker::ClientConfig;
use serde::Deserialize;
use std::path::Path;

/// Top-level configuration.
#[derive(Debug, Deserialize, Default)]
pub struct Config {
    /// Controller connection and polling settings.
    #[serde(default)]
    pub printer: ClientConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::parse(&content)
    }

    /// Parse configuration from TOML string.
    pub fn parse(toml: &str) -> Result<Self, ConfigError> {
        toml::from_str(toml).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Override the controller address.
    pub fn with_url(mut self, url: Option<String>) -> Self {
        if let Some(url) = url {
            self.printer.base_url = url;
        }
        self
    }

    /// Check values the client cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let url = self.printer.base_url();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(ConfigError::InvalidUrl(url.to_string()));
        }
        for (name, poll) in [
            ("tool_change", &self.printer.tool_change),
            ("moves", &self.printer.moves),
        ] {
            if poll.interval_ms == 0 {
                return Err(ConfigError::ZeroInterval(name));
            }
        }
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(String),

    #[error("printer.base_url must start with http:// or https://, got '{0}'")]
    InvalidUrl(String),

    #[error("printer.{0}.interval_ms must be greater than zero")]
    ZeroInterval(&'static str),
}
