//! Player configuration with JSON loading.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::vlc::{find_vlc, ReadTimeouts};

/// Port VLC's remote-control interface listens on when none is configured.
pub const DEFAULT_TCP_PORT: u16 = 2019;

#[derive(Error, Debug)]
pub enum ConfigError {
  #[error("Failed to read config: {0}")]
  Io(#[from] std::io::Error),
  #[error("Malformed config: {0}")]
  Json(#[from] serde_json::Error),
  #[error("Invalid config: {0}")]
  Invalid(String),
}

/// Player configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerConfig {
  /// Custom VLC executable path (None = auto-detect).
  #[serde(default)]
  pub exe_path: Option<PathBuf>,

  /// Host the remote-control socket is bound to.
  #[serde(default = "default_host")]
  pub host: String,

  /// Remote-control TCP port (0 = default).
  #[serde(default = "default_tcp_port")]
  pub tcp_port: u16,

  /// Additional VLC command-line arguments.
  #[serde(default)]
  pub extra_args: Vec<String>,

  /// How long to wait after launch before dialing the control socket.
  #[serde(default = "default_startup_delay_ms")]
  pub startup_delay_ms: u64,

  /// Deadline for the first line of a reply.
  #[serde(default = "default_initial_read_timeout_ms")]
  pub initial_read_timeout_ms: u64,

  /// Deadline for every line after the first.
  #[serde(default = "default_follow_up_read_timeout_ms")]
  pub follow_up_read_timeout_ms: u64,
}

fn default_host() -> String {
  "localhost".to_string()
}

fn default_tcp_port() -> u16 {
  DEFAULT_TCP_PORT
}

fn default_startup_delay_ms() -> u64 {
  2000
}

fn default_initial_read_timeout_ms() -> u64 {
  500
}

fn default_follow_up_read_timeout_ms() -> u64 {
  200
}

impl Default for PlayerConfig {
  fn default() -> Self {
    Self {
      exe_path: None,
      host: default_host(),
      tcp_port: default_tcp_port(),
      extra_args: Vec::new(),
      startup_delay_ms: default_startup_delay_ms(),
      initial_read_timeout_ms: default_initial_read_timeout_ms(),
      follow_up_read_timeout_ms: default_follow_up_read_timeout_ms(),
    }
  }
}

impl PlayerConfig {
  /// Load and validate a JSON config file.
  pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
    let text = std::fs::read_to_string(path)?;
    Self::from_json(&text)
  }

  /// Parse and validate a JSON config document.
  pub fn from_json(text: &str) -> Result<Self, ConfigError> {
    let config: Self = serde_json::from_str(text)?;
    config.validate()?;
    Ok(config)
  }

  /// Validate configuration values.
  pub fn validate(&self) -> Result<(), ConfigError> {
    if self.host.trim().is_empty() {
      return Err(ConfigError::Invalid("Host cannot be empty".to_string()));
    }
    if self.initial_read_timeout_ms == 0 || self.follow_up_read_timeout_ms == 0 {
      return Err(ConfigError::Invalid(
        "Read timeouts must be greater than zero".to_string(),
      ));
    }
    if self.follow_up_read_timeout_ms > self.initial_read_timeout_ms {
      return Err(ConfigError::Invalid(
        "Follow-up read timeout cannot exceed the initial read timeout".to_string(),
      ));
    }
    Ok(())
  }

  /// Executable to launch: the configured one, else whatever VLC is found.
  pub fn actual_exe_path(&self) -> PathBuf {
    self
      .exe_path
      .clone()
      .filter(|p| !p.as_os_str().is_empty())
      .unwrap_or_else(find_vlc)
  }

  pub fn actual_tcp_port(&self) -> u16 {
    if self.tcp_port != 0 {
      self.tcp_port
    } else {
      DEFAULT_TCP_PORT
    }
  }

  /// `host:port` of the remote-control socket.
  pub fn address(&self) -> String {
    format!("{}:{}", self.host, self.actual_tcp_port())
  }

  pub fn startup_delay(&self) -> Duration {
    Duration::from_millis(self.startup_delay_ms)
  }

  pub fn read_timeouts(&self) -> ReadTimeouts {
    ReadTimeouts {
      initial: Duration::from_millis(self.initial_read_timeout_ms),
      follow_up: Duration::from_millis(self.follow_up_read_timeout_ms),
    }
  }
}
