//! Configuration loading
//!
//! The bridge reads one TOML file, or the copy of `config/default.toml`
//! compiled into the binary. Every section is optional and missing values
//! take the type's `Default`.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::info;

use rookwire_core::config::{
    ChallengeConfig, RetryLimits, SeekConfig, SentinelMap, SessionConfig,
};
use rookwire_hal::UartConfig;

use crate::cli::CliArgs;
use crate::error::ConfigError;

/// Configuration used when no file is given
pub const DEFAULT_CONFIG: &str = include_str!("../../config/default.toml");

/// Top-level bridge configuration
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct BridgeConfig {
    pub serial: SerialConfig,
    pub account: AccountConfig,
    pub seek: SeekConfig,
    pub challenge: Option<ChallengeConfig>,
    pub sentinels: SentinelMap,
    pub limits: RetryLimits,
    pub logging: LoggingConfig,
    pub archive: ArchiveConfig,
    pub bench: BenchConfig,
}

/// Board serial port
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct SerialConfig {
    pub port: String,
    pub baud: u32,
    /// Receive timeout, milliseconds
    pub timeout_ms: u32,
}

impl Default for SerialConfig {
    fn default() -> Self {
        let uart = UartConfig::default();
        Self {
            port: "/dev/ttyUSB0".to_string(),
            baud: uart.baudrate,
            timeout_ms: uart.rx_timeout_ms,
        }
    }
}

impl SerialConfig {
    pub fn uart_config(&self) -> UartConfig {
        UartConfig {
            baudrate: self.baud,
            rx_timeout_ms: self.timeout_ms,
            ..UartConfig::default()
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct AccountConfig {
    pub id: String,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive, overridden by `RUST_LOG`
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct ArchiveConfig {
    /// Where exported games are written
    pub dir: Option<PathBuf>,
}

/// In-process opponent
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct BenchConfig {
    pub opponent: String,
    /// Moves, `draw` or `resign`, played in order
    pub script: Vec<String>,
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            opponent: "bench".to_string(),
            script: Vec::new(),
        }
    }
}

impl BridgeConfig {
    /// Load from `path`, or the embedded defaults
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match path {
            Some(path) => {
                let contents =
                    std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
                        path: path.to_path_buf(),
                        source,
                    })?;
                let config = Self::parse(&contents)?;
                info!(path = %path.display(), "loaded config");
                config
            }
            None => Self::parse(DEFAULT_CONFIG)?,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn parse(contents: &str) -> Result<Self, ConfigError> {
        toml::from_str(contents).map_err(ConfigError::Parse)
    }

    /// Apply CLI overrides to a loaded config
    pub fn apply_cli_overrides(&mut self, args: &CliArgs) {
        if let Some(ref port) = args.port {
            self.serial.port = port.clone();
        }
        if let Some(ref level) = args.log_level {
            self.logging.level = level.clone();
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.account.id.is_empty() {
            return Err(ConfigError::Invalid("account.id is empty".to_string()));
        }
        let ranks = self
            .sentinels
            .resign_ranks
            .iter()
            .chain(self.sentinels.draw_ranks.iter());
        for &rank in ranks {
            if !(1..=8).contains(&rank) {
                return Err(ConfigError::Invalid(format!(
                    "sentinel rank {} is not on the board",
                    rank
                )));
            }
        }
        if self.sentinels.draw_ranks.iter().any(|rank| self.sentinels.resign_ranks.contains(rank)) {
            return Err(ConfigError::Invalid(
                "a rank cannot be both a resign and a draw sentinel".to_string(),
            ));
        }
        if self.serial.baud == 0 || self.serial.timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "serial baud and timeout_ms must be non-zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Settings the game session needs
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            account_id: self.account.id.clone(),
            seek: self.seek,
            challenge: self.challenge.clone(),
            sentinels: self.sentinels.clone(),
            limits: self.limits,
        }
    }
}
