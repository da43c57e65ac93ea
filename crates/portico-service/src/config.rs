//! Service configuration loaded from TOML.
//!
//! Every section and every field is optional; anything left out takes its
//! default from [`portico_core::constants`].
//!
//! ```toml
//! [log]
//! level = "debug"
//!
//! [database]
//! path = "/var/lib/portico/portico.db"
//!
//! [card_reader]
//! driver = "pcsc"
//! debounce_cooldown_secs = 3
//!
//! [serial]
//! port = "/dev/ttyUSB0"
//!
//! [alarm]
//! driver = "sysfs"
//! gpio_pin = 17
//! threshold = 3
//! window_minutes = 1
//! duration_secs = 5
//! ```

use crate::error::{ServiceError, ServiceResult};
use portico_core::constants::*;
use portico_storage::DatabaseConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::warn;

/// Top-level service configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub log: LogConfig,
    pub database: DatabaseConfig,
    pub card_reader: CardReaderConfig,
    pub serial: SerialConfig,
    pub alarm: AlarmConfig,
    pub workers: WorkerConfig,
}

impl ServiceConfig {
    /// Parse a configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Config`] if the text is not valid TOML or a
    /// field has the wrong type.
    pub fn from_toml(text: &str) -> ServiceResult<Self> {
        toml::from_str(text).map_err(|e| ServiceError::Config(e.to_string()))
    }

    /// Load the configuration file at `path`.
    ///
    /// A missing file is not an error: defaults are used and a warning is
    /// logged.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Config`] if the file exists but cannot be read
    /// or parsed.
    pub fn load_from_path(path: impl AsRef<Path>) -> ServiceResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            warn!(path = %path.display(), "config file not found, using defaults");
            return Ok(Self::default());
        }

        let text = std::fs::read_to_string(path).map_err(|e| {
            ServiceError::Config(format!("failed to read {}: {e}", path.display()))
        })?;
        Self::from_toml(&text)
            .map_err(|e| ServiceError::Config(format!("failed to parse {}: {e}", path.display())))
    }

    /// Set the database path
    pub fn database_path(mut self, path: impl Into<String>) -> Self {
        self.database.path = path.into();
        self
    }

    /// Enable or disable the card reader channel
    pub fn card_reader_enabled(mut self, enabled: bool) -> Self {
        self.card_reader.enabled = enabled;
        self
    }

    /// Enable or disable the serial channel
    pub fn serial_enabled(mut self, enabled: bool) -> Self {
        self.serial.enabled = enabled;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Default filter when `RUST_LOG` is not set
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Card reader driver selection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReaderDriver {
    #[default]
    Mock,
    Pcsc,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CardReaderConfig {
    pub enabled: bool,
    pub driver: ReaderDriver,
    /// PC/SC reader name; the first attached reader when unset
    pub reader_name: Option<String>,
    pub poll_timeout_ms: u64,
    pub identification_width: usize,
    pub debounce_cooldown_secs: u64,
}

impl Default for CardReaderConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            driver: ReaderDriver::default(),
            reader_name: None,
            poll_timeout_ms: DEFAULT_CARD_POLL_TIMEOUT_MS,
            identification_width: IDENTIFICATION_WIDTH,
            debounce_cooldown_secs: DEFAULT_DEBOUNCE_COOLDOWN_SECS,
        }
    }
}

impl CardReaderConfig {
    pub fn poll_timeout(&self) -> Duration {
        Duration::from_millis(self.poll_timeout_ms)
    }

    pub fn debounce_cooldown(&self) -> Duration {
        Duration::from_secs(self.debounce_cooldown_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SerialConfig {
    pub enabled: bool,
    pub port: String,
    pub baud: u32,
    pub sync_pacing_ms: u64,
    /// Only identifications of exactly this many digits are bulk-synced
    pub sync_identification_length: usize,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            port: DEFAULT_SERIAL_PORT.to_string(),
            baud: DEFAULT_SERIAL_BAUD,
            sync_pacing_ms: DEFAULT_SYNC_PACING_MS,
            sync_identification_length: IDENTIFICATION_WIDTH,
        }
    }
}

impl SerialConfig {
    pub fn sync_pacing(&self) -> Duration {
        Duration::from_millis(self.sync_pacing_ms)
    }
}

/// Alarm output driver selection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputDriver {
    #[default]
    Mock,
    Sysfs,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlarmConfig {
    pub driver: OutputDriver,
    /// GPIO pin exported through sysfs
    pub gpio_pin: Option<u32>,
    /// Explicit sysfs `value` file; takes precedence over `gpio_pin`
    pub value_path: Option<PathBuf>,
    pub threshold: u32,
    pub window_minutes: u32,
    pub duration_secs: u64,
}

impl Default for AlarmConfig {
    fn default() -> Self {
        Self {
            driver: OutputDriver::default(),
            gpio_pin: None,
            value_path: None,
            threshold: DEFAULT_ALARM_THRESHOLD,
            window_minutes: DEFAULT_ALARM_WINDOW_MINUTES,
            duration_secs: DEFAULT_ALARM_DURATION_SECS,
        }
    }
}

impl AlarmConfig {
    pub fn duration(&self) -> Duration {
        Duration::from_secs(self.duration_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkerConfig {
    pub pool_size: usize,
    pub queue_capacity: usize,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            pool_size: DEFAULT_WORKER_POOL_SIZE,
            queue_capacity: DEFAULT_WORKER_QUEUE_CAPACITY,
        }
    }
}
