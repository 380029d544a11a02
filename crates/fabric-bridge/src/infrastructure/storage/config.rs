//! TOML-based configuration for the bridge.
//!
//! # What is TOML? (for beginners)
//!
//! TOML is a configuration file format designed to be easy to read and
//! write.  The bridge's file looks like this:
//!
//! ```toml
//! [bridge]
//! log_level = "info"
//! flush_interval_ms = 10
//!
//! [reflash]
//! rom_image = "system.rom"
//! precheck = "skip-if-current"
//!
//! [diagnostics]
//! bank_dump_hotkey = true
//! ```
//!
//! # Serde default values
//!
//! Every field carries `#[serde(default = "some_fn")]`, so a missing file, a
//! missing section, or a missing key all fall back to the same defaults.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::application::reflash::{PrecheckMode, ReflashSettings};

/// Error type for configuration file operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A file system I/O error occurred.
    #[error("I/O error accessing config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The TOML content could not be parsed.
    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// The config could not be serialized to TOML.
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

// ── Config schema types ───────────────────────────────────────────────────────

/// Top-level configuration stored on disk.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub bridge: BridgeConfig,
    #[serde(default)]
    pub reflash: ReflashConfig,
    #[serde(default)]
    pub diagnostics: DiagnosticsConfig,
}

/// Runtime settings for the input loop.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BridgeConfig {
    /// `tracing` log level: `"error"`, `"warn"`, `"info"`, `"debug"`, `"trace"`.
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Housekeeping tick that publishes the keyboard matrix.
    #[serde(default = "default_flush_interval_ms")]
    pub flush_interval_ms: u64,
}

/// System ROM image and reflash timing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReflashConfig {
    #[serde(default = "default_rom_image")]
    pub rom_image: PathBuf,
    /// First flash address of the image; must be 4096-aligned.
    #[serde(default)]
    pub image_base: u32,
    #[serde(default)]
    pub precheck: PrecheckMode,
    #[serde(default = "default_blink_count")]
    pub blink_count: u32,
    #[serde(default = "default_blink_interval_ms")]
    pub blink_interval_ms: u64,
    #[serde(default = "default_intro_hold_ms")]
    pub intro_hold_ms: u64,
    #[serde(default = "default_status_hold_ms")]
    pub status_hold_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DiagnosticsConfig {
    /// F4 dumps the bank-select registers to the log.
    #[serde(default = "default_true")]
    pub bank_dump_hotkey: bool,
}

// ── Default helpers ───────────────────────────────────────────────────────────

fn default_log_level() -> String {
    "info".to_string()
}
fn default_flush_interval_ms() -> u64 {
    10
}
fn default_rom_image() -> PathBuf {
    PathBuf::from("system.rom")
}
fn default_blink_count() -> u32 {
    5
}
fn default_blink_interval_ms() -> u64 {
    200
}
fn default_intro_hold_ms() -> u64 {
    1000
}
fn default_status_hold_ms() -> u64 {
    2000
}
fn default_true() -> bool {
    true
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            flush_interval_ms: default_flush_interval_ms(),
        }
    }
}

impl Default for ReflashConfig {
    fn default() -> Self {
        Self {
            rom_image: default_rom_image(),
            image_base: 0,
            precheck: PrecheckMode::default(),
            blink_count: default_blink_count(),
            blink_interval_ms: default_blink_interval_ms(),
            intro_hold_ms: default_intro_hold_ms(),
            status_hold_ms: default_status_hold_ms(),
        }
    }
}

impl Default for DiagnosticsConfig {
    fn default() -> Self {
        Self {
            bank_dump_hotkey: default_true(),
        }
    }
}

impl BridgeConfig {
    pub fn flush_interval(&self) -> Duration {
        // A zero period would make the tick spin.
        Duration::from_millis(self.flush_interval_ms.max(1))
    }
}

impl ReflashConfig {
    pub fn settings(&self) -> ReflashSettings {
        ReflashSettings {
            precheck: self.precheck,
            blink_count: self.blink_count,
            blink_interval: Duration::from_millis(self.blink_interval_ms),
            intro_hold: Duration::from_millis(self.intro_hold_ms),
            status_hold: Duration::from_millis(self.status_hold_ms),
        }
    }
}

// ── Config repository ─────────────────────────────────────────────────────────

/// Loads `AppConfig` from `path`, returning `AppConfig::default()` if the
/// file does not exist.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system errors other than "not found",
/// and [`ConfigError::Parse`] if the TOML is malformed.
pub fn load_config(path: &Path) -> Result<AppConfig, ConfigError> {
    match std::fs::read_to_string(path) {
        Ok(content) => Ok(toml::from_str(&content)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(AppConfig::default()),
        Err(e) => Err(ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}

/// Writes `config` to `path`, creating parent directories as needed.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system failures or
/// [`ConfigError::Serialize`] if serialization fails.
pub fn save_config(path: &Path, config: &AppConfig) -> Result<(), ConfigError> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir).map_err(|source| ConfigError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
    }

    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })
}

// ── Tests ─────────────────────────────────────────────────────────────────────
