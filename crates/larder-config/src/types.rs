//! Configuration types mapping to the TOML schema.
//!
//! Top-level config:
//! ```toml
//! [maintenance]            # prune / cap / rotate thresholds
//! [store]                  # location of the session store file
//! [logging]                # log file output
//! ```

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Application name used for data and config directory resolution.
pub(crate) const APP_NAME: &str = "larder";

/// Default session store filename.
pub const DEFAULT_STORE_FILE: &str = "sessions.json";

// ─────────────────────────────────────────────────────────────────────────────
// Top-level Config
// ─────────────────────────────────────────────────────────────────────────────

/// Root configuration structure.
///
/// Maps to the full TOML config file. All sections are optional so that
/// partial configs (e.g., project-local overrides) can be loaded and merged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LarderConfig {
    /// Store maintenance thresholds.
    pub maintenance: Option<MaintenanceConfig>,

    /// Session store location.
    pub store: Option<StoreConfig>,

    /// Log output configuration.
    pub logging: Option<LoggingConfig>,
}

impl LarderConfig {
    /// Create an empty config.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse from a TOML string.
    pub fn from_toml(toml_str: &str) -> crate::Result<Self> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Serialize to a TOML string.
    pub fn to_toml(&self) -> crate::Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Merge another config on top of this one (other takes priority).
    ///
    /// `[maintenance]` merges field by field, so a project file can override
    /// a single threshold without restating the others.
    pub fn merge(&mut self, other: LarderConfig) {
        if let Some(maintenance) = other.maintenance {
            match self.maintenance.as_mut() {
                Some(existing) => existing.merge(maintenance),
                None => self.maintenance = Some(maintenance),
            }
        }

        if other.store.is_some() {
            self.store = other.store;
        }

        if other.logging.is_some() {
            self.logging = other.logging;
        }
    }

    /// Resolved path of the session store file.
    pub fn store_path(&self) -> PathBuf {
        self.store.clone().unwrap_or_default().resolved_path()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Maintenance Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Overrides for the session store maintenance thresholds.
///
/// Every field is optional; unset fields fall back to the built-in defaults
/// owned by the maintenance engine.
///
/// ```toml
/// [maintenance]
/// max_age_ms = 2592000000
/// max_entries = 500
/// max_bytes = 10485760
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MaintenanceConfig {
    /// Entries idle longer than this many milliseconds are pruned.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_age_ms: Option<u64>,

    /// Maximum number of entries kept in the store.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_entries: Option<usize>,

    /// Store file size above which it is rotated to a backup.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_bytes: Option<u64>,
}

impl MaintenanceConfig {
    /// Overlay the fields set in `other`.
    pub fn merge(&mut self, other: MaintenanceConfig) {
        if other.max_age_ms.is_some() {
            self.max_age_ms = other.max_age_ms;
        }
        if other.max_entries.is_some() {
            self.max_entries = other.max_entries;
        }
        if other.max_bytes.is_some() {
            self.max_bytes = other.max_bytes;
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Store Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Location of the persisted session store.
///
/// ```toml
/// [store]
/// path = "/var/lib/app/sessions.json"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Path to the store file. Defaults to `<data dir>/larder/sessions.json`.
    pub path: Option<PathBuf>,
}

impl StoreConfig {
    /// Resolve the store path, falling back to the platform data directory.
    pub fn resolved_path(&self) -> PathBuf {
        self.path.clone().unwrap_or_else(|| {
            dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(APP_NAME)
                .join(DEFAULT_STORE_FILE)
        })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Logging Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Logging configuration section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Whether the JSON log file is written.
    pub file: bool,
    /// Directory for daily log files. Defaults to `<config dir>/logs`.
    pub dir: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            file: true,
            dir: None,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
