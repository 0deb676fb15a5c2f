//! Maintenance thresholds and their resolution against configuration.
//!
//! Built-in defaults live in [`MaintenanceSettings::default`]. A
//! [`MaintenanceConfigSource`] supplies optional overrides which are merged
//! on top, field by field.

use std::time::Duration;

use larder_config::{LarderConfig, LoadedConfig, MaintenanceConfig};

/// Default maximum idle age before an entry is pruned (30 days).
pub const DEFAULT_MAX_AGE: Duration = Duration::from_secs(30 * 24 * 60 * 60);

/// Default maximum number of entries kept in the store.
pub const DEFAULT_MAX_ENTRIES: usize = 500;

/// Default store file size above which it is rotated (10 MiB).
pub const DEFAULT_MAX_BYTES: u64 = 10 * 1024 * 1024;

/// Number of rotated backups kept per store file.
pub const BACKUP_RETENTION: usize = 3;

/// Fully resolved maintenance thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MaintenanceSettings {
    /// Entries idle longer than this are pruned.
    pub max_age: Duration,

    /// Maximum number of entries kept after capping.
    pub max_entries: usize,

    /// Store file size that triggers rotation.
    pub max_bytes: u64,
}

impl Default for MaintenanceSettings {
    fn default() -> Self {
        Self {
            max_age: DEFAULT_MAX_AGE,
            max_entries: DEFAULT_MAX_ENTRIES,
            max_bytes: DEFAULT_MAX_BYTES,
        }
    }
}

impl MaintenanceSettings {
    /// Built-in defaults overlaid with whatever `overrides` sets.
    pub fn resolve(overrides: &MaintenanceConfig) -> Self {
        Self::default().merge(overrides)
    }

    /// Overlay the fields set in `overrides`.
    pub fn merge(mut self, overrides: &MaintenanceConfig) -> Self {
        if let Some(ms) = overrides.max_age_ms {
            self.max_age = Duration::from_millis(ms);
        }
        if let Some(max) = overrides.max_entries {
            self.max_entries = max;
        }
        if let Some(bytes) = overrides.max_bytes {
            self.max_bytes = bytes;
        }
        self
    }

    /// Maximum age in whole milliseconds, saturating at `i64::MAX`.
    pub fn max_age_ms(&self) -> i64 {
        i64::try_from(self.max_age.as_millis()).unwrap_or(i64::MAX)
    }
}

/// Supplies optional maintenance overrides.
///
/// Implement this to connect maintenance to a configuration backend.
/// Returning `None` (or an empty [`MaintenanceConfig`]) means every
/// threshold uses its built-in default.
pub trait MaintenanceConfigSource {
    /// Load the `[maintenance]` overrides, if any.
    fn load(&self) -> Option<MaintenanceConfig>;

    /// Defaults merged with the loaded overrides.
    fn settings(&self) -> MaintenanceSettings {
        match self.load() {
            Some(overrides) => MaintenanceSettings::resolve(&overrides),
            None => MaintenanceSettings::default(),
        }
    }
}

/// A source with no configuration: every threshold uses its default.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoConfig;

impl MaintenanceConfigSource for NoConfig {
    fn load(&self) -> Option<MaintenanceConfig> {
        None
    }
}

impl MaintenanceConfigSource for MaintenanceConfig {
    fn load(&self) -> Option<MaintenanceConfig> {
        Some(self.clone())
    }
}

impl MaintenanceConfigSource for LarderConfig {
    fn load(&self) -> Option<MaintenanceConfig> {
        self.maintenance.clone()
    }
}

impl MaintenanceConfigSource for LoadedConfig {
    fn load(&self) -> Option<MaintenanceConfig> {
        self.config.maintenance.clone()
    }
}
