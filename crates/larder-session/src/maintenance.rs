//! Maintenance entry points with threshold resolution.
//!
//! [`SessionMaintenance`] pairs the prune, cap and rotate operations with a
//! [`MaintenanceConfigSource`]. Each call takes an optional override; when it
//! is absent the threshold comes from the source, and from the built-in
//! defaults when the source has nothing.

use std::path::Path;
use std::time::Duration;

use larder_config::MaintenanceConfig;
use serde::Serialize;
use tracing::{debug, info};

use crate::cap;
use crate::entry::SessionStore;
use crate::error::Result;
use crate::prune;
use crate::rotate;
use crate::settings::{MaintenanceConfigSource, MaintenanceSettings, NoConfig};
use crate::store;

/// Outcome of a full maintenance pass over a store file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MaintenanceReport {
    /// Entries removed for exceeding the maximum age.
    pub pruned: usize,
    /// Entries evicted to respect the maximum count.
    pub evicted: usize,
    /// Entries left in the store.
    pub remaining: usize,
    /// Whether the store file was moved to a backup.
    pub rotated: bool,
    /// Whether a store file was written.
    pub saved: bool,
}

/// Session store maintenance bound to a configuration source.
#[derive(Debug, Clone, Default)]
pub struct SessionMaintenance<C: MaintenanceConfigSource = NoConfig> {
    config: C,
}

impl SessionMaintenance<NoConfig> {
    /// Maintenance using only the built-in defaults.
    pub fn new() -> Self {
        Self::with_config(NoConfig)
    }
}

impl<C: MaintenanceConfigSource> SessionMaintenance<C> {
    /// Maintenance that resolves defaults through `config`.
    pub fn with_config(config: C) -> Self {
        Self { config }
    }

    /// Thresholds currently in effect when no override is passed.
    pub fn settings(&self) -> MaintenanceSettings {
        self.config.settings()
    }

    /// Remove entries idle for longer than `max_age` (or the configured age).
    pub fn prune_stale_entries(&self, store: &mut SessionStore, max_age: Option<Duration>) -> usize {
        let max_age = max_age.unwrap_or_else(|| self.settings().max_age);
        prune::prune_stale_entries(store, max_age)
    }

    /// Evict the lowest-priority entries until at most `max_entries` remain.
    pub fn cap_entry_count(&self, store: &mut SessionStore, max_entries: Option<usize>) -> usize {
        let max_entries = max_entries.unwrap_or_else(|| self.settings().max_entries);
        cap::cap_entry_count(store, max_entries)
    }

    /// Rotate the store file if it exceeds `max_bytes` (or the configured size).
    pub async fn rotate_session_file(&self, path: &Path, max_bytes: Option<u64>) -> Result<bool> {
        let max_bytes = max_bytes.unwrap_or_else(|| self.settings().max_bytes);
        rotate::rotate_session_file(path, max_bytes).await
    }

    /// Prune, cap, rotate and persist the store at `path`.
    ///
    /// Thresholds come from the configuration source, with any field set in
    /// `overrides` taking precedence. Rotation runs against the file as found
    /// on disk, before the maintained store is written back. The store is
    /// saved when entries were removed or when rotation left the path empty.
    ///
    /// With `dry_run` nothing is renamed or written: the report says what a
    /// real pass would do, with `rotated` meaning the file is over threshold.
    pub async fn run(
        &self,
        path: &Path,
        overrides: &MaintenanceConfig,
        dry_run: bool,
    ) -> Result<MaintenanceReport> {
        let settings = self.settings().merge(overrides);
        let mut sessions = store::load_store(path).await?;

        let pruned = prune::prune_stale_entries(&mut sessions, settings.max_age);
        let evicted = cap::cap_entry_count(&mut sessions, settings.max_entries);

        if dry_run {
            let rotated = rotate::exceeds_threshold(path, settings.max_bytes).await?;
            debug!(path = %path.display(), pruned, evicted, rotated, "Dry run, store untouched");
            return Ok(MaintenanceReport {
                pruned,
                evicted,
                remaining: sessions.len(),
                rotated,
                saved: false,
            });
        }

        let rotated = rotate::rotate_session_file(path, settings.max_bytes).await?;

        let saved = pruned > 0 || evicted > 0 || rotated;
        if saved {
            store::save_store(path, &sessions).await?;
        }

        let report = MaintenanceReport {
            pruned,
            evicted,
            remaining: sessions.len(),
            rotated,
            saved,
        };

        info!(
            path = %path.display(),
            pruned = report.pruned,
            evicted = report.evicted,
            remaining = report.remaining,
            rotated = report.rotated,
            "Session store maintenance complete"
        );

        Ok(report)
    }
}
