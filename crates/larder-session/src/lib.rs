//! Session store maintenance.
//!
//! Keeps a persisted session store bounded in age, count, and file size:
//! - Pruning of entries idle longer than a maximum age
//! - Capping the entry count, evicting untimestamped then oldest entries
//! - Rotating an oversized store file to timestamped backups (3 retained)
//!
//! # Example
//!
//! ```rust,ignore
//! use larder_session::{SessionMaintenance, load_store, save_store};
//!
//! let maintenance = SessionMaintenance::with_config(loaded_config);
//! let mut store = load_store(&path).await?;
//! maintenance.prune_stale_entries(&mut store, None);
//! maintenance.cap_entry_count(&mut store, None);
//! maintenance.rotate_session_file(&path, None).await?;
//! save_store(&path, &store).await?;
//! ```

mod cap;
mod entry;
mod error;
mod maintenance;
mod prune;
mod rotate;
mod settings;
mod store;

pub use cap::cap_entry_count;
pub use entry::{EvictionRank, SessionEntry, SessionStore, eviction_order, now_ms};
pub use error::{Error, Result};
pub use maintenance::{MaintenanceReport, SessionMaintenance};
pub use prune::{prune_stale_entries, prune_stale_entries_at};
pub use rotate::{list_backups, rotate_session_file};
pub use settings::{
    BACKUP_RETENTION, DEFAULT_MAX_AGE, DEFAULT_MAX_BYTES, DEFAULT_MAX_ENTRIES,
    MaintenanceConfigSource, MaintenanceSettings, NoConfig,
};
pub use store::{load_store, save_store};
