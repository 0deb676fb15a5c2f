//! Age-based removal of stale session entries.

use std::time::Duration;

use tracing::{debug, trace};

use crate::entry::{SessionStore, now_ms};

/// Remove every entry idle for longer than `max_age`.
///
/// Returns the number of entries removed. Entries without `updated_at` are
/// never removed: their age cannot be computed.
pub fn prune_stale_entries(store: &mut SessionStore, max_age: Duration) -> usize {
    prune_stale_entries_at(store, max_age, now_ms())
}

/// Like [`prune_stale_entries`], measuring every entry against `now_ms`.
pub fn prune_stale_entries_at(store: &mut SessionStore, max_age: Duration, now_ms: i64) -> usize {
    let max_age_ms = i64::try_from(max_age.as_millis()).unwrap_or(i64::MAX);
    let before = store.len();

    store.retain(|session_id, entry| match entry.age_ms(now_ms) {
        Some(age) if age > max_age_ms => {
            trace!(session_id = %session_id, age_ms = age, "Pruning stale session");
            false
        }
        _ => true,
    });

    let removed = before - store.len();
    if removed > 0 {
        debug!(removed, max_age_ms, "Pruned stale sessions");
    }
    removed
}
