//! Count-based eviction of the lowest-priority session entries.

use tracing::{debug, trace};

use crate::entry::{SessionStore, eviction_order};

/// Evict entries until at most `max_entries` remain.
///
/// Entries without `updated_at` go first, then the oldest timestamps, with
/// the session id breaking ties. Exactly `len - max_entries` entries are
/// evicted when over the cap; none otherwise. Returns the eviction count.
pub fn cap_entry_count(store: &mut SessionStore, max_entries: usize) -> usize {
    if store.len() <= max_entries {
        return 0;
    }
    let excess = store.len() - max_entries;

    let victims: Vec<String> = eviction_order(store)
        .into_iter()
        .take(excess)
        .map(str::to_owned)
        .collect();

    for session_id in &victims {
        trace!(session_id = %session_id, "Evicting session over capacity");
        store.remove(session_id);
    }

    debug!(
        evicted = victims.len(),
        max_entries,
        remaining = store.len(),
        "Capped session store"
    );
    victims.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::SessionEntry;
    use std::collections::BTreeSet;

    const NOW: i64 = 1_760_000_000_000;

    /// `n` entries where `key-i` is `i` minutes old.
    fn aged_store(n: usize) -> SessionStore {
        (0..n)
            .map(|i| {
                let id = format!("key-{i}");
                let entry = SessionEntry::new(&id).with_updated_at(NOW - (i as i64) * 60_000);
                (id, entry)
            })
            .collect()
    }

    fn keys(store: &SessionStore) -> BTreeSet<String> {
        store.keys().cloned().collect()
    }

    fn set(ids: &[&str]) -> BTreeSet<String> {
        ids.iter().map(|id| id.to_string()).collect()
    }

    #[test]
    fn test_under_cap_is_noop() {
        let mut store = aged_store(3);
        let before = keys(&store);

        assert_eq!(cap_entry_count(&mut store, 3), 0);
        assert_eq!(cap_entry_count(&mut store, 10), 0);
        assert_eq!(keys(&store), before);
    }

    #[test]
    fn test_evicts_oldest_first() {
        let mut store = aged_store(5);

        assert_eq!(cap_entry_count(&mut store, 3), 2);
        assert_eq!(keys(&store), set(&["key-0", "key-1", "key-2"]));
    }

    #[test]
    fn test_default_cap_evicts_single_oldest() {
        let mut store = aged_store(501);

        assert_eq!(cap_entry_count(&mut store, 500), 1);
        assert_eq!(store.len(), 500);
        assert!(!store.contains_key("key-500"));
    }

    #[test]
    fn test_untimestamped_evicted_before_any_timestamped() {
        let mut store = aged_store(3);
        store.insert("ancient".into(), SessionEntry::new("ancient").with_updated_at(0));
        store.insert("never-a".into(), SessionEntry::new("never-a"));
        store.insert("never-b".into(), SessionEntry::new("never-b"));

        assert_eq!(cap_entry_count(&mut store, 4), 2);
        assert!(!store.contains_key("never-a"));
        assert!(!store.contains_key("never-b"));
        assert!(store.contains_key("ancient"));
    }

    #[test]
    fn test_untimestamped_ties_break_by_id() {
        let mut store = SessionStore::new();
        for id in ["c", "a", "b"] {
            store.insert(id.into(), SessionEntry::new(id));
        }

        assert_eq!(cap_entry_count(&mut store, 2), 1);
        assert_eq!(keys(&store), set(&["b", "c"]));
    }

    #[test]
    fn test_exactness() {
        for (len, cap) in [(0, 0), (4, 0), (10, 7), (7, 10)] {
            let mut store = aged_store(len);
            let evicted = cap_entry_count(&mut store, cap);
            assert_eq!(evicted, len.saturating_sub(cap));
            assert_eq!(store.len(), len.min(cap));
        }
    }

    #[test]
    fn test_deterministic_on_identical_input() {
        let mut store = SessionStore::new();
        for id in ["x", "y", "z", "w"] {
            store.insert(id.into(), SessionEntry::new(id).with_updated_at(42));
        }
        let mut again = store.clone();

        cap_entry_count(&mut store, 2);
        cap_entry_count(&mut again, 2);
        assert_eq!(keys(&store), keys(&again));
        assert_eq!(keys(&store), set(&["y", "z"]));
    }
}
