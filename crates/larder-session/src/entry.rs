//! Session records and the ordering used to evict them.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The in-memory session store: session id to entry.
///
/// A `BTreeMap` keeps iteration (and therefore eviction tie-breaking)
/// independent of insertion history.
pub type SessionStore = BTreeMap<String, SessionEntry>;

/// One record in the session store.
///
/// Only `updatedAt` matters to maintenance. Every other field is carried in
/// `extra` and written back exactly as it was read.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionEntry {
    /// Identifier recorded inside the entry. The store key is authoritative.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,

    /// Last activity, in milliseconds since the Unix epoch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<i64>,

    /// Fields owned by the session producer.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SessionEntry {
    /// Create an entry with no timestamp.
    pub fn new(session_id: impl Into<String>) -> Self {
        Self {
            session_id: Some(session_id.into()),
            ..Self::default()
        }
    }

    /// Set the last-activity timestamp (epoch milliseconds).
    pub fn with_updated_at(mut self, updated_at_ms: i64) -> Self {
        self.updated_at = Some(updated_at_ms);
        self
    }

    /// Attach a producer-owned field.
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    /// Milliseconds since last activity, or `None` if never timestamped.
    pub fn age_ms(&self, now_ms: i64) -> Option<i64> {
        self.updated_at.map(|ts| now_ms.saturating_sub(ts))
    }
}

/// Current wall-clock time in epoch milliseconds.
pub fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

/// Eviction priority of a single entry. Lower ranks are evicted first.
///
/// Untimestamped entries rank below every timestamped one, older timestamps
/// rank below newer ones, and the session id breaks remaining ties.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EvictionRank<'a> {
    pub updated_at: Option<i64>,
    pub session_id: &'a str,
}

impl<'a> EvictionRank<'a> {
    pub fn of(session_id: &'a str, entry: &SessionEntry) -> Self {
        Self {
            updated_at: entry.updated_at,
            session_id,
        }
    }
}

impl Ord for EvictionRank<'_> {
    fn cmp(&self, other: &Self) -> Ordering {
        // Option orders None before Some, which is exactly the priority we want.
        self.updated_at
            .cmp(&other.updated_at)
            .then_with(|| self.session_id.cmp(other.session_id))
    }
}

impl PartialOrd for EvictionRank<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Session ids in eviction order, lowest priority first.
pub fn eviction_order(store: &SessionStore) -> Vec<&str> {
    let mut ranks: Vec<EvictionRank<'_>> = store
        .iter()
        .map(|(id, entry)| EvictionRank::of(id, entry))
        .collect();
    ranks.sort_unstable();
    ranks.into_iter().map(|r| r.session_id).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_untimestamped_ranks_lowest() {
        let never = SessionEntry::new("a");
        let ancient = SessionEntry::new("b").with_updated_at(i64::MIN);

        assert!(EvictionRank::of("z", &never) < EvictionRank::of("a", &ancient));
    }

    #[test]
    fn test_older_ranks_lower() {
        let old = SessionEntry::new("old").with_updated_at(1_000);
        let new = SessionEntry::new("new").with_updated_at(2_000);

        assert!(EvictionRank::of("old", &old) < EvictionRank::of("new", &new));
    }

    #[test]
    fn test_ties_broken_by_session_id() {
        let mut store = SessionStore::new();
        store.insert("b".into(), SessionEntry::new("b").with_updated_at(5));
        store.insert("a".into(), SessionEntry::new("a").with_updated_at(5));
        store.insert("d".into(), SessionEntry::new("d"));
        store.insert("c".into(), SessionEntry::new("c"));

        assert_eq!(eviction_order(&store), vec!["c", "d", "a", "b"]);
    }

    #[test]
    fn test_age_ms() {
        let entry = SessionEntry::new("s").with_updated_at(1_000);
        assert_eq!(entry.age_ms(4_000), Some(3_000));
        assert_eq!(SessionEntry::new("s").age_ms(4_000), None);
    }

    #[test]
    fn test_serde_preserves_unknown_fields() {
        let json = r#"{"sessionId":"s1","updatedAt":1700000000000,"channel":"web","turns":[1,2]}"#;
        let entry: SessionEntry = serde_json::from_str(json).unwrap();

        assert_eq!(entry.session_id.as_deref(), Some("s1"));
        assert_eq!(entry.updated_at, Some(1_700_000_000_000));
        assert_eq!(entry.extra["channel"], "web");

        let back: Value = serde_json::to_value(&entry).unwrap();
        let original: Value = serde_json::from_str(json).unwrap();
        assert_eq!(back, original);
    }

    #[test]
    fn test_missing_updated_at_is_none() {
        let entry: SessionEntry = serde_json::from_str(r#"{"sessionId":"s1"}"#).unwrap();
        assert!(entry.updated_at.is_none());
    }
}
