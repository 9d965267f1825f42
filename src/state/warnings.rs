//! Per-session warning suppression
//!
//! Records which (session, warning-type) pairs have already been shown so
//! advisory messages fire once per session instead of on every tool call.

use chrono::{DateTime, Duration, Utc};
use eyre::Result;
use indexmap::IndexMap;
use std::sync::Arc;

use super::StateStore;

const DOC: &str = "warnings.json";

/// Records grow until cleanup; 24 hours covers the longest plausible session.
const MAX_AGE_HOURS: i64 = 24;

type WarningMap = IndexMap<String, IndexMap<String, DateTime<Utc>>>;

pub struct WarningTracker {
    store: Arc<dyn StateStore>,
}

impl WarningTracker {
    pub fn new(store: Arc<dyn StateStore>) -> Self {
        Self { store }
    }

    fn load(&self) -> Result<WarningMap> {
        match self.store.read_doc(DOC)? {
            Some(value) => Ok(serde_json::from_value(value).unwrap_or_default()),
            None => Ok(WarningMap::default()),
        }
    }

    fn save(&self, map: &WarningMap) -> Result<()> {
        self.store.write_doc(DOC, &serde_json::to_value(map)?)
    }

    /// True the first time a (session, warning-type) pair is seen; false on
    /// repeats. Records the timestamp on the first call.
    pub fn should_warn(&self, session_id: &str, warning_type: &str) -> Result<bool> {
        let mut map = self.load()?;

        let session = map.entry(session_id.to_string()).or_default();
        if session.contains_key(warning_type) {
            return Ok(false);
        }

        session.insert(warning_type.to_string(), Utc::now());
        self.save(&map)?;
        Ok(true)
    }

    /// Always true; still records the timestamp so later suppressed checks
    /// see the warning as shown.
    pub fn force_warn(&self, session_id: &str, warning_type: &str) -> Result<bool> {
        let mut map = self.load()?;
        map.entry(session_id.to_string())
            .or_default()
            .insert(warning_type.to_string(), Utc::now());
        self.save(&map)?;
        Ok(true)
    }

    /// Drop sessions whose newest record is older than 24 hours.
    pub fn cleanup(&self) -> Result<usize> {
        let mut map = self.load()?;
        let cutoff = Utc::now() - Duration::hours(MAX_AGE_HOURS);

        let before = map.len();
        map.retain(|_, warnings| warnings.values().any(|ts| *ts > cutoff));
        let removed = before - map.len();

        if removed > 0 {
            self.save(&map)?;
        }
        Ok(removed)
    }

    /// Number of tracked sessions.
    pub fn session_count(&self) -> Result<usize> {
        Ok(self.load()?.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::MemoryStore;

    fn tracker() -> WarningTracker {
        WarningTracker::new(Arc::new(MemoryStore::new()))
    }

    #[test]
    fn test_warns_once_per_pair() {
        let tracker = tracker();
        assert!(tracker.should_warn("s1", "sensitive-read").unwrap());
        assert!(!tracker.should_warn("s1", "sensitive-read").unwrap());
    }

    #[test]
    fn test_distinct_pairs_warn_independently() {
        let tracker = tracker();
        assert!(tracker.should_warn("s1", "sensitive-read").unwrap());
        assert!(tracker.should_warn("s1", "format-failed").unwrap());
        assert!(tracker.should_warn("s2", "sensitive-read").unwrap());
    }

    #[test]
    fn test_force_warn_always_true() {
        let tracker = tracker();
        assert!(tracker.force_warn("s1", "policy-advisory").unwrap());
        assert!(tracker.force_warn("s1", "policy-advisory").unwrap());
        // The forced record still suppresses the plain check.
        assert!(!tracker.should_warn("s1", "policy-advisory").unwrap());
    }

    #[test]
    fn test_cleanup_drops_stale_sessions() {
        let tracker = tracker();
        tracker.should_warn("old", "x").unwrap();

        // Backdate the record past the cutoff.
        let mut map = tracker.load().unwrap();
        map.get_mut("old").unwrap().insert(
            "x".to_string(),
            Utc::now() - Duration::hours(MAX_AGE_HOURS + 1),
        );
        tracker.save(&map).unwrap();

        tracker.should_warn("fresh", "y").unwrap();

        assert_eq!(tracker.cleanup().unwrap(), 1);
        assert_eq!(tracker.session_count().unwrap(), 1);
        // The stale pair warns again after cleanup.
        assert!(tracker.should_warn("old", "x").unwrap());
    }
}
