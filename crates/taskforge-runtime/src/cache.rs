use dashmap::DashMap;
use serde_json::Value;
use std::time::{Duration, Instant};

// Per-kind TTL overrides. Tasks and everything unnamed use the default
// (5 minutes via config); templates and code patterns change rarely and
// keep a longer window.
pub(crate) const TEMPLATES_TTL: Duration = Duration::from_secs(15 * 60);
pub(crate) const CODE_PATTERNS_TTL: Duration = Duration::from_secs(15 * 60);
pub(crate) const LEARNINGS_TTL: Duration = Duration::from_secs(5 * 60);

/// Process-local TTL cache over opaque JSON values.
///
/// Writes must invalidate the touched key plus its list prefix (e.g.
/// `task:{id}` and `tasks:*`) before the operation returns; the cache must
/// never serve state that has not committed.
pub struct Cache {
    entries: DashMap<String, Entry>,
    default_ttl: Duration,
}

struct Entry {
    value: Value,
    expires_at: Instant,
}

impl Cache {
    pub fn new(default_ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            default_ttl,
        }
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        let entry = self.entries.get(key)?;
        if entry.expires_at <= Instant::now() {
            drop(entry);
            self.entries.remove(key);
            return None;
        }
        Some(entry.value.clone())
    }

    pub fn set(&self, key: impl Into<String>, value: Value, ttl: Option<Duration>) {
        self.entries.insert(
            key.into(),
            Entry {
                value,
                expires_at: Instant::now() + ttl.unwrap_or(self.default_ttl),
            },
        );
    }

    pub fn invalidate(&self, key: &str) {
        self.entries.remove(key);
    }

    /// Wildcard-style clear: a trailing `*` removes every key with the
    /// prefix (`tasks:*`); without one, an exact key is removed.
    pub fn invalidate_pattern(&self, pattern: &str) {
        match pattern.strip_suffix('*') {
            Some(prefix) => self.entries.retain(|key, _| !key.starts_with(prefix)),
            None => {
                self.entries.remove(pattern);
            }
        }
    }

    pub fn get_or_set<F>(&self, key: &str, ttl: Option<Duration>, factory: F) -> Value
    where
        F: FnOnce() -> Value,
    {
        if let Some(hit) = self.get(key) {
            return hit;
        }
        let value = factory();
        self.set(key.to_string(), value.clone(), ttl);
        value
    }

    /// Drop expired entries; called from the background sweep.
    pub fn sweep_expired(&self) -> usize {
        let now = Instant::now();
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.expires_at > now);
        before - self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_get_set_round_trip() {
        let cache = Cache::new(Duration::from_secs(60));
        cache.set("task:1", json!({"id": 1}), None);
        assert_eq!(cache.get("task:1"), Some(json!({"id": 1})));
        assert_eq!(cache.get("task:2"), None);
    }

    #[test]
    fn test_expiry() {
        let cache = Cache::new(Duration::from_secs(60));
        cache.set("k", json!(1), Some(Duration::ZERO));
        assert_eq!(cache.get("k"), None);
    }

    #[test]
    fn test_pattern_invalidation() {
        let cache = Cache::new(Duration::from_secs(60));
        cache.set("tasks:all", json!(1), None);
        cache.set("tasks:backlog", json!(2), None);
        cache.set("task:1", json!(3), None);

        cache.invalidate_pattern("tasks:*");
        assert_eq!(cache.get("tasks:all"), None);
        assert_eq!(cache.get("tasks:backlog"), None);
        assert_eq!(cache.get("task:1"), Some(json!(3)));
    }

    #[test]
    fn test_get_or_set_calls_factory_once() {
        let cache = Cache::new(Duration::from_secs(60));
        let first = cache.get_or_set("k", None, || json!("fresh"));
        let second = cache.get_or_set("k", None, || json!("stale"));
        assert_eq!(first, json!("fresh"));
        assert_eq!(second, json!("fresh"));
    }

    #[test]
    fn test_sweep_removes_only_expired() {
        let cache = Cache::new(Duration::from_secs(60));
        cache.set("dead", json!(1), Some(Duration::ZERO));
        cache.set("alive", json!(2), None);
        let swept = cache.sweep_expired();
        assert_eq!(swept, 1);
        assert_eq!(cache.len(), 1);
    }
}
