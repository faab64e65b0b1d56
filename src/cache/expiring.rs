//! Key/value store with per-entry absolute expiry.
//!
//! Reads never check expiry. Expired entries are removed only by
//! [`ExpiringCache::sweep`], so a reader can observe a logically expired value
//! for up to one sweep interval.

use std::sync::Arc;
use std::time::{Duration, SystemTime};

use dashmap::DashMap;

use crate::observability::metrics;

/// Latest representable expiry, 9999-12-31T23:59:59Z.
const FAR_FUTURE_SECS: u64 = 253_402_300_799;

/// Lifetime of `minutes`, saturating instead of overflowing.
pub fn minutes(minutes: u64) -> Duration {
    Duration::from_secs(minutes.saturating_mul(60))
}

/// `now + ttl`, clamped to a far-future instant when the sum overflows.
pub fn expiry_after(now: SystemTime, ttl: Duration) -> SystemTime {
    let far_future = SystemTime::UNIX_EPOCH + Duration::from_secs(FAR_FUTURE_SECS);
    now.checked_add(ttl)
        .map_or(far_future, |at| at.min(far_future))
}

/// A cached value and the moment it stops being valid.
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    pub value: V,
    pub expires_at: SystemTime,
}

impl<V> CacheEntry<V> {
    /// Strictly before `now`.
    pub fn is_expired_at(&self, now: SystemTime) -> bool {
        self.expires_at < now
    }
}

/// Anything the sweeper can evict from.
pub trait Sweep: Send + Sync {
    fn name(&self) -> &str;

    /// Remove entries expired at `now`; returns how many were removed.
    fn sweep_at(&self, now: SystemTime) -> usize;

    fn len(&self) -> usize;
}

/// Thread-safe expiring cache. Cloning shares the underlying map.
#[derive(Debug, Clone)]
pub struct ExpiringCache<V> {
    name: &'static str,
    inner: Arc<DashMap<String, CacheEntry<V>>>,
}

impl<V: Clone + Send + Sync + 'static> ExpiringCache<V> {
    /// Create an empty cache. `name` labels logs and metrics.
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            inner: Arc::new(DashMap::new()),
        }
    }

    /// Store `value` until `expires_at`, replacing any previous entry.
    pub fn write(&self, key: impl Into<String>, value: V, expires_at: SystemTime) -> V {
        self.inner.insert(
            key.into(),
            CacheEntry {
                value: value.clone(),
                expires_at,
            },
        );
        metrics::record_cache_size(self.name, self.inner.len());
        value
    }

    /// Store `value` for `ttl` from now.
    pub fn write_for(&self, key: impl Into<String>, value: V, ttl: Duration) -> V {
        self.write(key, value, expiry_after(SystemTime::now(), ttl))
    }

    /// Stored value, whether or not it has expired.
    pub fn read(&self, key: &str) -> Option<V> {
        self.inner.get(key).map(|r| r.value().value.clone())
    }

    pub fn entry(&self, key: &str) -> Option<CacheEntry<V>> {
        self.inner.get(key).map(|r| r.value().clone())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.inner.contains_key(key)
    }

    pub fn remove(&self, key: &str) -> Option<V> {
        let removed = self.inner.remove(key).map(|(_, entry)| entry.value);
        metrics::record_cache_size(self.name, self.inner.len());
        removed
    }

    /// Remove every entry whose key contains `filter`.
    pub fn remove_all(&self, filter: &str) -> usize {
        let mut removed = 0;
        self.inner.retain(|key, _| {
            let keep = !key.contains(filter);
            if !keep {
                removed += 1;
            }
            keep
        });
        metrics::record_cache_size(self.name, self.inner.len());
        removed
    }

    /// Evict entries expired at `now`.
    pub fn sweep_at(&self, now: SystemTime) -> usize {
        let mut evicted = 0;
        self.inner.retain(|_, entry| {
            let keep = !entry.is_expired_at(now);
            if !keep {
                evicted += 1;
            }
            keep
        });

        if evicted > 0 {
            tracing::debug!(cache = self.name, evicted, remaining = self.inner.len(), "Cache sweep");
        }
        metrics::record_cache_evictions(self.name, evicted);
        metrics::record_cache_size(self.name, self.inner.len());
        evicted
    }

    pub fn sweep(&self) -> usize {
        self.sweep_at(SystemTime::now())
    }

    pub fn keys(&self) -> Vec<String> {
        self.inner.iter().map(|r| r.key().clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn clear(&self) {
        self.inner.clear();
        metrics::record_cache_size(self.name, 0);
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl<V: Clone + Send + Sync + 'static> Sweep for ExpiringCache<V> {
    fn name(&self) -> &str {
        self.name
    }

    fn sweep_at(&self, now: SystemTime) -> usize {
        ExpiringCache::sweep_at(self, now)
    }

    fn len(&self) -> usize {
        ExpiringCache::len(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_ignores_expiry_until_sweep() {
        let cache = ExpiringCache::new("test");
        let past = SystemTime::now() - Duration::from_millis(1);

        assert_eq!(cache.write("k", "v".to_string(), past), "v");
        assert_eq!(cache.read("k").as_deref(), Some("v"));

        assert_eq!(cache.sweep(), 1);
        assert_eq!(cache.read("k"), None);
    }

    #[test]
    fn test_sweep_keeps_live_entries() {
        let cache = ExpiringCache::new("test");
        let now = SystemTime::now();
        cache.write("old", 1, now - Duration::from_secs(5));
        cache.write("fresh", 2, now + Duration::from_secs(60));
        cache.write("edge", 3, now);

        // expiry is strict: an entry expiring exactly at `now` survives
        assert_eq!(cache.sweep_at(now), 1);
        assert_eq!(cache.read("fresh"), Some(2));
        assert_eq!(cache.read("edge"), Some(3));
        assert_eq!(cache.read("old"), None);
    }

    #[test]
    fn test_overwrite_replaces_expiry() {
        let cache = ExpiringCache::new("test");
        let now = SystemTime::now();
        cache.write("k", 1, now + Duration::from_secs(60));
        cache.write("k", 2, now - Duration::from_secs(1));

        let entry = cache.entry("k").unwrap();
        assert_eq!(entry.value, 2);
        assert!(entry.is_expired_at(now));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_remove_and_remove_all() {
        let cache = ExpiringCache::new("test");
        let later = SystemTime::now() + Duration::from_secs(60);
        cache.write("user.1", "a", later);
        cache.write("user.2", "b", later);
        cache.write("product.1", "c", later);

        assert_eq!(cache.remove("user.1"), Some("a"));
        assert_eq!(cache.remove("user.1"), None);
        assert_eq!(cache.remove_all("user."), 1);
        assert_eq!(cache.keys(), vec!["product.1".to_string()]);
        assert_eq!(cache.remove_all("missing"), 0);
    }

    #[test]
    fn test_clones_share_storage() {
        let cache = ExpiringCache::new("test");
        let other = cache.clone();
        cache.write_for("k", 7, Duration::from_secs(60));
        assert_eq!(other.read("k"), Some(7));
        other.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn test_long_lifetime_is_clamped() {
        let cache = ExpiringCache::new("test");
        cache.write_for("forever", 1, minutes(u64::MAX / 60));
        cache.write_for("max", 2, Duration::MAX);

        let entry = cache.entry("forever").unwrap();
        assert!(!entry.is_expired_at(SystemTime::now() + Duration::from_secs(86_400 * 365 * 1000)));
        assert_eq!(cache.entry("max").unwrap().expires_at, entry.expires_at);
        assert_eq!(cache.sweep(), 0);
    }

    #[test]
    fn test_minutes_saturates() {
        assert_eq!(minutes(10), Duration::from_secs(600));
        assert_eq!(minutes(u64::MAX), Duration::from_secs(u64::MAX));
    }
}
