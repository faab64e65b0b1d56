//! Per-URL request locks.
//!
//! A URL with a request in flight is locked; a second request for it is
//! rejected immediately rather than queued. The lock is released when the
//! guard drops, including on early return or error.

use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

#[derive(Debug, Clone, Default)]
pub struct UrlLocks {
    locked: Arc<DashMap<String, ()>>,
}

impl UrlLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lock `url`, or return `None` if it is already locked.
    pub fn try_lock(&self, url: &str) -> Option<UrlLockGuard> {
        match self.locked.entry(url.to_string()) {
            Entry::Occupied(_) => None,
            Entry::Vacant(slot) => {
                slot.insert(());
                Some(UrlLockGuard {
                    locks: self.locked.clone(),
                    url: url.to_string(),
                })
            }
        }
    }

    pub fn is_locked(&self, url: &str) -> bool {
        self.locked.contains_key(url)
    }

    pub fn len(&self) -> usize {
        self.locked.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locked.is_empty()
    }
}

/// Releases the URL lock on drop.
#[derive(Debug)]
pub struct UrlLockGuard {
    locks: Arc<DashMap<String, ()>>,
    url: String,
}

impl UrlLockGuard {
    pub fn url(&self) -> &str {
        &self.url
    }
}

impl Drop for UrlLockGuard {
    fn drop(&mut self) {
        self.locks.remove(&self.url);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_lock_rejected_until_release() {
        let locks = UrlLocks::new();
        let guard = locks.try_lock("/api/users").unwrap();
        assert_eq!(guard.url(), "/api/users");
        assert!(locks.try_lock("/api/users").is_none());
        assert!(locks.try_lock("/api/orders").is_some());

        drop(guard);
        assert!(!locks.is_locked("/api/users"));
        assert!(locks.try_lock("/api/users").is_some());
        assert!(locks.is_empty());
    }
}
