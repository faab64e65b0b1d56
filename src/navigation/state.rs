//! Navigation state: current URL, query, repository, history and error log.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use crate::navigation::query::QueryParams;

/// Ring buffer that evicts its oldest entry once full.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundedLog<T> {
    entries: VecDeque<T>,
    capacity: usize,
}

impl<T> BoundedLog<T> {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity.min(64)),
            capacity,
        }
    }

    pub fn push(&mut self, entry: T) {
        if self.capacity == 0 {
            return;
        }
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(entry);
    }

    pub fn pop(&mut self) -> Option<T> {
        self.entries.pop_back()
    }

    pub fn last(&self) -> Option<&T> {
        self.entries.back()
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl<T: Clone> BoundedLog<T> {
    pub fn to_vec(&self) -> Vec<T> {
        self.entries.iter().cloned().collect()
    }
}

/// Where the dispatcher is in its cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DispatchPhase {
    #[default]
    Idle,
    Matching,
    Invoking,
    Settled,
}

/// One entry of the error log.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorRecord {
    pub url: String,
    pub message: String,
    pub at: DateTime<Utc>,
}

impl ErrorRecord {
    pub fn new(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            message: message.into(),
            at: Utc::now(),
        }
    }
}

/// State owned by the dispatcher and mutated only during a location change.
#[derive(Debug, Clone)]
pub struct NavigationState {
    pub url: String,
    pub query: QueryParams,
    /// Transient model handed over by `redirect`, reset on every dispatch.
    pub repository: Value,
    pub history: BoundedLog<String>,
    pub errors: BoundedLog<ErrorRecord>,
    pub phase: DispatchPhase,
}

impl NavigationState {
    pub fn new(history_capacity: usize, error_capacity: usize) -> Self {
        Self {
            url: String::new(),
            query: QueryParams::default(),
            repository: Value::Object(Default::default()),
            history: BoundedLog::new(history_capacity),
            errors: BoundedLog::new(error_capacity),
            phase: DispatchPhase::Idle,
        }
    }

    /// Record the outgoing URL before moving to a new one.
    ///
    /// Skipped for refreshes, for the very first navigation and when the URL
    /// is already the newest history entry.
    pub fn remember_previous(&mut self, is_refresh: bool) {
        if is_refresh || self.url.is_empty() {
            return;
        }
        if self.history.last() == Some(&self.url) {
            return;
        }
        self.history.push(self.url.clone());
    }
}
