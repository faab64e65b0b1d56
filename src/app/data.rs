//! Data API: cached, per-URL locked GET and POST.
//!
//! # Data Flow
//! ```text
//! get / post(url, cache, callback)
//!     → URL locked?             → false
//!     → cache key present?      → callback(cached), true
//!     → lock URL, emit begin
//!     → Transport::execute
//!     → unlock, emit end (with the response body on success)
//!     → Ok: write cache, callback(value)
//!     → Err: error log + error event
//! ```

use serde_json::Value;

use crate::app::Framework;
use crate::cache::minutes;
use crate::events::{Event, RequestPhase};
use crate::observability::metrics;
use crate::transport::{Method, TransportRequest};

/// Cache the response under `key`, for `expire_minutes` or the configured default.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheDirective {
    pub key: String,
    pub expire_minutes: Option<u64>,
}

impl CacheDirective {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            expire_minutes: None,
        }
    }

    pub fn expire_minutes(mut self, minutes: u64) -> Self {
        self.expire_minutes = Some(minutes);
        self
    }
}

fn request_event(method: Method, phase: RequestPhase, url: &str, body: Option<Value>) -> Event {
    let url = url.to_string();
    match method {
        Method::Get => Event::Get { phase, url, body },
        Method::Post => Event::Post { phase, url, body },
    }
}

impl Framework {
    /// GET `url`. Returns false only when a request for `url` is already in flight.
    pub async fn get<F>(&self, url: &str, cache: Option<CacheDirective>, callback: F) -> bool
    where
        F: FnOnce(&Value) + Send,
    {
        self.request(TransportRequest::get(url), cache, callback)
            .await
    }

    /// POST `data` as JSON to `url`. Same locking and caching rules as [`Framework::get`].
    pub async fn post<F>(
        &self,
        url: &str,
        data: Value,
        cache: Option<CacheDirective>,
        callback: F,
    ) -> bool
    where
        F: FnOnce(&Value) + Send,
    {
        self.request(TransportRequest::post(url, data), cache, callback)
            .await
    }

    async fn request<F>(
        &self,
        request: TransportRequest,
        cache: Option<CacheDirective>,
        callback: F,
    ) -> bool
    where
        F: FnOnce(&Value) + Send,
    {
        let method = request.method;
        let url = request.url.clone();

        if self.locks.is_locked(&url) {
            tracing::debug!(method = %method, url = %url, "Request already in flight");
            metrics::record_request(method.as_str(), "locked");
            return false;
        }

        if let Some(hit) = cache.as_ref().and_then(|d| self.data_cache.read(&d.key)) {
            tracing::trace!(method = %method, url = %url, "Served from cache");
            metrics::record_request(method.as_str(), "cached");
            callback(&hit);
            return true;
        }

        let Some(guard) = self.locks.try_lock(&url) else {
            metrics::record_request(method.as_str(), "locked");
            return false;
        };

        self.events()
            .emit(&request_event(method, RequestPhase::Begin, &url, None));
        let result = self.transport.execute(request).await;
        drop(guard);
        let body = result.as_ref().ok().cloned();
        self.events()
            .emit(&request_event(method, RequestPhase::End, &url, body));

        match result {
            Ok(value) => {
                metrics::record_request(method.as_str(), "ok");
                if let Some(directive) = cache {
                    let expire = directive
                        .expire_minutes
                        .unwrap_or(self.config().cache.default_expire_minutes);
                    self.data_cache
                        .write_for(directive.key, value.clone(), minutes(expire));
                }
                callback(&value);
            }
            Err(e) => {
                metrics::record_request(method.as_str(), "error");
                tracing::warn!(method = %method, url = %url, error = %e, "Request failed");
                self.dispatcher.record_error(&url, &e.to_string());
                self.events().emit(&Event::Error {
                    message: e.to_string(),
                    url,
                });
            }
        }

        true
    }
}
