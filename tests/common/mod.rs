//! Shared utilities for integration tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures_util::future::BoxFuture;
use parking_lot::Mutex;
use serde_json::Value;

use partial::events::{Event, EventKind};
use partial::transport::{NetworkError, Transport, TransportRequest};
use partial::{Framework, FrameworkConfig};

/// Transport answering from a fixed table of URL → result.
#[derive(Default)]
pub struct MockTransport {
    responses: Mutex<HashMap<String, Result<Value, NetworkError>>>,
    requests: Mutex<Vec<TransportRequest>>,
    calls: AtomicUsize,
    delay: Option<Duration>,
}

#[allow(dead_code)]
impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep every request in flight for `delay`.
    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::default()
        }
    }

    pub fn respond(&self, url: &str, result: Result<Value, NetworkError>) {
        self.responses.lock().insert(url.to_string(), result);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<TransportRequest> {
        self.requests.lock().clone()
    }
}

impl Transport for MockTransport {
    fn execute(&self, request: TransportRequest) -> BoxFuture<'_, Result<Value, NetworkError>> {
        Box::pin(async move {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            let result = self
                .responses
                .lock()
                .get(&request.url)
                .cloned()
                .unwrap_or_else(|| {
                    Err(NetworkError::Status {
                        code: 404,
                        body: "not found".into(),
                    })
                });
            self.requests.lock().push(request);
            result
        })
    }
}

/// Framework with default configuration over `transport`.
#[allow(dead_code)]
pub fn framework_with(transport: Arc<MockTransport>) -> Arc<Framework> {
    Arc::new(Framework::with_transport(FrameworkConfig::default(), transport).unwrap())
}

#[allow(dead_code)]
pub fn framework() -> Arc<Framework> {
    framework_with(Arc::new(MockTransport::new()))
}

/// Record every event of the given kinds, in emission order.
#[allow(dead_code)]
pub fn record(framework: &Framework, kinds: &[EventKind]) -> Arc<Mutex<Vec<Event>>> {
    let events = Arc::new(Mutex::new(Vec::new()));
    for &kind in kinds {
        let sink = events.clone();
        framework.on(kind, move |e| sink.lock().push(e.clone()));
    }
    events
}

/// Shared call log for handlers.
#[allow(dead_code)]
pub fn call_log() -> Arc<Mutex<Vec<String>>> {
    Arc::new(Mutex::new(Vec::new()))
}
