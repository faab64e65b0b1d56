//! Navigation dispatch.
//!
//! # Responsibilities
//! - Normalize the requested URL and update navigation state before any callback runs
//! - Invoke partials, then the handler, of every matched route in priority order
//! - Isolate callback faults and report them as one error and one 500 status
//! - Signal 404 when no non-catch-all route matched
//! - Serialize reentrant navigations
//!
//! # Design Decisions
//! - A navigation requested while another runs is queued and dispatched after it, in order
//! - A 404 is emitted even when a catch-all handler ran successfully
//! - No lock is held while callbacks or event listeners run

use std::any::Any;
use std::collections::VecDeque;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::{Mutex, RwLock};
use serde_json::Value;
use thiserror::Error;
use uuid::Uuid;

use crate::app::Framework;
use crate::config::NavigationConfig;
use crate::events::Event;
use crate::navigation::query::{split_url, QueryParams};
use crate::navigation::state::{DispatchPhase, ErrorRecord, NavigationState};
use crate::observability::metrics;
use crate::routing::HandlerResult;

/// Which callback of a route failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Callback {
    Partial(String),
    Handler,
}

impl fmt::Display for Callback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Callback::Partial(name) => write!(f, "partial '{}'", name),
            Callback::Handler => write!(f, "handler"),
        }
    }
}

/// A partial or handler that returned an error or panicked.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("route '{route}' {callback} failed: {message}")]
pub struct RouteExecutionError {
    pub route: String,
    pub callback: Callback,
    pub message: String,
}

/// Outcome of one dispatch.
#[derive(Debug, Clone, PartialEq)]
pub struct DispatchReport {
    pub id: Uuid,
    /// Normalized path that was dispatched.
    pub url: String,
    /// Patterns of the routes that ran, in order.
    pub matched: Vec<String>,
    pub faults: Vec<RouteExecutionError>,
    pub not_found: bool,
}

impl DispatchReport {
    pub fn is_ok(&self) -> bool {
        self.faults.is_empty() && !self.not_found
    }
}

/// Result of submitting a navigation.
#[derive(Debug, Clone, PartialEq)]
pub enum Navigation {
    Dispatched(DispatchReport),
    /// Another dispatch was running; this one runs after it.
    Queued,
}

impl Navigation {
    pub fn report(&self) -> Option<&DispatchReport> {
        match self {
            Navigation::Dispatched(report) => Some(report),
            Navigation::Queued => None,
        }
    }
}

/// A navigation waiting to be dispatched.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingNavigation {
    pub id: Uuid,
    pub url: String,
    pub is_refresh: bool,
    /// Transient model for the next dispatch, from `redirect`.
    pub repository: Option<Value>,
}

impl PendingNavigation {
    pub fn new(url: impl Into<String>, is_refresh: bool) -> Self {
        Self {
            id: Uuid::new_v4(),
            url: url.into(),
            is_refresh,
            repository: None,
        }
    }

    pub fn with_repository(mut self, repository: Value) -> Self {
        self.repository = Some(repository);
        self
    }
}

/// Clears the dispatch flag on drop, including while unwinding.
struct ActiveGuard<'a>(&'a AtomicBool);

impl Drop for ActiveGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Owns navigation state and runs dispatches one at a time.
#[derive(Debug)]
pub struct Dispatcher {
    state: RwLock<NavigationState>,
    queue: Mutex<VecDeque<PendingNavigation>>,
    active: AtomicBool,
}

impl Dispatcher {
    pub fn new(config: &NavigationConfig) -> Self {
        Self {
            state: RwLock::new(NavigationState::new(
                config.history_capacity,
                config.error_log_capacity,
            )),
            queue: Mutex::new(VecDeque::new()),
            active: AtomicBool::new(false),
        }
    }

    /// Queue a navigation and drain the queue unless a dispatch is already running.
    pub fn submit(&self, framework: &Framework, pending: PendingNavigation) -> Navigation {
        let id = pending.id;
        self.queue.lock().push_back(pending);

        if !self.try_activate() {
            tracing::debug!(navigation_id = %id, "Dispatch in progress, navigation queued");
            return Navigation::Queued;
        }

        let mut own = None;
        loop {
            let active = ActiveGuard(&self.active);
            loop {
                let next = self.queue.lock().pop_front();
                let Some(next) = next else { break };
                let report = self.dispatch(framework, next);
                if report.id == id {
                    own = Some(report);
                }
            }

            drop(active);
            // something may have been queued between the last pop and the release
            if self.queue.lock().is_empty() || !self.try_activate() {
                break;
            }
        }

        own.map_or(Navigation::Queued, Navigation::Dispatched)
    }

    fn try_activate(&self) -> bool {
        self.active
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    fn dispatch(&self, framework: &Framework, pending: PendingNavigation) -> DispatchReport {
        let span = tracing::info_span!("navigation", navigation_id = %pending.id);
        let _entered = span.enter();

        let (path, query) = split_url(&pending.url);
        {
            let mut state = self.state.write();
            state.phase = DispatchPhase::Matching;
            state.remember_previous(pending.is_refresh);
            state.url = path.clone();
            state.query = QueryParams::parse(&query);
            state.repository = pending
                .repository
                .unwrap_or_else(|| Value::Object(Default::default()));
        }

        tracing::debug!(url = %path, refresh = pending.is_refresh, "Dispatching");
        framework.events().emit(&Event::Location { url: path.clone() });

        let found = framework.find_routes(&path);
        self.state.write().phase = DispatchPhase::Invoking;

        let mut faults = Vec::new();
        for route in &found.routes {
            for name in route.partials() {
                let outcome = match framework.partial_handler(name) {
                    Some(partial) => invoke(|| partial(framework)),
                    None => Err("partial is not registered".to_string()),
                };
                if let Err(message) = outcome {
                    faults.push(RouteExecutionError {
                        route: route.pattern().to_string(),
                        callback: Callback::Partial(name.clone()),
                        message,
                    });
                }
            }

            let params = route.params(&found.tokens);
            if let Err(message) = invoke(|| (route.handler())(framework, &params)) {
                faults.push(RouteExecutionError {
                    route: route.pattern().to_string(),
                    callback: Callback::Handler,
                    message,
                });
            }
        }

        if !faults.is_empty() {
            let report = faults
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join("\n");

            tracing::warn!(url = %path, faults = faults.len(), "Route callbacks failed");
            metrics::record_route_faults(faults.len());

            self.record_error(&path, &report);
            framework.events().emit(&Event::Error {
                message: report.clone(),
                url: path.clone(),
            });
            framework.events().emit(&Event::Status {
                code: 500,
                message: report,
            });
        }

        if found.not_found {
            tracing::debug!(url = %path, "No route matched");
            framework.events().emit(&Event::Status {
                code: 404,
                message: path.clone(),
            });
        }

        self.state.write().phase = DispatchPhase::Settled;

        let outcome = match (faults.is_empty(), found.not_found) {
            (_, true) => "not_found",
            (false, false) => "faulted",
            (true, false) => "ok",
        };
        metrics::record_dispatch(outcome);

        DispatchReport {
            id: pending.id,
            url: path,
            matched: found.routes.iter().map(|r| r.pattern().to_string()).collect(),
            faults,
            not_found: found.not_found,
        }
    }

    /// Append to the bounded error log.
    pub fn record_error(&self, url: &str, message: &str) {
        self.state.write().errors.push(ErrorRecord::new(url, message));
    }

    /// Remove and return the newest history entry.
    pub fn pop_history(&self) -> Option<String> {
        self.state.write().history.pop()
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    pub fn current_url(&self) -> String {
        self.state.read().url.clone()
    }

    pub fn query(&self) -> QueryParams {
        self.state.read().query.clone()
    }

    pub fn repository(&self) -> Value {
        self.state.read().repository.clone()
    }

    pub fn set_repository(&self, repository: Value) {
        self.state.write().repository = repository;
    }

    pub fn history(&self) -> Vec<String> {
        self.state.read().history.to_vec()
    }

    pub fn errors(&self) -> Vec<ErrorRecord> {
        self.state.read().errors.to_vec()
    }

    pub fn phase(&self) -> DispatchPhase {
        self.state.read().phase
    }
}

/// Run a callback, turning an error or a panic into a message.
fn invoke(callback: impl FnOnce() -> HandlerResult) -> Result<(), String> {
    match panic::catch_unwind(AssertUnwindSafe(callback)) {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => Err(e.to_string()),
        Err(payload) => Err(panic_message(payload.as_ref())),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        format!("panicked: {}", message)
    } else if let Some(message) = payload.downcast_ref::<String>() {
        format!("panicked: {}", message)
    } else {
        "panicked".to_string()
    }
}
