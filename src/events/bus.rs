//! Typed publish/subscribe.

use std::collections::HashMap;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use serde_json::Value;

/// Kinds of events the framework emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Location,
    Error,
    Status,
    Get,
    Post,
    Service,
    Ready,
}

/// Whether a request is starting or has finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestPhase {
    Begin,
    End,
}

/// An event with its payload.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// A dispatch has set its new URL and is about to run callbacks.
    Location { url: String },
    /// Aggregated fault report for one dispatch or one failed request.
    Error { message: String, url: String },
    /// Status signal (404 not found, 500 route faults).
    Status { code: u16, message: String },
    /// Request start and finish. `body` is the response on a successful `End`.
    Get { phase: RequestPhase, url: String, body: Option<Value> },
    Post { phase: RequestPhase, url: String, body: Option<Value> },
    /// Cache sweep tick, increasing on every sweep.
    Service { tick: u64 },
    Ready,
}

impl Event {
    pub fn kind(&self) -> EventKind {
        match self {
            Event::Location { .. } => EventKind::Location,
            Event::Error { .. } => EventKind::Error,
            Event::Status { .. } => EventKind::Status,
            Event::Get { .. } => EventKind::Get,
            Event::Post { .. } => EventKind::Post,
            Event::Service { .. } => EventKind::Service,
            Event::Ready => EventKind::Ready,
        }
    }
}

type Listener = Arc<dyn Fn(&Event) + Send + Sync>;

/// Handle returned by [`EventBus::subscribe`], used to unsubscribe.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Subscription {
    kind: EventKind,
    id: u64,
}

impl Subscription {
    pub fn kind(&self) -> EventKind {
        self.kind
    }
}

/// Event bus with per-kind listener lists.
///
/// Listeners are called in subscription order. The listener list is copied
/// before delivery, so a listener may subscribe, unsubscribe or emit.
/// A panicking listener is logged and skipped; later listeners still run.
#[derive(Default)]
pub struct EventBus {
    listeners: RwLock<HashMap<EventKind, Vec<(u64, Listener)>>>,
    next_id: AtomicU64,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe<F>(&self, kind: EventKind, listener: F) -> Subscription
    where
        F: Fn(&Event) + Send + Sync + 'static,
    {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.listeners
            .write()
            .entry(kind)
            .or_default()
            .push((id, Arc::new(listener)));
        Subscription { kind, id }
    }

    /// Remove a listener. Returns false if it was already gone.
    pub fn unsubscribe(&self, subscription: &Subscription) -> bool {
        let mut listeners = self.listeners.write();
        let Some(list) = listeners.get_mut(&subscription.kind) else {
            return false;
        };
        let before = list.len();
        list.retain(|(id, _)| *id != subscription.id);
        list.len() < before
    }

    pub fn emit(&self, event: &Event) {
        let listeners: Vec<Listener> = match self.listeners.read().get(&event.kind()) {
            Some(list) => list.iter().map(|(_, l)| l.clone()).collect(),
            None => return,
        };

        tracing::trace!(kind = ?event.kind(), listeners = listeners.len(), "Emitting event");
        for listener in listeners {
            if panic::catch_unwind(AssertUnwindSafe(|| listener(event))).is_err() {
                tracing::warn!(kind = ?event.kind(), "Event listener panicked");
            }
        }
    }

    pub fn listener_count(&self, kind: EventKind) -> usize {
        self.listeners.read().get(&kind).map_or(0, Vec::len)
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let listeners = self.listeners.read();
        let counts: HashMap<&EventKind, usize> = listeners.iter().map(|(k, v)| (k, v.len())).collect();
        f.debug_struct("EventBus").field("listeners", &counts).finish()
    }
}
