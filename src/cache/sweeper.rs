//! Periodic cache sweep.
//!
//! # Responsibilities
//! - Evict expired entries from every registered cache on a fixed interval
//! - Emit a `service` event with an increasing tick count on every sweep
//! - Stop cleanly on the shutdown signal

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use tokio::sync::broadcast;
use tokio::time::{self, Instant};

use crate::cache::expiring::Sweep;
use crate::events::{Event, EventBus};

/// Outcome of a single sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SweepReport {
    pub tick: u64,
    pub evicted: usize,
}

/// Sweeps a set of caches. Cloning shares the tick counter.
#[derive(Clone)]
pub struct CacheSweeper {
    caches: Vec<Arc<dyn Sweep>>,
    events: Arc<EventBus>,
    interval: Duration,
    ticks: Arc<AtomicU64>,
}

impl CacheSweeper {
    pub fn new(events: Arc<EventBus>, interval: Duration) -> Self {
        Self {
            caches: Vec::new(),
            events,
            interval,
            ticks: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn with_cache(mut self, cache: Arc<dyn Sweep>) -> Self {
        self.caches.push(cache);
        self
    }

    /// Run one sweep now.
    pub fn tick(&self) -> SweepReport {
        self.tick_at(SystemTime::now())
    }

    pub fn tick_at(&self, now: SystemTime) -> SweepReport {
        let evicted = self.caches.iter().map(|c| c.sweep_at(now)).sum();
        let tick = self.ticks.fetch_add(1, Ordering::AcqRel) + 1;

        tracing::trace!(tick, evicted, "Sweep tick");
        self.events.emit(&Event::Service { tick });

        SweepReport { tick, evicted }
    }

    /// Number of sweeps performed so far.
    pub fn ticks(&self) -> u64 {
        self.ticks.load(Ordering::Acquire)
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Sweep on every interval until shutdown.
    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        tracing::info!(
            interval_ms = self.interval.as_millis() as u64,
            caches = self.caches.len(),
            "Cache sweeper starting"
        );

        let mut ticker = time::interval_at(Instant::now() + self.interval, self.interval);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.tick();
                }
                _ = shutdown.recv() => {
                    tracing::info!(ticks = self.ticks(), "Cache sweeper received shutdown signal");
                    break;
                }
            }
        }
    }
}

impl fmt::Debug for CacheSweeper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheSweeper")
            .field("caches", &self.caches.iter().map(|c| c.name().to_string()).collect::<Vec<_>>())
            .field("interval", &self.interval)
            .field("ticks", &self.ticks())
            .finish()
    }
}
