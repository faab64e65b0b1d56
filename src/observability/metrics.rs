//! Metrics collection.
//!
//! # Metrics
//! - `partial_dispatch_total` (counter): dispatches by outcome (`ok`, `not_found`, `faulted`)
//! - `partial_route_faults_total` (counter): failed handler/partial invocations
//! - `partial_cache_entries` (gauge): entries per cache
//! - `partial_cache_evictions_total` (counter): entries removed by sweeps
//! - `partial_template_compiles_total` (counter): compilations by outcome
//! - `partial_requests_total` (counter): data API requests by method and outcome
//! - `partial_tasks_total` (counter): coordinated tasks by outcome (`ok`, `failed`)
//!
//! # Design Decisions
//! - Recording without an installed recorder is a no-op
//! - The host application decides how to export

use metrics::{counter, gauge};

pub fn record_dispatch(outcome: &'static str) {
    counter!("partial_dispatch_total", "outcome" => outcome).increment(1);
}

pub fn record_route_faults(count: usize) {
    if count > 0 {
        counter!("partial_route_faults_total").increment(count as u64);
    }
}

pub fn record_cache_size(cache: &'static str, size: usize) {
    gauge!("partial_cache_entries", "cache" => cache).set(size as f64);
}

pub fn record_cache_evictions(cache: &'static str, evicted: usize) {
    if evicted > 0 {
        counter!("partial_cache_evictions_total", "cache" => cache).increment(evicted as u64);
    }
}

pub fn record_template_compile(outcome: &'static str) {
    counter!("partial_template_compiles_total", "outcome" => outcome).increment(1);
}

pub fn record_request(method: &'static str, outcome: &'static str) {
    counter!("partial_requests_total", "method" => method, "outcome" => outcome).increment(1);
}

pub fn record_task(outcome: &'static str) {
    counter!("partial_tasks_total", "outcome" => outcome).increment(1);
}
