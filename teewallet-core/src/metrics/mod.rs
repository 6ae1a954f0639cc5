//! Metrics for wallet observability
//!
//! Everything here goes through the `metrics` facade, so recording is free
//! until the embedding application installs a recorder.

use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use std::time::Instant;

pub const READINESS_FAILED: &str = "wallet.readiness.failed";
pub const QUERIES_TOTAL: &str = "wallet.queries.total";
pub const QUERIES_FAILED: &str = "wallet.queries.failed";
pub const QUERY_DURATION_MS: &str = "wallet.query.duration_ms";
pub const HANDSHAKE_TOTAL: &str = "wallet.handshake.total";
pub const LATENCY_MS: &str = "wallet.latency_ms";
pub const ASSETS_COUNT: &str = "wallet.assets.count";

/// Register metric descriptions with the installed recorder
pub fn init_metrics() {
    describe_counter!(READINESS_FAILED, "Readiness checks that failed, labelled by reason");
    describe_counter!(QUERIES_TOTAL, "Encrypted queries sent to the runtime");
    describe_counter!(QUERIES_FAILED, "Encrypted queries that failed");
    describe_histogram!(QUERY_DURATION_MS, "Encrypted query round trip in milliseconds");
    describe_counter!(HANDSHAKE_TOTAL, "Channel handshake steps, labelled by step and outcome");
    describe_gauge!(LATENCY_MS, "Smoothed runtime round-trip latency in milliseconds");
    describe_gauge!(ASSETS_COUNT, "Number of assets in the last listing");
}

pub fn readiness_failed(reason: &'static str) {
    counter!(READINESS_FAILED, "reason" => reason).increment(1);
}

pub fn handshake_step(step: &'static str, outcome: &'static str) {
    counter!(HANDSHAKE_TOTAL, "step" => step, "outcome" => outcome).increment(1);
}

pub fn record_counter(name: &'static str, value: u64) {
    counter!(name).increment(value);
}

pub fn record_gauge(name: &'static str, value: f64) {
    gauge!(name).set(value);
}

/// Timer for measuring operation duration
pub struct Timer {
    name: &'static str,
    start: Instant,
}

impl Timer {
    pub fn new(name: &'static str) -> Self {
        Self { name, start: Instant::now() }
    }

    /// Stop the timer, record the histogram and return the elapsed milliseconds
    pub fn stop(self) -> u64 {
        let elapsed = self.start.elapsed();
        histogram!(self.name).record(elapsed.as_secs_f64() * 1000.0);
        elapsed.as_millis() as u64
    }
}
