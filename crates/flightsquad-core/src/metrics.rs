//! Global atomic counters for verification and harvesting.
//!
//! Counters are incremented silently at the call site. Call
//! [`Metrics::flush`] to emit current values as a single
//! `tracing::info!` event (e.g. before the CLI exits).

use std::sync::atomic::{AtomicU64, Ordering};

/// Global metrics singleton.
pub static METRICS: Metrics = Metrics::new();

pub struct Metrics {
    verifications_run: AtomicU64,
    verifications_passed: AtomicU64,
    records_harvested: AtomicU64,
    records_approved: AtomicU64,
    harvest_failures: AtomicU64,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    pub const fn new() -> Self {
        Self {
            verifications_run: AtomicU64::new(0),
            verifications_passed: AtomicU64::new(0),
            records_harvested: AtomicU64::new(0),
            records_approved: AtomicU64::new(0),
            harvest_failures: AtomicU64::new(0),
        }
    }

    /// Count a finished verification run.
    pub fn record_verification(&self, passed: bool) {
        self.verifications_run.fetch_add(1, Ordering::Relaxed);
        if passed {
            self.verifications_passed.fetch_add(1, Ordering::Relaxed);
        }
        tracing::trace!(metric = "verifications_run", "counter incremented");
    }

    pub fn inc_records_harvested(&self) {
        self.records_harvested.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "records_harvested", "counter incremented");
    }

    pub fn inc_records_approved(&self) {
        self.records_approved.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "records_approved", "counter incremented");
    }

    pub fn inc_harvest_failures(&self) {
        self.harvest_failures.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "harvest_failures", "counter incremented");
    }

    /// Emit all current counter values as a single `info!` event.
    pub fn flush(&self) {
        tracing::info!(
            metric = "flush",
            verifications_run = self.verifications_run(),
            verifications_passed = self.verifications_passed(),
            records_harvested = self.records_harvested(),
            records_approved = self.records_approved(),
            harvest_failures = self.harvest_failures(),
        );
    }

    pub fn verifications_run(&self) -> u64 {
        self.verifications_run.load(Ordering::Relaxed)
    }

    pub fn verifications_passed(&self) -> u64 {
        self.verifications_passed.load(Ordering::Relaxed)
    }

    pub fn records_harvested(&self) -> u64 {
        self.records_harvested.load(Ordering::Relaxed)
    }

    pub fn records_approved(&self) -> u64 {
        self.records_approved.load(Ordering::Relaxed)
    }

    pub fn harvest_failures(&self) -> u64 {
        self.harvest_failures.load(Ordering::Relaxed)
    }

    /// Reset all counters to zero (useful in tests).
    pub fn reset(&self) {
        self.verifications_run.store(0, Ordering::Relaxed);
        self.verifications_passed.store(0, Ordering::Relaxed);
        self.records_harvested.store(0, Ordering::Relaxed);
        self.records_approved.store(0, Ordering::Relaxed);
        self.harvest_failures.store(0, Ordering::Relaxed);
    }
}
