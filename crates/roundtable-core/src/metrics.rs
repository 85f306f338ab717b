//! Global atomic counters for Roundtable observability.
//!
//! Counters are incremented silently at the call site. Call
//! [`Metrics::flush`] to emit current values as a single
//! `tracing::info!` event (the orchestrator does this when a session ends).

use std::sync::atomic::{AtomicU64, Ordering};

/// Global metrics singleton.
pub static METRICS: Metrics = Metrics::new();

/// Lightweight atomic counters — no allocations, no locking.
pub struct Metrics {
    turns_completed: AtomicU64,
    production_retries: AtomicU64,
    failed_turns: AtomicU64,
    executions_run: AtomicU64,
    confirmations_requested: AtomicU64,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    pub const fn new() -> Self {
        Self {
            turns_completed: AtomicU64::new(0),
            production_retries: AtomicU64::new(0),
            failed_turns: AtomicU64::new(0),
            executions_run: AtomicU64::new(0),
            confirmations_requested: AtomicU64::new(0),
        }
    }

    pub fn inc_turns(&self) {
        self.turns_completed.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "turns_completed", "counter incremented");
    }

    pub fn inc_retries(&self) {
        self.production_retries.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "production_retries", "counter incremented");
    }

    pub fn inc_failed_turns(&self) {
        self.failed_turns.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "failed_turns", "counter incremented");
    }

    pub fn inc_executions(&self) {
        self.executions_run.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "executions_run", "counter incremented");
    }

    pub fn inc_confirmations(&self) {
        self.confirmations_requested.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "confirmations_requested", "counter incremented");
    }

    /// Emit all current counter values as a single `info!` event.
    pub fn flush(&self) {
        tracing::info!(
            metric = "flush",
            turns_completed = self.turns_completed(),
            production_retries = self.production_retries(),
            failed_turns = self.failed_turns(),
            executions_run = self.executions_run(),
            confirmations_requested = self.confirmations_requested(),
        );
    }

    pub fn turns_completed(&self) -> u64 {
        self.turns_completed.load(Ordering::Relaxed)
    }

    pub fn production_retries(&self) -> u64 {
        self.production_retries.load(Ordering::Relaxed)
    }

    pub fn failed_turns(&self) -> u64 {
        self.failed_turns.load(Ordering::Relaxed)
    }

    pub fn executions_run(&self) -> u64 {
        self.executions_run.load(Ordering::Relaxed)
    }

    pub fn confirmations_requested(&self) -> u64 {
        self.confirmations_requested.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_counters_increment() {
        let m = Metrics::new();
        m.inc_turns();
        m.inc_turns();
        m.inc_retries();
        m.inc_executions();
        assert_eq!(m.turns_completed(), 2);
        assert_eq!(m.production_retries(), 1);
        assert_eq!(m.failed_turns(), 0);
        assert_eq!(m.executions_run(), 1);
        assert_eq!(m.confirmations_requested(), 0);
        m.flush();
    }
}
