//! Refresh cycle metrics.

// std
use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe counters describing refresh cycle activity.
#[derive(Debug, Default)]
pub struct CycleMetrics {
	cycles: AtomicU64,
	success: AtomicU64,
	failure: AtomicU64,
	queued: AtomicU64,
	replays: AtomicU64,
	clear_failures: AtomicU64,
}
impl CycleMetrics {
	/// Returns the number of refresh cycles started (one refresh call each).
	pub fn cycles(&self) -> u64 {
		self.cycles.load(Ordering::Relaxed)
	}

	/// Returns the number of cycles that produced a new credential.
	pub fn successes(&self) -> u64 {
		self.success.load(Ordering::Relaxed)
	}

	/// Returns the number of cycles that failed and cleared the session.
	pub fn failures(&self) -> u64 {
		self.failure.load(Ordering::Relaxed)
	}

	/// Returns how many callers joined a cycle that was already in flight.
	pub fn queued(&self) -> u64 {
		self.queued.load(Ordering::Relaxed)
	}

	/// Returns how many requests were re-dispatched with a refreshed credential.
	pub fn replays(&self) -> u64 {
		self.replays.load(Ordering::Relaxed)
	}

	/// Returns how many failed cycles could not clear the stored credentials.
	pub fn clear_failures(&self) -> u64 {
		self.clear_failures.load(Ordering::Relaxed)
	}

	pub(crate) fn record_cycle(&self) {
		self.cycles.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_success(&self) {
		self.success.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_failure(&self) {
		self.failure.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_queued(&self) {
		self.queued.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_replay(&self) {
		self.replays.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_clear_failure(&self) {
		self.clear_failures.fetch_add(1, Ordering::Relaxed);
	}
}
