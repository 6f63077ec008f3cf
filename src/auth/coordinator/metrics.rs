// std
use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe counters for coordinator activity.
#[derive(Debug, Default)]
pub struct RefreshMetrics {
	issued: AtomicU64,
	joined: AtomicU64,
	cache_hits: AtomicU64,
	success: AtomicU64,
	failure: AtomicU64,
}
impl RefreshMetrics {
	/// Returns how many refresh operations invoked the issuer.
	pub fn issued(&self) -> u64 {
		self.issued.load(Ordering::Relaxed)
	}

	/// Returns how many callers joined a refresh that was already in flight.
	pub fn joined(&self) -> u64 {
		self.joined.load(Ordering::Relaxed)
	}

	/// Returns how many calls were answered from the held credential.
	pub fn cache_hits(&self) -> u64 {
		self.cache_hits.load(Ordering::Relaxed)
	}

	/// Returns the number of refresh operations that produced a credential.
	pub fn successes(&self) -> u64 {
		self.success.load(Ordering::Relaxed)
	}

	/// Returns the number of refresh operations that failed.
	pub fn failures(&self) -> u64 {
		self.failure.load(Ordering::Relaxed)
	}

	pub(crate) fn record_issue(&self) {
		self.issued.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_join(&self) {
		self.joined.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_cache_hit(&self) {
		self.cache_hits.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_success(&self) {
		self.success.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_failure(&self) {
		self.failure.fetch_add(1, Ordering::Relaxed);
	}
}
