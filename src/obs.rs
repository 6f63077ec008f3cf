//! Optional observability helpers for relay operations.
//!
//! # Feature Flags
//!
//! - Enable `tracing` to emit structured spans named `bearer_relay.op` with the `op` (operation)
//!   and `stage` (call site) fields, plus `debug` events for refresh starts and retries. Request
//!   spans also record the target `environment` and the `status` of the latest exchange.
//! - Enable `metrics` to increment the `bearer_relay_operation_total` counter for every
//!   attempt/success/failure/join/retry, labeled by `op` + `outcome`, and the
//!   `bearer_relay_exchange_total` counter for every exchange, labeled by `environment` +
//!   `status_class`.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// Operation kinds observed by the relay.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OperationKind {
	/// Request execution through [`RequestExecutor`](crate::executor::RequestExecutor).
	Perform,
	/// Credential refresh through [`TokenCoordinator`](crate::auth::TokenCoordinator).
	Refresh,
}
impl OperationKind {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			OperationKind::Perform => "perform",
			OperationKind::Refresh => "refresh",
		}
	}
}
impl Display for OperationKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OperationOutcome {
	/// Entry to a relay operation.
	Attempt,
	/// Successful completion.
	Success,
	/// Failure propagated back to the caller.
	Failure,
	/// Caller attached to a refresh that was already in flight.
	Joined,
	/// Request was replayed after a forced refresh.
	Retried,
}
impl OperationOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			OperationOutcome::Attempt => "attempt",
			OperationOutcome::Success => "success",
			OperationOutcome::Failure => "failure",
			OperationOutcome::Joined => "joined",
			OperationOutcome::Retried => "retried",
		}
	}
}
impl Display for OperationOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Buckets an HTTP status into a low-cardinality label (`2xx`, `4xx`, ...).
pub const fn status_class(status: u16) -> &'static str {
	match status {
		100..=199 => "1xx",
		200..=299 => "2xx",
		300..=399 => "3xx",
		401 => "401",
		400..=499 => "4xx",
		500..=599 => "5xx",
		_ => "other",
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn labels_are_stable() {
		assert_eq!(OperationKind::Refresh.to_string(), "refresh");
		assert_eq!(OperationKind::Perform.as_str(), "perform");
		assert_eq!(OperationOutcome::Joined.to_string(), "joined");
		assert_eq!(OperationOutcome::Retried.as_str(), "retried");
	}

	#[test]
	fn status_classes_single_out_unauthorized() {
		assert_eq!(status_class(204), "2xx");
		assert_eq!(status_class(401), "401");
		assert_eq!(status_class(403), "4xx");
		assert_eq!(status_class(503), "5xx");
		assert_eq!(status_class(42), "other");
	}
}
