// self
use crate::obs::{self, OperationKind, OperationOutcome};

/// Records an operation outcome via the global metrics recorder (when enabled).
pub fn record_outcome(kind: OperationKind, outcome: OperationOutcome) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!(
			"bearer_relay_operation_total",
			"op" => kind.as_str(),
			"outcome" => outcome.as_str()
		)
		.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = (kind, outcome);
	}
}

/// Counts one completed exchange by target environment and status class (when enabled).
pub fn record_exchange(environment: &'static str, status: u16) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!(
			"bearer_relay_exchange_total",
			"environment" => environment,
			"status_class" => obs::status_class(status)
		)
		.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = (environment, obs::status_class(status));
	}
}
