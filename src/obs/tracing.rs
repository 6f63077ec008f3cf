// self
use crate::{_prelude::*, obs::OperationKind};

/// Type alias that resolves to an instrumented future when tracing is enabled.
#[cfg(feature = "tracing")]
pub type InstrumentedOp<F> = tracing::instrument::Instrumented<F>;
/// Passthrough future type when tracing is disabled.
#[cfg(not(feature = "tracing"))]
pub type InstrumentedOp<F> = F;

/// A span builder used by relay operations.
#[derive(Clone, Debug)]
pub struct OpSpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl OpSpan {
	/// Creates a new span tagged with the provided operation kind + stage.
	pub fn new(kind: OperationKind, stage: &'static str) -> Self {
		#[cfg(feature = "tracing")]
		{
			let span = tracing::info_span!(
				"bearer_relay.op",
				op = kind.as_str(),
				stage,
				environment = tracing::field::Empty,
				status = tracing::field::Empty,
			);

			Self { span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = (kind, stage);

			Self {}
		}
	}

	/// Records the environment a request targets.
	pub fn record_environment(&self, label: &'static str) {
		#[cfg(feature = "tracing")]
		{
			self.span.record("environment", label);
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = label;
		}
	}

	/// Records the status of the latest exchange; a retried request overwrites the first 401.
	pub fn record_status(&self, status: u16) {
		#[cfg(feature = "tracing")]
		{
			self.span.record("status", status);
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = status;
		}
	}

	/// Instruments an async block without holding a guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> InstrumentedOp<Fut>
	where
		Fut: Future,
	{
		#[cfg(feature = "tracing")]
		{
			use tracing::Instrument;

			fut.instrument(self.span.clone())
		}
		#[cfg(not(feature = "tracing"))]
		{
			fut
		}
	}
}

/// Emits a `debug` event tagged with the operation kind.
pub fn debug_event(kind: OperationKind, message: &'static str) {
	#[cfg(feature = "tracing")]
	{
		tracing::debug!(op = kind.as_str(), "{message}");
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = (kind, message);
	}
}
