// self
use crate::{_prelude::*, obs::GatewayFlow};

/// Type alias that resolves to an instrumented future when tracing is enabled.
#[cfg(feature = "tracing")]
pub type InstrumentedFlow<F> = tracing::instrument::Instrumented<F>;
/// Passthrough future type when tracing is disabled.
#[cfg(not(feature = "tracing"))]
pub type InstrumentedFlow<F> = F;

/// Span handle shared by gateway flows.
#[derive(Clone, Debug)]
pub struct FlowSpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl FlowSpan {
	/// Creates a new span tagged with the provided flow + stage.
	pub fn new(flow: GatewayFlow, stage: &'static str) -> Self {
		#[cfg(feature = "tracing")]
		{
			let span = tracing::info_span!("bearer_gateway.flow", flow = flow.as_str(), stage);

			Self { span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = (flow, stage);

			Self {}
		}
	}

	/// Instruments an async block without holding a guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> InstrumentedFlow<Fut>
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

	/// Emits a warning event for a failure that does not change the flow's result.
	pub fn warn(&self, message: &'static str, error: &dyn Display) {
		#[cfg(feature = "tracing")]
		self.span.in_scope(|| tracing::warn!(error = %error, "{message}"));
		#[cfg(not(feature = "tracing"))]
		let _ = (message, error);
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use futures::executor::block_on;
	// self
	use super::*;

	#[test]
	fn instrument_passes_output_through() {
		let span = FlowSpan::new(GatewayFlow::Execute, "instrument_passes_output_through");
		let value = block_on(span.instrument(async { 42 }));

		assert_eq!(value, 42);
	}

	#[test]
	fn warn_accepts_any_display_error() {
		let span = FlowSpan::new(GatewayFlow::Refresh, "warn_accepts_any_display_error");

		span.warn("Credentials could not be cleared.", &"disk unavailable");
	}
}
