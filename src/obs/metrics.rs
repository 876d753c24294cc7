// self
use crate::obs::{FlowOutcome, GatewayFlow};

/// Records a flow outcome via the global metrics recorder (when enabled).
pub fn record_flow_outcome(flow: GatewayFlow, outcome: FlowOutcome) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!(
			"bearer_gateway_flow_total",
			"flow" => flow.as_str(),
			"outcome" => outcome.as_str()
		)
		.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = (flow, outcome);
	}
}
