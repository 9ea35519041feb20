// self
use crate::{
	error::SessionExpiredReason,
	obs::{ClientOp, OpOutcome},
};

/// Counts one attempt, success, or failure of `op` under `dashboard_client_op_total`.
pub fn record_op_outcome(op: ClientOp, outcome: OpOutcome) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!(
			"dashboard_client_op_total",
			"op" => op.as_str(),
			"outcome" => outcome.as_str()
		)
		.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = (op, outcome);
	}
}

/// Counts a request that reused an in-flight refresh instead of starting its own.
pub fn record_refresh_joined() {
	#[cfg(feature = "metrics")]
	metrics::counter!("dashboard_client_refresh_joined_total").increment(1);
}

/// Counts a session ended by a failed refresh, labeled by the failure kind.
pub fn record_session_expired(reason: &SessionExpiredReason) {
	let kind = match reason {
		SessionExpiredReason::NoRefreshToken => "no_refresh_token",
		SessionExpiredReason::RefreshRejected { .. } => "refresh_rejected",
		SessionExpiredReason::RefreshTransport { .. } => "refresh_transport",
		SessionExpiredReason::RefreshMalformed { .. } => "refresh_malformed",
	};

	#[cfg(feature = "metrics")]
	metrics::counter!("dashboard_client_session_expired_total", "reason" => kind).increment(1);

	#[cfg(not(feature = "metrics"))]
	let _ = kind;
}
