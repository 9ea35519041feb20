// self
use crate::{_prelude::*, error::SessionExpiredReason, obs::ClientOp};

/// Type alias that resolves to an instrumented future when tracing is enabled.
#[cfg(feature = "tracing")]
pub type InstrumentedOp<F> = tracing::instrument::Instrumented<F>;
/// Passthrough future type when tracing is disabled.
#[cfg(not(feature = "tracing"))]
pub type InstrumentedOp<F> = F;

/// A span builder used by client operations.
#[derive(Clone, Debug)]
pub struct OpSpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl OpSpan {
	/// Creates a new span tagged with the provided operation + stage.
	pub fn new(op: ClientOp, stage: &'static str) -> Self {
		#[cfg(feature = "tracing")]
		{
			let span = tracing::info_span!("dashboard_client.op", op = op.as_str(), stage);

			Self { span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = (op, stage);

			Self {}
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

pub(crate) fn log_refresh_joined(epoch: u64) {
	#[cfg(feature = "tracing")]
	{
		tracing::debug!(epoch, "Reusing access token from a refresh completed by another request.");
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = epoch;
	}
}

pub(crate) fn log_session_expired(reason: &SessionExpiredReason) {
	#[cfg(feature = "tracing")]
	{
		tracing::warn!(%reason, "Session expired; local credentials cleared.");
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = reason;
	}
}

pub(crate) fn log_logout_failure(error: &Error) {
	#[cfg(feature = "tracing")]
	{
		tracing::warn!(%error, "Server-side logout failed; clearing local credentials anyway.");
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = error;
	}
}
