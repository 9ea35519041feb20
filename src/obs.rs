//! Optional observability helpers for client operations.
//!
//! # Feature Flags
//!
//! - Enable `tracing` to emit structured spans named `dashboard_client.op` with the `op` and
//!   `stage` (call site) fields, plus events for refresh joins, session expiry, and ignored
//!   logout failures.
//! - Enable `metrics` to increment the `dashboard_client_op_total` counter for every
//!   attempt/success/failure, labeled by `op` + `outcome`. Refresh joins and expired sessions
//!   are counted under `dashboard_client_refresh_joined_total` and
//!   `dashboard_client_session_expired_total` (labeled by `reason`).

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// Client operations observed by the crate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ClientOp {
	/// Authenticated API request, including any replay.
	Request,
	/// Access-token refresh exchange.
	Refresh,
	/// Credential login.
	Login,
	/// Account registration.
	Register,
	/// Session termination.
	Logout,
}
impl ClientOp {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			ClientOp::Request => "request",
			ClientOp::Refresh => "refresh",
			ClientOp::Login => "login",
			ClientOp::Register => "register",
			ClientOp::Logout => "logout",
		}
	}
}
impl Display for ClientOp {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OpOutcome {
	/// Entry to a client operation.
	Attempt,
	/// Successful completion.
	Success,
	/// Failure propagated back to the caller.
	Failure,
}
impl OpOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			OpOutcome::Attempt => "attempt",
			OpOutcome::Success => "success",
			OpOutcome::Failure => "failure",
		}
	}

	/// Maps a result onto its terminal outcome label.
	pub fn of<T, E>(result: &Result<T, E>) -> Self {
		if result.is_ok() { OpOutcome::Success } else { OpOutcome::Failure }
	}
}
impl Display for OpOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
