//! Session-expiry notifications for the presentation layer.

// self
use crate::{_prelude::*, error::SessionExpiredReason};

/// Subscriber notified whenever the client wipes local credentials because the session could
/// not be recovered.
///
/// Observers are invoked synchronously on the task that observed the failure, after the store
/// has been cleared and before the caller receives [`Error::SessionExpired`]. Implementations
/// should hand off quickly (e.g. push onto a channel) instead of blocking.
pub trait SessionObserver
where
	Self: Send + Sync,
{
	/// Called once per failed refresh with the reason the session ended.
	fn session_expired(&self, reason: &SessionExpiredReason);
}
impl<F> SessionObserver for F
where
	F: Fn(&SessionExpiredReason) + Send + Sync,
{
	fn session_expired(&self, reason: &SessionExpiredReason) {
		self(reason)
	}
}

/// Observer that records every reason it receives; handy for tests and diagnostics.
#[derive(Clone, Debug, Default)]
pub struct RecordingObserver(Arc<Mutex<Vec<SessionExpiredReason>>>);
impl RecordingObserver {
	/// Returns every reason observed so far.
	pub fn reasons(&self) -> Vec<SessionExpiredReason> {
		self.0.lock().clone()
	}
}
impl SessionObserver for RecordingObserver {
	fn session_expired(&self, reason: &SessionExpiredReason) {
		self.0.lock().push(reason.clone());
	}
}

#[cfg(test)]
mod tests {
	// std
	use std::sync::atomic::{AtomicUsize, Ordering};
	// self
	use super::*;

	#[test]
	fn closures_act_as_observers() {
		let calls = Arc::new(AtomicUsize::new(0));
		let counter = calls.clone();
		let observer = move |_: &SessionExpiredReason| {
			counter.fetch_add(1, Ordering::SeqCst);
		};

		observer.session_expired(&SessionExpiredReason::NoRefreshToken);

		assert_eq!(calls.load(Ordering::SeqCst), 1);
	}

	#[test]
	fn recording_observer_keeps_reasons_in_order() {
		let observer = RecordingObserver::default();

		observer.session_expired(&SessionExpiredReason::RefreshRejected { status: 401 });
		observer.session_expired(&SessionExpiredReason::NoRefreshToken);

		assert_eq!(
			observer.reasons(),
			vec![
				SessionExpiredReason::RefreshRejected { status: 401 },
				SessionExpiredReason::NoRefreshToken
			]
		);
	}
}
