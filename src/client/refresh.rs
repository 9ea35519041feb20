//! Request dispatch with transparent access-token renewal.
//!
//! [`ApiClient::request`] attaches the stored access token, and when the backend answers
//! `401` with the configured expiry code it renews the token once and replays the request.
//! Renewal is single-flight: every request that observes expiry queues on one latch, the first
//! one through performs the exchange, and the rest reuse its outcome. A failed exchange clears
//! the store, notifies the session observers once, and fails every queued request with
//! [`Error::SessionExpired`].

mod metrics;

pub use metrics::RefreshMetrics;

// self
use crate::{
	_prelude::*,
	auth::{IssuedTokens, StorageKey, TokenSecret},
	client::{ApiClient, ApiResponse, RequestDescriptor},
	envelope::Envelope,
	error::SessionExpiredReason,
	http::{HttpTransport, Method, TransportRequest, TransportResponse},
	obs::{self, ClientOp, OpOutcome, OpSpan},
};

/// Serializes refresh exchanges and publishes their outcome.
///
/// `epoch` increments after every finished exchange. A request remembers the epoch it was sent
/// under; finding a newer epoch once it holds the guard means another request already renewed
/// (or lost) the session on its behalf.
#[derive(Debug, Default)]
pub(crate) struct RefreshLatch {
	guard: AsyncMutex<()>,
	state: Mutex<LatchState>,
}
impl RefreshLatch {
	fn epoch(&self) -> u64 {
		self.state.lock().epoch
	}

	fn snapshot(&self) -> LatchState {
		self.state.lock().clone()
	}

	fn publish(&self, failure: Option<SessionExpiredReason>) {
		let mut state = self.state.lock();

		state.epoch += 1;
		state.failure = failure;
	}
}

#[derive(Clone, Debug, Default)]
struct LatchState {
	epoch: u64,
	failure: Option<SessionExpiredReason>,
}

impl<T> ApiClient<T>
where
	T: ?Sized + HttpTransport,
{
	/// Sends `descriptor`, renewing the access token at most once on expiry.
	///
	/// Paths on the exclusion list (login, register, refresh) are sent without the stored token
	/// and never trigger renewal. Non-2xx responses surface as [`Error::Server`], transport
	/// failures as [`Error::Transport`], and an unrecoverable session as
	/// [`Error::SessionExpired`].
	pub async fn request(&self, descriptor: RequestDescriptor) -> Result<ApiResponse> {
		const OP: ClientOp = ClientOp::Request;

		let span = OpSpan::new(OP, "request");

		obs::record_op_outcome(OP, OpOutcome::Attempt);

		let result = span.instrument(self.dispatch(descriptor)).await;

		obs::record_op_outcome(OP, OpOutcome::of(&result));

		result
	}

	/// Forces a refresh exchange through the single-flight latch and returns the new token.
	///
	/// Concurrent callers share one exchange. On failure the session is cleared exactly as it
	/// would be for an expired request.
	pub async fn refresh_session(&self) -> Result<TokenSecret> {
		let observed_epoch = self.latch.epoch();
		let _singleflight = self.latch.guard.lock().await;
		let state = self.latch.snapshot();

		if state.epoch != observed_epoch {
			if let Some(reason) = state.failure {
				return Err(Error::SessionExpired { reason });
			}
			if let Some(current) = self.store.access_token().await? {
				self.join_refresh(state.epoch);

				return Ok(current);
			}
		}

		self.refresh_locked().await
	}

	async fn dispatch(&self, mut descriptor: RequestDescriptor) -> Result<ApiResponse> {
		let excluded = self.config.endpoints.is_excluded(&descriptor.path);
		let observed_epoch = self.latch.epoch();
		let sent = if excluded { None } else { self.store.access_token().await? };
		let response = self.send(&descriptor, sent.as_ref()).await?;

		match ApiResponse::from_transport(response) {
			Err(err)
				if !excluded
					&& !descriptor.retried
					&& err.is_token_expired(&self.config.expired_code) => {},
			other => return other.map_err(Error::from),
		}

		let token = self.renew_after_expiry(observed_epoch, sent).await?;

		descriptor.retried = true;

		let response = self.send(&descriptor, Some(&token)).await?;

		ApiResponse::from_transport(response).map_err(Error::from)
	}

	async fn send(
		&self,
		descriptor: &RequestDescriptor,
		bearer: Option<&TokenSecret>,
	) -> Result<TransportResponse> {
		let url = self.config.url_for(&descriptor.path, &descriptor.query)?;
		let mut request = TransportRequest::new(descriptor.method, url);

		request.set_header("accept", "application/json");

		for (name, value) in &descriptor.headers {
			request.set_header(name.as_str(), value.as_str());
		}

		if let Some(body) = &descriptor.body {
			request.set_header("content-type", "application/json");
			request.body = Some(
				serde_json::to_vec(body).map_err(|e| Error::Encode { message: e.to_string() })?,
			);
		}
		if let Some(token) = bearer {
			request.set_header("authorization", token.bearer());
		}

		Ok(self.transport.send(request).await?)
	}

	// Resolves the token to replay an expired request with. `sent` is the token the request
	// carried; a different token already in the store means someone else renewed it.
	async fn renew_after_expiry(
		&self,
		observed_epoch: u64,
		sent: Option<TokenSecret>,
	) -> Result<TokenSecret> {
		let _singleflight = self.latch.guard.lock().await;
		let state = self.latch.snapshot();

		if let Some(current) =
			self.store.access_token().await?.filter(|current| Some(current) != sent.as_ref())
		{
			if state.epoch != observed_epoch {
				self.join_refresh(state.epoch);
			}

			return Ok(current);
		}
		if let Some(reason) = state.failure.filter(|_| state.epoch != observed_epoch) {
			return Err(Error::SessionExpired { reason });
		}

		self.refresh_locked().await
	}

	fn join_refresh(&self, epoch: u64) {
		self.refresh_metrics.record_joined();

		obs::record_refresh_joined();
		obs::log_refresh_joined(epoch);
	}

	// Caller must hold the latch guard.
	async fn refresh_locked(&self) -> Result<TokenSecret> {
		const OP: ClientOp = ClientOp::Refresh;

		let span = OpSpan::new(OP, "refresh_locked");

		obs::record_op_outcome(OP, OpOutcome::Attempt);
		self.refresh_metrics.record_attempt();

		let result = span.instrument(self.exchange_refresh_token()).await;

		match result {
			Ok(_) => self.refresh_metrics.record_success(),
			Err(_) => self.refresh_metrics.record_failure(),
		}

		obs::record_op_outcome(OP, OpOutcome::of(&result));

		result
	}

	async fn exchange_refresh_token(&self) -> Result<TokenSecret> {
		let Some(refresh_token) = self.store.refresh_token().await? else {
			return self.expire_session(SessionExpiredReason::NoRefreshToken).await;
		};
		let url = self.config.url_for(&self.config.endpoints.refresh, &[])?;
		let mut request = TransportRequest::new(Method::Post, url);

		request.set_header("accept", "application/json");
		request.set_header("content-type", "application/json");
		request.set_header("authorization", refresh_token.bearer());
		request.body = Some(b"{}".to_vec());

		let response = match self.transport.send(request).await {
			Ok(response) => response,
			Err(err) => {
				let reason = SessionExpiredReason::RefreshTransport { message: err.to_string() };

				return self.expire_session(reason).await;
			},
		};

		if !response.is_success() {
			let reason = SessionExpiredReason::RefreshRejected { status: response.status };

			return self.expire_session(reason).await;
		}

		let issued = match Envelope::normalize(response.status, &response.body)
			.into_data::<IssuedTokens>()
		{
			Ok(issued) if issued.is_usable() => issued,
			Ok(_) => {
				let reason = SessionExpiredReason::RefreshMalformed {
					message: "Refresh response carried a blank access token".into(),
				};

				return self.expire_session(reason).await;
			},
			Err(err) => {
				let reason = SessionExpiredReason::RefreshMalformed { message: err.to_string() };

				return self.expire_session(reason).await;
			},
		};
		let access_token = TokenSecret::new(issued.access_token);

		self.store.set(StorageKey::AccessToken, access_token.expose().to_owned()).await?;

		if let Some(rotated) = issued.refresh_token.filter(|value| !value.trim().is_empty()) {
			self.store.set(StorageKey::RefreshToken, rotated).await?;
		}

		self.latch.publish(None);

		Ok(access_token)
	}

	// Clears local credentials, publishes the failure to queued requests, and notifies every
	// observer once.
	async fn expire_session<V>(&self, reason: SessionExpiredReason) -> Result<V> {
		let cleared = self.store.clear().await;

		self.latch.publish(Some(reason.clone()));
		obs::record_session_expired(&reason);
		obs::log_session_expired(&reason);

		for observer in self.observers.iter() {
			observer.session_expired(&reason);
		}

		cleared?;

		Err(Error::SessionExpired { reason })
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn latch_publishes_outcome_and_advances_epoch() {
		let latch = RefreshLatch::default();

		assert_eq!(latch.epoch(), 0);

		latch.publish(Some(SessionExpiredReason::NoRefreshToken));

		let state = latch.snapshot();

		assert_eq!(state.epoch, 1);
		assert_eq!(state.failure, Some(SessionExpiredReason::NoRefreshToken));

		latch.publish(None);

		assert_eq!(latch.epoch(), 2);
		assert!(latch.snapshot().failure.is_none());
	}
}
