#![cfg(feature = "reqwest")]

// std
use std::sync::atomic::{AtomicUsize, Ordering};
// crates.io
use futures::future;
use serde_json::json;
// self
use dashboard_client::{
	_preludet::*,
	auth::{CredentialPair, StorageKey},
	client::ApiClient,
	config::ClientConfig,
	error::SessionExpiredReason,
	ext::RecordingObserver,
	http::{HttpTransport, TransportFuture, TransportRequest, TransportResponse},
	store::{CredentialStore, MemoryStore},
};

const CONCURRENCY: usize = 5;

// Accepts only `Bearer T2`; answers the refresh endpoint after a delay so every caller observes
// the expiry before the exchange completes.
#[derive(Default)]
struct ScriptedTransport {
	reject_refresh: bool,
	refresh_calls: AtomicUsize,
	seen: Mutex<Vec<(String, Option<String>)>>,
}
impl ScriptedTransport {
	fn rejecting_refresh() -> Self {
		Self { reject_refresh: true, ..Default::default() }
	}

	fn seen(&self) -> Vec<(String, Option<String>)> {
		self.seen.lock().clone()
	}
}
impl HttpTransport for ScriptedTransport {
	fn send(&self, request: TransportRequest) -> TransportFuture<'_, TransportResponse> {
		Box::pin(async move {
			let path = request.url.path().to_owned();
			let bearer = request.bearer().map(str::to_owned);

			self.seen.lock().push((path.clone(), bearer.clone()));

			if path == "/api/refresh" {
				self.refresh_calls.fetch_add(1, Ordering::SeqCst);
				tokio::time::sleep(std::time::Duration::from_millis(50)).await;

				let (status, body) = if self.reject_refresh {
					(401, json!({ "message": "Refresh token revoked" }))
				} else {
					(200, json!({ "success": true, "data": { "token": "T2" } }))
				};

				return Ok(TransportResponse::json(status, &body));
			}

			Ok(match bearer.as_deref() {
				Some("T2") => TransportResponse::json(200, &json!({ "data": path })),
				_ => TransportResponse::json(401, &json!({ "code": "token_expired" })),
			})
		})
	}
}

async fn build_client(
	transport: Arc<ScriptedTransport>,
) -> (ApiClient<ScriptedTransport>, Arc<MemoryStore>, RecordingObserver) {
	let store = Arc::new(MemoryStore::default());
	let observer = RecordingObserver::default();
	let config = ClientConfig::builder(test_base_url("http://dashboard.test/api"))
		.build()
		.expect("Scripted client configuration should build.");
	let client = ApiClient::with_transport(config, store.clone(), transport)
		.with_session_observer(observer.clone());

	store
		.save_pair(CredentialPair::new("T1", "R1"))
		.await
		.expect("Failed to seed the credential pair into the store.");

	(client, store, observer)
}

#[tokio::test]
async fn concurrent_expiries_share_one_refresh() {
	let transport = Arc::new(ScriptedTransport::default());
	let (client, store, observer) = build_client(transport.clone()).await;
	let results = future::join_all(
		(0..CONCURRENCY).map(|idx| {
			let client = client.clone();

			async move { client.get(format!("/users/{idx}")).await }
		}),
	)
	.await;

	for (idx, result) in results.into_iter().enumerate() {
		let response = result.expect("Every request should succeed after the shared refresh.");

		assert_eq!(response.data(), &json!(format!("/api/users/{idx}")));
	}

	assert_eq!(transport.refresh_calls.load(Ordering::SeqCst), 1);
	assert_eq!(client.refresh_metrics.attempts(), 1);
	assert_eq!(client.refresh_metrics.joined(), (CONCURRENCY - 1) as u64);
	assert!(observer.reasons().is_empty());
	assert_eq!(store.snapshot().get(&StorageKey::AccessToken).map(String::as_str), Some("T2"));

	let replays = transport
		.seen()
		.into_iter()
		.filter(|(path, bearer)| {
			path.starts_with("/api/users/") && bearer.as_deref() == Some("T2")
		})
		.count();

	assert_eq!(replays, CONCURRENCY);
}

#[tokio::test]
async fn concurrent_expiries_share_one_failure() {
	let transport = Arc::new(ScriptedTransport::rejecting_refresh());
	let (client, store, observer) = build_client(transport.clone()).await;
	let results =
		future::join_all((0..CONCURRENCY).map(|_| client.get("/statistics/daily"))).await;

	for result in results {
		let err = result.expect_err("Every request should fail once the refresh is rejected.");

		assert!(err.is_session_expired());
	}

	assert_eq!(transport.refresh_calls.load(Ordering::SeqCst), 1);
	assert_eq!(observer.reasons(), vec![SessionExpiredReason::RefreshRejected { status: 401 }]);
	assert!(store.is_empty());
}

#[tokio::test]
async fn refresh_exchange_sends_refresh_token_only() {
	let transport = Arc::new(ScriptedTransport::default());
	let (client, _store, _observer) = build_client(transport.clone()).await;
	let token = client.refresh_session().await.expect("Explicit refresh should succeed.");

	assert_eq!(token.expose(), "T2");
	assert_eq!(transport.seen(), vec![("/api/refresh".to_owned(), Some("R1".to_owned()))]);

	client.get("/me").await.expect("Refreshed token should be accepted.");

	assert_eq!(transport.refresh_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn excluded_paths_never_carry_the_access_token() {
	let transport = Arc::new(ScriptedTransport::default());
	let (client, store, _observer) = build_client(transport.clone()).await;

	for path in ["/login", "/register"] {
		let err = client
			.post(path, &json!({ "email": "ana@example.com" }))
			.await
			.expect_err("Scripted transport rejects unauthenticated calls.");

		assert_eq!(err.status(), Some(401));
	}

	assert!(transport.seen().iter().all(|(_, bearer)| bearer.is_none()));
	assert_eq!(transport.refresh_calls.load(Ordering::SeqCst), 0);
	assert_eq!(store.snapshot().get(&StorageKey::AccessToken).map(String::as_str), Some("T1"));
}

#[tokio::test]
async fn requests_after_refresh_use_new_token_directly() {
	let transport = Arc::new(ScriptedTransport::default());
	let (client, _store, _observer) = build_client(transport.clone()).await;

	client.get("/users").await.expect("First request should succeed after refresh.");
	client.get("/users").await.expect("Second request should succeed directly.");

	let seen = transport.seen();

	assert_eq!(seen.len(), 4);
	assert_eq!(seen[3], ("/api/users".to_owned(), Some("T2".to_owned())));
	assert_eq!(client.refresh_metrics.attempts(), 1);
}

#[tokio::test]
async fn empty_store_sends_no_bearer_and_expires() {
	let transport = Arc::new(ScriptedTransport::default());
	let (client, store, observer) = build_client(transport.clone()).await;

	store.clear().await.expect("Clearing the seeded pair should succeed.");

	let err = client.get("/users").await.expect_err("Anonymous expiry cannot be recovered.");

	assert!(err.is_session_expired());
	assert_eq!(transport.seen(), vec![("/api/users".to_owned(), None)]);
	assert_eq!(observer.reasons(), vec![SessionExpiredReason::NoRefreshToken]);
}
