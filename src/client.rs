//! Authenticated API client with bearer attachment and single-flight token refresh.

pub mod refresh;
pub mod request;

pub use refresh::*;
pub use request::*;

// self
use crate::{
	_prelude::*,
	auth::TokenSecret,
	config::ClientConfig,
	ext::SessionObserver,
	http::HttpTransport,
	store::CredentialStore,
};
#[cfg(feature = "reqwest")] use crate::http::ReqwestTransport;

#[cfg(feature = "reqwest")]
/// Client specialized for the crate's default reqwest transport.
pub type ReqwestApiClient = ApiClient<ReqwestTransport>;

/// Issues requests against a fixed base URL on behalf of one session.
///
/// The client owns the transport, the credential store, and the refresh latch. Clones share all
/// three, so every clone participates in the same single-flight refresh and sees the same
/// credentials. Services in [`crate::services`] hold a clone and call [`ApiClient::request`].
pub struct ApiClient<T>
where
	T: ?Sized + HttpTransport,
{
	/// Transport used for every outbound request, including refresh exchanges.
	pub transport: Arc<T>,
	/// Credential store holding the access/refresh pair and cached user.
	pub store: Arc<dyn CredentialStore>,
	/// Validated client configuration.
	pub config: Arc<ClientConfig>,
	/// Shared counters for refresh outcomes.
	pub refresh_metrics: Arc<RefreshMetrics>,
	observers: Arc<Vec<Arc<dyn SessionObserver>>>,
	latch: Arc<RefreshLatch>,
}
impl<T> ApiClient<T>
where
	T: ?Sized + HttpTransport,
{
	/// Creates a client that reuses the caller-provided transport.
	pub fn with_transport(
		config: ClientConfig,
		store: Arc<dyn CredentialStore>,
		transport: impl Into<Arc<T>>,
	) -> Self {
		Self {
			transport: transport.into(),
			store,
			config: Arc::new(config),
			refresh_metrics: Default::default(),
			observers: Default::default(),
			latch: Default::default(),
		}
	}

	/// Registers an observer notified whenever the session expires.
	pub fn with_session_observer(mut self, observer: impl 'static + SessionObserver) -> Self {
		Arc::make_mut(&mut self.observers).push(Arc::new(observer));

		self
	}

	/// Returns true iff an access token is present in the store.
	pub async fn is_authenticated(&self) -> Result<bool> {
		Ok(self.access_token().await?.is_some())
	}

	/// Returns the current access token, if any.
	pub async fn access_token(&self) -> Result<Option<TokenSecret>> {
		Ok(self.store.access_token().await?)
	}

	/// Removes every session key from the store.
	pub async fn clear_credentials(&self) -> Result<()> {
		Ok(self.store.clear().await?)
	}

	/// Sends a `GET` request to `path`.
	pub async fn get(&self, path: impl Into<String>) -> Result<ApiResponse> {
		self.request(RequestDescriptor::get(path)).await
	}

	/// Sends a `GET` request to `path` with query parameters.
	pub async fn get_with_query<I, K, V>(
		&self,
		path: impl Into<String>,
		query: I,
	) -> Result<ApiResponse>
	where
		I: IntoIterator<Item = (K, V)>,
		K: Into<String>,
		V: Into<String>,
	{
		let descriptor = RequestDescriptor::get(path).queries(query);

		self.request(descriptor).await
	}

	/// Sends a `POST` request with a JSON body.
	pub async fn post<B>(&self, path: impl Into<String>, body: &B) -> Result<ApiResponse>
	where
		B: ?Sized + Serialize + Sync,
	{
		self.request(RequestDescriptor::post(path).json(body)?).await
	}

	/// Sends a `PUT` request with a JSON body.
	pub async fn put<B>(&self, path: impl Into<String>, body: &B) -> Result<ApiResponse>
	where
		B: ?Sized + Serialize + Sync,
	{
		self.request(RequestDescriptor::put(path).json(body)?).await
	}

	/// Sends a `DELETE` request to `path`.
	pub async fn delete(&self, path: impl Into<String>) -> Result<ApiResponse> {
		self.request(RequestDescriptor::delete(path)).await
	}
}
#[cfg(feature = "reqwest")]
impl ApiClient<ReqwestTransport> {
	/// Creates a client backed by a reqwest transport built from `config`.
	pub fn new(config: ClientConfig, store: Arc<dyn CredentialStore>) -> Result<Self> {
		let transport = ReqwestTransport::from_config(&config)?;

		Ok(Self::with_transport(config, store, transport))
	}
}
impl<T> Clone for ApiClient<T>
where
	T: ?Sized + HttpTransport,
{
	fn clone(&self) -> Self {
		Self {
			transport: self.transport.clone(),
			store: self.store.clone(),
			config: self.config.clone(),
			refresh_metrics: self.refresh_metrics.clone(),
			observers: self.observers.clone(),
			latch: self.latch.clone(),
		}
	}
}
impl<T> Debug for ApiClient<T>
where
	T: ?Sized + HttpTransport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ApiClient")
			.field("base_url", &self.config.base_url.as_str())
			.field("timeout", &self.config.timeout)
			.field("observers", &self.observers.len())
			.finish()
	}
}
