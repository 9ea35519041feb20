//! Client configuration: base URL, timeout, endpoint table, and the token-expiry discriminator.
//!
//! Configurations are assembled through [`ClientConfigBuilder`], which validates every field
//! before a client can be constructed, or loaded from the environment via
//! [`ClientConfig::from_env`].

// std
use std::{env, time::Duration as StdDuration};
// self
use crate::{_prelude::*, error::ConfigError};

/// Base URL used when `DASHBOARD_API_BASE_URL` is unset.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000/api";
/// Environment variable holding the API base URL.
pub const BASE_URL_ENV: &str = "DASHBOARD_API_BASE_URL";
/// Environment variable holding the request timeout in whole seconds.
pub const TIMEOUT_ENV: &str = "DASHBOARD_API_TIMEOUT_SECS";
/// Discriminator the backend places in 401 bodies when the access token expired.
pub const DEFAULT_EXPIRED_CODE: &str = "token_expired";

/// Relative paths of the authentication endpoints.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Endpoints {
	/// Credential exchange endpoint.
	pub login: String,
	/// Account creation endpoint.
	pub register: String,
	/// Access-token renewal endpoint.
	pub refresh: String,
	/// Server-side session termination endpoint.
	pub logout: String,
	/// Current-user endpoint.
	pub me: String,
}
impl Endpoints {
	/// Returns true for paths that must never attach the stored access token or enter the
	/// refresh-retry flow (login, register, refresh).
	pub fn is_excluded(&self, path: &str) -> bool {
		let path = normalize_path(path);

		[&self.login, &self.register, &self.refresh]
			.into_iter()
			.any(|endpoint| normalize_path(endpoint) == path)
	}

	fn validate(&self) -> Result<(), ConfigError> {
		for (endpoint, path) in [
			("login", &self.login),
			("register", &self.register),
			("refresh", &self.refresh),
			("logout", &self.logout),
			("me", &self.me),
		] {
			if !path.starts_with('/') {
				return Err(ConfigError::InvalidEndpoint { endpoint, path: path.clone() });
			}
		}

		Ok(())
	}
}
impl Default for Endpoints {
	fn default() -> Self {
		Self {
			login: "/login".into(),
			register: "/register".into(),
			refresh: "/refresh".into(),
			logout: "/logout".into(),
			me: "/me".into(),
		}
	}
}

/// Immutable configuration consumed by [`crate::client::ApiClient`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClientConfig {
	/// Base URL every relative request path is appended to.
	pub base_url: Url,
	/// Per-request timeout enforced by the transport.
	pub timeout: StdDuration,
	/// Authentication endpoint paths.
	pub endpoints: Endpoints,
	/// Value of the 401 body's `code` field that marks an expired access token.
	pub expired_code: String,
	/// Optional `User-Agent` header.
	pub user_agent: Option<String>,
}
impl ClientConfig {
	/// Default per-request timeout.
	pub const DEFAULT_TIMEOUT: StdDuration = StdDuration::from_secs(10);

	/// Creates a new builder rooted at `base_url`.
	pub fn builder(base_url: Url) -> ClientConfigBuilder {
		ClientConfigBuilder::new(base_url)
	}

	/// Loads the configuration from `DASHBOARD_API_BASE_URL` and `DASHBOARD_API_TIMEOUT_SECS`,
	/// falling back to [`DEFAULT_BASE_URL`] and [`Self::DEFAULT_TIMEOUT`].
	pub fn from_env() -> Result<Self, ConfigError> {
		Self::from_lookup(|name| env::var(name).ok())
	}

	/// Same as [`Self::from_env`] but reads variables through `lookup`.
	pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
	where
		F: Fn(&str) -> Option<String>,
	{
		let raw_url = lookup(BASE_URL_ENV)
			.filter(|value| !value.trim().is_empty())
			.unwrap_or_else(|| DEFAULT_BASE_URL.to_owned());
		let base_url = Url::parse(raw_url.trim())
			.map_err(|source| ConfigError::InvalidBaseUrl { source })?;
		let mut builder = Self::builder(base_url);

		if let Some(raw) = lookup(TIMEOUT_ENV).filter(|value| !value.trim().is_empty()) {
			let secs = raw
				.trim()
				.parse::<u64>()
				.map_err(|_| ConfigError::InvalidEnv { name: TIMEOUT_ENV, value: raw.clone() })?;

			builder = builder.timeout(StdDuration::from_secs(secs));
		}

		builder.build()
	}

	/// Resolves a relative request path (plus query pairs) against the base URL.
	///
	/// The path is appended to the base path, so a base of `http://host/api` and a path of
	/// `/users/1` yield `http://host/api/users/1`.
	pub fn url_for(&self, path: &str, query: &[(String, String)]) -> Result<Url, ConfigError> {
		if !path.starts_with('/') {
			return Err(ConfigError::InvalidRequestPath { path: path.to_owned() });
		}

		let mut url = self.base_url.clone();
		let joined = format!("{}{}", url.path().trim_end_matches('/'), path);

		url.set_path(&joined);
		url.set_query(None);
		url.set_fragment(None);

		if !query.is_empty() {
			url.query_pairs_mut().extend_pairs(query.iter().map(|(k, v)| (k.as_str(), v.as_str())));
		}

		Ok(url)
	}
}

/// Builder for [`ClientConfig`] values.
#[derive(Debug)]
pub struct ClientConfigBuilder {
	/// Base URL for every request.
	pub base_url: Url,
	/// Per-request timeout.
	pub timeout: StdDuration,
	/// Authentication endpoint paths.
	pub endpoints: Endpoints,
	/// Token-expiry discriminator.
	pub expired_code: String,
	/// Optional `User-Agent` header.
	pub user_agent: Option<String>,
}
impl ClientConfigBuilder {
	/// Creates a new builder seeded with defaults and the provided base URL.
	pub fn new(base_url: Url) -> Self {
		Self {
			base_url,
			timeout: ClientConfig::DEFAULT_TIMEOUT,
			endpoints: Endpoints::default(),
			expired_code: DEFAULT_EXPIRED_CODE.into(),
			user_agent: None,
		}
	}

	/// Overrides the per-request timeout (defaults to 10 seconds).
	pub fn timeout(mut self, timeout: StdDuration) -> Self {
		self.timeout = timeout;

		self
	}

	/// Overrides the authentication endpoint table.
	pub fn endpoints(mut self, endpoints: Endpoints) -> Self {
		self.endpoints = endpoints;

		self
	}

	/// Overrides the token-expiry discriminator (defaults to `token_expired`).
	pub fn expired_code(mut self, code: impl Into<String>) -> Self {
		self.expired_code = code.into();

		self
	}

	/// Sets the `User-Agent` header sent with each request.
	pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
		self.user_agent = Some(agent.into());

		self
	}

	/// Consumes the builder and validates the resulting configuration.
	pub fn build(self) -> Result<ClientConfig, ConfigError> {
		let config = ClientConfig {
			base_url: self.base_url,
			timeout: self.timeout,
			endpoints: self.endpoints,
			expired_code: self.expired_code,
			user_agent: self.user_agent,
		};

		config.validate()?;

		Ok(config)
	}
}

impl ClientConfig {
	fn validate(&self) -> Result<(), ConfigError> {
		if !matches!(self.base_url.scheme(), "http" | "https") || self.base_url.cannot_be_a_base() {
			return Err(ConfigError::UnsupportedBaseUrl { url: self.base_url.to_string() });
		}
		if self.timeout.is_zero() {
			return Err(ConfigError::ZeroTimeout);
		}
		if self.expired_code.trim().is_empty() {
			return Err(ConfigError::EmptyExpiredCode);
		}

		self.endpoints.validate()
	}
}

fn normalize_path(path: &str) -> &str {
	let path = path.split(['?', '#']).next().unwrap_or(path);
	let trimmed = path.trim_end_matches('/');

	if trimmed.is_empty() { "/" } else { trimmed }
}
