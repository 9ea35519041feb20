//! Transport primitives for API calls.
//!
//! [`HttpTransport`] is the client's only dependency on an HTTP stack. The crate ships
//! [`ReqwestTransport`] behind the default `reqwest` feature; tests and embedders can plug in
//! their own implementation to script responses or route through a custom stack. Transports
//! only move bytes: bearer attachment, refresh handling, and envelope decoding all live in
//! [`crate::client`].

// std
#[cfg(feature = "reqwest")] use std::time::Duration as StdDuration;
// self
use crate::{_prelude::*, error::TransportError};
#[cfg(feature = "reqwest")]
use crate::{config::ClientConfig, error::ConfigError};

/// Boxed future returned by [`HttpTransport::send`].
pub type TransportFuture<'a, T> =
	Pin<Box<dyn Future<Output = Result<T, TransportError>> + 'a + Send>>;

/// HTTP methods used by the API.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
	/// `GET`
	Get,
	/// `POST`
	Post,
	/// `PUT`
	Put,
	/// `PATCH`
	Patch,
	/// `DELETE`
	Delete,
}
impl Method {
	/// Returns the method token as sent on the wire.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Get => "GET",
			Self::Post => "POST",
			Self::Put => "PUT",
			Self::Patch => "PATCH",
			Self::Delete => "DELETE",
		}
	}
}
impl Display for Method {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Fully resolved request handed to a transport.
#[derive(Clone, Debug)]
pub struct TransportRequest {
	/// Request method.
	pub method: Method,
	/// Absolute URL including query parameters.
	pub url: Url,
	/// Header name/value pairs in insertion order.
	pub headers: Vec<(String, String)>,
	/// Encoded body, if any.
	pub body: Option<Vec<u8>>,
}
impl TransportRequest {
	/// Creates a request without headers or body.
	pub fn new(method: Method, url: Url) -> Self {
		Self { method, url, headers: Vec::new(), body: None }
	}

	/// Returns the first header value matching `name` (case-insensitive).
	pub fn header(&self, name: &str) -> Option<&str> {
		find_header(&self.headers, name)
	}

	/// Returns the bearer token from the `Authorization` header, if one is attached.
	pub fn bearer(&self) -> Option<&str> {
		self.header("authorization").and_then(|value| value.strip_prefix("Bearer "))
	}

	/// Sets a header, replacing any existing value with the same name.
	pub fn set_header(&mut self, name: impl Into<String>, value: impl Into<String>) {
		let name = name.into();

		self.headers.retain(|(existing, _)| !existing.eq_ignore_ascii_case(&name));
		self.headers.push((name, value.into()));
	}
}

/// Raw response returned by a transport.
#[derive(Clone, Debug, Default)]
pub struct TransportResponse {
	/// HTTP status code.
	pub status: u16,
	/// Header name/value pairs.
	pub headers: Vec<(String, String)>,
	/// Response body bytes.
	pub body: Vec<u8>,
}
impl TransportResponse {
	/// Creates a response with the provided status and body.
	pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
		Self { status, headers: Vec::new(), body: body.into() }
	}

	/// Creates a JSON response from a serializable value.
	pub fn json(status: u16, value: &JsonValue) -> Self {
		let mut response = Self::new(status, value.to_string());

		response.headers.push(("content-type".into(), "application/json".into()));

		response
	}

	/// Returns true for 2xx statuses.
	pub fn is_success(&self) -> bool {
		(200..300).contains(&self.status)
	}

	/// Returns the first header value matching `name` (case-insensitive).
	pub fn header(&self, name: &str) -> Option<&str> {
		find_header(&self.headers, name)
	}

	/// Captures status and retry hints for error reporting.
	pub fn metadata(&self) -> ResponseMetadata {
		ResponseMetadata {
			status: self.status,
			retry_after: self.header("retry-after").and_then(parse_retry_after),
		}
	}
}

/// Metadata captured from a response for downstream error mapping.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ResponseMetadata {
	/// HTTP status code.
	pub status: u16,
	/// Retry-After hint expressed as a relative duration.
	pub retry_after: Option<Duration>,
}

/// Abstraction over HTTP stacks capable of executing API requests.
///
/// Implementations must be `Send + Sync + 'static` so one transport can be shared by every
/// clone of the client, and the returned futures must be `Send` so requests can hop executors.
/// A transport returns `Err` only when no response was received; any HTTP status, including
/// 4xx/5xx, is a successful transport outcome.
pub trait HttpTransport
where
	Self: 'static + Send + Sync,
{
	/// Executes `request` and returns the raw response.
	fn send(&self, request: TransportRequest) -> TransportFuture<'_, TransportResponse>;
}

/// Reqwest-backed transport used by default.
///
/// Redirects are not followed so a misconfigured base URL surfaces as a server error instead
/// of silently replaying credentials against another host.
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug)]
pub struct ReqwestTransport(pub ReqwestClient);
#[cfg(feature = "reqwest")]
impl ReqwestTransport {
	/// Wraps an existing reqwest [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}

	/// Builds a transport honoring the configured timeout and user agent.
	pub fn from_config(config: &ClientConfig) -> Result<Self, ConfigError> {
		Self::build(config.timeout, config.user_agent.as_deref())
	}

	fn build(timeout: StdDuration, user_agent: Option<&str>) -> Result<Self, ConfigError> {
		let mut builder = ReqwestClient::builder()
			.timeout(timeout)
			.redirect(reqwest::redirect::Policy::none());

		if let Some(agent) = user_agent {
			builder = builder.user_agent(agent.to_owned());
		}

		Ok(Self(builder.build()?))
	}
}
#[cfg(feature = "reqwest")]
impl HttpTransport for ReqwestTransport {
	fn send(&self, request: TransportRequest) -> TransportFuture<'_, TransportResponse> {
		let client = self.0.clone();

		Box::pin(async move {
			let method = match request.method {
				Method::Get => reqwest::Method::GET,
				Method::Post => reqwest::Method::POST,
				Method::Put => reqwest::Method::PUT,
				Method::Patch => reqwest::Method::PATCH,
				Method::Delete => reqwest::Method::DELETE,
			};
			let mut builder = client.request(method, request.url);

			for (name, value) in &request.headers {
				builder = builder.header(name.as_str(), value.as_str());
			}
			if let Some(body) = request.body {
				builder = builder.body(body);
			}

			let response = builder.send().await?;
			let status = response.status().as_u16();
			let headers = response
				.headers()
				.iter()
				.filter_map(|(name, value)| {
					value.to_str().ok().map(|value| (name.as_str().to_owned(), value.to_owned()))
				})
				.collect();
			let body = response.bytes().await?.to_vec();

			Ok(TransportResponse { status, headers, body })
		})
	}
}

fn find_header<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
	headers
		.iter()
		.find(|(existing, _)| existing.eq_ignore_ascii_case(name))
		.map(|(_, value)| value.as_str())
}

/// Parses a `Retry-After` value given as delta-seconds or an RFC 2822 date.
pub fn parse_retry_after(raw: &str) -> Option<Duration> {
	use time::format_description::well_known::Rfc2822;

	let raw = raw.trim();

	if let Ok(secs) = raw.parse::<u64>() {
		return Some(Duration::seconds(i64::try_from(secs).unwrap_or(i64::MAX)));
	}
	if let Ok(moment) = OffsetDateTime::parse(raw, &Rfc2822) {
		let delta = moment - OffsetDateTime::now_utc();

		if delta.is_positive() {
			return Some(delta);
		}
	}

	None
}
