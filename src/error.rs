//! Client-level error types shared across the transport, store, and service layers.

// self
use crate::{_prelude::*, envelope::Envelope};

/// Client-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical client error exposed by public APIs.
///
/// Callers branch on the variant: [`Error::Transport`] means no response was received,
/// [`Error::Server`] means the backend answered with a non-2xx status, and
/// [`Error::SessionExpired`] means the refresh flow failed and local credentials were wiped.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Storage-layer failure.
	#[error("{0}")]
	Storage(
		#[from]
		#[source]
		crate::store::StoreError,
	),
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Transport failure; no response was received.
	#[error(transparent)]
	Transport(#[from] TransportError),
	/// Backend answered with a non-2xx status.
	#[error(transparent)]
	Server(#[from] ServerError),
	/// Client-side payload validation rejected the request before it was sent.
	#[error(transparent)]
	Validation(#[from] crate::validate::ValidationErrors),

	/// Refresh failed or no refresh token was available; local credentials have been cleared.
	#[error("Session expired: {reason}.")]
	SessionExpired {
		/// Why the session could not be recovered.
		reason: SessionExpiredReason,
	},
	/// Response body could not be decoded into the expected type.
	#[error("Response body does not match the expected shape at `{path}`: {message}.")]
	Decode {
		/// JSON path of the offending value.
		path: String,
		/// Decoder message.
		message: String,
	},
	/// Request payload could not be encoded as JSON.
	#[error("Request payload could not be encoded: {message}.")]
	Encode {
		/// Encoder message.
		message: String,
	},
}
impl Error {
	/// Returns true when the failure means the caller must authenticate again.
	pub fn is_session_expired(&self) -> bool {
		matches!(self, Self::SessionExpired { .. })
	}

	/// Returns true when no response was received from the backend.
	pub fn is_network(&self) -> bool {
		matches!(self, Self::Transport(_))
	}

	/// Returns the HTTP status for server-side failures.
	pub fn status(&self) -> Option<u16> {
		match self {
			Self::Server(err) => Some(err.status),
			_ => None,
		}
	}

	pub(crate) fn decode(err: serde_path_to_error::Error<serde_json::Error>) -> Self {
		Self::Decode { path: err.path().to_string(), message: err.into_inner().to_string() }
	}
}

/// Reason attached to [`Error::SessionExpired`] and published to session observers.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SessionExpiredReason {
	/// The store held no refresh token to exchange.
	NoRefreshToken,
	/// The refresh endpoint rejected the refresh token.
	RefreshRejected {
		/// HTTP status returned by the refresh endpoint.
		status: u16,
	},
	/// The refresh request never received a response.
	RefreshTransport {
		/// Transport failure message.
		message: String,
	},
	/// The refresh endpoint answered 2xx without a usable access token.
	RefreshMalformed {
		/// Decoder message.
		message: String,
	},
}
impl Display for SessionExpiredReason {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		match self {
			Self::NoRefreshToken => f.write_str("no refresh token is available"),
			Self::RefreshRejected { status } =>
				write!(f, "refresh endpoint rejected the token with HTTP {status}"),
			Self::RefreshTransport { message } => write!(f, "refresh request failed: {message}"),
			Self::RefreshMalformed { message } =>
				write!(f, "refresh response is malformed: {message}"),
		}
	}
}

/// Non-2xx response returned by the backend.
#[derive(Clone, Debug, ThisError)]
#[error("Server responded with HTTP {status}: {}.", display_message(.envelope))]
pub struct ServerError {
	/// HTTP status code.
	pub status: u16,
	/// Normalized response body.
	pub envelope: Envelope,
	/// Retry-After hint, if supplied.
	pub retry_after: Option<Duration>,
}
impl ServerError {
	/// Human-readable message from the envelope, if the backend supplied one.
	pub fn message(&self) -> Option<&str> {
		self.envelope.message.as_deref()
	}

	/// Per-field validation messages from the envelope.
	pub fn field_errors(&self) -> &BTreeMap<String, Vec<String>> {
		&self.envelope.errors
	}

	/// Returns true for a 401 whose body carries the `expired_code` discriminator.
	pub fn is_token_expired(&self, expired_code: &str) -> bool {
		self.status == 401 && self.envelope.code.as_deref() == Some(expired_code)
	}
}

fn display_message(envelope: &Envelope) -> &str {
	envelope.message.as_deref().map(|m| m.trim_end_matches('.')).unwrap_or("no message")
}

/// Configuration and validation failures raised while building the client.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// Base URL cannot be parsed.
	#[error("Base URL is invalid.")]
	InvalidBaseUrl {
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},

	/// Base URL must be HTTP(S) and able to carry a path.
	#[error("Base URL `{url}` must be an http(s) URL that can carry a path.")]
	UnsupportedBaseUrl {
		/// URL that failed validation.
		url: String,
	},
	/// Endpoint paths must be relative and start with `/`.
	#[error("The {endpoint} endpoint path `{path}` must start with `/`.")]
	InvalidEndpoint {
		/// Which endpoint failed validation.
		endpoint: &'static str,
		/// Offending path.
		path: String,
	},
	/// Request paths must be relative and start with `/`.
	#[error("Request path `{path}` must start with `/`.")]
	InvalidRequestPath {
		/// Offending path.
		path: String,
	},
	/// A zero timeout would fail every request.
	#[error("Request timeout must be greater than zero.")]
	ZeroTimeout,
	/// The token-expiry discriminator cannot be empty.
	#[error("The token-expired code cannot be empty.")]
	EmptyExpiredCode,
	/// An environment variable holds an unusable value.
	#[error("Environment variable `{name}` is invalid: {value}.")]
	InvalidEnv {
		/// Variable name.
		name: &'static str,
		/// Raw value.
		value: String,
	},
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Transport-level failures (network, timeout, IO).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the API.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Request did not complete within the configured timeout.
	#[error("Request to the API timed out.")]
	Timeout {
		/// Transport-specific timeout error.
		#[source]
		source: BoxError,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred while calling the API.")]
	Io(#[from] std::io::Error),
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}

	/// Wraps a transport-specific timeout error.
	pub fn timeout(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Timeout { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		if e.is_timeout() { Self::timeout(e) } else { Self::network(e) }
	}
}
