//! Request descriptors and normalized responses exchanged with [`super::ApiClient`].

// self
use crate::{
	_prelude::*,
	envelope::Envelope,
	error::ServerError,
	http::{Method, TransportResponse},
};

/// One logical API request.
///
/// `retried` starts `false` and is flipped by the client when the request is replayed after a
/// token refresh; a descriptor that arrives with `retried == true` never triggers a refresh.
#[derive(Clone, Debug, PartialEq)]
pub struct RequestDescriptor {
	/// Request method.
	pub method: Method,
	/// Path relative to the configured base URL; must start with `/`.
	pub path: String,
	/// Query parameters in insertion order.
	pub query: Vec<(String, String)>,
	/// Extra headers; the client adds `Accept`, `Content-Type`, and `Authorization` itself.
	pub headers: Vec<(String, String)>,
	/// JSON body, if any.
	pub body: Option<JsonValue>,
	/// Whether this request has already been replayed after a refresh.
	pub retried: bool,
}
impl RequestDescriptor {
	/// Creates a descriptor for `method` + `path`.
	pub fn new(method: Method, path: impl Into<String>) -> Self {
		Self {
			method,
			path: path.into(),
			query: Vec::new(),
			headers: Vec::new(),
			body: None,
			retried: false,
		}
	}

	/// Shorthand for a `GET` descriptor.
	pub fn get(path: impl Into<String>) -> Self {
		Self::new(Method::Get, path)
	}

	/// Shorthand for a `POST` descriptor.
	pub fn post(path: impl Into<String>) -> Self {
		Self::new(Method::Post, path)
	}

	/// Shorthand for a `PUT` descriptor.
	pub fn put(path: impl Into<String>) -> Self {
		Self::new(Method::Put, path)
	}

	/// Shorthand for a `PATCH` descriptor.
	pub fn patch(path: impl Into<String>) -> Self {
		Self::new(Method::Patch, path)
	}

	/// Shorthand for a `DELETE` descriptor.
	pub fn delete(path: impl Into<String>) -> Self {
		Self::new(Method::Delete, path)
	}

	/// Appends one query parameter.
	pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
		self.query.push((key.into(), value.into()));

		self
	}

	/// Appends several query parameters.
	pub fn queries<I, K, V>(mut self, pairs: I) -> Self
	where
		I: IntoIterator<Item = (K, V)>,
		K: Into<String>,
		V: Into<String>,
	{
		self.query.extend(pairs.into_iter().map(|(k, v)| (k.into(), v.into())));

		self
	}

	/// Adds an extra header.
	pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
		self.headers.push((name.into(), value.into()));

		self
	}

	/// Sets a pre-built JSON body.
	pub fn with_body(mut self, body: JsonValue) -> Self {
		self.body = Some(body);

		self
	}

	/// Serializes `body` as the JSON payload.
	pub fn json<B>(self, body: &B) -> Result<Self>
	where
		B: ?Sized + Serialize,
	{
		let value = serde_json::to_value(body)
			.map_err(|e| Error::Encode { message: e.to_string() })?;

		Ok(self.with_body(value))
	}
}

/// Successful (2xx) response normalized to the canonical envelope.
#[derive(Clone, Debug, PartialEq)]
pub struct ApiResponse {
	/// HTTP status code.
	pub status: u16,
	/// Normalized body.
	pub envelope: Envelope,
}
impl ApiResponse {
	/// Splits a transport response into success or [`ServerError`].
	pub fn from_transport(response: TransportResponse) -> Result<Self, ServerError> {
		let envelope = Envelope::normalize(response.status, &response.body);

		if response.is_success() {
			Ok(Self { status: response.status, envelope })
		} else {
			Err(ServerError {
				status: response.status,
				retry_after: response.metadata().retry_after,
				envelope,
			})
		}
	}

	/// Raw `data` payload.
	pub fn data(&self) -> &JsonValue {
		&self.envelope.data
	}

	/// Decodes `data` into `T`.
	pub fn data_as<T>(&self) -> Result<T>
	where
		T: DeserializeOwned,
	{
		self.envelope.data_as()
	}

	/// Consumes the response, decoding `data` into `T`.
	pub fn into_data<T>(self) -> Result<T>
	where
		T: DeserializeOwned,
	{
		self.envelope.into_data()
	}

	/// Display message supplied by the backend, if any.
	pub fn message(&self) -> Option<&str> {
		self.envelope.message.as_deref()
	}
}
