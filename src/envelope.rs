//! Canonical response envelope and normalization of the backend's response shapes.
//!
//! The backend mostly answers with `{success, data, message?, errors?}`, but some routes return
//! a bare object, a raw array, or an empty body, and authorization failures carry a `code`
//! discriminator. [`Envelope::normalize`] folds all of them into one type at the client boundary.

// self
use crate::_prelude::*;

const ENVELOPE_KEYS: [&str; 6] = ["success", "data", "message", "errors", "code", "error"];
const BODY_PREVIEW_LIMIT: usize = 256;

/// Normalized response body.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
	/// Backend success flag; derived from the HTTP status when the body omits it.
	pub success: bool,
	/// Payload; `null` for empty bodies.
	#[serde(default)]
	pub data: JsonValue,
	/// Human-readable message for display.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub message: Option<String>,
	/// Per-field validation messages.
	#[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
	pub errors: BTreeMap<String, Vec<String>>,
	/// Machine-readable discriminator such as `token_expired`.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub code: Option<String>,
}
impl Envelope {
	/// Wraps an arbitrary payload as a successful envelope.
	pub fn wrap(data: JsonValue) -> Self {
		Self { success: true, data, ..Default::default() }
	}

	/// Normalizes a raw response body received with `status`.
	pub fn normalize(status: u16, body: &[u8]) -> Self {
		let success = (200..300).contains(&status);

		if body.iter().all(u8::is_ascii_whitespace) {
			return Self { success, ..Default::default() };
		}

		match serde_json::from_slice::<JsonValue>(body) {
			Ok(JsonValue::Object(map)) if is_envelope_shaped(&map) =>
				from_envelope_map(map, success),
			Ok(JsonValue::Object(map)) if !success => from_error_object(map),
			Ok(value) => Self { success, data: value, ..Default::default() },
			Err(_) => Self { success, message: Some(preview(body)), ..Default::default() },
		}
	}

	/// Decodes `data` into `T`, reporting the JSON path of any mismatch.
	pub fn data_as<T>(&self) -> Result<T>
	where
		T: DeserializeOwned,
	{
		serde_path_to_error::deserialize(&self.data).map_err(Error::decode)
	}

	/// Consumes the envelope, decoding `data` into `T`.
	pub fn into_data<T>(self) -> Result<T>
	where
		T: DeserializeOwned,
	{
		serde_path_to_error::deserialize(self.data).map_err(Error::decode)
	}

	/// Returns true when the body carries `code == expired_code`.
	pub fn has_code(&self, expired_code: &str) -> bool {
		self.code.as_deref() == Some(expired_code)
	}
}

fn is_envelope_shaped(map: &serde_json::Map<String, JsonValue>) -> bool {
	if map.contains_key("success") {
		return true;
	}

	!map.is_empty() && map.keys().all(|key| ENVELOPE_KEYS.contains(&key.as_str()))
}

fn from_envelope_map(
	mut map: serde_json::Map<String, JsonValue>,
	status_success: bool,
) -> Envelope {
	let success =
		map.remove("success").and_then(|value| value.as_bool()).unwrap_or(status_success);
	let data = map.remove("data").unwrap_or(JsonValue::Null);
	let message = take_string(&mut map, "message").or_else(|| take_string(&mut map, "error"));
	let code = take_string(&mut map, "code");
	let errors = map.remove("errors").map(field_errors).unwrap_or_default();

	Envelope { success, data, message, errors, code }
}

// Error bodies keep every key as `data`; the discriminator fields are still read from the top.
fn from_error_object(map: serde_json::Map<String, JsonValue>) -> Envelope {
	let text = |key: &str| match map.get(key)? {
		JsonValue::String(value) => Some(value.clone()),
		JsonValue::Null => None,
		other => Some(other.to_string()),
	};
	let message = text("message").or_else(|| text("error"));
	let code = text("code");
	let errors = map.get("errors").cloned().map(field_errors).unwrap_or_default();

	Envelope { success: false, data: JsonValue::Object(map), message, errors, code }
}

fn take_string(map: &mut serde_json::Map<String, JsonValue>, key: &str) -> Option<String> {
	match map.remove(key)? {
		JsonValue::String(value) => Some(value),
		JsonValue::Null => None,
		other => Some(other.to_string()),
	}
}

// Accepts `{field: [msg, ...]}` and `{field: msg}`; anything else is kept under `_`.
fn field_errors(value: JsonValue) -> BTreeMap<String, Vec<String>> {
	let mut errors = BTreeMap::new();

	match value {
		JsonValue::Object(fields) =>
			for (field, messages) in fields {
				let messages = match messages {
					JsonValue::Array(items) => items.into_iter().map(message_text).collect(),
					other => vec![message_text(other)],
				};

				errors.insert(field, messages);
			},
		JsonValue::Null => {},
		other => {
			errors.insert("_".into(), vec![message_text(other)]);
		},
	}

	errors
}

fn message_text(value: JsonValue) -> String {
	match value {
		JsonValue::String(text) => text,
		other => other.to_string(),
	}
}

fn preview(body: &[u8]) -> String {
	let text = String::from_utf8_lossy(body);
	let trimmed = text.trim();

	match trimmed.char_indices().nth(BODY_PREVIEW_LIMIT) {
		Some((idx, _)) => format!("{}…", &trimmed[..idx]),
		None => trimmed.to_owned(),
	}
}
