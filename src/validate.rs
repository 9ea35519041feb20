//! Client-side payload validation run before any request leaves the process.
//!
//! Rules return `Some(message)` on failure so they compose with [`ValidationErrors::check`].
//! Failures are reported per field, in the same shape as the backend's `errors` map.

// self
use crate::_prelude::*;

/// Minimum password length accepted by the backend.
pub const MIN_PASSWORD_LEN: usize = 6;

/// Field → messages map produced by a failed validation.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ThisError)]
#[serde(transparent)]
#[error("Request payload failed validation for {}.", field_list(.0))]
pub struct ValidationErrors(BTreeMap<String, Vec<String>>);
impl ValidationErrors {
	/// Records `message` against `field`.
	pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
		self.0.entry(field.into()).or_default().push(message.into());
	}

	/// Records the outcome of one rule; `None` means the rule passed.
	pub fn check(&mut self, field: &str, outcome: Option<String>) -> &mut Self {
		if let Some(message) = outcome {
			self.add(field, message);
		}

		self
	}

	/// Returns true when no rule failed.
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	/// Messages recorded for `field`.
	pub fn messages(&self, field: &str) -> &[String] {
		self.0.get(field).map(Vec::as_slice).unwrap_or_default()
	}

	/// Borrows the full field map.
	pub fn fields(&self) -> &BTreeMap<String, Vec<String>> {
		&self.0
	}

	/// `Ok(())` when empty, otherwise `Err(self)`.
	pub fn into_result(self) -> Result<(), Self> {
		if self.is_empty() { Ok(()) } else { Err(self) }
	}
}
impl From<ValidationErrors> for BTreeMap<String, Vec<String>> {
	fn from(errors: ValidationErrors) -> Self {
		errors.0
	}
}

/// Payloads that can be checked locally before submission.
pub trait Validate {
	/// Runs every rule for the payload.
	fn validate(&self) -> Result<(), ValidationErrors>;
}

/// Fails on empty or whitespace-only values.
pub fn required(value: &str) -> Option<String> {
	value.trim().is_empty().then(|| "This field is required.".into())
}

/// Fails unless `value` looks like `local@domain.tld` with no whitespace.
pub fn email(value: &str) -> Option<String> {
	if value.is_empty() {
		return Some("Email is required.".into());
	}

	let valid = !value.chars().any(char::is_whitespace)
		&& value.split_once('@').is_some_and(|(local, domain)| {
			!local.is_empty()
				&& !domain.contains('@')
				&& domain
					.char_indices()
					.any(|(idx, c)| c == '.' && idx > 0 && idx + 1 < domain.len())
		});

	(!valid).then(|| "Email address is invalid.".into())
}

/// Fails on empty passwords and passwords shorter than [`MIN_PASSWORD_LEN`].
pub fn password(value: &str) -> Option<String> {
	if value.is_empty() {
		return Some("Password is required.".into());
	}

	(value.chars().count() < MIN_PASSWORD_LEN)
		.then(|| format!("Password must be at least {MIN_PASSWORD_LEN} characters."))
}

/// Fails on non-empty values shorter than `min` characters.
pub fn min_length(value: &str, min: usize) -> Option<String> {
	let len = value.chars().count();

	(len > 0 && len < min).then(|| format!("Must be at least {min} characters."))
}

/// Fails on values longer than `max` characters.
pub fn max_length(value: &str, max: usize) -> Option<String> {
	(value.chars().count() > max).then(|| format!("Must be at most {max} characters."))
}

/// Fails when a confirmation field differs from the original.
pub fn matches(value: &str, original: &str) -> Option<String> {
	(value != original).then(|| "Values do not match.".into())
}

fn field_list(errors: &BTreeMap<String, Vec<String>>) -> String {
	errors.keys().map(String::as_str).collect::<Vec<_>>().join(", ")
}
