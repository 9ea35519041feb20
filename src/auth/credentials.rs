//! Access/refresh credential pair, storage keys, and token payloads issued by the backend.

// self
use crate::{_prelude::*, auth::TokenSecret};

/// Fixed keys under which session state is persisted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageKey {
	/// Short-lived bearer credential.
	AccessToken,
	/// Credential exchanged at the refresh endpoint.
	RefreshToken,
	/// Cached JSON blob describing the signed-in user.
	User,
}
impl StorageKey {
	/// Every key cleared together on logout or refresh failure.
	pub const ALL: [StorageKey; 3] = [Self::AccessToken, Self::RefreshToken, Self::User];

	/// Returns the stable storage name for the key.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::AccessToken => "access_token",
			Self::RefreshToken => "refresh_token",
			Self::User => "user",
		}
	}

	/// Resolves a storage name back into a key.
	pub fn from_name(name: &str) -> Option<Self> {
		Self::ALL.into_iter().find(|key| key.as_str() == name)
	}
}
impl Display for StorageKey {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Access and refresh token persisted together after login or registration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CredentialPair {
	/// Bearer credential attached to every authenticated request.
	pub access_token: TokenSecret,
	/// Credential used only against the refresh endpoint.
	pub refresh_token: TokenSecret,
}
impl CredentialPair {
	/// Creates a pair from explicit access and refresh tokens.
	pub fn new(
		access_token: impl Into<TokenSecret>,
		refresh_token: impl Into<TokenSecret>,
	) -> Self {
		Self { access_token: access_token.into(), refresh_token: refresh_token.into() }
	}

	/// Builds the pair from a login/register payload.
	///
	/// Backends that issue a single `token` get it stored as both access and refresh token.
	pub fn from_issued(issued: IssuedTokens) -> Self {
		let access_token = TokenSecret::new(issued.access_token);
		let refresh_token = issued
			.refresh_token
			.filter(|value| !value.trim().is_empty())
			.map(TokenSecret::new)
			.unwrap_or_else(|| access_token.clone());

		Self { access_token, refresh_token }
	}
}

/// Token fields returned by the login, register, and refresh endpoints.
///
/// Accepts `token`, `accessToken`, or `access_token` for the access credential and
/// `refreshToken` or `refresh_token` for the optional rotated refresh credential.
#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct IssuedTokens {
	/// Newly issued access token.
	#[serde(alias = "token", alias = "accessToken")]
	pub access_token: String,
	/// Rotated refresh token, when the backend rotates it.
	#[serde(default, alias = "refreshToken")]
	pub refresh_token: Option<String>,
}
impl IssuedTokens {
	/// Returns true when the access token is present and non-blank.
	pub fn is_usable(&self) -> bool {
		!self.access_token.trim().is_empty()
	}
}
impl Debug for IssuedTokens {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("IssuedTokens")
			.field("access_token", &"<redacted>")
			.field("refresh_token_set", &self.refresh_token.is_some())
			.finish()
	}
}
