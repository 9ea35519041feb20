//! Session lifecycle: login, registration, logout, and the current-user cache.

// self
use crate::{
	_prelude::*,
	auth::{CredentialPair, IssuedTokens, StorageKey, TokenSecret},
	client::{ApiClient, RequestDescriptor},
	http::HttpTransport,
	obs::{self, ClientOp, OpOutcome, OpSpan},
	services::{User, decode_user},
	validate::{self, Validate, ValidationErrors},
};

/// Credentials for the login endpoint.
#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct LoginRequest {
	/// Account email.
	pub email: String,
	/// Account password.
	pub password: String,
}
impl LoginRequest {
	/// Creates a login payload.
	pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
		Self { email: email.into(), password: password.into() }
	}
}
impl Validate for LoginRequest {
	fn validate(&self) -> Result<(), ValidationErrors> {
		let mut errors = ValidationErrors::default();

		errors
			.check("email", validate::email(&self.email))
			.check("password", validate::required(&self.password));

		errors.into_result()
	}
}
impl Debug for LoginRequest {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("LoginRequest")
			.field("email", &self.email)
			.field("password", &"<redacted>")
			.finish()
	}
}

/// Account details for the register endpoint.
#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct RegisterRequest {
	/// Display name.
	pub name: String,
	/// Account email.
	pub email: String,
	/// Chosen password.
	pub password: String,
	/// Must equal `password`.
	pub password_confirmation: String,
}
impl RegisterRequest {
	/// Creates a register payload whose confirmation equals `password`.
	pub fn new(
		name: impl Into<String>,
		email: impl Into<String>,
		password: impl Into<String>,
	) -> Self {
		let password = password.into();

		Self {
			name: name.into(),
			email: email.into(),
			password_confirmation: password.clone(),
			password,
		}
	}
}
impl Validate for RegisterRequest {
	fn validate(&self) -> Result<(), ValidationErrors> {
		let mut errors = ValidationErrors::default();

		errors
			.check("name", validate::required(&self.name))
			.check("name", validate::min_length(self.name.trim(), 2))
			.check("email", validate::email(&self.email))
			.check("password", validate::password(&self.password))
			.check(
				"password_confirmation",
				validate::matches(&self.password_confirmation, &self.password),
			);

		errors.into_result()
	}
}
impl Debug for RegisterRequest {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("RegisterRequest")
			.field("name", &self.name)
			.field("email", &self.email)
			.field("password", &"<redacted>")
			.finish()
	}
}

/// Result of a successful login or registration.
#[derive(Clone, Debug, PartialEq)]
pub struct AuthSession {
	/// Authenticated user, when the server included one this client can decode.
	pub user: Option<User>,
	/// Access token now held by the store.
	pub access_token: TokenSecret,
}

// The user stays raw so a payload this client cannot model never costs the issued tokens.
#[derive(Debug, Deserialize)]
struct IssuedSession {
	#[serde(flatten)]
	tokens: IssuedTokens,
	#[serde(default)]
	user: Option<JsonValue>,
}

/// Login, registration, logout, and the cached current user.
pub struct AuthService<T>
where
	T: ?Sized + HttpTransport,
{
	client: ApiClient<T>,
}
impl<T> AuthService<T>
where
	T: ?Sized + HttpTransport,
{
	/// Wraps `client`.
	pub fn new(client: ApiClient<T>) -> Self {
		Self { client }
	}

	/// Exchanges credentials for a session and persists it.
	pub async fn login(&self, request: &LoginRequest) -> Result<AuthSession> {
		const OP: ClientOp = ClientOp::Login;

		request.validate()?;

		let span = OpSpan::new(OP, "login");
		let path = self.client.config.endpoints.login.clone();

		obs::record_op_outcome(OP, OpOutcome::Attempt);

		let result = span.instrument(self.open_session(path, request)).await;

		obs::record_op_outcome(OP, OpOutcome::of(&result));

		result
	}

	/// Creates an account and persists the session it returns.
	pub async fn register(&self, request: &RegisterRequest) -> Result<AuthSession> {
		const OP: ClientOp = ClientOp::Register;

		request.validate()?;

		let span = OpSpan::new(OP, "register");
		let path = self.client.config.endpoints.register.clone();

		obs::record_op_outcome(OP, OpOutcome::Attempt);

		let result = span.instrument(self.open_session(path, request)).await;

		obs::record_op_outcome(OP, OpOutcome::of(&result));

		result
	}

	/// Ends the session. The server call is best effort; local credentials are always cleared.
	pub async fn logout(&self) -> Result<()> {
		const OP: ClientOp = ClientOp::Logout;

		let span = OpSpan::new(OP, "logout");
		let path = self.client.config.endpoints.logout.clone();

		obs::record_op_outcome(OP, OpOutcome::Attempt);

		let result = span
			.instrument(async move {
				if let Err(e) = self.client.request(RequestDescriptor::post(path)).await {
					obs::log_logout_failure(&e);
				}

				self.client.clear_credentials().await
			})
			.await;

		obs::record_op_outcome(OP, OpOutcome::of(&result));

		result
	}

	/// Renews the access token through the client's single-flight latch.
	pub async fn refresh(&self) -> Result<TokenSecret> {
		self.client.refresh_session().await
	}

	/// Fetches the authenticated user and refreshes the cached copy.
	pub async fn current_user(&self) -> Result<User> {
		let response = self.client.get(self.client.config.endpoints.me.as_str()).await?;
		let user = decode_user(response.data())?;

		self.cache_user(&user).await?;

		Ok(user)
	}

	/// Returns the user cached by the last login, registration, or [`Self::current_user`].
	pub async fn cached_user(&self) -> Result<Option<User>> {
		let Some(raw) = self.client.store.get(StorageKey::User).await? else {
			return Ok(None);
		};
		let mut deserializer = serde_json::Deserializer::from_str(&raw);

		serde_path_to_error::deserialize(&mut deserializer).map(Some).map_err(Error::decode)
	}

	/// Returns true iff an access token is stored.
	pub async fn is_authenticated(&self) -> Result<bool> {
		self.client.is_authenticated().await
	}

	async fn open_session<B>(&self, path: String, body: &B) -> Result<AuthSession>
	where
		B: Serialize + Sync,
	{
		let response = self.client.request(RequestDescriptor::post(path).json(body)?).await?;
		let IssuedSession { tokens, user } = response.into_data()?;

		if !tokens.is_usable() {
			return Err(Error::Decode {
				path: "access_token".into(),
				message: "access token is blank".into(),
			});
		}

		let pair = CredentialPair::from_issued(tokens);
		let access_token = pair.access_token.clone();

		self.client.store.save_pair(pair).await?;

		let user = match user.filter(JsonValue::is_object) {
			Some(raw) => {
				let encoded = serde_json::to_string(&raw)
					.map_err(|e| Error::Encode { message: e.to_string() })?;

				self.client.store.set(StorageKey::User, encoded).await?;

				serde_json::from_value(raw).ok()
			},
			None => {
				self.client.store.remove(StorageKey::User).await?;

				None
			},
		};

		Ok(AuthSession { user, access_token })
	}

	async fn cache_user(&self, user: &User) -> Result<()> {
		let raw =
			serde_json::to_string(user).map_err(|e| Error::Encode { message: e.to_string() })?;

		Ok(self.client.store.set(StorageKey::User, raw).await?)
	}
}
impl<T> Clone for AuthService<T>
where
	T: ?Sized + HttpTransport,
{
	fn clone(&self) -> Self {
		Self { client: self.client.clone() }
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn login_rejects_malformed_credentials() {
		let err = LoginRequest::new("not-an-email", "  ")
			.validate()
			.expect_err("Malformed credentials should fail validation.");

		assert_eq!(err.messages("email").len(), 1);
		assert_eq!(err.messages("password").len(), 1);
		assert!(LoginRequest::new("a@b.com", "x").validate().is_ok());
	}

	#[test]
	fn register_requires_matching_confirmation() {
		let mut request = RegisterRequest::new("Ana", "ana@example.com", "secret1");

		assert!(request.validate().is_ok());

		request.password_confirmation = "secret2".into();

		let err = request.validate().expect_err("Mismatched confirmation should fail.");

		assert_eq!(err.fields().keys().collect::<Vec<_>>(), ["password_confirmation"]);
	}

	#[test]
	fn issued_sessions_accept_single_token_payloads() {
		let session: IssuedSession = serde_json::from_value(serde_json::json!({
			"token": "T1",
			"user": { "id": 1, "name": "Ana", "email": "ana@example.com" }
		}))
		.expect("Single-token payload should decode.");
		let pair = CredentialPair::from_issued(session.tokens);

		assert_eq!(pair.access_token.expose(), "T1");
		assert_eq!(pair.refresh_token.expose(), "T1");
		assert_eq!(session.user.map(|user| user["id"].clone()), Some(serde_json::json!(1)));
	}

	#[test]
	fn debug_output_redacts_passwords() {
		let rendered = format!("{:?}", LoginRequest::new("ana@example.com", "hunter22"));

		assert!(!rendered.contains("hunter22"));
	}
}
