//! User administration: listing, CRUD, soft delete, restore, and permanent removal.

// self
use crate::{
	_prelude::*,
	client::{ApiClient, RequestDescriptor},
	http::HttpTransport,
	services::decode_user,
	validate::{self, Validate, ValidationErrors},
};

const NAME_MAX_LEN: usize = 255;

/// Account role.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
	/// Full administrative access.
	Admin,
	/// Regular account.
	User,
	/// Read-only account.
	Guest,
	/// Any role this client does not know about.
	#[serde(other)]
	Unknown,
}
impl Role {
	/// Wire name of the role.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Admin => "admin",
			Self::User => "user",
			Self::Guest => "guest",
			Self::Unknown => "unknown",
		}
	}
}

/// Account status.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserStatus {
	/// Account can sign in.
	Active,
	/// Account is disabled.
	Inactive,
	/// Account is soft-deleted.
	Deleted,
	/// Any status this client does not know about.
	#[serde(other)]
	Unknown,
}
impl UserStatus {
	/// Wire name of the status.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Active => "active",
			Self::Inactive => "inactive",
			Self::Deleted => "deleted",
			Self::Unknown => "unknown",
		}
	}
}

/// Dashboard user as returned by the API.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct User {
	/// Numeric identifier.
	pub id: u64,
	/// Display name; empty when a session payload omits it.
	#[serde(default)]
	pub name: String,
	/// Login email; empty when a session payload omits it.
	#[serde(default)]
	pub email: String,
	/// Assigned role.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub role: Option<Role>,
	/// Account status.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub status: Option<UserStatus>,
	/// Creation time.
	#[serde(default, with = "time::serde::rfc3339::option")]
	pub created_at: Option<OffsetDateTime>,
	/// Last modification time.
	#[serde(default, with = "time::serde::rfc3339::option")]
	pub updated_at: Option<OffsetDateTime>,
	/// Soft-deletion time; set iff the user is in the trash.
	#[serde(default, with = "time::serde::rfc3339::option")]
	pub deleted_at: Option<OffsetDateTime>,
	/// Fields this client does not model.
	#[serde(flatten)]
	pub extra: BTreeMap<String, JsonValue>,
}
impl User {
	/// Returns true when the user has been soft-deleted.
	pub fn is_trashed(&self) -> bool {
		self.deleted_at.is_some()
	}
}

/// One page of a listing.
///
/// Deserializes from a Laravel-style paginator (`{data, current_page, per_page, total,
/// last_page}`) or from a bare array, which is treated as a single complete page.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Page<T> {
	/// Items on this page.
	pub items: Vec<T>,
	/// 1-based page number.
	pub current_page: u64,
	/// Page size requested from the server.
	pub per_page: u64,
	/// Total number of items across all pages.
	pub total: u64,
	/// Number of the last page.
	pub last_page: u64,
}
impl<T> Page<T> {
	/// Returns true when a later page exists.
	pub fn has_next(&self) -> bool {
		self.current_page < self.last_page
	}

	/// Returns true when this page holds no items.
	pub fn is_empty(&self) -> bool {
		self.items.is_empty()
	}
}
impl<'de, T> Deserialize<'de> for Page<T>
where
	T: Deserialize<'de>,
{
	fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
	where
		D: serde::Deserializer<'de>,
	{
		let page = match PageRepr::<T>::deserialize(deserializer)? {
			PageRepr::Paginated { data, current_page, per_page, total, last_page } => {
				let len = data.len() as u64;

				Page {
					current_page: current_page.unwrap_or(1),
					per_page: per_page.unwrap_or(len),
					total: total.unwrap_or(len),
					last_page: last_page.unwrap_or(1),
					items: data,
				}
			},
			PageRepr::Plain(items) => {
				let len = items.len() as u64;

				Page { items, current_page: 1, per_page: len, total: len, last_page: 1 }
			},
		};

		Ok(page)
	}
}

#[derive(Deserialize)]
#[serde(untagged)]
enum PageRepr<T> {
	Paginated {
		data: Vec<T>,
		#[serde(default, deserialize_with = "lenient_u64")]
		current_page: Option<u64>,
		#[serde(default, deserialize_with = "lenient_u64")]
		per_page: Option<u64>,
		#[serde(default, deserialize_with = "lenient_u64")]
		total: Option<u64>,
		#[serde(default, deserialize_with = "lenient_u64")]
		last_page: Option<u64>,
	},
	Plain(Vec<T>),
}

// Some paginators send numbers as strings (`"per_page": "10"`).
fn lenient_u64<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
	D: serde::Deserializer<'de>,
{
	#[derive(Deserialize)]
	#[serde(untagged)]
	enum Number {
		Int(u64),
		Text(String),
	}

	match Option::<Number>::deserialize(deserializer)? {
		Some(Number::Int(value)) => Ok(Some(value)),
		Some(Number::Text(text)) => text.trim().parse().map(Some).map_err(serde::de::Error::custom),
		None => Ok(None),
	}
}

/// Filters for [`UserService::list`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct UserQuery {
	/// 1-based page number.
	pub page: Option<u32>,
	/// Page size.
	pub per_page: Option<u32>,
	/// Free-text search over name and email.
	pub search: Option<String>,
	/// Status filter.
	pub status: Option<UserStatus>,
	/// Role filter.
	pub role: Option<Role>,
	/// Include soft-deleted users.
	pub with_trashed: bool,
}
impl UserQuery {
	/// Query for `page` with `per_page` items.
	pub fn page(page: u32, per_page: u32) -> Self {
		Self { page: Some(page), per_page: Some(per_page), ..Default::default() }
	}

	/// Adds a free-text search term.
	pub fn search(mut self, term: impl Into<String>) -> Self {
		self.search = Some(term.into());

		self
	}

	/// Filters by status.
	pub fn status(mut self, status: UserStatus) -> Self {
		self.status = Some(status);

		self
	}

	/// Filters by role.
	pub fn role(mut self, role: Role) -> Self {
		self.role = Some(role);

		self
	}

	/// Includes soft-deleted users.
	pub fn with_trashed(mut self) -> Self {
		self.with_trashed = true;

		self
	}

	/// Encodes the filters as query pairs, omitting unset ones.
	pub fn to_pairs(&self) -> Vec<(String, String)> {
		let mut pairs = Vec::new();

		if let Some(page) = self.page {
			pairs.push(("page".into(), page.to_string()));
		}
		if let Some(per_page) = self.per_page {
			pairs.push(("per_page".into(), per_page.to_string()));
		}
		if let Some(search) = self.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
			pairs.push(("search".into(), search.to_owned()));
		}
		if let Some(status) = self.status {
			pairs.push(("status".into(), status.as_str().into()));
		}
		if let Some(role) = self.role {
			pairs.push(("role".into(), role.as_str().into()));
		}
		if self.with_trashed {
			pairs.push(("with_trashed".into(), "1".into()));
		}

		pairs
	}
}

/// Payload for [`UserService::create`].
#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct NewUser {
	/// Display name; empty when a session payload omits it.
	#[serde(default)]
	pub name: String,
	/// Login email; empty when a session payload omits it.
	#[serde(default)]
	pub email: String,
	/// Initial password.
	pub password: String,
	/// Assigned role.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub role: Option<Role>,
	/// Initial status.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub status: Option<UserStatus>,
}
impl NewUser {
	/// Creates a payload with the required fields.
	pub fn new(
		name: impl Into<String>,
		email: impl Into<String>,
		password: impl Into<String>,
	) -> Self {
		Self {
			name: name.into(),
			email: email.into(),
			password: password.into(),
			role: None,
			status: None,
		}
	}
}
impl Validate for NewUser {
	fn validate(&self) -> Result<(), ValidationErrors> {
		let mut errors = ValidationErrors::default();

		errors
			.check("name", validate::required(&self.name))
			.check("name", validate::max_length(&self.name, NAME_MAX_LEN))
			.check("email", validate::email(&self.email))
			.check("password", validate::password(&self.password));

		errors.into_result()
	}
}
impl Debug for NewUser {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("NewUser")
			.field("name", &self.name)
			.field("email", &self.email)
			.field("password", &"<redacted>")
			.field("role", &self.role)
			.field("status", &self.status)
			.finish()
	}
}

/// Partial update for [`UserService::update`]; unset fields are left untouched.
#[derive(Clone, Default, PartialEq, Eq, Serialize)]
pub struct UserUpdate {
	/// New display name.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub name: Option<String>,
	/// New login email.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub email: Option<String>,
	/// New password.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub password: Option<String>,
	/// New role.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub role: Option<Role>,
	/// New status.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub status: Option<UserStatus>,
}
impl Validate for UserUpdate {
	fn validate(&self) -> Result<(), ValidationErrors> {
		let mut errors = ValidationErrors::default();

		if let Some(name) = &self.name {
			errors
				.check("name", validate::required(name))
				.check("name", validate::max_length(name, NAME_MAX_LEN));
		}
		if let Some(email) = &self.email {
			errors.check("email", validate::email(email));
		}
		if let Some(password) = &self.password {
			errors.check("password", validate::password(password));
		}

		errors.into_result()
	}
}
impl Debug for UserUpdate {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("UserUpdate")
			.field("name", &self.name)
			.field("email", &self.email)
			.field("password_set", &self.password.is_some())
			.field("role", &self.role)
			.field("status", &self.status)
			.finish()
	}
}

/// `/users` resource.
pub struct UserService<T>
where
	T: ?Sized + HttpTransport,
{
	client: ApiClient<T>,
}
impl<T> UserService<T>
where
	T: ?Sized + HttpTransport,
{
	/// Wraps `client`.
	pub fn new(client: ApiClient<T>) -> Self {
		Self { client }
	}

	/// Lists users matching `query`.
	pub async fn list(&self, query: &UserQuery) -> Result<Page<User>> {
		self.client.get_with_query("/users", query.to_pairs()).await?.into_data()
	}

	/// Fetches one user.
	pub async fn get(&self, id: u64) -> Result<User> {
		let response = self.client.get(format!("/users/{id}")).await?;

		decode_user(response.data())
	}

	/// Creates a user after validating the payload locally.
	pub async fn create(&self, user: &NewUser) -> Result<User> {
		user.validate()?;

		let response = self.client.post("/users", user).await?;

		decode_user(response.data())
	}

	/// Applies a partial update after validating it locally.
	pub async fn update(&self, id: u64, update: &UserUpdate) -> Result<User> {
		update.validate()?;

		let response = self.client.put(format!("/users/{id}"), update).await?;

		decode_user(response.data())
	}

	/// Soft-deletes a user.
	pub async fn delete(&self, id: u64) -> Result<()> {
		self.client.delete(format!("/users/{id}")).await?;

		Ok(())
	}

	/// Restores a soft-deleted user, returning it when the server echoes it back.
	pub async fn restore(&self, id: u64) -> Result<Option<User>> {
		let response =
			self.client.request(RequestDescriptor::post(format!("/users/{id}/restore"))).await?;

		if response.data().is_null() { Ok(None) } else { decode_user(response.data()).map(Some) }
	}

	/// Permanently deletes a user.
	pub async fn force_delete(&self, id: u64) -> Result<()> {
		self.client.delete(format!("/users/{id}/force")).await?;

		Ok(())
	}
}
impl<T> Clone for UserService<T>
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
	fn users_decode_with_optional_fields() {
		let user: User = serde_json::from_value(serde_json::json!({
			"id": 7,
			"name": "Ana",
			"email": "ana@example.com",
			"role": "superuser",
			"status": "active",
			"created_at": "2024-03-01T10:00:00.000000Z",
			"deleted_at": null,
			"avatar": "a.png"
		}))
		.expect("User fixture should decode.");

		assert_eq!(user.role, Some(Role::Unknown));
		assert_eq!(user.status, Some(UserStatus::Active));
		assert!(user.created_at.is_some());
		assert!(!user.is_trashed());
		assert_eq!(user.extra["avatar"], "a.png");
	}

	#[test]
	fn pages_accept_paginators_and_arrays() {
		let paginated: Page<u32> = serde_json::from_value(serde_json::json!({
			"data": [1, 2],
			"current_page": 2,
			"per_page": "2",
			"total": 5,
			"last_page": 3
		}))
		.expect("Paginator fixture should decode.");

		assert_eq!(paginated.items, vec![1, 2]);
		assert_eq!(paginated.per_page, 2);
		assert!(paginated.has_next());

		let plain: Page<u32> =
			serde_json::from_value(serde_json::json!([4, 5, 6])).expect("Array should decode.");

		assert_eq!((plain.total, plain.last_page), (3, 1));
		assert!(!plain.has_next());
	}

	#[test]
	fn query_pairs_skip_unset_filters() {
		let pairs = UserQuery::page(1, 10)
			.search("  ana ")
			.status(UserStatus::Inactive)
			.with_trashed()
			.to_pairs();

		assert_eq!(pairs, vec![
			("page".to_owned(), "1".to_owned()),
			("per_page".to_owned(), "10".to_owned()),
			("search".to_owned(), "ana".to_owned()),
			("status".to_owned(), "inactive".to_owned()),
			("with_trashed".to_owned(), "1".to_owned()),
		]);
		assert!(UserQuery::default().to_pairs().is_empty());
	}

	#[test]
	fn payloads_validate_before_submission() {
		let err = NewUser::new("", "ana@", "123")
			.validate()
			.expect_err("Invalid payload should fail validation.");

		assert_eq!(err.fields().keys().collect::<Vec<_>>(), ["email", "name", "password"]);
		assert!(UserUpdate::default().validate().is_ok());

		let update = UserUpdate { email: Some("bad".into()), ..Default::default() };

		assert!(update.validate().is_err());
	}
}
