//! Typed wrappers over the dashboard's REST resources.
//!
//! Every service holds a clone of the [`ApiClient`] it was built from, so all of them share one
//! credential store and one refresh latch.

pub mod auth;
pub mod statistics;
pub mod users;

pub use auth::*;
pub use statistics::*;
pub use users::*;

// self
use crate::{_prelude::*, client::ApiClient, http::HttpTransport};

/// Entry point bundling every service over one client.
pub struct Dashboard<T>
where
	T: ?Sized + HttpTransport,
{
	/// Session management.
	pub auth: AuthService<T>,
	/// User administration.
	pub users: UserService<T>,
	/// Registration statistics.
	pub statistics: StatisticsService<T>,
}
impl<T> Dashboard<T>
where
	T: ?Sized + HttpTransport,
{
	/// Builds all services over clones of `client`.
	pub fn new(client: &ApiClient<T>) -> Self {
		Self {
			auth: AuthService::new(client.clone()),
			users: UserService::new(client.clone()),
			statistics: StatisticsService::new(client.clone()),
		}
	}
}
impl<T> Clone for Dashboard<T>
where
	T: ?Sized + HttpTransport,
{
	fn clone(&self) -> Self {
		Self {
			auth: self.auth.clone(),
			users: self.users.clone(),
			statistics: self.statistics.clone(),
		}
	}
}

// Single-user payloads arrive either bare or wrapped as `{"user": {...}}`.
fn decode_user(data: &JsonValue) -> Result<User> {
	let user = data.get("user").filter(|value| value.is_object()).unwrap_or(data);

	serde_path_to_error::deserialize(user).map_err(Error::decode)
}
