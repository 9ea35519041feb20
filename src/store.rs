//! Storage contracts and built-in credential store implementations.

pub mod file;
pub mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

// self
use crate::{
	_prelude::*,
	auth::{CredentialPair, StorageKey, TokenSecret},
};

/// Boxed future returned by [`CredentialStore`] operations.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + 'a + Send>>;

/// Injectable key/value store holding the session's credentials.
///
/// One store instance is owned by the API client and shared by reference with anything that
/// needs the authentication status. Only login, register, refresh success, and
/// logout/refresh failure mutate it.
pub trait CredentialStore
where
	Self: Send + Sync,
{
	/// Reads the value stored under `key`, if present.
	fn get(&self, key: StorageKey) -> StoreFuture<'_, Option<String>>;

	/// Stores or replaces the value under `key`.
	fn set(&self, key: StorageKey, value: String) -> StoreFuture<'_, ()>;

	/// Removes the value under `key`; missing keys are not an error.
	fn remove(&self, key: StorageKey) -> StoreFuture<'_, ()>;

	/// Removes every session key together.
	fn clear(&self) -> StoreFuture<'_, ()>;

	/// Persists both tokens of a freshly issued pair.
	///
	/// The default implementation writes the keys one after another; backends with a single
	/// lock should override it so readers never observe a half-written pair.
	fn save_pair(&self, pair: CredentialPair) -> StoreFuture<'_, ()> {
		Box::pin(async move {
			self.set(StorageKey::AccessToken, pair.access_token.expose().to_owned()).await?;
			self.set(StorageKey::RefreshToken, pair.refresh_token.expose().to_owned()).await
		})
	}

	/// Reads the access token, treating blank values as absent.
	fn access_token(&self) -> StoreFuture<'_, Option<TokenSecret>> {
		Box::pin(async move { Ok(non_blank(self.get(StorageKey::AccessToken).await?)) })
	}

	/// Reads the refresh token, treating blank values as absent.
	fn refresh_token(&self) -> StoreFuture<'_, Option<TokenSecret>> {
		Box::pin(async move { Ok(non_blank(self.get(StorageKey::RefreshToken).await?)) })
	}
}

fn non_blank(value: Option<String>) -> Option<TokenSecret> {
	value.map(TokenSecret::new).filter(|secret| !secret.is_blank())
}

/// Error type produced by [`CredentialStore`] implementations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum StoreError {
	/// Serialization failures surfaced by the backend.
	#[error("Serialization error: {message}.")]
	Serialization {
		/// Human-readable error payload.
		message: String,
	},
	/// Backend-level failure for the storage engine.
	#[error("Backend failure: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[derive(Default)]
	struct KeyOnlyStore(RwLock<HashMap<StorageKey, String>>);
	impl CredentialStore for KeyOnlyStore {
		fn get(&self, key: StorageKey) -> StoreFuture<'_, Option<String>> {
			Box::pin(async move { Ok(self.0.read().get(&key).cloned()) })
		}

		fn set(&self, key: StorageKey, value: String) -> StoreFuture<'_, ()> {
			Box::pin(async move {
				self.0.write().insert(key, value);

				Ok(())
			})
		}

		fn remove(&self, key: StorageKey) -> StoreFuture<'_, ()> {
			Box::pin(async move {
				self.0.write().remove(&key);

				Ok(())
			})
		}

		fn clear(&self) -> StoreFuture<'_, ()> {
			Box::pin(async move {
				self.0.write().clear();

				Ok(())
			})
		}
	}

	#[tokio::test]
	async fn default_pair_helpers_use_fixed_keys() {
		let store = KeyOnlyStore::default();

		store
			.save_pair(CredentialPair::new("access-1", "refresh-1"))
			.await
			.expect("Saving a pair through the default helper should succeed.");

		assert_eq!(
			store.get(StorageKey::AccessToken).await.expect("Read should succeed."),
			Some("access-1".into())
		);
		assert_eq!(
			store
				.refresh_token()
				.await
				.expect("Read should succeed.")
				.map(|secret| secret.expose().to_owned()),
			Some("refresh-1".into())
		);
	}

	#[tokio::test]
	async fn blank_tokens_read_as_absent() {
		let store = KeyOnlyStore::default();

		store.set(StorageKey::AccessToken, " ".into()).await.expect("Write should succeed.");

		assert!(store.access_token().await.expect("Read should succeed.").is_none());
	}
}
