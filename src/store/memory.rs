//! Thread-safe in-memory [`CredentialStore`] implementation for tests and short-lived sessions.

// self
use crate::{
	_prelude::*,
	auth::{CredentialPair, StorageKey},
	store::{CredentialStore, StoreError, StoreFuture},
};

type StoreMap = Arc<RwLock<HashMap<StorageKey, String>>>;

/// Thread-safe storage backend that keeps session values in-process.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore(StoreMap);
impl MemoryStore {
	/// Returns a snapshot of every stored key, mainly for assertions in tests.
	pub fn snapshot(&self) -> BTreeMap<StorageKey, String> {
		self.0.read().iter().map(|(key, value)| (*key, value.clone())).collect()
	}

	/// Returns true when no session values are stored.
	pub fn is_empty(&self) -> bool {
		self.0.read().is_empty()
	}

	fn get_now(map: StoreMap, key: StorageKey) -> Option<String> {
		map.read().get(&key).cloned()
	}

	fn set_now(map: StoreMap, key: StorageKey, value: String) -> Result<(), StoreError> {
		map.write().insert(key, value);

		Ok(())
	}

	fn save_pair_now(map: StoreMap, pair: CredentialPair) -> Result<(), StoreError> {
		let mut guard = map.write();

		guard.insert(StorageKey::AccessToken, pair.access_token.expose().to_owned());
		guard.insert(StorageKey::RefreshToken, pair.refresh_token.expose().to_owned());

		Ok(())
	}

	fn clear_now(map: StoreMap) -> Result<(), StoreError> {
		let mut guard = map.write();

		for key in StorageKey::ALL {
			guard.remove(&key);
		}

		Ok(())
	}
}
impl CredentialStore for MemoryStore {
	fn get(&self, key: StorageKey) -> StoreFuture<'_, Option<String>> {
		let map = self.0.clone();

		Box::pin(async move { Ok(Self::get_now(map, key)) })
	}

	fn set(&self, key: StorageKey, value: String) -> StoreFuture<'_, ()> {
		let map = self.0.clone();

		Box::pin(async move { Self::set_now(map, key, value) })
	}

	fn remove(&self, key: StorageKey) -> StoreFuture<'_, ()> {
		let map = self.0.clone();

		Box::pin(async move {
			map.write().remove(&key);

			Ok(())
		})
	}

	fn clear(&self) -> StoreFuture<'_, ()> {
		let map = self.0.clone();

		Box::pin(async move { Self::clear_now(map) })
	}

	fn save_pair(&self, pair: CredentialPair) -> StoreFuture<'_, ()> {
		let map = self.0.clone();

		Box::pin(async move { Self::save_pair_now(map, pair) })
	}
}
