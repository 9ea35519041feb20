//! File-backed [`CredentialStore`] that keeps a session across process restarts.

// std
use std::{
	fs::{self, File},
	io::Write,
	path::{Path, PathBuf},
};
// self
use crate::{
	_prelude::*,
	auth::{CredentialPair, StorageKey},
	store::{CredentialStore, StoreError, StoreFuture},
};

/// Persists session values to a JSON object after each mutation.
///
/// The file maps storage names (`access_token`, `refresh_token`, `user`) to strings. Entries
/// under other names belong to whoever shares the file; they are carried through every rewrite
/// untouched and survive [`CredentialStore::clear`].
#[derive(Clone, Debug)]
pub struct FileStore {
	path: PathBuf,
	inner: Arc<RwLock<FileContents>>,
}
impl FileStore {
	/// Opens (or creates) a store at the provided path, eagerly loading existing data.
	pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
		let path = path.into();

		Self::ensure_parent_exists(&path)?;

		let snapshot = Self::load_snapshot(&path)?;

		Ok(Self { path, inner: Arc::new(RwLock::new(snapshot)) })
	}

	/// Location of the backing file.
	pub fn path(&self) -> &Path {
		&self.path
	}

	fn load_snapshot(path: &Path) -> Result<FileContents, StoreError> {
		if !path.exists() {
			return Ok(FileContents::default());
		}

		let bytes = fs::read(path).map_err(|e| StoreError::Backend {
			message: format!("Failed to read {}: {e}", path.display()),
		})?;

		if bytes.iter().all(u8::is_ascii_whitespace) {
			return Ok(FileContents::default());
		}

		let entries: BTreeMap<String, JsonValue> =
			serde_json::from_slice(&bytes).map_err(|e| StoreError::Serialization {
				message: format!("Failed to parse {}: {e}", path.display()),
			})?;
		let mut contents = FileContents::default();

		for (name, value) in entries {
			match (StorageKey::from_name(&name), value) {
				(Some(key), JsonValue::String(value)) => {
					contents.session.insert(key, value);
				},
				(Some(_), _) => {},
				(None, value) => {
					contents.foreign.insert(name, value);
				},
			}
		}

		Ok(contents)
	}

	fn ensure_parent_exists(path: &Path) -> Result<(), StoreError> {
		if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
			fs::create_dir_all(parent).map_err(|e| StoreError::Backend {
				message: format!("Failed to create store directory {}: {e}", parent.display()),
			})?;
		}

		Ok(())
	}

	fn persist_locked(&self, contents: &FileContents) -> Result<(), StoreError> {
		Self::ensure_parent_exists(&self.path)?;

		let mut merged = contents.foreign.clone();

		for (key, value) in &contents.session {
			merged.insert(key.as_str().to_owned(), JsonValue::String(value.clone()));
		}

		let serialized =
			serde_json::to_vec_pretty(&merged).map_err(|e| StoreError::Serialization {
				message: format!("Failed to serialize session snapshot: {e}"),
			})?;
		let mut tmp_path = self.path.clone();

		tmp_path.set_extension("tmp");

		{
			let mut file = File::create(&tmp_path).map_err(|e| StoreError::Backend {
				message: format!("Failed to create {}: {e}", tmp_path.display()),
			})?;

			file.write_all(&serialized).map_err(|e| StoreError::Backend {
				message: format!("Failed to write {}: {e}", tmp_path.display()),
			})?;
			file.sync_all().map_err(|e| StoreError::Backend {
				message: format!("Failed to sync {}: {e}", tmp_path.display()),
			})?;
		}

		fs::rename(&tmp_path, &self.path).map_err(|e| StoreError::Backend {
			message: format!("Failed to replace {}: {e}", self.path.display()),
		})
	}

	fn mutate<F>(&self, apply: F) -> Result<(), StoreError>
	where
		F: FnOnce(&mut BTreeMap<StorageKey, String>) -> bool,
	{
		let mut guard = self.inner.write();

		if apply(&mut guard.session) {
			self.persist_locked(&guard)?;
		}

		Ok(())
	}
}

#[derive(Debug, Default)]
struct FileContents {
	session: BTreeMap<StorageKey, String>,
	foreign: BTreeMap<String, JsonValue>,
}

impl CredentialStore for FileStore {
	fn get(&self, key: StorageKey) -> StoreFuture<'_, Option<String>> {
		Box::pin(async move { Ok(self.inner.read().session.get(&key).cloned()) })
	}

	fn set(&self, key: StorageKey, value: String) -> StoreFuture<'_, ()> {
		Box::pin(async move {
			self.mutate(|map| map.insert(key, value.clone()).as_ref() != Some(&value))
		})
	}

	fn remove(&self, key: StorageKey) -> StoreFuture<'_, ()> {
		Box::pin(async move { self.mutate(|map| map.remove(&key).is_some()) })
	}

	fn clear(&self) -> StoreFuture<'_, ()> {
		Box::pin(async move {
			self.mutate(|map| {
				let had_values = !map.is_empty();

				map.clear();

				had_values
			})
		})
	}

	fn save_pair(&self, pair: CredentialPair) -> StoreFuture<'_, ()> {
		Box::pin(async move {
			self.mutate(|map| {
				map.insert(StorageKey::AccessToken, pair.access_token.expose().to_owned());
				map.insert(StorageKey::RefreshToken, pair.refresh_token.expose().to_owned());

				true
			})
		})
	}
}
