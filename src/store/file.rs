//! File-backed [`CredentialStore`] for desktop clients and CLIs.
//!
//! Remembered credentials are written to a JSON object keyed by the configured
//! [`StorageKeys`]; session credentials stay in memory and vanish with the process.

// std
use std::{
	fs::{self, File},
	io::Write,
	path::{Path, PathBuf},
};
// self
use crate::{
	_prelude::*,
	auth::{Credential, CredentialKind},
	config::StorageKeys,
	store::{CredentialStore, Persistence, StoreError},
};

type Snapshot = BTreeMap<String, Credential>;

#[derive(Debug, Default)]
struct FileState {
	remembered: Snapshot,
	session: HashMap<CredentialKind, Credential>,
}

/// Persists remembered credentials to a JSON file after each mutation.
#[derive(Clone, Debug)]
pub struct FileStore {
	path: PathBuf,
	keys: StorageKeys,
	inner: Arc<RwLock<FileState>>,
}
impl FileStore {
	/// Opens (or creates) a store at the provided path, eagerly loading existing data.
	pub fn open(path: impl Into<PathBuf>, keys: StorageKeys) -> Result<Self, StoreError> {
		let path = path.into();

		Self::ensure_parent_exists(&path)?;

		let remembered = Self::load_snapshot(&path)?;

		Ok(Self {
			path,
			keys,
			inner: Arc::new(RwLock::new(FileState { remembered, session: HashMap::new() })),
		})
	}

	fn key(&self, kind: CredentialKind) -> &str {
		match kind {
			CredentialKind::Access => &self.keys.access,
			CredentialKind::Refresh => &self.keys.refresh,
		}
	}

	fn load_snapshot(path: &Path) -> Result<Snapshot, StoreError> {
		if !path.exists() {
			return Ok(Snapshot::new());
		}

		let bytes = fs::read(path).map_err(|e| StoreError::Backend {
			message: format!("Failed to read {}: {e}", path.display()),
		})?;

		if bytes.iter().all(u8::is_ascii_whitespace) {
			return Ok(Snapshot::new());
		}

		serde_json::from_slice(&bytes).map_err(|e| StoreError::Serialization {
			message: format!("Failed to parse {}: {e}", path.display()),
		})
	}

	fn ensure_parent_exists(path: &Path) -> Result<(), StoreError> {
		if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
			fs::create_dir_all(parent).map_err(|e| StoreError::Backend {
				message: format!("Failed to create store directory {}: {e}", parent.display()),
			})?;
		}

		Ok(())
	}

	fn persist_locked(&self, contents: &Snapshot) -> Result<(), StoreError> {
		Self::ensure_parent_exists(&self.path)?;

		let serialized =
			serde_json::to_vec_pretty(contents).map_err(|e| StoreError::Serialization {
				message: format!("Failed to serialize credential snapshot: {e}"),
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
}
impl CredentialStore for FileStore {
	fn get(&self, kind: CredentialKind) -> Result<Option<Credential>, StoreError> {
		let state = self.inner.read();

		Ok(state.session.get(&kind).or_else(|| state.remembered.get(self.key(kind))).cloned())
	}

	fn persistence(&self, kind: CredentialKind) -> Result<Option<Persistence>, StoreError> {
		let state = self.inner.read();

		if state.session.contains_key(&kind) {
			Ok(Some(Persistence::Session))
		} else if state.remembered.contains_key(self.key(kind)) {
			Ok(Some(Persistence::Remembered))
		} else {
			Ok(None)
		}
	}

	fn set(
		&self,
		kind: CredentialKind,
		credential: Credential,
		persistence: Persistence,
	) -> Result<(), StoreError> {
		let key = self.key(kind).to_owned();
		let mut state = self.inner.write();

		state.session.remove(&kind);

		match persistence {
			Persistence::Remembered => {
				state.remembered.insert(key, credential);
			},
			Persistence::Session => {
				state.session.insert(kind, credential);

				if state.remembered.remove(&key).is_none() {
					return Ok(());
				}
			},
		}

		self.persist_locked(&state.remembered)
	}

	fn remove(&self, kind: CredentialKind) -> Result<(), StoreError> {
		let mut state = self.inner.write();

		state.session.remove(&kind);

		if state.remembered.remove(self.key(kind)).is_some() {
			self.persist_locked(&state.remembered)?;
		}

		Ok(())
	}
}
