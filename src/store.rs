//! Storage contracts and built-in credential store implementations.
//!
//! A store keeps at most one [`Credential`] per [`CredentialKind`], filed under one of two
//! [`Persistence`] tiers. Reads prefer the session tier, so a non-remembered sign-in shadows a
//! stale remembered one.

pub mod file;
pub mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

// self
use crate::{
	_prelude::*,
	auth::{Credential, CredentialKind},
};

/// How long a stored credential should survive.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Persistence {
	/// Survives process restarts ("remember me").
	#[default]
	Remembered,
	/// Lives only as long as the current process.
	Session,
}

/// Synchronous credential storage shared by the gateway and the application.
///
/// Only the gateway's sign-in, refresh-success, and sign-out paths write through this trait;
/// everything else reads.
pub trait CredentialStore
where
	Self: Send + Sync,
{
	/// Returns the credential of `kind`, checking the session tier first.
	fn get(&self, kind: CredentialKind) -> Result<Option<Credential>, StoreError>;

	/// Returns the tier currently holding the credential of `kind`.
	fn persistence(&self, kind: CredentialKind) -> Result<Option<Persistence>, StoreError>;

	/// Stores `credential` in the `persistence` tier, evicting it from the other tier.
	fn set(
		&self,
		kind: CredentialKind,
		credential: Credential,
		persistence: Persistence,
	) -> Result<(), StoreError>;

	/// Removes the credential of `kind` from both tiers.
	fn remove(&self, kind: CredentialKind) -> Result<(), StoreError>;

	/// Replaces the credential of `kind` while keeping the tier it already lives in.
	///
	/// Falls back to [`Persistence::Remembered`] when nothing is stored yet.
	fn update(&self, kind: CredentialKind, credential: Credential) -> Result<(), StoreError> {
		let persistence = self.persistence(kind)?.unwrap_or_default();

		self.set(kind, credential, persistence)
	}

	/// Removes every credential kind.
	///
	/// Every kind is attempted even if an earlier removal fails; the first error is returned.
	fn clear(&self) -> Result<(), StoreError> {
		CredentialKind::ALL
			.into_iter()
			.map(|kind| self.remove(kind))
			.fold(Ok(()), |acc, result| acc.and(result))
	}
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
