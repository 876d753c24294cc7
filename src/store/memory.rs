//! Thread-safe in-memory [`CredentialStore`] implementation for local development and tests.

// self
use crate::{
	_prelude::*,
	auth::{Credential, CredentialKind},
	store::{CredentialStore, Persistence, StoreError},
};

type Tier = HashMap<CredentialKind, Credential>;

#[derive(Debug, Default)]
struct Tiers {
	remembered: Tier,
	session: Tier,
}
impl Tiers {
	fn tier_mut(&mut self, persistence: Persistence) -> &mut Tier {
		match persistence {
			Persistence::Remembered => &mut self.remembered,
			Persistence::Session => &mut self.session,
		}
	}
}

/// Storage backend that keeps both tiers in-process.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore(Arc<RwLock<Tiers>>);
impl MemoryStore {
	/// Creates a store pre-seeded with a remembered access credential.
	pub fn with_access(credential: Credential) -> Self {
		let store = Self::default();

		store.0.write().remembered.insert(CredentialKind::Access, credential);

		store
	}
}
impl CredentialStore for MemoryStore {
	fn get(&self, kind: CredentialKind) -> Result<Option<Credential>, StoreError> {
		let tiers = self.0.read();

		Ok(tiers.session.get(&kind).or_else(|| tiers.remembered.get(&kind)).cloned())
	}

	fn persistence(&self, kind: CredentialKind) -> Result<Option<Persistence>, StoreError> {
		let tiers = self.0.read();

		if tiers.session.contains_key(&kind) {
			Ok(Some(Persistence::Session))
		} else if tiers.remembered.contains_key(&kind) {
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
		let mut tiers = self.0.write();

		tiers.session.remove(&kind);
		tiers.remembered.remove(&kind);
		tiers.tier_mut(persistence).insert(kind, credential);

		Ok(())
	}

	fn remove(&self, kind: CredentialKind) -> Result<(), StoreError> {
		let mut tiers = self.0.write();

		tiers.session.remove(&kind);
		tiers.remembered.remove(&kind);

		Ok(())
	}
}
