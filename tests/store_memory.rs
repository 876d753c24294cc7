// self
use bearer_gateway::{
	auth::{Credential, CredentialKind},
	store::{CredentialStore, MemoryStore, Persistence},
};

#[test]
fn session_tier_shadows_remembered_tier() {
	let store = MemoryStore::default();

	store
		.set(CredentialKind::Access, Credential::new("remembered"), Persistence::Remembered)
		.expect("Remembered write should succeed.");

	assert_eq!(
		store.persistence(CredentialKind::Access).expect("Read should succeed."),
		Some(Persistence::Remembered)
	);

	store
		.set(CredentialKind::Access, Credential::new("session"), Persistence::Session)
		.expect("Session write should succeed.");

	assert_eq!(
		store.get(CredentialKind::Access).expect("Read should succeed."),
		Some(Credential::new("session"))
	);
	assert_eq!(
		store.persistence(CredentialKind::Access).expect("Read should succeed."),
		Some(Persistence::Session),
		"Writing one tier must evict the other."
	);
}

#[test]
fn update_keeps_the_existing_tier() {
	let store = MemoryStore::default();

	store
		.update(CredentialKind::Refresh, Credential::new("R1"))
		.expect("Update without a prior value should succeed.");

	assert_eq!(
		store.persistence(CredentialKind::Refresh).expect("Read should succeed."),
		Some(Persistence::Remembered)
	);

	store
		.set(CredentialKind::Access, Credential::new("T1"), Persistence::Session)
		.expect("Session write should succeed.");
	store
		.update(CredentialKind::Access, Credential::new("T2"))
		.expect("Update should succeed.");

	assert_eq!(
		store.get(CredentialKind::Access).expect("Read should succeed."),
		Some(Credential::new("T2"))
	);
	assert_eq!(
		store.persistence(CredentialKind::Access).expect("Read should succeed."),
		Some(Persistence::Session)
	);
}

#[test]
fn clear_removes_every_kind_and_clones_share_state() {
	let store = MemoryStore::with_access(Credential::new("T1"));
	let clone = store.clone();

	clone
		.set(CredentialKind::Refresh, Credential::new("R1"), Persistence::Remembered)
		.expect("Refresh write should succeed.");
	store.clear().expect("Clearing should succeed.");

	for kind in CredentialKind::ALL {
		assert_eq!(clone.get(kind).expect("Read should succeed."), None);
	}
}
