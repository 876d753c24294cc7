//! Redacted bearer credential wrapper.

// crates.io
use base64::{Engine as _, engine::general_purpose::STANDARD_NO_PAD};
use sha2::{Digest, Sha256};
// self
use crate::_prelude::*;

/// Slot a credential occupies inside a [`CredentialStore`](crate::store::CredentialStore).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CredentialKind {
	/// Short-lived access token presented as `Authorization: Bearer`.
	Access,
	/// Longer-lived token used only to mint new access tokens.
	Refresh,
}
impl CredentialKind {
	/// Both kinds, access first.
	pub const ALL: [Self; 2] = [Self::Access, Self::Refresh];

	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Access => "access",
			Self::Refresh => "refresh",
		}
	}
}
impl Display for CredentialKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Opaque bearer token that keeps sensitive material out of logs.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Credential(String);
impl Credential {
	/// Wraps a new token string.
	pub fn new(value: impl Into<String>) -> Self {
		Self(value.into())
	}

	/// Returns the inner token value. Callers must avoid logging this string.
	pub fn expose(&self) -> &str {
		&self.0
	}

	/// Renders the `Authorization` header value for this credential.
	pub fn bearer(&self) -> String {
		format!("Bearer {}", self.0)
	}

	/// Short, non-reversible identifier that is safe to log.
	///
	/// The value is the first 12 characters of the base64 (no padding) SHA-256 digest, which is
	/// enough to tell rotated credentials apart in traces.
	pub fn fingerprint(&self) -> String {
		let mut hasher = Sha256::new();

		hasher.update(self.0.as_bytes());

		let mut encoded = STANDARD_NO_PAD.encode(hasher.finalize());

		encoded.truncate(12);

		encoded
	}
}
impl AsRef<str> for Credential {
	fn as_ref(&self) -> &str {
		self.expose()
	}
}
impl Debug for Credential {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("Credential").field(&"<redacted>").finish()
	}
}
impl Display for Credential {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("<redacted>")
	}
}
