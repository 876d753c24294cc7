//! JWT payload decoding used to decide whether a stored access token is still usable.
//!
//! Signatures are not verified; the server remains the authority. The payload is only read to
//! avoid sending a token the client already knows to be expired.

// crates.io
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use serde_json::{Map, Value};
// self
use crate::{_prelude::*, auth::Credential};

/// Errors raised while decoding a token payload.
#[derive(Debug, ThisError)]
pub enum ClaimsError {
	/// Token does not have the `header.payload.signature` shape.
	#[error("Token is not a JWT.")]
	Malformed,
	/// Payload segment is not valid base64url.
	#[error("Token payload is not valid base64url.")]
	Base64(#[from] base64::DecodeError),
	/// Payload segment is not valid JSON.
	#[error("Token payload is not valid JSON.")]
	Json(#[from] serde_json::Error),
	/// Payload decoded to something other than a JSON object.
	#[error("Token payload is not a JSON object.")]
	NotAnObject,
}

/// Decoded JWT payload.
#[derive(Clone, Debug, PartialEq)]
pub struct TokenClaims(Map<String, Value>);
impl TokenClaims {
	/// Decodes the payload segment of `credential`.
	pub fn decode(credential: &Credential) -> Result<Self, ClaimsError> {
		let payload = credential.expose().split('.').nth(1).ok_or(ClaimsError::Malformed)?;
		let bytes = URL_SAFE_NO_PAD.decode(payload.trim_end_matches('='))?;

		match serde_json::from_slice(&bytes)? {
			Value::Object(map) => Ok(Self(map)),
			_ => Err(ClaimsError::NotAnObject),
		}
	}

	/// Returns a raw claim value.
	pub fn get(&self, name: &str) -> Option<&Value> {
		self.0.get(name)
	}

	/// Returns the `exp` claim as an instant, if present and representable.
	pub fn expires_at(&self) -> Option<OffsetDateTime> {
		let exp = self.get("exp")?;
		let secs = exp.as_i64().or_else(|| exp.as_f64().map(|value| value as i64))?;

		OffsetDateTime::from_unix_timestamp(secs).ok()
	}

	/// Returns `true` once `now` reaches the `exp` claim. Tokens without `exp` never expire.
	pub fn is_expired_at(&self, now: OffsetDateTime) -> bool {
		self.expires_at().is_some_and(|exp| now >= exp)
	}
}

/// Returns `true` when the credential is expired at `now` or cannot be decoded at all.
pub fn is_expired_at(credential: &Credential, now: OffsetDateTime) -> bool {
	TokenClaims::decode(credential).map(|claims| claims.is_expired_at(now)).unwrap_or(true)
}
