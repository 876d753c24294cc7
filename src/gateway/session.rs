//! Session lifecycle on top of the gateway: sign-in, sign-out, and startup restore.
//!
//! These are the only code paths, besides a successful refresh, that write to the credential
//! store.

// crates.io
use serde_json::Value;
// self
use crate::{
	_prelude::*,
	auth::{self, Credential, CredentialKind},
	gateway::Gateway,
	http::{GatewayRequest, Transport},
	obs::{self, FlowOutcome, FlowSpan, GatewayFlow},
	store::Persistence,
};

/// Email and password submitted to the login endpoint.
#[derive(Clone, Serialize, Deserialize)]
pub struct SignInRequest {
	/// Account email.
	pub email: String,
	/// Account password.
	pub password: String,
}
impl SignInRequest {
	/// Creates a new request.
	pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
		Self { email: email.into(), password: password.into() }
	}
}
impl Debug for SignInRequest {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("SignInRequest")
			.field("email", &self.email)
			.field("password", &"<redacted>")
			.finish()
	}
}

/// Result of a successful sign-in.
#[derive(Clone, Debug)]
pub struct SignedIn {
	/// Stored access credential.
	pub access: Credential,
	/// Stored refresh credential, when the server issued one.
	pub refresh: Option<Credential>,
	/// User resource embedded in the login response, left undecoded.
	pub user: Option<Value>,
	/// Server message, typically a greeting.
	pub message: Option<String>,
}

/// Client-side view of the stored session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SessionStatus {
	/// No access credential is stored.
	Anonymous,
	/// The stored access credential has not reached its `exp` claim.
	Active,
	/// The stored access credential is expired or unreadable.
	Expired,
}

#[derive(Debug, Deserialize)]
struct SignInEnvelope {
	#[serde(default)]
	error: bool,
	message: Option<String>,
	data: Option<SignInPayload>,
}

#[derive(Debug, Deserialize)]
struct SignInPayload {
	token: Option<String>,
	refresh_token: Option<String>,
	user: Option<Value>,
}

impl<T> Gateway<T>
where
	T: ?Sized + Transport,
{
	/// Signs in with email and password and stores the issued credentials under `persistence`.
	///
	/// The login endpoint is excluded from refresh handling, so a rejected sign-in surfaces as
	/// [`Error::Unauthorized`] without touching the refresh cycle.
	pub async fn sign_in(
		&self,
		credentials: &SignInRequest,
		persistence: Persistence,
	) -> Result<SignedIn> {
		const FLOW: GatewayFlow = GatewayFlow::Session;

		let span = FlowSpan::new(FLOW, "sign_in");

		obs::record_flow_outcome(FLOW, FlowOutcome::Attempt);

		let result = span
			.instrument(async move {
				let request = GatewayRequest::post(self.config.endpoints.login.as_str())
					.with_json(credentials)
					.map_err(|e| Error::SignIn { message: e.to_string() })?;
				let envelope = self.execute_json::<SignInEnvelope>(request).await?;
				let message = envelope.message;
				let payload = match envelope.data {
					Some(payload) if !envelope.error => payload,
					_ =>
						return Err(Error::SignIn {
							message: message.unwrap_or_else(|| "Sign-in was refused".into()),
						}),
				};
				let access = payload
					.token
					.filter(|token| !token.is_empty())
					.map(Credential::new)
					.ok_or_else(|| Error::SignIn {
						message: "Login response did not contain a token".into(),
					})?;
				let refresh =
					payload.refresh_token.filter(|token| !token.is_empty()).map(Credential::new);

				self.store.set(CredentialKind::Access, access.clone(), persistence)?;

				match &refresh {
					Some(refresh) =>
						self.store.set(CredentialKind::Refresh, refresh.clone(), persistence)?,
					None => self.store.remove(CredentialKind::Refresh)?,
				}

				Ok(SignedIn { access, refresh, user: payload.user, message })
			})
			.await;

		obs::record_flow_outcome(FLOW, FlowOutcome::of(&result));

		result
	}

	/// Removes both stored credentials.
	pub fn sign_out(&self) -> Result<()> {
		obs::record_flow_outcome(GatewayFlow::Session, FlowOutcome::Attempt);

		let result = self.store.clear().map_err(Error::from);

		obs::record_flow_outcome(GatewayFlow::Session, FlowOutcome::of(&result));

		result
	}

	/// Classifies the stored access credential at `now`.
	///
	/// Tokens without an `exp` claim count as active; tokens that cannot be decoded count as
	/// expired.
	pub fn session_status(&self, now: OffsetDateTime) -> Result<SessionStatus> {
		Ok(match self.store.get(CredentialKind::Access)? {
			None => SessionStatus::Anonymous,
			Some(credential) if auth::is_expired_at(&credential, now) => SessionStatus::Expired,
			Some(_) => SessionStatus::Active,
		})
	}

	/// Restores the session at startup.
	///
	/// Returns `None` when nobody is signed in and the stored credential when it is still
	/// active. An expired credential is refreshed through the shared cycle, so a restore racing
	/// with failing requests still issues a single refresh call.
	pub async fn restore(&self, now: OffsetDateTime) -> Result<Option<Credential>> {
		match self.session_status(now)? {
			SessionStatus::Anonymous => Ok(None),
			SessionStatus::Active => Ok(self.store.get(CredentialKind::Access)?),
			SessionStatus::Expired => self.refresh_credential().await.map(Some),
		}
	}
}
