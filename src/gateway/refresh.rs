//! Refresh endpoint abstraction and its HTTP implementation.
//!
//! The gateway calls [`RefreshEndpoint::refresh`] exactly once per cycle and never retries it.
//! Persisting the result is the gateway's job, so implementations only talk to the server.

// self
use crate::{
	_prelude::*,
	auth::{Credential, CredentialKind},
	config::GatewayConfig,
	error::RefreshError,
	http::{self, GatewayRequest, Transport},
	store::CredentialStore,
};

/// Boxed future returned by [`RefreshEndpoint::refresh`].
pub type RefreshFuture<'a> =
	Pin<Box<dyn Future<Output = Result<RefreshedSession, RefreshError>> + 'a + Send>>;

/// Credentials minted by a successful refresh.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RefreshedSession {
	/// New access credential.
	pub access: Credential,
	/// Rotated refresh credential, when the server hands one out.
	pub refresh: Option<Credential>,
}
impl RefreshedSession {
	/// Creates a session carrying only a new access credential.
	pub fn access(access: Credential) -> Self {
		Self { access, refresh: None }
	}
}

/// Server call that exchanges the current session for a new access credential.
pub trait RefreshEndpoint
where
	Self: Send + Sync,
{
	/// Performs one refresh attempt.
	fn refresh(&self) -> RefreshFuture<'_>;
}

#[derive(Debug, Deserialize)]
struct RefreshEnvelope {
	data: Option<RefreshPayload>,
}

#[derive(Debug, Deserialize)]
struct RefreshPayload {
	token: Option<String>,
	refresh_token: Option<String>,
}

/// [`RefreshEndpoint`] that POSTs to the configured refresh path through a [`Transport`].
///
/// The backend identifies the session through its cookie and the expired bearer, so the current
/// access credential is attached when one is stored. The request bypasses the gateway's
/// authorization handling, which keeps a rejected refresh from ever re-entering the cycle.
pub struct HttpRefreshEndpoint<T>
where
	T: ?Sized + Transport,
{
	transport: Arc<T>,
	store: Arc<dyn CredentialStore>,
	path: String,
}
impl<T> HttpRefreshEndpoint<T>
where
	T: ?Sized + Transport,
{
	/// Creates an endpoint bound to the refresh path from `config`.
	pub fn new(transport: Arc<T>, store: Arc<dyn CredentialStore>, config: &GatewayConfig) -> Self {
		Self { transport, store, path: config.endpoints.refresh.clone() }
	}

	async fn call(&self) -> Result<RefreshedSession, RefreshError> {
		let mut request = GatewayRequest::post(self.path.as_str());

		if let Some(current) =
			self.store.get(CredentialKind::Access).map_err(RefreshError::Storage)?
		{
			request.set_bearer(&current);
		}

		let response = http::dispatch(self.transport.as_ref(), &request).await?;

		if !response.is_success() {
			return Err(RefreshError::Rejected { status: response.status });
		}

		let envelope = response
			.json::<RefreshEnvelope>()
			.map_err(|e| RefreshError::MalformedResponse { message: e.to_string() })?;
		let payload = envelope.data.ok_or(RefreshError::MissingToken)?;
		let access = payload
			.token
			.filter(|token| !token.is_empty())
			.map(Credential::new)
			.ok_or(RefreshError::MissingToken)?;
		let refresh = payload.refresh_token.filter(|token| !token.is_empty()).map(Credential::new);

		Ok(RefreshedSession { access, refresh })
	}
}
impl<T> RefreshEndpoint for HttpRefreshEndpoint<T>
where
	T: ?Sized + Transport,
{
	fn refresh(&self) -> RefreshFuture<'_> {
		Box::pin(self.call())
	}
}
impl<T> Debug for HttpRefreshEndpoint<T>
where
	T: ?Sized + Transport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("HttpRefreshEndpoint").field("path", &self.path).finish()
	}
}
