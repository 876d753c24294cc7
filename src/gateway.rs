//! Authenticated request gateway.
//!
//! [`Gateway::execute`] attaches the stored bearer credential to every request and recovers from
//! a stale credential with a single-flight refresh:
//!
//! - the first request that fails authorization while no refresh is in flight leads a cycle and
//!   calls the [`RefreshEndpoint`]
//! - requests that fail while the cycle is in flight queue behind it instead of refreshing again
//! - the refresh is shared by every caller in the cycle; any of them drives it, so dropping one
//!   caller (the leader included) never cancels it for the others
//! - once the refresh settles, the new credential is stored, the cycle returns to idle, queued
//!   callers are settled in the order they failed, and each caller replays its own request
//! - if the refresh fails, both credentials are cleared, every queued request is rejected with
//!   the same [`RefreshError`], and the [`SignInNavigator`] is sent to the sign-in path
//!
//! Each request gets at most one replay. Authorization failures on the login or refresh
//! endpoints, and on replays, are terminal and surface as [`Error::Unauthorized`].

pub mod metrics;
pub mod refresh;
pub mod session;

mod cycle;

pub use self::{metrics::CycleMetrics, refresh::*, session::*};

// crates.io
use futures::future::{BoxFuture, FutureExt};
use serde::de::DeserializeOwned;
// self
use crate::{
	_prelude::*,
	auth::{Credential, CredentialKind},
	config::GatewayConfig,
	error::RefreshError,
	gateway::cycle::{Admission, RefreshCycle, RefreshOutcome},
	http::{self, GatewayRequest, GatewayResponse, Transport},
	navigation::{NoopNavigator, SignInNavigator},
	obs::{self, FlowOutcome, FlowSpan, GatewayFlow},
	store::CredentialStore,
};
#[cfg(feature = "reqwest")] use crate::{error::ConfigError, http::ReqwestTransport};

#[cfg(feature = "reqwest")]
/// Gateway specialized for the crate's default reqwest transport.
pub type ReqwestGateway = Gateway<ReqwestTransport>;

/// Executes API requests with bearer injection and single-flight credential refresh.
///
/// Clones share the transport, store, and refresh cycle, so every clone observes the same
/// in-flight refresh. Separate gateways never share cycle state.
pub struct Gateway<T>
where
	T: ?Sized + Transport,
{
	/// Transport used for API calls and replays.
	pub transport: Arc<T>,
	/// Credential store read before every request and written by refresh and session calls.
	pub store: Arc<dyn CredentialStore>,
	/// Refresh call issued once per cycle.
	pub refresher: Arc<dyn RefreshEndpoint>,
	/// Side effect fired after a terminal refresh failure.
	pub navigator: Arc<dyn SignInNavigator>,
	/// Immutable configuration.
	pub config: Arc<GatewayConfig>,
	/// Cycle counters.
	pub metrics: Arc<CycleMetrics>,
	cycle: Arc<RefreshCycle>,
}
impl<T> Gateway<T>
where
	T: ?Sized + Transport,
{
	/// Creates a gateway around a caller-provided transport.
	///
	/// The refresh endpoint defaults to [`HttpRefreshEndpoint`] on the same transport and the
	/// navigator to [`NoopNavigator`].
	pub fn with_transport(
		config: GatewayConfig,
		store: Arc<dyn CredentialStore>,
		transport: impl Into<Arc<T>>,
	) -> Self {
		let transport = transport.into();
		let refresher = Arc::new(HttpRefreshEndpoint::new(transport.clone(), store.clone(), &config));

		Self {
			transport,
			store,
			refresher,
			navigator: Arc::new(NoopNavigator),
			config: Arc::new(config),
			metrics: Default::default(),
			cycle: Default::default(),
		}
	}

	/// Replaces the refresh endpoint.
	pub fn with_refresher(mut self, refresher: Arc<dyn RefreshEndpoint>) -> Self {
		self.refresher = refresher;

		self
	}

	/// Replaces the sign-in navigator.
	pub fn with_navigator(mut self, navigator: Arc<dyn SignInNavigator>) -> Self {
		self.navigator = navigator;

		self
	}

	/// Returns `true` while a refresh cycle is in flight.
	pub fn is_refreshing(&self) -> bool {
		self.cycle.is_refreshing()
	}

	/// Executes `request` with the stored bearer credential.
	///
	/// Every status other than 401/403 is returned as-is, application errors included. A 401/403
	/// triggers (or joins) a refresh cycle and the request is replayed once with the new
	/// credential.
	pub async fn execute(&self, request: GatewayRequest) -> Result<GatewayResponse> {
		const FLOW: GatewayFlow = GatewayFlow::Execute;

		let span = FlowSpan::new(FLOW, "execute");

		obs::record_flow_outcome(FLOW, FlowOutcome::Attempt);

		let result = span.instrument(self.execute_once(request)).await;

		obs::record_flow_outcome(FLOW, FlowOutcome::of(&result));

		result
	}

	/// Executes `request` and decodes a 2xx body as `R`.
	///
	/// Non-2xx responses become [`Error::Status`].
	pub async fn execute_json<R>(&self, request: GatewayRequest) -> Result<R>
	where
		R: DeserializeOwned,
	{
		let response = self.execute(request).await?;

		if !response.is_success() {
			return Err(Error::Status(Box::new(response)));
		}

		response.json()
	}

	/// Obtains a fresh access credential through the shared refresh cycle.
	///
	/// Joins the in-flight cycle when there is one, so a proactive refresh never races a
	/// reactive one.
	pub async fn refresh_credential(&self) -> Result<Credential> {
		Ok(self.join_cycle().await?)
	}

	async fn execute_once(&self, mut request: GatewayRequest) -> Result<GatewayResponse> {
		if let Some(credential) = self.store.get(CredentialKind::Access)? {
			request.set_bearer(&credential);
		}

		let response = http::dispatch(self.transport.as_ref(), &request).await?;

		if !response.is_authorization_failure() {
			return Ok(response);
		}
		if self.config.endpoints.is_auth_endpoint(&request.path) {
			return Err(Error::Unauthorized(Box::new(response)));
		}

		let credential = self.join_cycle().await?;

		self.replay(request, &credential).await
	}

	/// Leads a new refresh cycle, or joins the one in flight, and waits for it to settle.
	async fn join_cycle(&self) -> RefreshOutcome {
		match self.cycle.join(|| self.start_refresh()) {
			Admission::Leader(refresh) => refresh.await,
			Admission::Queued(ticket) => {
				self.metrics.record_queued();

				ticket.settled().await
			},
		}
	}

	/// Builds the refresh shared by one cycle.
	///
	/// On success the new credential is stored before the queue is settled. On failure the
	/// store is cleared, every queued caller is rejected, and the navigator fires. The future
	/// owns every handle it touches and is driven by whichever caller of the cycle polls it.
	fn start_refresh(&self) -> BoxFuture<'static, RefreshOutcome> {
		let refresher = self.refresher.clone();
		let store = self.store.clone();
		let navigator = self.navigator.clone();
		let config = self.config.clone();
		let metrics = self.metrics.clone();
		let cycle = Arc::downgrade(&self.cycle);

		async move {
			const FLOW: GatewayFlow = GatewayFlow::Refresh;

			let span = FlowSpan::new(FLOW, "refresh");

			obs::record_flow_outcome(FLOW, FlowOutcome::Attempt);
			metrics.record_cycle();

			let outcome = span
				.instrument(async {
					let session = refresher.refresh().await?;

					persist(store.as_ref(), session)
				})
				.await;

			obs::record_flow_outcome(FLOW, FlowOutcome::of(&outcome));

			if outcome.is_ok() {
				metrics.record_success();
			} else {
				metrics.record_failure();

				if let Err(e) = store.clear() {
					metrics.record_clear_failure();
					span.warn("Stored credentials could not be cleared after a failed refresh.", &e);
				}
			}
			if let Some(cycle) = cycle.upgrade() {
				cycle.settle(&outcome);
			}
			if outcome.is_err() {
				navigator.redirect_to_sign_in(&config.sign_in_path);
			}

			outcome
		}
		.boxed()
	}

	async fn replay(
		&self,
		mut request: GatewayRequest,
		credential: &Credential,
	) -> Result<GatewayResponse> {
		const FLOW: GatewayFlow = GatewayFlow::Replay;

		let span = FlowSpan::new(FLOW, "replay");

		obs::record_flow_outcome(FLOW, FlowOutcome::Attempt);
		request.set_bearer(credential);
		self.metrics.record_replay();

		let result = span
			.instrument(async {
				let response = http::dispatch(self.transport.as_ref(), &request).await?;

				if response.is_authorization_failure() {
					Err(Error::Unauthorized(Box::new(response)))
				} else {
					Ok(response)
				}
			})
			.await;

		obs::record_flow_outcome(FLOW, FlowOutcome::of(&result));

		result
	}
}
#[cfg(feature = "reqwest")]
impl Gateway<ReqwestTransport> {
	/// Creates a gateway with a reqwest transport built from `config`.
	pub fn new(config: GatewayConfig, store: Arc<dyn CredentialStore>) -> Result<Self, ConfigError> {
		let transport = ReqwestTransport::new(&config)?;

		Ok(Self::with_transport(config, store, transport))
	}
}
impl<T> Clone for Gateway<T>
where
	T: ?Sized + Transport,
{
	fn clone(&self) -> Self {
		Self {
			transport: self.transport.clone(),
			store: self.store.clone(),
			refresher: self.refresher.clone(),
			navigator: self.navigator.clone(),
			config: self.config.clone(),
			metrics: self.metrics.clone(),
			cycle: self.cycle.clone(),
		}
	}
}
impl<T> Debug for Gateway<T>
where
	T: ?Sized + Transport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Gateway")
			.field("config", &self.config)
			.field("refreshing", &self.is_refreshing())
			.field("metrics", &self.metrics)
			.finish()
	}
}

fn persist(store: &dyn CredentialStore, session: RefreshedSession) -> Result<Credential, RefreshError> {
	store.update(CredentialKind::Access, session.access.clone()).map_err(RefreshError::Storage)?;

	if let Some(refresh) = session.refresh {
		store.update(CredentialKind::Refresh, refresh).map_err(RefreshError::Storage)?;
	}

	Ok(session.access)
}
