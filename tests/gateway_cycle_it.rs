// std
use std::{
	collections::VecDeque,
	sync::{
		Arc,
		atomic::{AtomicUsize, Ordering},
	},
};
// crates.io
use futures::future;
use parking_lot::Mutex;
use tokio::{sync::Notify, time};
use url::Url;
// self
use bearer_gateway::{
	auth::{Credential, CredentialKind},
	config::GatewayConfig,
	error::{Error, RefreshError, TransportError},
	gateway::{Gateway, RefreshEndpoint, RefreshFuture, RefreshedSession},
	http::{GatewayRequest, GatewayResponse, Transport, TransportFuture, cancel_pair},
	store::{CredentialStore, MemoryStore, Persistence, StoreError},
};

#[derive(Clone, Debug, PartialEq, Eq)]
struct Seen {
	path: String,
	bearer: Option<String>,
}
impl Seen {
	fn new(path: &str, bearer: &str) -> Self {
		Self { path: path.into(), bearer: Some(bearer.into()) }
	}
}

/// API double that only accepts the bearer it currently considers valid.
#[derive(Debug, Default)]
struct ScriptedApi {
	accepted: Mutex<Option<String>>,
	log: Mutex<Vec<Seen>>,
}
impl ScriptedApi {
	fn accept(&self, token: &str) {
		*self.accepted.lock() = Some(token.into());
	}

	fn log(&self) -> Vec<Seen> {
		self.log.lock().clone()
	}

	fn replays_with(&self, token: &str) -> Vec<String> {
		self.log()
			.into_iter()
			.filter(|seen| seen.bearer.as_deref() == Some(token))
			.map(|seen| seen.path)
			.collect()
	}
}
impl Transport for ScriptedApi {
	fn send<'a>(&'a self, request: &'a GatewayRequest) -> TransportFuture<'a> {
		let bearer = request.bearer_token().map(str::to_owned);

		self.log.lock().push(Seen { path: request.path.clone(), bearer: bearer.clone() });

		let authorized = bearer.is_some() && *self.accepted.lock() == bearer;
		let response = match request.path.as_str() {
			"/api/offline" =>
				return Box::pin(async { Err::<GatewayResponse, _>(TransportError::Timeout) }),
			"/api/slow" =>
				return Box::pin(future::pending::<Result<GatewayResponse, TransportError>>()),
			"/api/crash" => GatewayResponse::new(500, br#"{"message":"boom"}"#.to_vec()),
			"/api/forbidden" => GatewayResponse::new(403, Vec::new()),
			"/api/stall" if authorized =>
				return Box::pin(future::pending::<Result<GatewayResponse, TransportError>>()),
			path if authorized => GatewayResponse::new(200, format!(r#"{{"path":"{path}"}}"#)),
			_ => GatewayResponse::new(401, Vec::new()),
		};

		Box::pin(async move { Ok(response) })
	}
}

/// Refresh double that optionally parks until the test opens its gate.
struct ScriptedRefresher {
	api: Arc<ScriptedApi>,
	calls: AtomicUsize,
	gate: Option<Notify>,
	outcomes: Mutex<VecDeque<Result<&'static str, RefreshError>>>,
}
impl ScriptedRefresher {
	fn calls(&self) -> usize {
		self.calls.load(Ordering::SeqCst)
	}

	fn open(&self) {
		if let Some(gate) = &self.gate {
			gate.notify_one();
		}
	}
}
impl RefreshEndpoint for ScriptedRefresher {
	fn refresh(&self) -> RefreshFuture<'_> {
		Box::pin(async move {
			self.calls.fetch_add(1, Ordering::SeqCst);

			if let Some(gate) = &self.gate {
				gate.notified().await;
			}

			let outcome = self
				.outcomes
				.lock()
				.pop_front()
				.unwrap_or(Err(RefreshError::Rejected { status: 401 }));
			let token = outcome?;

			self.api.accept(token);

			Ok::<_, RefreshError>(RefreshedSession::access(Credential::new(token)))
		})
	}
}

/// Store that reads and writes normally but cannot remove anything.
struct StickyStore(MemoryStore);
impl CredentialStore for StickyStore {
	fn get(&self, kind: CredentialKind) -> Result<Option<Credential>, StoreError> {
		self.0.get(kind)
	}

	fn persistence(&self, kind: CredentialKind) -> Result<Option<Persistence>, StoreError> {
		self.0.persistence(kind)
	}

	fn set(
		&self,
		kind: CredentialKind,
		credential: Credential,
		persistence: Persistence,
	) -> Result<(), StoreError> {
		self.0.set(kind, credential, persistence)
	}

	fn remove(&self, kind: CredentialKind) -> Result<(), StoreError> {
		Err(StoreError::Backend { message: format!("cannot remove {kind}") })
	}
}

struct Harness {
	gateway: Gateway<ScriptedApi>,
	api: Arc<ScriptedApi>,
	refresher: Arc<ScriptedRefresher>,
	store: Arc<MemoryStore>,
	redirects: Arc<Mutex<Vec<String>>>,
}

fn harness(gated: bool, outcomes: Vec<Result<&'static str, RefreshError>>) -> Harness {
	let config = GatewayConfig::builder(
		Url::parse("https://api.example.com").expect("Fixture base URL should parse."),
	)
	.build()
	.expect("Default configuration should be valid.");
	let api = Arc::new(ScriptedApi::default());
	let store = Arc::new(MemoryStore::with_access(Credential::new("T1")));
	let refresher = Arc::new(ScriptedRefresher {
		api: api.clone(),
		calls: AtomicUsize::new(0),
		gate: gated.then(Notify::new),
		outcomes: Mutex::new(outcomes.into()),
	});
	let redirects = Arc::new(Mutex::new(Vec::new()));
	let sink = redirects.clone();

	store
		.set(CredentialKind::Refresh, Credential::new("R1"), Default::default())
		.expect("Seeding the refresh credential should succeed.");

	let gateway = Gateway::<ScriptedApi>::with_transport(config, store.clone(), api.clone())
		.with_refresher(refresher.clone())
		.with_navigator(Arc::new(move |path: &str| sink.lock().push(path.to_owned())));

	Harness { gateway, api, refresher, store, redirects }
}

async fn wait_until(mut condition: impl FnMut() -> bool) {
	for _ in 0..10_000 {
		if condition() {
			return;
		}

		tokio::task::yield_now().await;
	}

	panic!("Condition was not reached in time.");
}

fn spawn_get(
	gateway: &Gateway<ScriptedApi>,
	path: &'static str,
) -> tokio::task::JoinHandle<Result<GatewayResponse, Error>> {
	let gateway = gateway.clone();

	tokio::spawn(async move { gateway.execute(GatewayRequest::get(path)).await })
}

fn access(store: &MemoryStore) -> Option<Credential> {
	store.get(CredentialKind::Access).expect("Memory store reads cannot fail.")
}

#[tokio::test]
async fn responses_other_than_401_and_403_pass_through() {
	let h = harness(false, Vec::new());

	h.api.accept("T1");

	let ok = h.gateway.execute(GatewayRequest::get("/api/users")).await.expect("200 passes.");
	let crash =
		h.gateway.execute(GatewayRequest::get("/api/crash")).await.expect("500 passes too.");

	assert_eq!(ok.status, 200);
	assert_eq!(crash.status, 500);
	assert_eq!(crash.text(), r#"{"message":"boom"}"#);
	assert_eq!(h.refresher.calls(), 0);
	assert_eq!(h.api.log(), vec![Seen::new("/api/users", "T1"), Seen::new("/api/crash", "T1")]);
}

#[tokio::test]
async fn stale_credential_is_refreshed_and_request_replayed() -> color_eyre::Result<()> {
	let h = harness(false, vec![Ok("T2")]);
	let response = h.gateway.execute(GatewayRequest::get("/api/b")).await?;

	assert_eq!(response.status, 200);
	assert_eq!(h.api.log(), vec![Seen::new("/api/b", "T1"), Seen::new("/api/b", "T2")]);
	assert_eq!(access(&h.store), Some(Credential::new("T2")));
	assert_eq!(
		h.store.get(CredentialKind::Refresh)?,
		Some(Credential::new("R1")),
		"Refresh credential must survive when the endpoint does not rotate it."
	);
	assert_eq!(h.refresher.calls(), 1);
	assert_eq!(h.gateway.metrics.cycles(), 1);
	assert_eq!(h.gateway.metrics.replays(), 1);
	assert!(!h.gateway.is_refreshing());

	Ok(())
}

#[tokio::test]
async fn concurrent_failures_share_one_refresh_and_replay_in_order() {
	let h = harness(true, vec![Ok("T2")]);
	let c = spawn_get(&h.gateway, "/api/c");

	wait_until(|| h.refresher.calls() == 1).await;

	assert!(h.gateway.is_refreshing());

	let d = spawn_get(&h.gateway, "/api/d");

	wait_until(|| h.gateway.metrics.queued() == 1).await;

	let e = spawn_get(&h.gateway, "/api/e");

	wait_until(|| h.gateway.metrics.queued() == 2).await;
	h.refresher.open();

	for handle in [c, d, e] {
		let response = handle.await.expect("Task should not panic.").expect("Replay succeeds.");

		assert_eq!(response.status, 200);
	}

	assert_eq!(h.refresher.calls(), 1);
	assert_eq!(h.api.replays_with("T2"), vec!["/api/c", "/api/d", "/api/e"]);
	assert!(!h.gateway.is_refreshing());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn many_concurrent_failures_issue_exactly_one_refresh() {
	const N: usize = 24;

	let h = harness(true, vec![Ok("T2")]);
	let handles = (0..N)
		.map(|_| spawn_get(&h.gateway, "/api/report"))
		.collect::<Vec<_>>();

	wait_until(|| h.refresher.calls() == 1 && h.gateway.metrics.queued() == N as u64 - 1).await;
	h.refresher.open();

	for handle in handles {
		let response = handle.await.expect("Task should not panic.").expect("Replay succeeds.");

		assert_eq!(response.status, 200);
	}

	assert_eq!(h.refresher.calls(), 1);
	assert_eq!(h.gateway.metrics.replays(), N as u64);
	assert_eq!(h.api.replays_with("T2").len(), N);
}

#[tokio::test]
async fn refresh_failure_rejects_every_waiter_and_signs_out() {
	let h = harness(true, vec![Err(RefreshError::Rejected { status: 500 })]);
	let leader = spawn_get(&h.gateway, "/api/a");

	wait_until(|| h.refresher.calls() == 1).await;

	let first = spawn_get(&h.gateway, "/api/b");
	let second = spawn_get(&h.gateway, "/api/c");

	wait_until(|| h.gateway.metrics.queued() == 2).await;
	h.refresher.open();

	for handle in [leader, first, second] {
		let err = handle.await.expect("Task should not panic.").expect_err("Refresh failed.");

		assert!(
			matches!(err, Error::Refresh(RefreshError::Rejected { status: 500 })),
			"Unexpected error: {err:?}."
		);
	}

	assert_eq!(access(&h.store), None);
	assert_eq!(h.store.get(CredentialKind::Refresh).expect("Read should succeed."), None);
	assert_eq!(*h.redirects.lock(), vec!["/entrar".to_owned()]);
	assert_eq!(h.gateway.metrics.failures(), 1);
	assert_eq!(h.gateway.metrics.replays(), 0);
	assert!(!h.gateway.is_refreshing());
}

#[tokio::test]
async fn auth_endpoint_rejections_are_never_retried() {
	let h = harness(false, vec![Ok("T2")]);

	for path in ["/api/auth/login", "https://api.example.com/api/auth/refresh-token?x=1"] {
		let err = h
			.gateway
			.execute(GatewayRequest::post(path))
			.await
			.expect_err("Auth endpoint 401 must surface.");

		assert_eq!(err.response().map(|response| response.status), Some(401));
		assert!(matches!(err, Error::Unauthorized(_)));
	}

	assert_eq!(h.refresher.calls(), 0);
	assert_eq!(h.api.log().len(), 2);
}

#[tokio::test]
async fn replay_rejected_again_is_not_retried_twice() {
	let h = harness(false, vec![Ok("T2"), Ok("T3")]);
	let err = h
		.gateway
		.execute(GatewayRequest::get("/api/forbidden"))
		.await
		.expect_err("A second authorization failure is terminal.");

	assert_eq!(err.response().map(|response| response.status), Some(403));
	assert_eq!(h.refresher.calls(), 1);
	assert_eq!(
		h.api.log(),
		vec![Seen::new("/api/forbidden", "T1"), Seen::new("/api/forbidden", "T2")]
	);
	assert!(h.redirects.lock().is_empty());
}

#[tokio::test]
async fn later_failure_after_success_starts_a_new_cycle() -> color_eyre::Result<()> {
	let h = harness(false, vec![Ok("T2"), Ok("T3")]);

	assert_eq!(h.gateway.execute(GatewayRequest::get("/api/one")).await?.status, 200);

	h.api.accept("rotated-server-side");

	assert_eq!(h.gateway.execute(GatewayRequest::get("/api/two")).await?.status, 200);
	assert_eq!(h.refresher.calls(), 2);
	assert_eq!(h.gateway.metrics.cycles(), 2);
	assert_eq!(access(&h.store), Some(Credential::new("T3")));

	Ok(())
}

#[tokio::test]
async fn transport_errors_surface_without_refreshing() {
	let h = harness(false, vec![Ok("T2")]);
	let err = h
		.gateway
		.execute(GatewayRequest::get("/api/offline"))
		.await
		.expect_err("Transport failures surface.");

	assert!(matches!(err, Error::Transport(TransportError::Timeout)));
	assert_eq!(h.refresher.calls(), 0);
}

#[tokio::test]
async fn cancellation_stops_a_pending_request() {
	let h = harness(false, Vec::new());
	let (handle, signal) = cancel_pair();
	let gateway = h.gateway.clone();
	let task = tokio::spawn(async move {
		gateway.execute(GatewayRequest::get("/api/slow").with_cancel(signal)).await
	});

	wait_until(|| !h.api.log().is_empty()).await;
	handle.cancel();

	let err = task.await.expect("Task should not panic.").expect_err("Cancelled requests fail.");

	assert!(matches!(err, Error::Transport(TransportError::Cancelled)));
	assert_eq!(h.refresher.calls(), 0);
}

#[tokio::test]
async fn aborted_leader_does_not_cancel_the_shared_refresh() {
	let h = harness(true, vec![Ok("T2")]);
	let leader = spawn_get(&h.gateway, "/api/a");

	wait_until(|| h.refresher.calls() == 1).await;

	let waiter = spawn_get(&h.gateway, "/api/b");

	wait_until(|| h.gateway.metrics.queued() == 1).await;
	leader.abort();

	assert!(leader.await.expect_err("Aborted task yields a join error.").is_cancelled());
	assert!(h.gateway.is_refreshing(), "The queued request keeps the refresh alive.");

	h.refresher.open();

	let response = waiter.await.expect("Task should not panic.").expect("Waiter is replayed.");

	assert_eq!(response.status, 200);
	assert_eq!(h.refresher.calls(), 1);
	assert_eq!(h.api.replays_with("T2"), vec!["/api/b"]);
	assert_eq!(access(&h.store), Some(Credential::new("T2")));
	assert!(!h.gateway.is_refreshing());
}

#[tokio::test]
async fn cycle_without_callers_restarts_on_next_failure() -> color_eyre::Result<()> {
	let h = harness(true, vec![Ok("T2")]);
	let leader = spawn_get(&h.gateway, "/api/a");

	wait_until(|| h.refresher.calls() == 1).await;
	leader.abort();

	let _ = leader.await;

	assert!(!h.gateway.is_refreshing());

	let retry = spawn_get(&h.gateway, "/api/a");

	wait_until(|| h.refresher.calls() == 2).await;
	h.refresher.open();

	assert_eq!(retry.await??.status, 200);
	assert_eq!(h.gateway.metrics.queued(), 0);
	assert_eq!(access(&h.store), Some(Credential::new("T2")));

	Ok(())
}

#[tokio::test]
async fn leader_returns_while_a_queued_replay_is_still_pending() {
	let h = harness(true, vec![Ok("T2")]);
	let leader = spawn_get(&h.gateway, "/api/a");

	wait_until(|| h.refresher.calls() == 1).await;

	let stalled = spawn_get(&h.gateway, "/api/stall");

	wait_until(|| h.gateway.metrics.queued() == 1).await;
	h.refresher.open();

	let response = time::timeout(time::Duration::from_secs(2), leader)
		.await
		.expect("Leader must not wait for other callers' replays.")
		.expect("Task should not panic.")
		.expect("Leader replay succeeds.");

	assert_eq!(response.status, 200);

	wait_until(|| h.api.replays_with("T2").len() == 2).await;

	assert!(!stalled.is_finished());
	assert!(!h.gateway.is_refreshing());

	stalled.abort();
}

#[tokio::test]
async fn failed_clear_is_counted_and_the_cycle_still_settles() {
	let h = harness(false, vec![Err(RefreshError::Rejected { status: 401 })]);
	let store = Arc::new(StickyStore(MemoryStore::with_access(Credential::new("T1"))));
	let gateway = Gateway::<ScriptedApi>::with_transport(
		h.gateway.config.as_ref().clone(),
		store.clone(),
		h.api.clone(),
	)
	.with_refresher(h.refresher.clone())
	.with_navigator(h.gateway.navigator.clone());
	let err = gateway
		.execute(GatewayRequest::get("/api/a"))
		.await
		.expect_err("A rejected refresh is terminal.");

	assert!(matches!(err, Error::Refresh(RefreshError::Rejected { status: 401 })));
	assert_eq!(gateway.metrics.failures(), 1);
	assert_eq!(gateway.metrics.clear_failures(), 1);
	assert_eq!(*h.redirects.lock(), vec!["/entrar".to_owned()]);
	assert!(!gateway.is_refreshing());
}

#[tokio::test]
async fn proactive_refresh_joins_the_reactive_cycle() {
	let h = harness(true, vec![Ok("T2")]);
	let request = spawn_get(&h.gateway, "/api/a");

	wait_until(|| h.refresher.calls() == 1).await;

	let gateway = h.gateway.clone();
	let proactive = tokio::spawn(async move { gateway.refresh_credential().await });

	wait_until(|| h.gateway.metrics.queued() == 1).await;
	h.refresher.open();

	let credential =
		proactive.await.expect("Task should not panic.").expect("Proactive refresh succeeds.");

	assert_eq!(credential, Credential::new("T2"));
	assert_eq!(
		request.await.expect("Task should not panic.").expect("Replay succeeds.").status,
		200
	);
	assert_eq!(h.refresher.calls(), 1);
}
