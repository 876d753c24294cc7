//! Transport primitives for gateway requests.
//!
//! The module exposes [`Transport`] alongside the [`GatewayRequest`] and [`GatewayResponse`]
//! descriptors so applications can plug in custom HTTP stacks (or scripted fakes under test)
//! without touching the refresh machinery. Transports only move bytes: they never inspect
//! status codes, attach credentials, or retry. Those concerns belong to
//! [`Gateway`](crate::gateway::Gateway).

mod cancel;
mod request;
mod response;

pub use cancel::*;
pub use request::*;
pub use response::*;

// std
use std::pin::pin;
// crates.io
use futures::future::{self, Either};
#[cfg(feature = "reqwest")]
use reqwest::{
	header::{ACCEPT, CONTENT_TYPE as CONTENT_TYPE_HEADER, HeaderMap, HeaderValue},
	redirect::Policy,
};
// self
use crate::{_prelude::*, error::TransportError};
#[cfg(feature = "reqwest")] use crate::{config::GatewayConfig, error::ConfigError};

/// Boxed future returned by [`Transport::send`].
pub type TransportFuture<'a> =
	Pin<Box<dyn Future<Output = Result<GatewayResponse, TransportError>> + 'a + Send>>;

/// Abstraction over HTTP stacks capable of executing gateway requests.
///
/// Implementations must be `Send + Sync + 'static` so a single transport can be shared by the
/// gateway and its refresh endpoint, and the futures they return must be `Send` so gateway
/// calls can hop executors.
pub trait Transport
where
	Self: 'static + Send + Sync,
{
	/// Sends `request` and buffers the full response.
	///
	/// Any HTTP status, including 401 and 5xx, is a successful transport outcome.
	fn send<'a>(&'a self, request: &'a GatewayRequest) -> TransportFuture<'a>;
}

/// Sends `request`, racing the transport against the request's cancellation signal.
pub(crate) async fn dispatch<T>(
	transport: &T,
	request: &GatewayRequest,
) -> Result<GatewayResponse, TransportError>
where
	T: ?Sized + Transport,
{
	let Some(signal) = request.cancel.as_ref() else {
		return transport.send(request).await;
	};

	if signal.is_cancelled() {
		return Err(TransportError::Cancelled);
	}

	let cancelled = pin!(signal.cancelled());

	match future::select(transport.send(request), cancelled).await {
		Either::Left((result, _)) => result,
		Either::Right(((), _)) => Err(TransportError::Cancelled),
	}
}

/// Reqwest-backed [`Transport`] bound to a base URL.
///
/// Redirects are not followed: the API answers directly, and following a redirect would carry
/// the bearer credential to another location.
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug)]
pub struct ReqwestTransport {
	client: ReqwestClient,
	base_url: Url,
}
#[cfg(feature = "reqwest")]
impl ReqwestTransport {
	/// Builds a client honoring the configured timeout with JSON default headers.
	pub fn new(config: &GatewayConfig) -> Result<Self, ConfigError> {
		let timeout = std::time::Duration::try_from(config.timeout)
			.map_err(|_| ConfigError::NonPositiveTimeout)?;
		let mut headers = HeaderMap::new();

		headers.insert(CONTENT_TYPE_HEADER, HeaderValue::from_static("application/json"));
		headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

		let client = ReqwestClient::builder()
			.timeout(timeout)
			.default_headers(headers)
			.redirect(Policy::none())
			.build()?;

		Ok(Self::with_client(client, config.base_url.clone()))
	}

	/// Wraps an existing reqwest [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient, base_url: Url) -> Self {
		Self { client, base_url }
	}

	/// Resolves a request path against the base URL.
	///
	/// Relative paths are appended to the base URL verbatim so any base path prefix survives;
	/// absolute URLs pass through untouched.
	pub fn resolve(&self, path: &str) -> Result<Url, TransportError> {
		let raw = if path.starts_with("http://") || path.starts_with("https://") {
			path.to_owned()
		} else {
			let base = self.base_url.as_str().trim_end_matches('/');

			if path.starts_with('/') { format!("{base}{path}") } else { format!("{base}/{path}") }
		};

		Url::parse(&raw).map_err(|source| TransportError::InvalidUrl { url: raw, source })
	}

	fn prepare(&self, request: &GatewayRequest) -> Result<reqwest::RequestBuilder, TransportError> {
		let url = self.resolve(&request.path)?;
		let mut builder = self.client.request(reqwest_method(request.method), url);

		if !request.query.is_empty() {
			builder = builder.query(&request.query);
		}
		for (name, value) in &request.headers {
			builder = builder.header(name.as_str(), value.as_str());
		}
		if let Some(body) = &request.body {
			builder = builder.body(body.clone());
		}

		Ok(builder)
	}
}
#[cfg(feature = "reqwest")]
impl Transport for ReqwestTransport {
	fn send<'a>(&'a self, request: &'a GatewayRequest) -> TransportFuture<'a> {
		Box::pin(async move {
			let response = self.prepare(request)?.send().await?;
			let status = response.status().as_u16();
			let headers = collect_headers(response.headers());
			let body = response.bytes().await?.to_vec();

			Ok(GatewayResponse { status, headers, body })
		})
	}
}

#[cfg(feature = "reqwest")]
fn reqwest_method(method: Method) -> reqwest::Method {
	match method {
		Method::Get => reqwest::Method::GET,
		Method::Post => reqwest::Method::POST,
		Method::Put => reqwest::Method::PUT,
		Method::Patch => reqwest::Method::PATCH,
		Method::Delete => reqwest::Method::DELETE,
		Method::Head => reqwest::Method::HEAD,
		Method::Options => reqwest::Method::OPTIONS,
	}
}

#[cfg(feature = "reqwest")]
fn collect_headers(headers: &HeaderMap) -> BTreeMap<String, String> {
	headers
		.iter()
		.filter_map(|(name, value)| {
			value.to_str().ok().map(|value| (name.as_str().to_owned(), value.to_owned()))
		})
		.collect()
}
