//! Authenticated API client that injects bearer credentials, recovers from stale tokens with a
//! single-flight refresh, and replays queued requests in the order they failed.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod auth;
pub mod config;
pub mod error;
pub mod gateway;
pub mod http;
pub mod navigation;
pub mod obs;
pub mod store;
#[cfg(all(any(test, feature = "test"), feature = "reqwest"))]
pub mod _preludet {
	//! Convenience re-exports and helpers for tests; enabled via `cfg(test)` or the `test` crate
	//! feature.

	pub use crate::_prelude::*;

	// self
	use crate::{
		config::GatewayConfig,
		gateway::Gateway,
		http::ReqwestTransport,
		navigation::SignInNavigator,
		store::{CredentialStore, MemoryStore},
	};

	/// Gateway type alias used by reqwest-backed tests.
	pub type ReqwestTestGateway = Gateway<ReqwestTransport>;

	/// Navigator that records every sign-in redirect it receives.
	#[derive(Debug, Default)]
	pub struct RecordingNavigator(Mutex<Vec<String>>);
	impl RecordingNavigator {
		/// Returns the redirect targets observed so far, oldest first.
		pub fn redirects(&self) -> Vec<String> {
			self.0.lock().clone()
		}
	}
	impl SignInNavigator for RecordingNavigator {
		fn redirect_to_sign_in(&self, path: &str) {
			self.0.lock().push(path.to_owned());
		}
	}

	/// Builds a configuration pointing at `base_url` with the default auth endpoint layout.
	pub fn test_config(base_url: &str) -> GatewayConfig {
		let base_url = Url::parse(base_url).expect("Test base URL should parse.");

		GatewayConfig::builder(base_url)
			.storage_keys("test.access", "test.refresh")
			.build()
			.expect("Test gateway configuration should be valid.")
	}

	/// Constructs a [`Gateway`] backed by an in-memory store, a recording navigator, and the
	/// reqwest transport.
	pub fn build_reqwest_test_gateway(
		base_url: &str,
	) -> (ReqwestTestGateway, Arc<MemoryStore>, Arc<RecordingNavigator>) {
		let store_backend = Arc::new(MemoryStore::default());
		let store: Arc<dyn CredentialStore> = store_backend.clone();
		let navigator = Arc::new(RecordingNavigator::default());
		let gateway = ReqwestTestGateway::new(test_config(base_url), store)
			.expect("Failed to build reqwest test gateway.")
			.with_navigator(navigator.clone());

		(gateway, store_backend, navigator)
	}
}

mod _prelude {
	pub use std::{
		collections::{BTreeMap, HashMap, VecDeque},
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		sync::Arc,
	};

	pub use parking_lot::{Mutex, RwLock};
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(test)] use {color_eyre as _, httpmock as _, tokio as _};
