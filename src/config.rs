//! Gateway configuration: base URL, auth endpoint layout, storage keys, and timeouts.
//!
//! Values come either from [`GatewayConfig::builder`] or from the process environment via
//! [`GatewayConfig::from_env`]. Both paths run the same validation.

/// Builder API for assembling gateway configuration.
pub mod builder;

pub use builder::*;

// self
use crate::{_prelude::*, error::ConfigError};

/// Environment variable holding the API base URL.
pub const ENV_API_BASE_URL: &str = "API_BASE_URL";
/// Environment variable holding the access-token storage key.
pub const ENV_TOKEN_STORAGE_KEY: &str = "TOKEN_STORAGE_KEY";
/// Environment variable holding the refresh-token storage key.
pub const ENV_REFRESH_TOKEN_STORAGE_KEY: &str = "REFRESH_TOKEN_STORAGE_KEY";
/// Optional environment variable overriding the request timeout, in whole seconds.
pub const ENV_API_TIMEOUT_SECS: &str = "API_TIMEOUT_SECS";
/// Optional environment variable overriding the login endpoint path.
pub const ENV_AUTH_LOGIN_PATH: &str = "AUTH_LOGIN_PATH";
/// Optional environment variable overriding the refresh endpoint path.
pub const ENV_AUTH_REFRESH_PATH: &str = "AUTH_REFRESH_PATH";
/// Optional environment variable overriding the sign-in redirect target.
pub const ENV_SIGN_IN_PATH: &str = "SIGN_IN_PATH";

/// Paths of the endpoints that issue credentials.
///
/// Authorization failures on these paths are terminal: retrying a rejected login or a rejected
/// refresh would only loop.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthEndpoints {
	/// Login endpoint path.
	pub login: String,
	/// Refresh endpoint path.
	pub refresh: String,
}
impl AuthEndpoints {
	/// Default login endpoint path.
	pub const DEFAULT_LOGIN: &'static str = "/api/auth/login";
	/// Default refresh endpoint path.
	pub const DEFAULT_REFRESH: &'static str = "/api/auth/refresh-token";

	/// Returns `true` when `path` targets the login or refresh endpoint.
	///
	/// Matching is by substring so absolute URLs and query strings are recognized too. Any path
	/// that contains an endpoint path counts, `/api/auth/login-history` included.
	pub fn is_auth_endpoint(&self, path: &str) -> bool {
		path.contains(self.login.as_str()) || path.contains(self.refresh.as_str())
	}
}
impl Default for AuthEndpoints {
	fn default() -> Self {
		Self { login: Self::DEFAULT_LOGIN.into(), refresh: Self::DEFAULT_REFRESH.into() }
	}
}

/// Names under which persistent stores file the access and refresh credentials.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StorageKeys {
	/// Key for the access credential.
	pub access: String,
	/// Key for the refresh credential.
	pub refresh: String,
}
impl Default for StorageKeys {
	fn default() -> Self {
		Self { access: "auth.token".into(), refresh: "auth.refresh_token".into() }
	}
}

/// Immutable gateway configuration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GatewayConfig {
	/// Base URL prefixed to every relative request path.
	pub base_url: Url,
	/// Per-request timeout applied by the transport, refresh calls included.
	pub timeout: Duration,
	/// Credential-issuing endpoints.
	pub endpoints: AuthEndpoints,
	/// Application route that hosts the sign-in screen.
	pub sign_in_path: String,
	/// Storage keys used by persistent credential stores.
	pub storage_keys: StorageKeys,
}
impl GatewayConfig {
	/// Default per-request timeout.
	pub const DEFAULT_TIMEOUT: Duration = Duration::seconds(30);
	/// Default sign-in redirect target.
	pub const DEFAULT_SIGN_IN_PATH: &'static str = "/entrar";

	/// Creates a new builder for the provided base URL.
	pub fn builder(base_url: Url) -> GatewayConfigBuilder {
		GatewayConfigBuilder::new(base_url)
	}

	/// Loads configuration from the process environment.
	pub fn from_env() -> Result<Self, ConfigError> {
		Self::from_lookup(|key| std::env::var(key).ok())
	}

	/// Loads configuration through an arbitrary key lookup.
	///
	/// Empty values are treated as absent, so blank entries in a dotenv file fall back to
	/// defaults or fail the required-key check.
	pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
	where
		F: Fn(&str) -> Option<String>,
	{
		let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
		let require = |key: &'static str| get(key).ok_or(ConfigError::MissingEnv { key });
		let base_url = Url::parse(&require(ENV_API_BASE_URL)?)
			.map_err(|source| ConfigError::InvalidBaseUrl { source })?;
		let mut builder = Self::builder(base_url).storage_keys(
			require(ENV_TOKEN_STORAGE_KEY)?,
			require(ENV_REFRESH_TOKEN_STORAGE_KEY)?,
		);

		if let Some(raw) = get(ENV_API_TIMEOUT_SECS) {
			let secs = raw.trim().parse::<i64>().map_err(|e| ConfigError::InvalidEnv {
				key: ENV_API_TIMEOUT_SECS,
				reason: e.to_string(),
			})?;

			builder = builder.timeout(Duration::seconds(secs));
		}
		if let Some(path) = get(ENV_AUTH_LOGIN_PATH) {
			builder = builder.login_path(path);
		}
		if let Some(path) = get(ENV_AUTH_REFRESH_PATH) {
			builder = builder.refresh_path(path);
		}
		if let Some(path) = get(ENV_SIGN_IN_PATH) {
			builder = builder.sign_in_path(path);
		}

		builder.build()
	}
}
