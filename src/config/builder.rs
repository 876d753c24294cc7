// self
use crate::{
	_prelude::*,
	config::{AuthEndpoints, GatewayConfig, StorageKeys},
	error::ConfigError,
};

/// Builder for [`GatewayConfig`] values.
#[derive(Debug)]
pub struct GatewayConfigBuilder {
	/// Base URL prefixed to relative request paths.
	pub base_url: Url,
	/// Per-request timeout.
	pub timeout: Duration,
	/// Credential-issuing endpoints.
	pub endpoints: AuthEndpoints,
	/// Sign-in redirect target.
	pub sign_in_path: String,
	/// Storage keys for persistent stores.
	pub storage_keys: StorageKeys,
}
impl GatewayConfigBuilder {
	/// Creates a new builder seeded with defaults and the provided base URL.
	pub fn new(base_url: Url) -> Self {
		Self {
			base_url,
			timeout: GatewayConfig::DEFAULT_TIMEOUT,
			endpoints: AuthEndpoints::default(),
			sign_in_path: GatewayConfig::DEFAULT_SIGN_IN_PATH.into(),
			storage_keys: StorageKeys::default(),
		}
	}

	/// Overrides the per-request timeout.
	pub fn timeout(mut self, timeout: Duration) -> Self {
		self.timeout = timeout;

		self
	}

	/// Overrides the login endpoint path.
	pub fn login_path(mut self, path: impl Into<String>) -> Self {
		self.endpoints.login = path.into();

		self
	}

	/// Overrides the refresh endpoint path.
	pub fn refresh_path(mut self, path: impl Into<String>) -> Self {
		self.endpoints.refresh = path.into();

		self
	}

	/// Overrides the sign-in redirect target.
	pub fn sign_in_path(mut self, path: impl Into<String>) -> Self {
		self.sign_in_path = path.into();

		self
	}

	/// Overrides both storage keys.
	pub fn storage_keys(mut self, access: impl Into<String>, refresh: impl Into<String>) -> Self {
		self.storage_keys = StorageKeys { access: access.into(), refresh: refresh.into() };

		self
	}

	/// Consumes the builder and validates the resulting configuration.
	pub fn build(self) -> Result<GatewayConfig, ConfigError> {
		let config = GatewayConfig {
			base_url: self.base_url,
			timeout: self.timeout,
			endpoints: self.endpoints,
			sign_in_path: self.sign_in_path,
			storage_keys: self.storage_keys,
		};

		config.validate()?;

		Ok(config)
	}
}

impl GatewayConfig {
	fn validate(&self) -> Result<(), ConfigError> {
		if !matches!(self.base_url.scheme(), "http" | "https") {
			return Err(ConfigError::UnsupportedScheme { url: self.base_url.to_string() });
		}
		if !self.timeout.is_positive() {
			return Err(ConfigError::NonPositiveTimeout);
		}

		validate_path("login", &self.endpoints.login)?;
		validate_path("refresh", &self.endpoints.refresh)?;
		validate_path("sign-in", &self.sign_in_path)?;
		validate_key("access", &self.storage_keys.access)?;
		validate_key("refresh", &self.storage_keys.refresh)?;

		Ok(())
	}
}

fn validate_path(name: &'static str, path: &str) -> Result<(), ConfigError> {
	if path.starts_with('/') {
		Ok(())
	} else {
		Err(ConfigError::InvalidPath { name, path: path.to_owned() })
	}
}

fn validate_key(name: &'static str, key: &str) -> Result<(), ConfigError> {
	if key.trim().is_empty() { Err(ConfigError::EmptyStorageKey { name }) } else { Ok(()) }
}
