//! Gateway-level error types shared across transports, stores, and the refresh cycle.

// self
use crate::{_prelude::*, http::GatewayResponse};

/// Gateway-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical gateway error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Storage-layer failure.
	#[error("{0}")]
	Storage(
		#[from]
		#[source]
		crate::store::StoreError,
	),
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Transport failure (DNS, TCP, TLS, timeout, cancellation).
	#[error(transparent)]
	Transport(#[from] TransportError),
	/// Credential refresh failed; the session has been cleared.
	#[error(transparent)]
	Refresh(#[from] RefreshError),

	/// The server rejected the credential and no further refresh is allowed for this request.
	#[error("Request was rejected with HTTP {}.", .0.status)]
	Unauthorized(Box<GatewayResponse>),
	/// A typed call received a non-success status.
	#[error("Request failed with HTTP {}.", .0.status)]
	Status(Box<GatewayResponse>),
	/// Response body could not be decoded into the requested type.
	#[error("Response body with HTTP {status} could not be decoded.")]
	Decode {
		/// HTTP status of the response that failed to decode.
		status: u16,
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
	},
	/// Sign-in endpoint reported a failure inside its response envelope.
	#[error("Sign-in failed: {message}.")]
	SignIn {
		/// Server- or gateway-supplied message.
		message: String,
	},
}
impl Error {
	/// Returns the HTTP response attached to the error, if any.
	pub fn response(&self) -> Option<&GatewayResponse> {
		match self {
			Self::Unauthorized(response) | Self::Status(response) => Some(response),
			_ => None,
		}
	}
}

/// Configuration and validation failures raised by the gateway.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// A required environment variable is absent or empty.
	#[error("Missing required environment variable: {key}.")]
	MissingEnv {
		/// Variable name.
		key: &'static str,
	},
	/// An environment variable holds a value that cannot be used.
	#[error("Environment variable {key} is invalid: {reason}.")]
	InvalidEnv {
		/// Variable name.
		key: &'static str,
		/// Human-readable reason.
		reason: String,
	},
	/// Base URL cannot be parsed.
	#[error("Base URL is invalid.")]
	InvalidBaseUrl {
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Base URL uses a scheme other than http or https.
	#[error("Base URL must use http or https: {url}.")]
	UnsupportedScheme {
		/// Offending URL.
		url: String,
	},
	/// A configured path does not start with `/`.
	#[error("The {name} path must start with '/': {path}.")]
	InvalidPath {
		/// Which path failed validation.
		name: &'static str,
		/// Offending path.
		path: String,
	},
	/// Request timeout is zero or negative.
	#[error("Request timeout must be positive.")]
	NonPositiveTimeout,
	/// Storage key is empty.
	#[error("The {name} storage key cannot be empty.")]
	EmptyStorageKey {
		/// Which key failed validation.
		name: &'static str,
	},
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Transport-level failures (network, IO, timeouts, cancellation).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the API.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// The transport's per-request timeout elapsed.
	#[error("Request timed out.")]
	Timeout,
	/// The caller cancelled the request before a response arrived.
	#[error("Request was cancelled.")]
	Cancelled,
	/// Request URL could not be assembled.
	#[error("Request URL is invalid: {url}.")]
	InvalidUrl {
		/// URL that failed to parse.
		url: String,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred while calling the API.")]
	Io(#[from] std::io::Error),
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		if e.is_timeout() { Self::Timeout } else { Self::network(e) }
	}
}

/// Terminal refresh failures. Cloned once per waiter queued behind the failed cycle.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum RefreshError {
	/// Refresh endpoint answered with a non-success status.
	#[error("Refresh endpoint rejected the session with HTTP {status}.")]
	Rejected {
		/// HTTP status code.
		status: u16,
	},
	/// Refresh endpoint could not be reached.
	#[error("Refresh endpoint is unreachable: {message}.")]
	Network {
		/// Transport error summary.
		message: String,
	},
	/// Refresh endpoint returned a body that could not be parsed.
	#[error("Refresh endpoint returned a malformed response: {message}.")]
	MalformedResponse {
		/// Parser error summary.
		message: String,
	},
	/// Refresh endpoint succeeded without handing out a token.
	#[error("Refresh endpoint response did not contain a token.")]
	MissingToken,
	/// Refreshed credential could not be written to the store.
	#[error("Refreshed credential could not be stored: {0}")]
	Storage(crate::store::StoreError),
}
impl From<TransportError> for RefreshError {
	fn from(e: TransportError) -> Self {
		Self::Network { message: e.to_string() }
	}
}
