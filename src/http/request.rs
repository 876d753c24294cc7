//! Transport-agnostic request descriptor.

// self
use crate::{_prelude::*, auth::Credential, http::CancelSignal};

/// Header carrying the bearer credential.
pub const AUTHORIZATION: &str = "authorization";
/// Header naming the body media type.
pub const CONTENT_TYPE: &str = "content-type";

/// HTTP methods supported by the gateway.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Method {
	/// `GET`
	#[default]
	Get,
	/// `POST`
	Post,
	/// `PUT`
	Put,
	/// `PATCH`
	Patch,
	/// `DELETE`
	Delete,
	/// `HEAD`
	Head,
	/// `OPTIONS`
	Options,
}
impl Method {
	/// Returns the canonical upper-case method name.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Get => "GET",
			Self::Post => "POST",
			Self::Put => "PUT",
			Self::Patch => "PATCH",
			Self::Delete => "DELETE",
			Self::Head => "HEAD",
			Self::Options => "OPTIONS",
		}
	}
}
impl Display for Method {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Description of an outbound API call.
///
/// The gateway owns the `authorization` header: whatever the caller sets is replaced with the
/// stored credential before dispatch, and again with the refreshed one on replay.
#[derive(Clone, Debug, Default)]
pub struct GatewayRequest {
	/// HTTP method.
	pub method: Method,
	/// Path relative to the configured base URL, or an absolute URL.
	pub path: String,
	/// Query string pairs, appended in order.
	pub query: Vec<(String, String)>,
	/// Headers keyed by lower-cased name.
	pub headers: BTreeMap<String, String>,
	/// Raw request body.
	pub body: Option<Vec<u8>>,
	/// Optional cancellation signal raced against every dispatch of this request.
	pub cancel: Option<CancelSignal>,
}
impl GatewayRequest {
	/// Creates a request for the provided method and path.
	pub fn new(method: Method, path: impl Into<String>) -> Self {
		Self { method, path: path.into(), ..Default::default() }
	}

	/// Shorthand for a `GET` request.
	pub fn get(path: impl Into<String>) -> Self {
		Self::new(Method::Get, path)
	}

	/// Shorthand for a `POST` request.
	pub fn post(path: impl Into<String>) -> Self {
		Self::new(Method::Post, path)
	}

	/// Shorthand for a `PUT` request.
	pub fn put(path: impl Into<String>) -> Self {
		Self::new(Method::Put, path)
	}

	/// Shorthand for a `DELETE` request.
	pub fn delete(path: impl Into<String>) -> Self {
		Self::new(Method::Delete, path)
	}

	/// Sets a header, replacing any previous value under the same (case-insensitive) name.
	pub fn with_header(mut self, name: impl AsRef<str>, value: impl Into<String>) -> Self {
		self.headers.insert(name.as_ref().to_ascii_lowercase(), value.into());

		self
	}

	/// Appends a query string pair.
	pub fn with_query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
		self.query.push((name.into(), value.into()));

		self
	}

	/// Sets a raw body.
	pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
		self.body = Some(body.into());

		self
	}

	/// Serializes `payload` as the JSON body and sets the matching content type.
	pub fn with_json<T>(self, payload: &T) -> Result<Self, serde_json::Error>
	where
		T: ?Sized + Serialize,
	{
		let body = serde_json::to_vec(payload)?;

		Ok(self.with_header(CONTENT_TYPE, "application/json").with_body(body))
	}

	/// Attaches a cancellation signal.
	pub fn with_cancel(mut self, signal: CancelSignal) -> Self {
		self.cancel = Some(signal);

		self
	}

	/// Returns the `authorization` header value, if any.
	pub fn authorization(&self) -> Option<&str> {
		self.headers.get(AUTHORIZATION).map(String::as_str)
	}

	/// Returns the bearer token currently attached to the request, if any.
	pub fn bearer_token(&self) -> Option<&str> {
		self.authorization()?.strip_prefix("Bearer ")
	}

	pub(crate) fn set_bearer(&mut self, credential: &Credential) {
		self.headers.insert(AUTHORIZATION.into(), credential.bearer());
	}
}
