//! Transport primitives for request exchanges.
//!
//! [`Transport`] is the relay's only dependency on an HTTP stack: one call, one round trip, no
//! authentication or retry logic. [`RequestExecutor`](crate::executor::RequestExecutor) layers
//! credentials and the 401 retry on top. The default `reqwest` feature provides
//! [`ReqwestTransport`]; tests and custom stacks implement the trait directly.

// std
#[cfg(feature = "reqwest")] use std::ops::Deref;
// crates.io
use serde::de::DeserializeOwned;
// self
use crate::{
	_prelude::*,
	decode,
	error::{DecodeError, TransportError},
	request::BuiltRequest,
};
#[cfg(feature = "reqwest")]
use crate::{config::ClientConfig, error::ConfigError, request::Method};

/// HTTP status signalling that the credential was rejected.
pub const UNAUTHORIZED: u16 = 401;

/// Boxed future returned by [`Transport::exchange`].
pub type TransportFuture<'a> =
	Pin<Box<dyn Future<Output = Result<Exchange, TransportError>> + 'a + Send>>;

/// Performs one network round trip for a built request.
///
/// Implementations must be `Send + Sync + 'static` so executors can share them behind an
/// [`Arc`] across tasks. Cancellation and timeouts surface as [`TransportError`].
pub trait Transport
where
	Self: 'static + Send + Sync,
{
	/// Sends `request` and collects the response.
	fn exchange(&self, request: BuiltRequest) -> TransportFuture<'_>;
}

/// Raw outcome of one exchange.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Exchange {
	/// HTTP status code.
	pub status: u16,
	/// Response headers keyed by (lowercase) name.
	///
	/// Every value of a repeated header (for example `set-cookie`) is kept, in arrival order.
	pub headers: BTreeMap<String, Vec<String>>,
	/// Response body bytes.
	pub body: Vec<u8>,
}
impl Exchange {
	/// Creates an exchange with no headers.
	pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
		Self { status, headers: BTreeMap::new(), body: body.into() }
	}

	/// Appends a response header value.
	pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
		self.headers.entry(name.into()).or_default().push(value.into());

		self
	}

	/// Returns the first value of a header, matching the name case-insensitively.
	pub fn header(&self, name: &str) -> Option<&str> {
		self.header_values(name).first().map(String::as_str)
	}

	/// Returns every value of a header, matching the name case-insensitively.
	pub fn header_values(&self, name: &str) -> &[String] {
		self.headers
			.iter()
			.find(|(key, _)| key.eq_ignore_ascii_case(name))
			.map(|(_, values)| values.as_slice())
			.unwrap_or_default()
	}

	/// Returns `true` for 2xx statuses.
	pub fn is_success(&self) -> bool {
		(200..300).contains(&self.status)
	}

	/// Returns `true` when the server rejected the credential.
	pub fn is_unauthorized(&self) -> bool {
		self.status == UNAUTHORIZED
	}

	/// Decodes the body as JSON.
	pub fn json<T>(&self) -> Result<T, DecodeError>
	where
		T: DeserializeOwned,
	{
		decode::json(&self.body)
	}
}

/// Thin wrapper around [`ReqwestClient`] so shared HTTP behavior lives in one place.
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug, Default)]
pub struct ReqwestTransport(pub ReqwestClient);
#[cfg(feature = "reqwest")]
impl ReqwestTransport {
	/// Wraps an existing reqwest [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}

	/// Builds a client carrying the configured `User-Agent` and exchange timeout.
	pub fn from_config(config: &ClientConfig) -> Result<Self, ConfigError> {
		let mut builder = ReqwestClient::builder().user_agent(config.user_agent.as_str());

		if let Some(timeout) = config.request_timeout() {
			builder = builder.timeout(timeout);
		}

		Ok(Self(builder.build()?))
	}
}
#[cfg(feature = "reqwest")]
impl AsRef<ReqwestClient> for ReqwestTransport {
	fn as_ref(&self) -> &ReqwestClient {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl Deref for ReqwestTransport {
	type Target = ReqwestClient;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl Transport for ReqwestTransport {
	fn exchange(&self, request: BuiltRequest) -> TransportFuture<'_> {
		Box::pin(async move {
			let BuiltRequest { method, url, headers, body } = request;
			let mut builder = self.0.request(reqwest_method(method), url);

			for (name, value) in &headers {
				builder = builder.header(name.as_str(), value.as_str());
			}
			if let Some(body) = body {
				builder = builder.body(body);
			}

			let response = builder.send().await?;
			let status = response.status().as_u16();
			let headers = collect_headers(response.headers());
			let body = response.bytes().await?.to_vec();

			Ok(Exchange { status, headers, body })
		})
	}
}

// Non-UTF-8 values are skipped.
#[cfg(feature = "reqwest")]
fn collect_headers(map: &reqwest::header::HeaderMap) -> BTreeMap<String, Vec<String>> {
	let mut headers = BTreeMap::<String, Vec<String>>::new();

	for (name, value) in map {
		if let Ok(value) = value.to_str() {
			headers.entry(name.as_str().to_owned()).or_default().push(value.to_owned());
		}
	}

	headers
}

#[cfg(feature = "reqwest")]
fn reqwest_method(method: Method) -> reqwest::Method {
	match method {
		Method::Get => reqwest::Method::GET,
		Method::Post => reqwest::Method::POST,
		Method::Put => reqwest::Method::PUT,
		Method::Patch => reqwest::Method::PATCH,
		Method::Delete => reqwest::Method::DELETE,
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[derive(Debug, Deserialize)]
	struct Profile {
		name: String,
	}

	#[test]
	fn status_helpers_classify_responses() {
		assert!(Exchange::new(204, Vec::new()).is_success());
		assert!(!Exchange::new(302, Vec::new()).is_success());
		assert!(Exchange::new(UNAUTHORIZED, Vec::new()).is_unauthorized());
		assert!(!Exchange::new(403, Vec::new()).is_unauthorized());
	}

	#[test]
	fn headers_match_case_insensitively() {
		let exchange = Exchange::new(200, Vec::new()).with_header("content-type", "text/plain");

		assert_eq!(exchange.header("Content-Type"), Some("text/plain"));
		assert_eq!(exchange.header("etag"), None);
		assert!(exchange.header_values("etag").is_empty());
	}

	#[test]
	fn repeated_headers_keep_every_value() {
		let exchange = Exchange::new(200, Vec::new())
			.with_header("set-cookie", "session=abc")
			.with_header("set-cookie", "theme=dark");

		assert_eq!(exchange.header("Set-Cookie"), Some("session=abc"));
		assert_eq!(exchange.header_values("set-cookie"), ["session=abc", "theme=dark"]);
	}

	#[cfg(feature = "reqwest")]
	#[test]
	fn reqwest_headers_collect_repeated_values() {
		// crates.io
		use reqwest::header::{HeaderMap, HeaderValue, SET_COOKIE};

		let mut map = HeaderMap::new();

		map.append(SET_COOKIE, HeaderValue::from_static("a=1"));
		map.append(SET_COOKIE, HeaderValue::from_static("b=2"));
		map.append("x-raw", HeaderValue::from_bytes(b"\xff").expect("Opaque bytes are valid."));

		let headers = collect_headers(&map);

		assert_eq!(headers["set-cookie"], ["a=1", "b=2"]);
		assert!(!headers.contains_key("x-raw"));
	}

	#[cfg(feature = "reqwest")]
	#[test]
	fn invalid_user_agent_fails_client_build() {
		let config = ClientConfig { user_agent: "App\n1.0".into(), ..Default::default() };
		let err = ReqwestTransport::from_config(&config)
			.expect_err("Header-invalid user agents should fail the client build.");

		assert!(matches!(err, ConfigError::HttpClientBuild { .. }));
		assert!(
			ReqwestTransport::from_config(&ClientConfig::default()).is_ok(),
			"Default configuration should build a client."
		);
	}

	#[test]
	fn json_bodies_decode() {
		let exchange = Exchange::new(200, br#"{"name":"Ada"}"#.to_vec());
		let profile: Profile = exchange.json().expect("Profile body should decode.");

		assert_eq!(profile.name, "Ada");
	}
}
