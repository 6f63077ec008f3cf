//! Request descriptors (what to call) and built requests (what goes over the wire).
//!
//! A [`RequestDescriptor`] is an immutable description of an intended call: environment, path,
//! method, content classification, body, query, and whether a credential is required. Turning it
//! into a [`BuiltRequest`] is a pure function of the descriptor, the [`ClientConfig`], and an
//! optional [`Credential`](crate::auth::Credential); the descriptor is never mutated, so the same
//! descriptor can be replayed after a refresh.
//!
//! [`ClientConfig`]: crate::config::ClientConfig

pub mod built;
pub mod descriptor;
pub mod environment;

pub use built::*;
pub use descriptor::*;
pub use environment::*;

// self
use crate::_prelude::*;

/// Scheme used for every request.
pub const SCHEME: &str = "https";

/// `Authorization` header name.
pub const AUTHORIZATION: &str = "Authorization";
/// `Content-Type` header name.
pub const CONTENT_TYPE: &str = "Content-Type";
/// `User-Agent` header name.
pub const USER_AGENT: &str = "User-Agent";

/// Resolves `host` (optionally with a port) into an origin URL, rejecting anything that carries a
/// path, query, fragment, or userinfo.
pub(crate) fn base_url(host: &str) -> Option<Url> {
	let url = Url::parse(&format!("{SCHEME}://{host}")).ok()?;
	let origin_only = url.path() == "/"
		&& url.query().is_none()
		&& url.fragment().is_none()
		&& url.username().is_empty()
		&& url.password().is_none();

	origin_only.then_some(url)
}
