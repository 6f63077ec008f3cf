//! Transport-level request produced from a [`RequestDescriptor`](crate::request::RequestDescriptor).

// self
use crate::{
	_prelude::*,
	auth::Credential,
	request::{AUTHORIZATION, Method},
};

/// Fully resolved request handed to a [`Transport`](crate::http::Transport).
#[derive(Clone, PartialEq, Eq)]
pub struct BuiltRequest {
	/// HTTP method.
	pub method: Method,
	/// Absolute target URL.
	pub url: Url,
	/// Request headers, ordered by name.
	pub headers: BTreeMap<String, String>,
	/// Raw body bytes.
	pub body: Option<Vec<u8>>,
}
impl BuiltRequest {
	/// Returns a header value, matching the name case-insensitively.
	pub fn header(&self, name: &str) -> Option<&str> {
		self.headers
			.iter()
			.find(|(key, _)| key.eq_ignore_ascii_case(name))
			.map(|(_, value)| value.as_str())
	}

	/// Sets `Authorization: Bearer <credential>`, replacing any previous value.
	pub fn authorize(&mut self, credential: &Credential) {
		self.headers.insert(AUTHORIZATION.to_owned(), credential.bearer());
	}

	/// Returns `true` when an `Authorization` header is present.
	pub fn is_authorized(&self) -> bool {
		self.header(AUTHORIZATION).is_some()
	}
}
impl Debug for BuiltRequest {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		let headers = self
			.headers
			.iter()
			.map(|(name, value)| {
				let shown =
					if name.eq_ignore_ascii_case(AUTHORIZATION) { "<redacted>" } else { value };

				(name.as_str(), shown)
			})
			.collect::<BTreeMap<_, _>>();

		f.debug_struct("BuiltRequest")
			.field("method", &self.method)
			.field("url", &self.url.as_str())
			.field("headers", &headers)
			.field("body_len", &self.body.as_ref().map(Vec::len))
			.finish()
	}
}
