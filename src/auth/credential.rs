//! Opaque bearer credential that redacts its value in logs.

// self
use crate::_prelude::*;

/// Opaque bearer token attached to outgoing requests.
///
/// Clones share one allocation, so callers that joined the same refresh can confirm they received
/// the same instance via [`Credential::same_instance`].
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(Arc<str>);
impl Credential {
	/// Wraps a token string.
	pub fn new(value: impl AsRef<str>) -> Self {
		Self(Arc::from(value.as_ref()))
	}

	/// Returns the inner token value. Callers must avoid logging this string.
	pub fn expose(&self) -> &str {
		&self.0
	}

	/// Formats the value expected by the `Authorization` header.
	pub fn bearer(&self) -> String {
		format!("Bearer {}", self.expose())
	}

	/// Returns `true` when both values come from the same issuance.
	pub fn same_instance(&self, other: &Self) -> bool {
		Arc::ptr_eq(&self.0, &other.0)
	}
}
impl From<String> for Credential {
	fn from(value: String) -> Self {
		Self(Arc::from(value))
	}
}
impl From<&str> for Credential {
	fn from(value: &str) -> Self {
		Self::new(value)
	}
}
impl AsRef<str> for Credential {
	fn as_ref(&self) -> &str {
		self.expose()
	}
}
impl Debug for Credential {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("Credential").field(&"<redacted>").finish()
	}
}
impl Display for Credential {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("<redacted>")
	}
}
