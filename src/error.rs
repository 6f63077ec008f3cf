//! Relay-level error types shared across the coordinator, executor, and transports.

// std
use std::any::Any;
// self
use crate::_prelude::*;

/// Relay-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

pub(crate) type BoxError = Box<dyn StdError + Send + Sync>;

/// Canonical relay error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Request descriptor could not be turned into a transport request.
	#[error(transparent)]
	Network(#[from] NetworkError),
	/// Credential issuance failed while refreshing.
	#[error(transparent)]
	Refresh(#[from] RefreshError),
	/// Transport failure (DNS, TCP, TLS, timeout).
	#[error(transparent)]
	Transport(#[from] TransportError),
	/// Server kept rejecting the credential after the single retry.
	#[error(transparent)]
	Auth(#[from] AuthError),
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Response body could not be decoded.
	#[error(transparent)]
	Decode(#[from] DecodeError),

	/// Server answered with a non-success status where a decoded body was expected.
	#[error("Server responded with HTTP {status}.")]
	Status {
		/// HTTP status code.
		status: u16,
		/// Raw response body.
		body: Vec<u8>,
	},
}
impl Error {
	/// Returns the stage of a request that produced this error.
	pub fn stage(&self) -> FailureStage {
		match self {
			Self::Network(_) => FailureStage::Build,
			Self::Refresh(_) => FailureStage::Refresh,
			Self::Transport(_) | Self::Status { .. } => FailureStage::Exchange,
			Self::Auth(_) => FailureStage::Auth,
			Self::Config(_) => FailureStage::Config,
			Self::Decode(_) => FailureStage::Decode,
		}
	}
}

/// Request stage at which an [`Error`] was raised.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FailureStage {
	/// Descriptor could not be resolved into a request.
	Build,
	/// Credential issuance failed.
	Refresh,
	/// The exchange itself failed or returned an unusable status.
	Exchange,
	/// Credentials are unusable; the retry budget is spent.
	Auth,
	/// Response decoding failed.
	Decode,
	/// Configuration was rejected.
	Config,
}

/// Failures raised while resolving a request descriptor.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum NetworkError {
	/// The descriptor's target could not be resolved to a valid URL.
	#[error("Request target `{target}` is not a valid URL.")]
	InvalidUrl {
		/// Target that failed to resolve.
		target: String,
	},
}

/// Authentication failures that survive the retry path.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ThisError)]
pub enum AuthError {
	/// The refreshed credential was rejected as well.
	#[error("Credential was rejected after a forced refresh.")]
	InvalidToken,
}

/// Failure of a single refresh operation, shared by every caller that joined it.
#[derive(Clone, Debug, ThisError)]
#[error("Credential refresh failed.")]
pub struct RefreshError {
	#[source]
	source: Arc<IssuanceError>,
}
impl RefreshError {
	/// Wraps an issuer failure.
	pub fn new(source: IssuanceError) -> Self {
		Self { source: Arc::new(source) }
	}

	/// Returns the underlying issuer failure.
	pub fn cause(&self) -> &IssuanceError {
		&self.source
	}

	/// Returns `true` when both errors come from the same refresh operation.
	pub fn same_operation(&self, other: &Self) -> bool {
		Arc::ptr_eq(&self.source, &other.source)
	}
}

/// Errors reported by [`CredentialIssuer`](crate::auth::CredentialIssuer) implementations.
#[derive(Debug, ThisError)]
pub enum IssuanceError {
	/// The issuing authority refused to mint a credential.
	#[error("Credential issuer rejected the request: {reason}.")]
	Rejected {
		/// Issuer-supplied reason string.
		reason: String,
	},
	/// The issuer could not reach its authority.
	#[error(transparent)]
	Transport(#[from] TransportError),
	/// Any other issuer-specific failure.
	#[error("Credential issuer failed.")]
	Other {
		/// Issuer-specific failure.
		#[source]
		source: BoxError,
	},
	/// The issuer panicked while minting a credential.
	#[error("Credential issuer panicked: {message}.")]
	Panicked {
		/// Panic message, when the payload was a string.
		message: String,
	},
}
impl IssuanceError {
	/// Wraps an issuer-specific failure.
	pub fn other(src: impl 'static + Send + Sync + StdError) -> Self {
		Self::Other { source: Box::new(src) }
	}

	pub(crate) fn panicked(payload: Box<dyn Any + Send>) -> Self {
		let message = payload
			.downcast_ref::<&str>()
			.map(|message| (*message).to_owned())
			.or_else(|| payload.downcast_ref::<String>().cloned())
			.unwrap_or_else(|| "non-string panic payload".into());

		Self::Panicked { message }
	}
}

/// Configuration and validation failures.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// A configured environment host is not a valid host.
	#[error("The {environment} host `{host}` is invalid.")]
	InvalidHost {
		/// Environment label.
		environment: &'static str,
		/// Offending host string.
		host: String,
	},
	/// The configured user agent is empty or contains non-visible characters.
	#[error("User agent must be non-empty visible ASCII.")]
	InvalidUserAgent,
	/// The configured request timeout is zero.
	#[error("Request timeout must be greater than zero.")]
	InvalidTimeout,
	/// Configuration document could not be parsed.
	#[error("Configuration document is malformed.")]
	Parse {
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
	},
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + StdError) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Transport-level failures.
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred during the exchange.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// The exchange did not complete in time or was cancelled.
	#[error("The exchange timed out.")]
	Timeout {
		/// Transport-specific timeout error.
		#[source]
		source: BoxError,
	},
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + StdError) -> Self {
		Self::Network { source: Box::new(src) }
	}

	/// Wraps a transport-specific timeout.
	pub fn timeout(src: impl 'static + Send + Sync + StdError) -> Self {
		Self::Timeout { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		if e.is_timeout() { Self::timeout(e) } else { Self::network(e) }
	}
}

/// Response decoding failures.
#[derive(Debug, ThisError)]
pub enum DecodeError {
	/// Body is not valid JSON for the requested type.
	#[error("Response body is not valid JSON at `{}`.", .source.path())]
	Json {
		/// Structured parsing failure including the failing path.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
	},
	/// A timestamp did not match the expected format.
	#[error("Timestamp `{value}` does not match the expected format.")]
	Timestamp {
		/// Raw timestamp string.
		value: String,
		/// Underlying parse failure.
		#[source]
		source: time::error::Parse,
	},
}

#[cfg(test)]
mod tests {
	// std
	use std::error::Error as _;
	// self
	use super::*;

	#[test]
	fn refresh_error_exposes_issuer_cause() {
		let err = RefreshError::new(IssuanceError::Rejected { reason: "expired grant".into() });
		let relay: Error = err.clone().into();

		assert_eq!(relay.stage(), FailureStage::Refresh);
		assert!(err.same_operation(&err.clone()));
		assert!(matches!(err.cause(), IssuanceError::Rejected { .. }));

		let source = err.source().expect("Refresh error should expose the issuer failure.");

		assert!(source.to_string().contains("expired grant"));
	}

	#[test]
	fn panic_payloads_become_messages() {
		let from_str = IssuanceError::panicked(Box::new("boom"));
		let from_string = IssuanceError::panicked(Box::new(String::from("bang")));
		let opaque = IssuanceError::panicked(Box::new(7_u8));

		assert!(matches!(from_str, IssuanceError::Panicked { message } if message == "boom"));
		assert!(matches!(from_string, IssuanceError::Panicked { message } if message == "bang"));
		assert!(matches!(
			opaque,
			IssuanceError::Panicked { message } if message.contains("non-string")
		));
	}

	#[test]
	fn distinct_refresh_errors_are_not_the_same_operation() {
		let a = RefreshError::new(IssuanceError::Rejected { reason: "a".into() });
		let b = RefreshError::new(IssuanceError::Rejected { reason: "a".into() });

		assert!(!a.same_operation(&b));
	}

	#[test]
	fn stages_separate_build_and_auth_failures() {
		let build: Error = NetworkError::InvalidUrl { target: "https://".into() }.into();
		let auth: Error = AuthError::InvalidToken.into();

		assert_eq!(build.stage(), FailureStage::Build);
		assert_eq!(auth.stage(), FailureStage::Auth);
		assert_eq!(Error::Status { status: 500, body: Vec::new() }.stage(), FailureStage::Exchange);
	}
}
