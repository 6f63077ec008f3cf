//! Fakes shared by the integration tests.

#![allow(dead_code)]

// std
use std::{
	sync::{
		Arc,
		atomic::{AtomicUsize, Ordering},
	},
	time::Duration,
};
// crates.io
use parking_lot::Mutex;
// self
use bearer_relay::{
	auth::{Credential, CredentialIssuer, IssueFuture},
	error::IssuanceError,
	http::{Exchange, Transport, TransportFuture, UNAUTHORIZED},
	request::{AUTHORIZATION, BuiltRequest},
};

/// Issuer that mints `token-1`, `token-2`, ... after a short delay and counts its calls.
pub struct CountingIssuer {
	calls: AtomicUsize,
	delay: Duration,
	failures: Mutex<Vec<String>>,
}
impl CountingIssuer {
	pub fn new() -> Arc<Self> {
		Self::with_delay(Duration::from_millis(25))
	}

	pub fn with_delay(delay: Duration) -> Arc<Self> {
		Arc::new(Self { calls: AtomicUsize::new(0), delay, failures: Mutex::new(Vec::new()) })
	}

	/// Queues a rejection for the next call.
	pub fn fail_next(&self, reason: impl Into<String>) {
		self.failures.lock().push(reason.into());
	}

	pub fn calls(&self) -> usize {
		self.calls.load(Ordering::SeqCst)
	}
}
impl CredentialIssuer for CountingIssuer {
	fn issue(&self) -> IssueFuture<'_> {
		Box::pin(async move {
			let attempt = self.calls.fetch_add(1, Ordering::SeqCst) + 1;

			tokio::time::sleep(self.delay).await;

			if let Some(reason) = self.failures.lock().pop() {
				return Err(IssuanceError::Rejected { reason });
			}

			Ok(Credential::new(format!("token-{attempt}")))
		})
	}
}

/// Transport that answers 200 only for requests carrying the currently accepted bearer token.
#[derive(Default)]
pub struct GatedTransport {
	accepted: Mutex<Option<String>>,
	seen: Mutex<Vec<BuiltRequest>>,
}
impl GatedTransport {
	pub fn accepting(token: &str) -> Arc<Self> {
		let transport = Self::default();

		transport.accept(token);

		Arc::new(transport)
	}

	/// Rotates the token the server accepts.
	pub fn accept(&self, token: &str) {
		*self.accepted.lock() = Some(format!("Bearer {token}"));
	}

	pub fn exchanges(&self) -> usize {
		self.seen.lock().len()
	}

	pub fn seen(&self) -> Vec<BuiltRequest> {
		self.seen.lock().clone()
	}
}
impl Transport for GatedTransport {
	fn exchange(&self, request: BuiltRequest) -> TransportFuture<'_> {
		let presented = request.header(AUTHORIZATION).map(str::to_owned);
		let accepted = self.accepted.lock().clone();
		let status = match presented {
			Some(header) if Some(&header) != accepted.as_ref() => UNAUTHORIZED,
			_ => 200,
		};
		let path = request.url.path().to_owned();

		self.seen.lock().push(request);

		Box::pin(async move {
			tokio::task::yield_now().await;

			Ok(Exchange::new(status, path.into_bytes()))
		})
	}
}

/// Reqwest client builder that trusts the mock server's self-signed certificate.
#[cfg(feature = "reqwest")]
pub fn test_reqwest_client_builder() -> bearer_relay::reqwest::ClientBuilder {
	bearer_relay::reqwest::Client::builder()
		.danger_accept_invalid_certs(true)
		.danger_accept_invalid_hostnames(true)
}

/// Reqwest transport for talking to the mock server.
#[cfg(feature = "reqwest")]
pub fn test_reqwest_transport() -> bearer_relay::http::ReqwestTransport {
	let client =
		test_reqwest_client_builder().build().expect("Failed to build reqwest client for tests.");

	bearer_relay::http::ReqwestTransport::with_client(client)
}
