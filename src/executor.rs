//! Authenticated request execution with a single 401-triggered retry.
//!
//! One call to [`RequestExecutor::perform`] walks
//! `Building → (Authorizing) → Exchanging → {Done | Retrying → Exchanging → Done | Failed}`.
//! `Retrying` is reachable at most once per call: a 401 forces a coordinator refresh and replays
//! the descriptor with no retry budget left, so a second 401 fails with
//! [`AuthError::InvalidToken`]. The budget is local to the call; concurrent calls that all hit
//! 401 share one refresh through the coordinator but each replay once.

// crates.io
use serde::de::DeserializeOwned;
// self
use crate::{
	_prelude::*,
	auth::TokenCoordinator,
	config::ClientConfig,
	error::AuthError,
	http::{Exchange, Transport},
	obs::{self, OpSpan, OperationKind, OperationOutcome},
	request::RequestDescriptor,
};
#[cfg(feature = "reqwest")] use crate::{error::ConfigError, http::ReqwestTransport};

#[cfg(feature = "reqwest")]
/// Executor specialized for the crate's default reqwest transport.
pub type ReqwestExecutor = RequestExecutor<ReqwestTransport>;

const KIND: OperationKind = OperationKind::Perform;

/// Turns request descriptors into completed exchanges.
///
/// The executor holds no credential of its own: every attempt asks the shared
/// [`TokenCoordinator`], so a refresh triggered by one call is visible to all later calls.
pub struct RequestExecutor<T>
where
	T: ?Sized + Transport,
{
	/// Transport used for every exchange.
	pub transport: Arc<T>,
	/// Coordinator that owns the credential.
	pub coordinator: Arc<TokenCoordinator>,
	/// Hosts and default headers.
	pub config: Arc<ClientConfig>,
}
impl<T> RequestExecutor<T>
where
	T: ?Sized + Transport,
{
	/// Creates an executor over the caller-provided transport with the default configuration.
	pub fn with_transport(
		transport: impl Into<Arc<T>>,
		coordinator: Arc<TokenCoordinator>,
	) -> Self {
		Self {
			transport: transport.into(),
			coordinator,
			config: Arc::new(ClientConfig::default()),
		}
	}

	/// Replaces the configuration.
	pub fn with_config(mut self, config: impl Into<Arc<ClientConfig>>) -> Self {
		self.config = config.into();

		self
	}

	/// Performs `descriptor`, retrying once after a forced refresh if the server answers 401.
	pub async fn perform(&self, descriptor: &RequestDescriptor) -> Result<Exchange> {
		self.perform_with_retry(descriptor, true).await
	}

	/// Performs `descriptor`; with `allow_retry == false` a 401 fails immediately with
	/// [`AuthError::InvalidToken`].
	pub async fn perform_with_retry(
		&self,
		descriptor: &RequestDescriptor,
		allow_retry: bool,
	) -> Result<Exchange> {
		let span = OpSpan::new(KIND, "perform");
		let recorder = span.clone();
		let environment = descriptor.environment.label();

		span.record_environment(environment);
		obs::record_outcome(KIND, OperationOutcome::Attempt);

		let result: Result<Exchange> = span
			.instrument(async move {
				let mut allow_retry = allow_retry;

				loop {
					let exchange = self.attempt(descriptor).await?;

					recorder.record_status(exchange.status);
					obs::record_exchange(environment, exchange.status);

					if !exchange.is_unauthorized() {
						return Ok(exchange);
					}
					if !allow_retry {
						return Err(AuthError::InvalidToken.into());
					}

					obs::record_outcome(KIND, OperationOutcome::Retried);
					obs::debug_event(KIND, "request rejected with 401; forcing a refresh");

					self.coordinator.force_refresh().await?;

					allow_retry = false;
				}
			})
			.await;

		match &result {
			Ok(_) => obs::record_outcome(KIND, OperationOutcome::Success),
			Err(_) => obs::record_outcome(KIND, OperationOutcome::Failure),
		}

		result
	}

	/// Performs `descriptor` and decodes a 2xx body as JSON.
	///
	/// Non-2xx statuses surface as [`Error::Status`].
	pub async fn perform_json<D>(&self, descriptor: &RequestDescriptor) -> Result<D>
	where
		D: DeserializeOwned,
	{
		let exchange = self.perform(descriptor).await?;

		if !exchange.is_success() {
			return Err(Error::Status { status: exchange.status, body: exchange.body });
		}

		Ok(exchange.json()?)
	}

	async fn attempt(&self, descriptor: &RequestDescriptor) -> Result<Exchange> {
		// Build first so an invalid target fails before any refresh or network activity.
		let mut request = descriptor.build_request(&self.config, None)?;

		if descriptor.requires_auth {
			let credential = self.coordinator.current_or_refreshed().await?;

			request.authorize(&credential);
		}

		Ok(self.transport.exchange(request).await?)
	}
}
#[cfg(feature = "reqwest")]
impl RequestExecutor<ReqwestTransport> {
	/// Creates an executor backed by a default reqwest client.
	pub fn new(coordinator: Arc<TokenCoordinator>) -> Self {
		Self::with_transport(ReqwestTransport::default(), coordinator)
	}

	/// Creates an executor whose reqwest client honors `config` (user agent, exchange timeout).
	pub fn from_config(
		coordinator: Arc<TokenCoordinator>,
		config: ClientConfig,
	) -> Result<Self, ConfigError> {
		let transport = ReqwestTransport::from_config(&config)?;

		Ok(Self::with_transport(transport, coordinator).with_config(config))
	}
}
impl<T> Clone for RequestExecutor<T>
where
	T: ?Sized + Transport,
{
	fn clone(&self) -> Self {
		Self {
			transport: self.transport.clone(),
			coordinator: self.coordinator.clone(),
			config: self.config.clone(),
		}
	}
}
impl<T> Debug for RequestExecutor<T>
where
	T: ?Sized + Transport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("RequestExecutor")
			.field("coordinator", &self.coordinator)
			.field("config", &self.config)
			.finish()
	}
}
