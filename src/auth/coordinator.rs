//! Single-flight credential refresh.
//!
//! [`TokenCoordinator`] owns the current [`Credential`] and an in-flight cell. The cell is either
//! empty or holds a shared future for the one refresh operation currently running; every caller
//! that needs a new credential while it runs awaits a clone of that future, so the issuer is
//! contacted once and the outcome (credential or error) is broadcast. The operation clears the
//! cell and stores the new credential before any waiter observes the result, so a waiter that
//! immediately calls [`TokenCoordinator::current_or_refreshed`] sees the fresh credential without
//! refreshing again.
//!
//! State decisions happen under a short synchronous lock; the issuance itself runs unlocked.

mod metrics;

pub use metrics::RefreshMetrics;

// std
use std::{panic::AssertUnwindSafe, sync::Weak};
// crates.io
use futures::future::{BoxFuture, FutureExt, Shared};
// self
use crate::{
	_prelude::*,
	auth::{Credential, CredentialIssuer},
	error::{IssuanceError, RefreshError},
	obs::{self, OpSpan, OperationKind, OperationOutcome},
};

type RefreshFuture = Shared<BoxFuture<'static, Result<Credential, RefreshError>>>;

const KIND: OperationKind = OperationKind::Refresh;

#[derive(Default)]
struct CoordinatorState {
	current: Option<Credential>,
	in_flight: Option<RefreshFuture>,
}

/// Owns the current credential and serializes its refresh.
///
/// Construct one per credential scope and share it behind an [`Arc`] with every
/// [`RequestExecutor`](crate::executor::RequestExecutor) that should use it.
pub struct TokenCoordinator {
	issuer: Arc<dyn CredentialIssuer>,
	state: Arc<Mutex<CoordinatorState>>,
	metrics: Arc<RefreshMetrics>,
}
impl TokenCoordinator {
	/// Creates a coordinator with no credential held.
	pub fn new(issuer: Arc<dyn CredentialIssuer>) -> Self {
		Self { issuer, state: Default::default(), metrics: Default::default() }
	}

	/// Seeds the coordinator with a previously issued credential.
	pub fn with_credential(self, credential: impl Into<Credential>) -> Self {
		self.state.lock().current = Some(credential.into());

		self
	}

	/// Returns the held credential, refreshing only when none is held.
	///
	/// Joins the in-flight refresh when one exists, even if a credential is held, because that
	/// credential is about to be superseded.
	pub async fn current_or_refreshed(&self) -> Result<Credential, RefreshError> {
		let pending = {
			let mut state = self.state.lock();

			if let Some(pending) = state.in_flight.as_ref() {
				self.record_join();

				pending.clone()
			} else if let Some(current) = state.current.as_ref() {
				self.metrics.record_cache_hit();

				return Ok(current.clone());
			} else {
				self.start_refresh(&mut state)
			}
		};

		pending.await
	}

	/// Replaces the held credential with a newly issued one.
	///
	/// Joins the in-flight refresh when one exists; otherwise always contacts the issuer, whether
	/// or not a credential is held.
	pub async fn force_refresh(&self) -> Result<Credential, RefreshError> {
		let pending = {
			let mut state = self.state.lock();

			match state.in_flight.as_ref() {
				Some(pending) => {
					self.record_join();

					pending.clone()
				},
				None => self.start_refresh(&mut state),
			}
		};

		pending.await
	}

	/// Replaces (or clears, with `None`) the held credential.
	///
	/// An in-flight refresh is unaffected and will overwrite this value when it succeeds.
	pub fn save(&self, credential: Option<Credential>) {
		self.state.lock().current = credential;
	}

	/// Returns the held credential without refreshing.
	pub fn current(&self) -> Option<Credential> {
		self.state.lock().current.clone()
	}

	/// Returns `true` while a refresh operation is in flight.
	pub fn is_refreshing(&self) -> bool {
		self.state.lock().in_flight.is_some()
	}

	/// Returns the coordinator's activity counters.
	pub fn metrics(&self) -> &RefreshMetrics {
		&self.metrics
	}

	fn record_join(&self) {
		self.metrics.record_join();
		obs::record_outcome(KIND, OperationOutcome::Joined);
	}

	// Caller holds the state lock and has checked that nothing is in flight.
	fn start_refresh(&self, state: &mut CoordinatorState) -> RefreshFuture {
		let pending = refresh_operation(
			self.issuer.clone(),
			Arc::downgrade(&self.state),
			self.metrics.clone(),
		);

		state.in_flight = Some(pending.clone());

		pending
	}
}
impl Debug for TokenCoordinator {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		let state = self.state.lock();

		f.debug_struct("TokenCoordinator")
			.field("credential_held", &state.current.is_some())
			.field("refreshing", &state.in_flight.is_some())
			.finish()
	}
}

fn refresh_operation(
	issuer: Arc<dyn CredentialIssuer>,
	state: Weak<Mutex<CoordinatorState>>,
	metrics: Arc<RefreshMetrics>,
) -> RefreshFuture {
	let span = OpSpan::new(KIND, "issue");

	metrics.record_issue();
	obs::record_outcome(KIND, OperationOutcome::Attempt);
	obs::debug_event(KIND, "starting credential issuance");

	span.instrument(async move {
		// Issuer panics resolve as errors so the cell is always cleared.
		let outcome = AssertUnwindSafe(async { issuer.issue().await })
			.catch_unwind()
			.await
			.unwrap_or_else(|payload| Err(IssuanceError::panicked(payload)))
			.map_err(RefreshError::new);

		// The coordinator may be gone; waiters still get the outcome.
		if let Some(cell) = state.upgrade() {
			let mut guard = cell.lock();

			guard.in_flight = None;

			if let Ok(credential) = &outcome {
				guard.current = Some(credential.clone());
			}
		}

		match &outcome {
			Ok(_) => {
				metrics.record_success();
				obs::record_outcome(KIND, OperationOutcome::Success);
			},
			Err(_) => {
				metrics.record_failure();
				obs::record_outcome(KIND, OperationOutcome::Failure);
			},
		}

		outcome
	})
	.boxed()
	.shared()
}

#[cfg(test)]
mod tests {
	// std
	use std::{
		sync::atomic::{AtomicUsize, Ordering},
		time::Duration,
	};
	// crates.io
	use futures::future;
	// self
	use super::*;
	use crate::auth::IssueFuture;

	struct CountingIssuer {
		calls: AtomicUsize,
		delay: Duration,
		fail: bool,
	}
	impl CountingIssuer {
		fn new(fail: bool) -> Arc<Self> {
			Arc::new(Self { calls: AtomicUsize::new(0), delay: Duration::from_millis(20), fail })
		}

		fn succeeding() -> Arc<Self> {
			Self::new(false)
		}

		fn failing() -> Arc<Self> {
			Self::new(true)
		}

		fn calls(&self) -> usize {
			self.calls.load(Ordering::SeqCst)
		}
	}
	impl CredentialIssuer for CountingIssuer {
		fn issue(&self) -> IssueFuture<'_> {
			Box::pin(async move {
				let attempt = self.calls.fetch_add(1, Ordering::SeqCst) + 1;

				tokio::time::sleep(self.delay).await;

				if self.fail {
					Err(IssuanceError::Rejected { reason: format!("attempt {attempt}") })
				} else {
					Ok(Credential::new(format!("token-{attempt}")))
				}
			})
		}
	}

	#[tokio::test]
	async fn concurrent_callers_share_one_issuance() {
		let issuer = CountingIssuer::succeeding();
		let coordinator = TokenCoordinator::new(issuer.clone());
		let results = future::join_all((0..8).map(|_| coordinator.current_or_refreshed())).await;
		let first = results[0].as_ref().expect("Refresh should succeed.").clone();

		assert_eq!(issuer.calls(), 1);
		assert_eq!(first.expose(), "token-1");

		for result in &results {
			let credential = result.as_ref().expect("Every joiner should receive the credential.");

			assert!(credential.same_instance(&first));
		}

		assert_eq!(coordinator.metrics().issued(), 1);
		assert_eq!(coordinator.metrics().joined(), 7);
		assert!(!coordinator.is_refreshing());
	}

	#[tokio::test]
	async fn concurrent_forced_refreshes_share_one_issuance() {
		let issuer = CountingIssuer::succeeding();
		let coordinator = TokenCoordinator::new(issuer.clone()).with_credential("stale");
		let results = future::join_all((0..5).map(|_| coordinator.force_refresh())).await;

		assert_eq!(issuer.calls(), 1);

		for result in results {
			assert_eq!(result.expect("Forced refresh should succeed.").expose(), "token-1");
		}
	}

	#[tokio::test]
	async fn held_credential_is_reused_until_forced() {
		let issuer = CountingIssuer::succeeding();
		let coordinator = TokenCoordinator::new(issuer.clone());
		let issued =
			coordinator.current_or_refreshed().await.expect("Initial refresh should succeed.");

		for _ in 0..10 {
			let cached = coordinator
				.current_or_refreshed()
				.await
				.expect("Cached credential should be returned.");

			assert!(cached.same_instance(&issued));
		}

		assert_eq!(issuer.calls(), 1);
		assert_eq!(coordinator.metrics().cache_hits(), 10);

		let forced = coordinator.force_refresh().await.expect("Forced refresh should succeed.");

		assert_eq!(issuer.calls(), 2);
		assert_eq!(forced.expose(), "token-2");
		assert_eq!(coordinator.current(), Some(forced));
	}

	#[tokio::test]
	async fn forced_refresh_ignores_held_credential() {
		let issuer = CountingIssuer::succeeding();
		let coordinator = TokenCoordinator::new(issuer.clone()).with_credential("seeded");
		let cached = coordinator.current_or_refreshed().await.expect("Seed should be returned.");

		assert_eq!(cached.expose(), "seeded");
		assert_eq!(issuer.calls(), 0);

		let forced = coordinator.force_refresh().await.expect("Forced refresh should succeed.");

		assert_eq!(issuer.calls(), 1);
		assert_eq!(forced.expose(), "token-1");
	}

	#[tokio::test]
	async fn failed_refresh_is_broadcast_and_keeps_prior_credential() {
		let issuer = CountingIssuer::failing();
		let coordinator = TokenCoordinator::new(issuer.clone()).with_credential("prior");
		let results = future::join_all((0..3).map(|_| coordinator.force_refresh())).await;
		let errors = results
			.into_iter()
			.map(|result| result.expect_err("Every joiner should observe the failure."))
			.collect::<Vec<_>>();

		assert_eq!(issuer.calls(), 1);
		assert!(errors.iter().all(|err| err.same_operation(&errors[0])));
		assert_eq!(coordinator.current().map(|c| c.expose().to_owned()), Some("prior".into()));
		assert!(!coordinator.is_refreshing());

		coordinator.force_refresh().await.expect_err("The retry should reach the issuer again.");

		assert_eq!(issuer.calls(), 2);
		assert_eq!(coordinator.metrics().failures(), 2);
	}

	#[tokio::test]
	async fn save_replaces_and_clears_without_touching_in_flight_refresh() {
		let issuer = CountingIssuer::succeeding();
		let coordinator = Arc::new(TokenCoordinator::new(issuer.clone()));
		let task = tokio::spawn({
			let coordinator = coordinator.clone();

			async move { coordinator.force_refresh().await }
		});

		while !coordinator.is_refreshing() {
			tokio::task::yield_now().await;
		}

		coordinator.save(Some(Credential::new("manual")));

		assert!(coordinator.is_refreshing());

		let issued = task
			.await
			.expect("Refresh task should not panic.")
			.expect("Refresh should succeed.");

		assert_eq!(issued.expose(), "token-1");
		assert_eq!(coordinator.current(), Some(issued));

		coordinator.save(None);

		assert_eq!(coordinator.current(), None);
	}

	#[tokio::test]
	async fn abandoned_refresh_resumes_for_next_caller() {
		let issuer = CountingIssuer::succeeding();
		let coordinator = TokenCoordinator::new(issuer.clone());

		assert!(coordinator.force_refresh().now_or_never().is_none());
		assert!(coordinator.is_refreshing());

		let credential =
			coordinator.current_or_refreshed().await.expect("Resumed refresh should succeed.");

		assert_eq!(issuer.calls(), 1);
		assert_eq!(credential.expose(), "token-1");
	}

	#[tokio::test]
	async fn panicking_issuer_leaves_coordinator_usable() {
		struct PanicOnceIssuer(AtomicUsize);
		impl CredentialIssuer for PanicOnceIssuer {
			fn issue(&self) -> IssueFuture<'_> {
				let call = self.0.fetch_add(1, Ordering::SeqCst) + 1;

				Box::pin(async move {
					if call == 1 {
						panic!("issuer exploded");
					}

					Ok(Credential::new(format!("token-{call}")))
				})
			}
		}

		let issuer = Arc::new(PanicOnceIssuer(AtomicUsize::new(0)));
		let coordinator = TokenCoordinator::new(issuer.clone()).with_credential("prior");
		let err = coordinator.force_refresh().await.expect_err("Panic should surface as an error.");

		assert!(matches!(
			err.cause(),
			IssuanceError::Panicked { message } if message == "issuer exploded"
		));
		assert!(!coordinator.is_refreshing());
		assert_eq!(coordinator.current(), Some(Credential::new("prior")));

		let credential =
			coordinator.force_refresh().await.expect("Next refresh should reach the issuer.");

		assert_eq!(credential.expose(), "token-2");
		assert_eq!(issuer.0.load(Ordering::SeqCst), 2);
		assert_eq!(coordinator.metrics().failures(), 1);
	}
}
