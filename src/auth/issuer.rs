//! Credential issuance contract consumed by [`TokenCoordinator`](crate::auth::TokenCoordinator).
//!
//! How a credential is minted (refresh-token exchange, device flow, static key) lives outside the
//! relay. The coordinator calls [`CredentialIssuer::issue`] exactly once per refresh operation and
//! broadcasts the outcome to every caller that joined it.

// self
use crate::{_prelude::*, auth::Credential, error::IssuanceError};

/// Boxed future returned by [`CredentialIssuer::issue`].
pub type IssueFuture<'a> =
	Pin<Box<dyn Future<Output = Result<Credential, IssuanceError>> + 'a + Send>>;

/// Source of brand-new credentials.
pub trait CredentialIssuer
where
	Self: 'static + Send + Sync,
{
	/// Obtains a new credential.
	fn issue(&self) -> IssueFuture<'_>;
}

/// Issuer that hands out the same credential on every call.
///
/// Useful for development environments and for services that authenticate with a long-lived key.
#[derive(Clone, Debug)]
pub struct StaticIssuer(Credential);
impl StaticIssuer {
	/// Creates an issuer returning `credential`.
	pub fn new(credential: impl Into<Credential>) -> Self {
		Self(credential.into())
	}
}
impl CredentialIssuer for StaticIssuer {
	fn issue(&self) -> IssueFuture<'_> {
		let credential = self.0.clone();

		Box::pin(async move { Ok(credential) })
	}
}
