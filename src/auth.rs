//! Credentials, the issuer contract, and the single-flight refresh coordinator.

pub mod coordinator;
pub mod credential;
pub mod issuer;

pub use coordinator::*;
pub use credential::*;
pub use issuer::*;
