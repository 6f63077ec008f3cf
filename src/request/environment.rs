//! Named deployment environments that requests resolve against.

// self
use crate::{_prelude::*, config::EnvironmentHosts};

/// Deployment environment a request targets.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Environment {
	/// Production host from configuration.
	Prod,
	/// Development host from configuration.
	#[default]
	Dev,
	/// Arbitrary host (optionally with a port), e.g. a preview deployment.
	Custom(String),
}
impl Environment {
	/// Returns the host this environment resolves to.
	pub fn host<'a>(&'a self, hosts: &'a EnvironmentHosts) -> &'a str {
		match self {
			Self::Prod => &hosts.prod,
			Self::Dev => &hosts.dev,
			Self::Custom(host) => host,
		}
	}

	/// Returns a stable label suitable for logs.
	pub const fn label(&self) -> &'static str {
		match self {
			Self::Prod => "prod",
			Self::Dev => "dev",
			Self::Custom(_) => "custom",
		}
	}
}
