//! Client configuration: environment hosts, the `User-Agent` attached to every request, and the
//! per-exchange timeout applied by the reqwest transport.
//!
//! [`ClientConfig`] can be assembled with [`ClientConfig::builder`] or loaded from a JSON document
//! with [`ClientConfig::from_json_slice`]; both paths validate the result.

// std
use std::time::Duration;
// self
use crate::{_prelude::*, error::ConfigError, request};

/// Host used by [`Environment::Prod`](crate::request::Environment::Prod) unless configured.
pub const DEFAULT_PROD_HOST: &str = "prod.api.com";
/// Host used by [`Environment::Dev`](crate::request::Environment::Dev) unless configured.
pub const DEFAULT_DEV_HOST: &str = "dev.api.com";
/// `User-Agent` sent unless configured.
pub const DEFAULT_USER_AGENT: &str = concat!("bearer-relay/", env!("CARGO_PKG_VERSION"));

/// Hosts backing the named environments.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnvironmentHosts {
	/// Production host.
	pub prod: String,
	/// Development host.
	pub dev: String,
}
impl Default for EnvironmentHosts {
	fn default() -> Self {
		Self { prod: DEFAULT_PROD_HOST.into(), dev: DEFAULT_DEV_HOST.into() }
	}
}

/// Immutable configuration shared by request executors.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
	/// Hosts for the named environments.
	pub hosts: EnvironmentHosts,
	/// Value of the `User-Agent` header.
	pub user_agent: String,
	/// Upper bound for one exchange, in milliseconds; `None` leaves the transport default.
	pub request_timeout_ms: Option<u64>,
}
impl ClientConfig {
	/// Creates a new builder seeded with defaults.
	pub fn builder() -> ClientConfigBuilder {
		ClientConfigBuilder::default()
	}

	/// Parses and validates a JSON configuration document.
	///
	/// Missing fields fall back to defaults.
	pub fn from_json_slice(bytes: &[u8]) -> Result<Self, ConfigError> {
		let de = &mut serde_json::Deserializer::from_slice(bytes);
		let config: Self =
			serde_path_to_error::deserialize(de).map_err(|source| ConfigError::Parse { source })?;

		config.validate()?;

		Ok(config)
	}

	/// Validates hosts and the user agent.
	pub fn validate(&self) -> Result<(), ConfigError> {
		validate_host("prod", &self.hosts.prod)?;
		validate_host("dev", &self.hosts.dev)?;
		validate_user_agent(&self.user_agent)?;

		match self.request_timeout_ms {
			Some(0) => Err(ConfigError::InvalidTimeout),
			_ => Ok(()),
		}
	}

	/// Returns the configured exchange timeout.
	pub fn request_timeout(&self) -> Option<Duration> {
		self.request_timeout_ms.map(Duration::from_millis)
	}
}
impl Default for ClientConfig {
	fn default() -> Self {
		Self {
			hosts: EnvironmentHosts::default(),
			user_agent: DEFAULT_USER_AGENT.into(),
			request_timeout_ms: None,
		}
	}
}

/// Builder for [`ClientConfig`] values.
#[derive(Debug, Default)]
pub struct ClientConfigBuilder {
	/// Production host override.
	pub prod_host: Option<String>,
	/// Development host override.
	pub dev_host: Option<String>,
	/// `User-Agent` override.
	pub user_agent: Option<String>,
	/// Exchange timeout.
	pub request_timeout: Option<Duration>,
}
impl ClientConfigBuilder {
	/// Overrides the production host.
	pub fn prod_host(mut self, host: impl Into<String>) -> Self {
		self.prod_host = Some(host.into());

		self
	}

	/// Overrides the development host.
	pub fn dev_host(mut self, host: impl Into<String>) -> Self {
		self.dev_host = Some(host.into());

		self
	}

	/// Overrides the `User-Agent` header value.
	pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
		self.user_agent = Some(user_agent.into());

		self
	}

	/// Bounds each exchange performed by the reqwest transport.
	pub fn request_timeout(mut self, timeout: Duration) -> Self {
		self.request_timeout = Some(timeout);

		self
	}

	/// Consumes the builder and validates the resulting configuration.
	pub fn build(self) -> Result<ClientConfig, ConfigError> {
		let defaults = ClientConfig::default();
		let config = ClientConfig {
			hosts: EnvironmentHosts {
				prod: self.prod_host.unwrap_or(defaults.hosts.prod),
				dev: self.dev_host.unwrap_or(defaults.hosts.dev),
			},
			user_agent: self.user_agent.unwrap_or(defaults.user_agent),
			request_timeout_ms: self
				.request_timeout
				.map(|timeout| u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX)),
		};

		config.validate()?;

		Ok(config)
	}
}

fn validate_host(environment: &'static str, host: &str) -> Result<(), ConfigError> {
	match request::base_url(host) {
		Some(_) => Ok(()),
		None => Err(ConfigError::InvalidHost { environment, host: host.to_owned() }),
	}
}

fn validate_user_agent(user_agent: &str) -> Result<(), ConfigError> {
	let visible = user_agent.bytes().all(|b| (0x20..0x7f).contains(&b));

	if visible && !user_agent.trim().is_empty() {
		Ok(())
	} else {
		Err(ConfigError::InvalidUserAgent)
	}
}
