//! Fetches the current user's profile with a fixed development credential.
//!
//! ```sh
//! BEARER_RELAY_TOKEN=... cargo run --example user_profile
//! ```

// std
use std::{env, sync::Arc, time::Duration};
// crates.io
use color_eyre::{Result, eyre::WrapErr};
use serde::Deserialize;
// self
use bearer_relay::{
	auth::{StaticIssuer, TokenCoordinator},
	config::ClientConfig,
	executor::ReqwestExecutor,
	request::{Environment, RequestDescriptor},
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
struct UserProfile {
	user_id: String,
	display_name: Option<String>,
	#[serde(default, deserialize_with = "bearer_relay::decode::optional_timestamp")]
	created_at: Option<time::OffsetDateTime>,
}

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let token = env::var("BEARER_RELAY_TOKEN").wrap_err("BEARER_RELAY_TOKEN must be set")?;
	let config = ClientConfig::builder()
		.user_agent("bearer-relay-demo/0.1")
		.request_timeout(Duration::from_secs(10))
		.build()?;
	let coordinator = Arc::new(TokenCoordinator::new(Arc::new(StaticIssuer::new(token))));
	let executor = ReqwestExecutor::from_config(coordinator, config)?;
	let descriptor =
		RequestDescriptor::get("/api/v1/user-profiles/current").with_environment(Environment::Prod);
	let profile: UserProfile =
		executor.perform_json(&descriptor).await.wrap_err("Failed to fetch the user profile")?;

	println!("{profile:#?}");
	println!("refresh metrics: issued={}", executor.coordinator.metrics().issued());

	Ok(())
}
