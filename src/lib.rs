//! Bearer-token request layer: attach credentials to outgoing requests, coalesce concurrent
//! refreshes into one in-flight issuance, and retry exactly once when a request is rejected with
//! HTTP 401.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod auth;
pub mod config;
pub mod decode;
pub mod error;
pub mod executor;
pub mod http;
pub mod obs;
pub mod request;

mod _prelude {
	pub use std::{
		collections::BTreeMap,
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		sync::Arc,
	};

	pub use parking_lot::Mutex;
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::OffsetDateTime;
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(test)] use {color_eyre as _, httpmock as _};
