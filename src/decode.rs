//! Stateless response-body decoding helpers.
//!
//! JSON decoding reports the path of the first failing field. Timestamps use the
//! `yyyy-MM-ddTHH:mm:ss.SSS±hhmm` layout common to the backing APIs, with RFC 3339 accepted as a
//! fallback; parsing is a pure function with no cached formatter state.

// crates.io
use serde::{Deserializer, de::DeserializeOwned};
use time::{
	format_description::{BorrowedFormatItem, well_known::Rfc3339},
	macros::format_description,
};
// self
use crate::{_prelude::*, error::DecodeError};

const TIMESTAMP_FORMAT: &[BorrowedFormatItem<'static>] = format_description!(
	"[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond digits:3][offset_hour sign:mandatory][offset_minute]"
);

/// Decodes `bytes` as JSON into `T`.
pub fn json<T>(bytes: &[u8]) -> Result<T, DecodeError>
where
	T: DeserializeOwned,
{
	let de = &mut serde_json::Deserializer::from_slice(bytes);

	serde_path_to_error::deserialize(de).map_err(|source| DecodeError::Json { source })
}

/// Parses a timestamp such as `2024-05-01T08:30:00.250+0200`.
pub fn parse_timestamp(raw: &str) -> Result<OffsetDateTime, DecodeError> {
	OffsetDateTime::parse(raw, TIMESTAMP_FORMAT).or_else(|source| {
		OffsetDateTime::parse(raw, &Rfc3339)
			.map_err(|_| DecodeError::Timestamp { value: raw.to_owned(), source })
	})
}

/// `deserialize_with` helper for timestamp fields.
///
/// ```
/// #[derive(serde::Deserialize)]
/// struct Profile {
/// 	#[serde(deserialize_with = "bearer_relay::decode::timestamp")]
/// 	created_at: time::OffsetDateTime,
/// }
/// ```
pub fn timestamp<'de, D>(deserializer: D) -> Result<OffsetDateTime, D::Error>
where
	D: Deserializer<'de>,
{
	let raw = String::deserialize(deserializer)?;

	parse_timestamp(&raw).map_err(serde::de::Error::custom)
}

/// `deserialize_with` helper for optional timestamp fields; pair it with `#[serde(default)]`.
pub fn optional_timestamp<'de, D>(deserializer: D) -> Result<Option<OffsetDateTime>, D::Error>
where
	D: Deserializer<'de>,
{
	Option::<String>::deserialize(deserializer)?
		.map(|raw| parse_timestamp(&raw).map_err(serde::de::Error::custom))
		.transpose()
}
