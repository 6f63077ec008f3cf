//! Immutable request descriptors and the pure function that builds transport requests from them.

// crates.io
use rand::{Rng, distr::Alphanumeric};
// self
use crate::{
	_prelude::*,
	auth::Credential,
	config::ClientConfig,
	error::NetworkError,
	request::{self, BuiltRequest, CONTENT_TYPE, Environment, SCHEME, USER_AGENT},
};

/// HTTP method of a request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
	/// `GET`.
	Get,
	/// `POST`.
	Post,
	/// `PUT`.
	Put,
	/// `PATCH`.
	Patch,
	/// `DELETE`.
	Delete,
}
impl Method {
	/// Returns the method token as sent on the wire.
	pub const fn as_str(self) -> &'static str {
		match self {
			Method::Get => "GET",
			Method::Post => "POST",
			Method::Put => "PUT",
			Method::Patch => "PATCH",
			Method::Delete => "DELETE",
		}
	}
}
impl Display for Method {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Multipart boundary token.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Boundary(String);
impl Boundary {
	const RANDOM_LEN: usize = 32;

	/// Wraps a caller-chosen boundary (for example a UUID string).
	pub fn new(value: impl Into<String>) -> Self {
		Self(value.into())
	}

	/// Generates a random alphanumeric boundary.
	pub fn random() -> Self {
		let value =
			rand::rng().sample_iter(&Alphanumeric).take(Self::RANDOM_LEN).map(char::from).collect();

		Self(value)
	}

	/// Returns the boundary token.
	pub fn as_str(&self) -> &str {
		&self.0
	}
}
impl Display for Boundary {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(&self.0)
	}
}

/// Content classification of a request body, which determines its `Content-Type`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum ContentKind {
	/// `application/json`.
	Json,
	/// Raw bytes, sent as `application/octet-stream`.
	TextPlain,
	/// `multipart/form-data` with the given boundary.
	Multipart(Boundary),
	/// No `Content-Type` header.
	#[default]
	None,
}
impl ContentKind {
	/// Returns the `Content-Type` header value, if any.
	pub fn content_type(&self) -> Option<String> {
		match self {
			Self::Json => Some("application/json".into()),
			Self::TextPlain => Some("application/octet-stream".into()),
			Self::Multipart(boundary) => Some(format!("multipart/form-data; boundary={boundary}")),
			Self::None => None,
		}
	}
}

/// One query parameter; a missing value produces a valueless key (`?flag`).
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct QueryParam {
	/// Parameter name.
	pub key: String,
	/// Parameter value, if any.
	pub value: Option<String>,
}
impl QueryParam {
	/// Creates a key/value parameter.
	pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
		Self { key: key.into(), value: Some(value.into()) }
	}

	/// Creates a valueless parameter.
	pub fn flag(key: impl Into<String>) -> Self {
		Self { key: key.into(), value: None }
	}
}

/// Immutable description of an intended HTTP call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RequestDescriptor {
	/// Environment the path resolves against.
	pub environment: Environment,
	/// Absolute path, starting with `/`.
	pub path: String,
	/// HTTP method.
	pub method: Method,
	/// Content classification of the body.
	pub content: ContentKind,
	/// Raw body bytes.
	pub body: Option<Vec<u8>>,
	/// Ordered query parameters.
	pub query: Option<Vec<QueryParam>>,
	/// Whether an `Authorization: Bearer` header must be attached.
	pub requires_auth: bool,
}
impl RequestDescriptor {
	/// Creates a descriptor for `method` + `path` targeting the default environment, with no body
	/// and authentication required.
	pub fn new(method: Method, path: impl Into<String>) -> Self {
		Self {
			environment: Environment::default(),
			path: path.into(),
			method,
			content: ContentKind::default(),
			body: None,
			query: None,
			requires_auth: true,
		}
	}

	/// Shorthand for a `GET` descriptor.
	pub fn get(path: impl Into<String>) -> Self {
		Self::new(Method::Get, path)
	}

	/// Shorthand for a `POST` descriptor.
	pub fn post(path: impl Into<String>) -> Self {
		Self::new(Method::Post, path)
	}

	/// Overrides the target environment.
	pub fn with_environment(mut self, environment: Environment) -> Self {
		self.environment = environment;

		self
	}

	/// Overrides the content classification.
	pub fn with_content(mut self, content: ContentKind) -> Self {
		self.content = content;

		self
	}

	/// Sets the raw body.
	pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
		self.body = Some(body.into());

		self
	}

	/// Serializes `value` as the JSON body and classifies the content as JSON.
	pub fn with_json_body<T>(self, value: &T) -> Result<Self, serde_json::Error>
	where
		T: ?Sized + Serialize,
	{
		let body = serde_json::to_vec(value)?;

		Ok(self.with_content(ContentKind::Json).with_body(body))
	}

	/// Appends a query parameter.
	pub fn with_query(mut self, param: QueryParam) -> Self {
		self.query.get_or_insert_with(Vec::new).push(param);

		self
	}

	/// Overrides whether a credential is attached.
	pub fn with_requires_auth(mut self, requires_auth: bool) -> Self {
		self.requires_auth = requires_auth;

		self
	}

	/// Resolves the absolute URL for this descriptor.
	pub fn url(&self, config: &ClientConfig) -> Result<Url, NetworkError> {
		let host = self.environment.host(&config.hosts);
		let invalid =
			|| NetworkError::InvalidUrl { target: format!("{SCHEME}://{host}{}", self.path) };

		if !self.path.is_empty() && !self.path.starts_with('/') {
			return Err(invalid());
		}

		let mut url = request::base_url(host).ok_or_else(invalid)?;

		url.set_path(&self.path);

		if let Some(query) = self.query.as_ref().filter(|query| !query.is_empty()) {
			let mut pairs = url.query_pairs_mut();

			for param in query {
				match &param.value {
					Some(value) => pairs.append_pair(&param.key, value),
					None => pairs.append_key_only(&param.key),
				};
			}
		}

		Ok(url)
	}

	/// Returns the headers contributed by configuration and content classification.
	pub fn headers(&self, config: &ClientConfig) -> BTreeMap<String, String> {
		let mut headers = BTreeMap::new();

		headers.insert(USER_AGENT.to_owned(), config.user_agent.clone());

		if let Some(content_type) = self.content.content_type() {
			headers.insert(CONTENT_TYPE.to_owned(), content_type);
		}

		headers
	}

	/// Builds the transport request, attaching `credential` as a bearer token when given.
	pub fn build_request(
		&self,
		config: &ClientConfig,
		credential: Option<&Credential>,
	) -> Result<BuiltRequest, NetworkError> {
		let mut request = BuiltRequest {
			method: self.method,
			url: self.url(config)?,
			headers: self.headers(config),
			body: self.body.clone(),
		};

		if let Some(credential) = credential {
			request.authorize(credential);
		}

		Ok(request)
	}
}
