//! Declarative request descriptions.
//!
//! A [`RequestDescriptor`] carries everything one API operation needs:
//! method, endpoint path, query parameters, headers, an optional JSON body,
//! and optional per-request retry and auth settings. Descriptors are plain
//! data created fresh for each call; the client turns them into wire
//! requests at execution time.

use crate::error::BuildError;
use crate::{AuthMode, RetryPolicy};
use http::{HeaderMap, HeaderName, HeaderValue, Method};
use serde::Serialize;

pub(crate) type BodyProducer =
    Box<dyn Fn() -> std::result::Result<Vec<u8>, serde_json::Error> + Send + Sync>;

/// Declarative definition of one HTTP API operation.
///
/// # Examples
///
/// ```no_run
/// use courier::{AuthMode, RequestDescriptor};
/// use http::Method;
///
/// # fn example() -> Result<(), courier::Error> {
/// let descriptor = RequestDescriptor::new(Method::GET, "/users/123")
///     .with_query("expand", "profile")
///     .with_header("Accept", "application/json")?
///     .with_auth(AuthMode::Bearer);
/// # Ok(())
/// # }
/// ```
pub struct RequestDescriptor {
    /// The HTTP method.
    pub method: Method,

    /// Endpoint path, joined onto the client's base address.
    pub path: String,

    /// Query parameters in declaration order. Duplicate names are allowed
    /// and emitted in order.
    pub query: Vec<(String, String)>,

    /// Per-request headers. Names are case-insensitive; setting a name
    /// twice keeps the last value.
    pub headers: HeaderMap,

    /// Overrides the client's default retry policy when set.
    pub retry_policy: Option<RetryPolicy>,

    /// How the request authenticates.
    pub auth: AuthMode,

    pub(crate) body: Option<BodyProducer>,
}

impl RequestDescriptor {
    /// Creates a descriptor with the given method and endpoint path.
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            headers: HeaderMap::new(),
            retry_policy: None,
            auth: AuthMode::None,
            body: None,
        }
    }

    /// Creates a GET descriptor.
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    /// Creates a POST descriptor.
    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    /// Creates a PUT descriptor.
    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    /// Creates a DELETE descriptor.
    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    /// Appends a query parameter. Order is preserved and duplicate names
    /// are kept.
    pub fn with_query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((name.into(), value.into()));
        self
    }

    /// Sets a header.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::InvalidHeader`] if the name or value is not
    /// valid on the wire.
    pub fn with_header(
        mut self,
        name: impl AsRef<str>,
        value: impl AsRef<str>,
    ) -> std::result::Result<Self, BuildError> {
        let header = HeaderName::try_from(name.as_ref())
            .map_err(|_| BuildError::InvalidHeader(name.as_ref().to_string()))?;
        let value = HeaderValue::try_from(value.as_ref())
            .map_err(|_| BuildError::InvalidHeader(name.as_ref().to_string()))?;
        self.headers.insert(header, value);
        Ok(self)
    }

    /// Attaches a JSON body.
    ///
    /// The value is serialized when the wire request is assembled, not
    /// here; a serialization failure surfaces from `execute` as
    /// [`BuildError::BodyEncoding`] before anything reaches the network.
    pub fn with_json<B>(mut self, body: B) -> Self
    where
        B: Serialize + Send + Sync + 'static,
    {
        self.body = Some(Box::new(move || serde_json::to_vec(&body)));
        self
    }

    /// Overrides the client's retry policy for this request.
    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = Some(policy);
        self
    }

    /// Sets the auth mode for this request.
    pub fn with_auth(mut self, auth: AuthMode) -> Self {
        self.auth = auth;
        self
    }
}

impl std::fmt::Debug for RequestDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestDescriptor")
            .field("method", &self.method)
            .field("path", &self.path)
            .field("query", &self.query)
            .field("headers", &self.headers)
            .field("retry_policy", &self.retry_policy)
            .field("auth", &self.auth)
            .field("has_body", &self.body.is_some())
            .finish()
    }
}
