//! Success wrapper carrying the decoded value and exchange metadata.

use http::{HeaderMap, StatusCode};
use std::borrow::Cow;
use std::time::Duration;

/// A decoded response plus metadata about the exchange that produced it.
///
/// Derefs to the decoded data, so most call sites can treat it as the
/// value itself and reach for the metadata only when they need it.
///
/// # Examples
///
/// ```no_run
/// use courier::Client;
/// use serde::Deserialize;
///
/// #[derive(Deserialize)]
/// struct User {
///     name: String,
/// }
///
/// # async fn example() -> Result<(), courier::Error> {
/// # let client = Client::builder("https://api.example.com").build()?;
/// let response = client.get::<User>("/users/123").await?;
/// println!("{} ({} attempts, {:?})", response.name, response.attempts, response.latency);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Response<T> {
    /// The decoded response data.
    pub data: T,

    /// Raw body bytes as received, kept for debugging and logging.
    pub body: Vec<u8>,

    /// The HTTP status code.
    pub status: StatusCode,

    /// The response headers.
    pub headers: HeaderMap,

    /// Time from dispatch to the successful response, across all attempts.
    pub latency: Duration,

    /// Attempts made, `1` when the first try succeeded.
    pub attempts: u32,
}

impl<T> Response<T> {
    /// Transforms the decoded data, keeping the metadata.
    pub fn map<U, F>(self, f: F) -> Response<U>
    where
        F: FnOnce(T) -> U,
    {
        Response {
            data: f(self.data),
            body: self.body,
            status: self.status,
            headers: self.headers,
            latency: self.latency,
            attempts: self.attempts,
        }
    }

    /// Whether the request needed more than one attempt.
    pub fn was_retried(&self) -> bool {
        self.attempts > 1
    }

    /// Returns a response header value by name, if present and readable
    /// as a string.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)?.to_str().ok()
    }

    /// The raw body as text, with invalid UTF-8 replaced.
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }
}

impl<T> AsRef<T> for Response<T> {
    fn as_ref(&self) -> &T {
        &self.data
    }
}

impl<T> std::ops::Deref for Response<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.data
    }
}
