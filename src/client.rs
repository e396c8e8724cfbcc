//! The client orchestrating build, execution, retries, and parsing.
//!
//! [`Client`] composes the request builder, the retry-wrapped HTTP
//! executor, and the response parser into one `execute` contract, exposed
//! two ways: an async call that suspends until completion, and a
//! callback-style call that returns a [`CancellationHandle`] immediately.
//! Both drive the same state machine with identical semantics.

use crate::auth::TokenSource;
use crate::builder::{assemble, WireRequest};
use crate::cancel::CancellationHandle;
use crate::descriptor::RequestDescriptor;
use crate::error::{BuildError, Error, Result};
use crate::executor::{Executor, HttpExecutor, SendOutcome};
use crate::log::{RequestLogger, TracingLogger};
use crate::parse::parse_body;
use crate::response::Response;
use crate::retry::{RetryExecutor, RetryPolicy};
use crate::transport::{HttpTransport, Transport};
use http::{HeaderMap, HeaderName, HeaderValue};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use url::Url;

/// An HTTP client executing declarative requests with retries, auth, and
/// typed responses.
///
/// The client is cheap to clone and designed to be reused; concurrent
/// calls are fully independent. Long-lived collaborators — token source,
/// logger, transport — are injected once at construction.
///
/// # Examples
///
/// ```no_run
/// use courier::{Client, RequestDescriptor, RetryPolicy};
/// use serde::Deserialize;
/// use std::time::Duration;
///
/// #[derive(Deserialize)]
/// struct User {
///     id: u64,
///     name: String,
/// }
///
/// #[tokio::main]
/// async fn main() -> Result<(), courier::Error> {
///     let client = Client::builder("https://api.example.com")
///         .retry_policy(RetryPolicy::new(3, Duration::from_millis(100), 2.0))
///         .build()?;
///
///     let user = client.get::<User>("/users/123").await?;
///     println!("{} after {} attempt(s)", user.name, user.attempts);
///     Ok(())
/// }
/// ```
#[derive(Clone)]
pub struct Client {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    transport: Arc<dyn Transport>,
    base_address: String,
    default_headers: HeaderMap,
    default_retry: Option<RetryPolicy>,
    token_source: Option<Arc<dyn TokenSource>>,
    logger: Option<Arc<dyn RequestLogger>>,
}

impl Client {
    /// Creates a [`ClientBuilder`] for the given base address.
    ///
    /// The address is validated when [`ClientBuilder::build`] runs.
    pub fn builder(base_address: impl Into<String>) -> ClientBuilder {
        ClientBuilder::new(base_address)
    }

    /// Executes a request and suspends until it completes.
    ///
    /// The pipeline is: assemble the wire request (failures short-circuit
    /// here, before any network activity), run it through the retry-wrapped
    /// executor under the effective policy — the descriptor's own policy
    /// when set, the client default otherwise — and decode the response
    /// body into `T`.
    ///
    /// Dropping the returned future aborts the call, including a pending
    /// backoff wait.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use courier::{Client, RequestDescriptor};
    ///
    /// # async fn example() -> Result<(), courier::Error> {
    /// # let client = Client::builder("https://api.example.com").build()?;
    /// let descriptor = RequestDescriptor::get("/search").with_query("q", "rust");
    /// let results = client.execute::<serde_json::Value>(descriptor).await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn execute<T>(&self, descriptor: RequestDescriptor) -> Result<Response<T>>
    where
        T: DeserializeOwned + 'static,
    {
        let request = self.assemble_request(&descriptor)?;
        let policy = descriptor
            .retry_policy
            .or_else(|| self.inner.default_retry.clone());

        let token = CancellationToken::new();
        match self.dispatch::<T>(request, policy, &token).await {
            Some(result) => result,
            // The local token is never cancelled; aborting the await form
            // is done by dropping the future.
            None => Err(Error::Unexpected(
                "operation cancelled without a cancellation handle".to_string(),
            )),
        }
    }

    /// Executes a request, delivering the outcome to `on_complete` and
    /// returning a handle to cancel it.
    ///
    /// Returns `None` when the wire request could not be assembled: the
    /// callback has already been invoked with the build error and there is
    /// nothing in flight to cancel. After [`CancellationHandle::cancel`],
    /// the callback is guaranteed never to run — cancellation is silent,
    /// not an error.
    ///
    /// Must be called from within a tokio runtime.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use courier::{Client, RequestDescriptor};
    ///
    /// # async fn example() -> Result<(), courier::Error> {
    /// # let client = Client::builder("https://api.example.com").build()?;
    /// let handle = client.execute_with_callback::<serde_json::Value, _>(
    ///     RequestDescriptor::get("/reports/slow"),
    ///     |outcome| match outcome {
    ///         Ok(report) => println!("report: {:?}", report.data),
    ///         Err(error) => eprintln!("failed: {error}"),
    ///     },
    /// );
    ///
    /// if let Some(handle) = handle {
    ///     handle.cancel();
    /// }
    /// # Ok(())
    /// # }
    /// ```
    pub fn execute_with_callback<T, F>(
        &self,
        descriptor: RequestDescriptor,
        on_complete: F,
    ) -> Option<CancellationHandle>
    where
        T: DeserializeOwned + Send + 'static,
        F: FnOnce(Result<Response<T>>) + Send + 'static,
    {
        let request = match self.assemble_request(&descriptor) {
            Ok(request) => request,
            Err(error) => {
                on_complete(Err(error.into()));
                return None;
            }
        };
        let policy = descriptor
            .retry_policy
            .or_else(|| self.inner.default_retry.clone());

        let (handle, gate) = CancellationHandle::new();
        let client = self.clone();
        tokio::spawn(async move {
            let token = gate.token();
            match client.dispatch::<T>(request, policy, &token).await {
                // Cancelled: the callback stays silent.
                None => {}
                Some(result) => {
                    if gate.try_complete() {
                        on_complete(result);
                    }
                }
            }
        });
        Some(handle)
    }

    /// Makes a GET request.
    pub async fn get<T>(&self, path: impl Into<String>) -> Result<Response<T>>
    where
        T: DeserializeOwned + 'static,
    {
        self.execute(RequestDescriptor::get(path)).await
    }

    /// Makes a POST request with a JSON body.
    pub async fn post<B, T>(&self, path: impl Into<String>, body: B) -> Result<Response<T>>
    where
        B: Serialize + Send + Sync + 'static,
        T: DeserializeOwned + 'static,
    {
        self.execute(RequestDescriptor::post(path).with_json(body))
            .await
    }

    /// Makes a PUT request with a JSON body.
    pub async fn put<B, T>(&self, path: impl Into<String>, body: B) -> Result<Response<T>>
    where
        B: Serialize + Send + Sync + 'static,
        T: DeserializeOwned + 'static,
    {
        self.execute(RequestDescriptor::put(path).with_json(body))
            .await
    }

    /// Makes a DELETE request.
    ///
    /// Pair with [`NoContent`](crate::NoContent) when the response body is
    /// irrelevant.
    pub async fn delete<T>(&self, path: impl Into<String>) -> Result<Response<T>>
    where
        T: DeserializeOwned + 'static,
    {
        self.execute(RequestDescriptor::delete(path)).await
    }

    fn assemble_request(
        &self,
        descriptor: &RequestDescriptor,
    ) -> std::result::Result<WireRequest, BuildError> {
        assemble(
            descriptor,
            &self.inner.base_address,
            &self.inner.default_headers,
            self.inner.token_source.as_deref(),
        )
    }

    /// Runs an assembled request through the retry-wrapped executor and
    /// parses the outcome. `None` means the call was cancelled and no
    /// result exists to deliver.
    async fn dispatch<T>(
        &self,
        request: WireRequest,
        policy: Option<RetryPolicy>,
        cancel: &CancellationToken,
    ) -> Option<Result<Response<T>>>
    where
        T: DeserializeOwned + 'static,
    {
        let started = Instant::now();
        let executor = RetryExecutor::new(
            HttpExecutor::new(Arc::clone(&self.inner.transport), self.inner.logger.clone()),
            policy,
        );

        match executor.send(&request, cancel).await {
            SendOutcome::Cancelled => None,
            SendOutcome::Failure(error) => Some(Err(Error::Network(error))),
            SendOutcome::Success(delivery) => Some(match parse_body::<T>(&delivery.body) {
                Ok(data) => Ok(Response {
                    data,
                    status: delivery.status,
                    headers: delivery.headers,
                    latency: started.elapsed(),
                    attempts: delivery.attempts,
                    body: delivery.body,
                }),
                Err(error) => Err(Error::Parse(error)),
            }),
        }
    }
}

/// Builder for configuring and creating a [`Client`].
///
/// # Examples
///
/// ```no_run
/// use courier::{AuthMode, Client, RetryPolicy, StaticTokenSource};
/// use std::time::Duration;
///
/// # fn example() -> Result<(), courier::Error> {
/// let client = Client::builder("https://api.example.com")
///     .timeout(Duration::from_secs(30))
///     .retry_policy(RetryPolicy::new(3, Duration::from_millis(100), 2.0))
///     .token_source(StaticTokenSource::new("s3cret"))
///     .default_header("User-Agent", "my-app/1.0")?
///     .build()?;
/// # Ok(())
/// # }
/// ```
pub struct ClientBuilder {
    base_address: String,
    default_headers: HeaderMap,
    default_retry: Option<RetryPolicy>,
    token_source: Option<Arc<dyn TokenSource>>,
    logger: Option<Arc<dyn RequestLogger>>,
    timeout: Option<Duration>,
    transport: Option<Arc<dyn Transport>>,
}

impl ClientBuilder {
    /// Creates a builder for the given base address.
    pub fn new(base_address: impl Into<String>) -> Self {
        Self {
            base_address: base_address.into(),
            default_headers: HeaderMap::new(),
            default_retry: None,
            token_source: None,
            logger: Some(Arc::new(TracingLogger)),
            timeout: None,
            transport: None,
        }
    }

    /// Adds a header sent with every request. Per-request headers with the
    /// same name take precedence.
    ///
    /// # Errors
    ///
    /// Fails if the header name or value is not valid on the wire.
    pub fn default_header(mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Result<Self> {
        let header = HeaderName::try_from(name.as_ref())
            .map_err(|_| BuildError::InvalidHeader(name.as_ref().to_string()))?;
        let value = HeaderValue::try_from(value.as_ref())
            .map_err(|_| BuildError::InvalidHeader(name.as_ref().to_string()))?;
        self.default_headers.insert(header, value);
        Ok(self)
    }

    /// Sets the default retry policy. Descriptors carrying their own
    /// policy override it per request.
    pub fn retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.default_retry = Some(policy);
        self
    }

    /// Injects the token source consulted by authenticated requests.
    pub fn token_source(mut self, source: impl TokenSource + 'static) -> Self {
        self.token_source = Some(Arc::new(source));
        self
    }

    /// Replaces the default [`TracingLogger`] sink.
    pub fn logger(mut self, logger: impl RequestLogger + 'static) -> Self {
        self.logger = Some(Arc::new(logger));
        self
    }

    /// Disables request/response logging entirely.
    pub fn no_logger(mut self) -> Self {
        self.logger = None;
        self
    }

    /// Sets the transport-level request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Replaces the HTTP transport. Mainly useful for tests.
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Builds the configured [`Client`].
    ///
    /// # Errors
    ///
    /// Fails with [`BuildError::InvalidBaseAddress`] when the base address
    /// does not parse, or [`Error::Unexpected`] when the underlying HTTP
    /// engine cannot be constructed.
    pub fn build(self) -> Result<Client> {
        Url::parse(&self.base_address)
            .map_err(|error| Error::Build(BuildError::InvalidBaseAddress(error)))?;

        let transport = match self.transport {
            Some(transport) => transport,
            None => Arc::new(HttpTransport::new(self.timeout).map_err(|error| {
                Error::Unexpected(format!("failed to build HTTP transport: {error}"))
            })?),
        };

        Ok(Client {
            inner: Arc::new(ClientInner {
                transport,
                base_address: self.base_address,
                default_headers: self.default_headers,
                default_retry: self.default_retry,
                token_source: self.token_source,
                logger: self.logger,
            }),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_rejects_an_invalid_base_address() {
        let result = Client::builder("definitely not a url").build();
        assert!(matches!(
            result,
            Err(Error::Build(BuildError::InvalidBaseAddress(_)))
        ));
    }

    #[test]
    fn builder_rejects_invalid_default_headers() {
        let result = Client::builder("https://api.test.com").default_header("bad\nname", "v");
        assert!(matches!(
            result,
            Err(Error::Build(BuildError::InvalidHeader(_)))
        ));
    }

    #[test]
    fn clients_are_cheap_to_clone() {
        let client = Client::builder("https://api.test.com").build().unwrap();
        let clone = client.clone();
        assert!(Arc::ptr_eq(&client.inner, &clone.inner));
    }
}
