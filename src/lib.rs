//! # Courier - typed HTTP request orchestration
//!
//! Courier turns declarative request descriptions into executed HTTP
//! calls with strongly-typed decoded results, transparently applying
//! authentication, retries with exponential backoff, and structured
//! logging. It is built on `reqwest` and `tokio`.
//!
//! ## Quick Start
//!
//! ```no_run
//! use courier::{AuthMode, Client, RequestDescriptor, RetryPolicy, StaticTokenSource};
//! use serde::{Deserialize, Serialize};
//! use std::time::Duration;
//!
//! #[derive(Serialize)]
//! struct CreateUser {
//!     name: String,
//! }
//!
//! #[derive(Deserialize)]
//! struct User {
//!     id: u64,
//!     name: String,
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), courier::Error> {
//!     let client = Client::builder("https://api.example.com")
//!         .retry_policy(RetryPolicy::new(3, Duration::from_millis(100), 2.0))
//!         .token_source(StaticTokenSource::new(std::env::var("API_TOKEN").unwrap_or_default()))
//!         .build()?;
//!
//!     // Simple typed GET.
//!     let user = client.get::<User>("/users/123").await?;
//!     println!("{} in {:?}", user.name, user.latency);
//!
//!     // Full descriptor: query, auth, per-request retry override.
//!     let descriptor = RequestDescriptor::post("/users")
//!         .with_json(CreateUser { name: "Alice".into() })
//!         .with_auth(AuthMode::Bearer)
//!         .with_retry_policy(RetryPolicy::new(1, Duration::from_millis(50), 2.0));
//!     let created = client.execute::<User>(descriptor).await?;
//!     println!("created user {}", created.id);
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Two ways to execute
//!
//! [`Client::execute`] suspends until the call completes; dropping the
//! future aborts it. [`Client::execute_with_callback`] returns a
//! [`CancellationHandle`] immediately and invokes a callback with the
//! outcome later. Both run the same pipeline with identical semantics:
//! build → send (with retries) → parse. Cancelling the handle aborts
//! whatever is in flight — a live network attempt or a pending backoff
//! wait — and guarantees the callback never runs; cancellation is never
//! delivered as an error.
//!
//! ## Errors
//!
//! Failures are classified per pipeline layer — [`NetworkError`],
//! [`BuildError`], [`ParseError`] — and surfaced through the [`Error`]
//! union without losing the original cause:
//!
//! ```no_run
//! use courier::{Client, Error, NetworkError};
//!
//! # async fn example() -> Result<(), Error> {
//! # let client = Client::builder("https://api.example.com").build()?;
//! match client.get::<serde_json::Value>("/endpoint").await {
//!     Ok(response) => println!("{:?}", response.data),
//!     Err(Error::Network(NetworkError::UnexpectedStatus { status, body })) => {
//!         eprintln!("server said {}: {}", status, String::from_utf8_lossy(&body));
//!     }
//!     Err(Error::Network(NetworkError::RetriesExhausted { attempts, last_error })) => {
//!         eprintln!("gave up after {attempts} attempts: {last_error}");
//!     }
//!     Err(e) => eprintln!("failed: {e}"),
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Retries
//!
//! A [`RetryPolicy`] allows `max_retries + 1` attempts with delays growing
//! by `backoff_factor`. The default predicate retries 5xx responses and
//! transient transport failures; anything else is terminal. Predicates are
//! pluggable per policy, and policies attach to the client or to a single
//! descriptor, with the descriptor winning.

mod auth;
mod builder;
mod cancel;
mod client;
mod descriptor;
mod error;
mod executor;
mod log;
mod parse;
mod response;
pub mod retry;
mod transport;

pub use auth::{AuthMode, StaticTokenSource, TokenSource};
pub use builder::WireRequest;
pub use cancel::CancellationHandle;
pub use client::{Client, ClientBuilder};
pub use descriptor::RequestDescriptor;
pub use error::{
    BuildError, Error, NetworkError, ParseError, Result, TransportError, TransportErrorKind,
};
pub use executor::{Delivery, Executor, HttpExecutor, SendOutcome};
pub use log::{curl_command, RequestLogger, TracingLogger};
pub use parse::NoContent;
pub use response::Response;
pub use retry::{RetryExecutor, RetryPolicy, RetryPredicate};
pub use transport::{HttpTransport, RawResponse, Transport};
