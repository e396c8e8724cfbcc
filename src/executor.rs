//! Request execution.
//!
//! [`Executor`] is the contract shared by everything that can carry a wire
//! request to completion: the plain [`HttpExecutor`] here, and the retry
//! decorator in [`crate::retry`] that wraps any executor with the same
//! contract. Both forms the client exposes — awaited and
//! callback-with-handle — drive this one interface.

use crate::builder::WireRequest;
use crate::error::{NetworkError, TransportErrorKind};
use crate::log::RequestLogger;
use crate::transport::Transport;
use async_trait::async_trait;
use http::{HeaderMap, StatusCode};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// A successfully validated response.
#[derive(Debug, Clone)]
pub struct Delivery {
    /// The 2xx status the server answered with.
    pub status: StatusCode,
    /// Response headers.
    pub headers: HeaderMap,
    /// Body bytes; empty when the server sent none.
    pub body: Vec<u8>,
    /// Attempts it took to get this response. Set to the real count by the
    /// retry decorator; `1` when executed directly.
    pub attempts: u32,
}

/// Outcome of driving one request to completion.
///
/// Cancellation is its own arm, not an error: a cancelled operation has no
/// result to deliver and its callers stay silent.
#[derive(Debug)]
pub enum SendOutcome {
    /// The server answered with a success status.
    Success(Delivery),
    /// The request failed with a classified error.
    Failure(NetworkError),
    /// The caller cancelled before an outcome was reached.
    Cancelled,
}

/// Executes a wire request, observing the cancellation token at every
/// suspension point.
#[async_trait]
pub trait Executor: Send + Sync {
    /// Drives the request to an outcome.
    async fn send(&self, request: &WireRequest, cancel: &CancellationToken) -> SendOutcome;
}

/// Executor backed by a [`Transport`], with status validation and
/// request/response logging.
pub struct HttpExecutor {
    transport: Arc<dyn Transport>,
    logger: Option<Arc<dyn RequestLogger>>,
}

impl HttpExecutor {
    /// Creates an executor over the given transport and logger sink.
    pub fn new(transport: Arc<dyn Transport>, logger: Option<Arc<dyn RequestLogger>>) -> Self {
        Self { transport, logger }
    }

    fn log_response(
        &self,
        request: &WireRequest,
        status: Option<StatusCode>,
        body: Option<&[u8]>,
        error: Option<&NetworkError>,
    ) {
        if let Some(logger) = &self.logger {
            logger.log_response(request, status, body, error);
        }
    }
}

#[async_trait]
impl Executor for HttpExecutor {
    async fn send(&self, request: &WireRequest, cancel: &CancellationToken) -> SendOutcome {
        if cancel.is_cancelled() {
            return SendOutcome::Cancelled;
        }

        if let Some(logger) = &self.logger {
            logger.log_request(request);
        }

        // A cancelled round-trip is dropped mid-flight and leaves no
        // response event: the log shows "sent, no response".
        let result = tokio::select! {
            biased;
            () = cancel.cancelled() => return SendOutcome::Cancelled,
            result = self.transport.roundtrip(request) => result,
        };

        let raw = match result {
            Err(failure) if failure.kind == TransportErrorKind::Cancelled => {
                return SendOutcome::Cancelled;
            }
            Err(failure) => {
                let error = if failure.kind == TransportErrorKind::MalformedResponse {
                    NetworkError::InvalidResponse
                } else {
                    NetworkError::RequestFailed(failure)
                };
                self.log_response(request, None, None, Some(&error));
                return SendOutcome::Failure(error);
            }
            Ok(raw) => raw,
        };

        if raw.status == StatusCode::UNAUTHORIZED {
            let error = NetworkError::Unauthorized {
                body: raw.body.clone(),
            };
            self.log_response(request, Some(raw.status), Some(&raw.body), Some(&error));
            return SendOutcome::Failure(error);
        }

        if !raw.status.is_success() {
            let error = NetworkError::UnexpectedStatus {
                status: raw.status,
                body: raw.body.clone(),
            };
            self.log_response(request, Some(raw.status), Some(&raw.body), Some(&error));
            return SendOutcome::Failure(error);
        }

        self.log_response(request, Some(raw.status), Some(&raw.body), None);
        SendOutcome::Success(Delivery {
            status: raw.status,
            headers: raw.headers,
            body: raw.body,
            attempts: 1,
        })
    }
}
