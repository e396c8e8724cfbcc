//! Error types for the request pipeline.
//!
//! Failures are classified into three independent closed sets, one per
//! pipeline layer: [`NetworkError`] (transport and status validation),
//! [`BuildError`] (wire request assembly), and [`ParseError`] (response
//! decoding). [`Error`] is the top-level union the client surfaces; every
//! lower error is traceable through exactly one wrapping layer to its
//! origin, and `Display` renders the wrapped cause recursively.

use http::StatusCode;

/// Kind of a transport-level failure, classified from the underlying
/// HTTP engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum TransportErrorKind {
    /// The request did not complete within the transport's timeout.
    Timeout,
    /// DNS resolution failed for the target host.
    HostUnresolved,
    /// A connection to the host could not be established.
    HostUnreachable,
    /// An established connection was interrupted mid-exchange.
    ConnectionLost,
    /// No usable network connection was available.
    NotConnected,
    /// The peer answered with something that is not a valid HTTP response.
    MalformedResponse,
    /// The caller aborted the request.
    Cancelled,
    /// Anything the classification above does not cover.
    Other,
}

impl std::fmt::Display for TransportErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::Timeout => "timeout",
            Self::HostUnresolved => "host unresolved",
            Self::HostUnreachable => "host unreachable",
            Self::ConnectionLost => "connection lost",
            Self::NotConnected => "not connected",
            Self::MalformedResponse => "malformed response",
            Self::Cancelled => "cancelled",
            Self::Other => "other",
        };
        f.write_str(label)
    }
}

/// Sendable snapshot of an underlying transport failure.
///
/// The original engine error is not held onto; the classified kind and its
/// rendered description are enough to diagnose and to decide retryability.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct TransportError {
    /// Classified failure kind.
    pub kind: TransportErrorKind,
    /// Human-readable description from the underlying engine.
    pub message: String,
}

impl TransportError {
    /// Creates a snapshot with the given kind and description.
    pub fn new(kind: TransportErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// A network-layer failure: the transport failed outright, or the server
/// answered with a status outside the success range.
#[derive(Debug, thiserror::Error)]
pub enum NetworkError {
    /// The response was not a parseable HTTP response.
    #[error("invalid HTTP response")]
    InvalidResponse,

    /// The server answered 401. Carries the response body, empty when the
    /// server sent none.
    #[error("unauthorized (401)")]
    Unauthorized {
        /// Response body bytes, possibly empty.
        body: Vec<u8>,
    },

    /// The server answered with a status outside 200–299 that is not 401.
    #[error("unexpected status code {status}")]
    UnexpectedStatus {
        /// The HTTP status code.
        status: StatusCode,
        /// Response body bytes, possibly empty.
        body: Vec<u8>,
    },

    /// The transport failed before a usable response arrived.
    #[error("request failed: {0}")]
    RequestFailed(TransportError),

    /// Every attempt the retry policy allowed has failed.
    ///
    /// Carries the last observed error and the total attempt count; the
    /// wrapped error is itself a `NetworkError`, boxed to keep the variant
    /// finite.
    #[error("all {attempts} attempts failed, last error: {last_error}")]
    RetriesExhausted {
        /// Total attempts made, including the first.
        attempts: u32,
        /// The error observed on the final attempt.
        last_error: Box<NetworkError>,
    },
}

impl NetworkError {
    /// Returns the HTTP status code if this error carries one.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Unauthorized { .. } => Some(StatusCode::UNAUTHORIZED),
            Self::UnexpectedStatus { status, .. } => Some(*status),
            Self::RetriesExhausted { last_error, .. } => last_error.status(),
            _ => None,
        }
    }

    /// Returns the response body if this error carries one.
    pub fn body(&self) -> Option<&[u8]> {
        match self {
            Self::Unauthorized { body } | Self::UnexpectedStatus { body, .. } => Some(body),
            Self::RetriesExhausted { last_error, .. } => last_error.body(),
            _ => None,
        }
    }
}

/// A failure while assembling the wire request. These short-circuit before
/// any network activity.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    /// The configured base address is not a valid URL.
    #[error("invalid base address")]
    InvalidBaseAddress(#[source] url::ParseError),

    /// Base address and endpoint did not combine into a valid URL.
    #[error("could not assemble URL for endpoint {endpoint:?}")]
    InvalidEndpoint {
        /// The endpoint path that failed to join.
        endpoint: String,
        /// The underlying parse failure.
        #[source]
        source: url::ParseError,
    },

    /// A header name or value was not valid for the wire.
    #[error("invalid header {0:?}")]
    InvalidHeader(String),

    /// The request body producer failed.
    #[error("failed to encode request body")]
    BodyEncoding(#[source] serde_json::Error),

    /// The request's auth mode requires a token but the token source is
    /// missing or yielded an empty one.
    #[error("authentication token is missing or empty")]
    MissingAuthToken,
}

/// A failure while decoding a successful response body.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    /// The response had no body but the target shape expects one.
    #[error("response body is empty")]
    NoData,

    /// The body did not decode into the target shape.
    #[error("failed to decode response body")]
    Decode(#[source] serde_json::Error),
}

/// The error type surfaced by [`Client`](crate::Client) calls.
///
/// Wraps the three lower taxonomies one-to-one; [`Error::Unexpected`] is a
/// safety net for failures that fit none of them, not an expected path.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A network-layer failure, possibly after retries.
    #[error("network error: {0}")]
    Network(#[from] NetworkError),

    /// The wire request could not be assembled; nothing reached the network.
    #[error("request build error: {0}")]
    Build(#[from] BuildError),

    /// The response arrived but did not decode into the requested shape.
    #[error("response parse error: {0}")]
    Parse(#[from] ParseError),

    /// An unclassified failure.
    #[error("unexpected error: {0}")]
    Unexpected(String),
}

/// A specialized `Result` for client calls.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exhaustion_renders_the_wrapped_cause() {
        let inner = NetworkError::UnexpectedStatus {
            status: StatusCode::SERVICE_UNAVAILABLE,
            body: Vec::new(),
        };
        let outer = NetworkError::RetriesExhausted {
            attempts: 4,
            last_error: Box::new(inner),
        };

        let rendered = outer.to_string();
        assert!(rendered.contains("4 attempts"));
        assert!(rendered.contains("503"));
    }

    #[test]
    fn top_level_error_renders_nested_descriptions() {
        let error = Error::Network(NetworkError::RequestFailed(TransportError::new(
            TransportErrorKind::Timeout,
            "deadline elapsed",
        )));
        assert_eq!(
            error.to_string(),
            "network error: request failed: timeout: deadline elapsed"
        );
    }

    #[test]
    fn status_and_body_reach_through_exhaustion() {
        let error = NetworkError::RetriesExhausted {
            attempts: 2,
            last_error: Box::new(NetworkError::Unauthorized {
                body: b"denied".to_vec(),
            }),
        };
        assert_eq!(error.status(), Some(StatusCode::UNAUTHORIZED));
        assert_eq!(error.body(), Some(&b"denied"[..]));
    }
}
