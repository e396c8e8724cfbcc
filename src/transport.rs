//! The raw transport boundary.
//!
//! [`Transport`] is the narrow contract the pipeline has with the HTTP
//! engine: one wire request in, status + headers + body out, or a
//! classified [`TransportError`]. [`HttpTransport`] is the `reqwest`
//! implementation; tests inject their own.

use crate::builder::WireRequest;
use crate::error::{TransportError, TransportErrorKind};
use async_trait::async_trait;
use http::{HeaderMap, StatusCode};
use std::time::Duration;

/// Raw response as delivered by the transport, before status validation.
#[derive(Debug, Clone)]
pub struct RawResponse {
    /// The status line's code.
    pub status: StatusCode,
    /// Response headers.
    pub headers: HeaderMap,
    /// Body bytes; empty when the server sent none.
    pub body: Vec<u8>,
}

/// Performs one HTTP round-trip.
///
/// The pipeline does not configure TLS, proxies, or connection reuse on
/// this collaborator; that is the implementation's concern.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Executes the request and returns the raw response.
    async fn roundtrip(
        &self,
        request: &WireRequest,
    ) -> std::result::Result<RawResponse, TransportError>;
}

/// `reqwest`-backed transport.
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    /// Builds a transport, optionally with a per-request timeout.
    pub fn new(timeout: Option<Duration>) -> std::result::Result<Self, reqwest::Error> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            client: builder.build()?,
        })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn roundtrip(
        &self,
        request: &WireRequest,
    ) -> std::result::Result<RawResponse, TransportError> {
        let mut builder = self
            .client
            .request(request.method.clone(), request.url.clone())
            .headers(request.headers.clone());
        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }

        let response = builder.send().await.map_err(classify)?;
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await.map_err(classify)?.to_vec();

        Ok(RawResponse {
            status,
            headers,
            body,
        })
    }
}

/// Maps a `reqwest` error into the closed transport kind set.
fn classify(error: reqwest::Error) -> TransportError {
    let message = chain_text(&error);
    let lowered = message.to_ascii_lowercase();

    let kind = if error.is_timeout() {
        TransportErrorKind::Timeout
    } else if error.is_connect() {
        if lowered.contains("dns") || lowered.contains("resolve") {
            TransportErrorKind::HostUnresolved
        } else if lowered.contains("unreachable") {
            TransportErrorKind::HostUnreachable
        } else if lowered.contains("network is down") || lowered.contains("not connected") {
            TransportErrorKind::NotConnected
        } else {
            TransportErrorKind::HostUnreachable
        }
    } else if error.is_decode() {
        TransportErrorKind::MalformedResponse
    } else if error.is_body()
        || lowered.contains("connection reset")
        || lowered.contains("broken pipe")
        || lowered.contains("incomplete message")
        || lowered.contains("connection closed")
    {
        TransportErrorKind::ConnectionLost
    } else {
        TransportErrorKind::Other
    };

    TransportError::new(kind, message)
}

fn chain_text(error: &dyn std::error::Error) -> String {
    let mut text = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        text.push_str(": ");
        text.push_str(&cause.to_string());
        source = cause.source();
    }
    text
}
