//! Request/response logging sink.
//!
//! The executor reports a snapshot of every outgoing request and, unless
//! the call was cancelled first, the response that came back (or the
//! classified error that took its place). [`TracingLogger`] is the
//! default sink and emits `tracing` events plus a cURL transcription of
//! the request at trace level; any [`RequestLogger`] can be injected
//! instead, and no logger at all is a valid configuration.
//!
//! Cancelled calls log the request but never a response: they read as
//! "sent, no response".

use crate::builder::WireRequest;
use crate::error::NetworkError;
use http::header::AUTHORIZATION;
use http::{Method, StatusCode};

/// Sink for request/response observability events.
///
/// Implementations must be infallible side effects; they are invoked from
/// concurrent requests and must not panic or block for long.
pub trait RequestLogger: Send + Sync {
    /// Called once per attempt, before the request is dispatched.
    fn log_request(&self, request: &WireRequest);

    /// Called once per attempt after the outcome is known, except when the
    /// attempt was cancelled before a response arrived.
    ///
    /// `status` and `body` are absent when the transport failed outright;
    /// `error` is absent on success.
    fn log_response(
        &self,
        request: &WireRequest,
        status: Option<StatusCode>,
        body: Option<&[u8]>,
        error: Option<&NetworkError>,
    );
}

/// Default logger: structured `tracing` events.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogger;

impl RequestLogger for TracingLogger {
    fn log_request(&self, request: &WireRequest) {
        tracing::debug!(
            method = %request.method,
            url = %request.url,
            "sending HTTP request"
        );
        tracing::trace!(curl = %curl_command(request), "request as curl");
    }

    fn log_response(
        &self,
        request: &WireRequest,
        status: Option<StatusCode>,
        body: Option<&[u8]>,
        error: Option<&NetworkError>,
    ) {
        let body_preview = body.map(preview);
        match (status, error) {
            (Some(status), None) => {
                tracing::info!(
                    status = status.as_u16(),
                    url = %request.url,
                    body = body_preview.as_deref().unwrap_or(""),
                    "received HTTP response"
                );
            }
            (Some(status), Some(error)) => {
                tracing::warn!(
                    status = status.as_u16(),
                    url = %request.url,
                    error = %error,
                    body = body_preview.as_deref().unwrap_or(""),
                    "HTTP request failed"
                );
            }
            (None, Some(error)) => {
                tracing::error!(
                    url = %request.url,
                    error = %error,
                    "HTTP request failed without a response"
                );
            }
            (None, None) => {}
        }
    }
}

const PREVIEW_LIMIT: usize = 2048;

fn preview(body: &[u8]) -> String {
    let text = String::from_utf8_lossy(body);
    if text.len() <= PREVIEW_LIMIT {
        return text.into_owned();
    }
    let mut cut = PREVIEW_LIMIT;
    while !text.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}… ({} bytes)", &text[..cut], body.len())
}

/// Renders a wire request as a copy-pasteable cURL command.
///
/// The `Authorization` header value is redacted.
pub fn curl_command(request: &WireRequest) -> String {
    let mut command = String::from("curl");

    if request.method != Method::GET {
        command.push_str(" -X ");
        command.push_str(request.method.as_str());
    }

    for (name, value) in &request.headers {
        let rendered = if *name == AUTHORIZATION {
            "<redacted>"
        } else {
            value.to_str().unwrap_or("<binary>")
        };
        command.push_str(&format!(" -H '{name}: {rendered}'"));
    }

    if let Some(body) = &request.body {
        command.push_str(&format!(" --data '{}'", String::from_utf8_lossy(body)));
    }

    command.push_str(&format!(" '{}'", request.url));
    command
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::{HeaderMap, HeaderValue};
    use url::Url;

    fn request() -> WireRequest {
        let mut headers = HeaderMap::new();
        headers.insert("content-type", HeaderValue::from_static("application/json"));
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer secret"));
        WireRequest {
            method: Method::POST,
            url: Url::parse("https://api.test.com/users?page=1").unwrap(),
            headers,
            body: Some(br#"{"name":"A"}"#.to_vec()),
        }
    }

    #[test]
    fn curl_includes_method_headers_body_and_url() {
        let rendered = curl_command(&request());
        assert!(rendered.starts_with("curl -X POST"));
        assert!(rendered.contains("-H 'content-type: application/json'"));
        assert!(rendered.contains(r#"--data '{"name":"A"}'"#));
        assert!(rendered.ends_with("'https://api.test.com/users?page=1'"));
    }

    #[test]
    fn curl_redacts_authorization() {
        let rendered = curl_command(&request());
        assert!(rendered.contains("-H 'authorization: <redacted>'"));
        assert!(!rendered.contains("secret"));
    }

    #[test]
    fn plain_get_renders_without_explicit_method() {
        let get = WireRequest {
            method: Method::GET,
            url: Url::parse("https://api.test.com/users").unwrap(),
            headers: HeaderMap::new(),
            body: None,
        };
        assert_eq!(curl_command(&get), "curl 'https://api.test.com/users'");
    }
}
