//! Wire request assembly.
//!
//! [`assemble`] is a pure function from a descriptor plus client-level
//! configuration to a fully-formed [`WireRequest`]. It performs no I/O;
//! every failure here short-circuits the call before the network layer is
//! touched.

use crate::auth::{AuthMode, TokenSource};
use crate::descriptor::RequestDescriptor;
use crate::error::BuildError;
use http::header::{AUTHORIZATION, CONTENT_TYPE};
use http::{HeaderMap, HeaderValue, Method};
use url::Url;

/// A fully-resolved HTTP request, ready for the transport.
#[derive(Debug, Clone)]
pub struct WireRequest {
    /// The HTTP method.
    pub method: Method,
    /// The final URL, including any query string.
    pub url: Url,
    /// Merged headers: client defaults, descriptor headers, auth.
    pub headers: HeaderMap,
    /// Serialized body bytes, if the descriptor carries a body.
    pub body: Option<Vec<u8>>,
}

/// Assembles a wire request from a descriptor and client configuration.
///
/// The endpoint is joined onto the base address with exactly one `/`
/// between them; one leading separator on the endpoint is dropped so
/// `"https://api.test.com"` + `"/users/1"` and `"users/1"` produce the
/// same URL. The query string is omitted entirely when the final
/// parameter list is empty.
pub(crate) fn assemble(
    descriptor: &RequestDescriptor,
    base_address: &str,
    default_headers: &HeaderMap,
    token_source: Option<&dyn TokenSource>,
) -> std::result::Result<WireRequest, BuildError> {
    let base = Url::parse(base_address).map_err(BuildError::InvalidBaseAddress)?;

    let endpoint = descriptor
        .path
        .strip_prefix('/')
        .unwrap_or(&descriptor.path);
    let joined = if base.as_str().ends_with('/') {
        format!("{base}{endpoint}")
    } else {
        format!("{base}/{endpoint}")
    };
    let mut url = Url::parse(&joined).map_err(|source| BuildError::InvalidEndpoint {
        endpoint: descriptor.path.clone(),
        source,
    })?;

    let mut headers = default_headers.clone();
    for (name, value) in &descriptor.headers {
        headers.insert(name.clone(), value.clone());
    }

    let mut query = descriptor.query.clone();
    match &descriptor.auth {
        AuthMode::None => {}
        AuthMode::Bearer => {
            let token = require_token(token_source)?;
            let value = HeaderValue::try_from(format!("Bearer {token}"))
                .map_err(|_| BuildError::InvalidHeader(AUTHORIZATION.to_string()))?;
            headers.insert(AUTHORIZATION, value);
        }
        AuthMode::ApiKeyQuery { parameter } => {
            let token = require_token(token_source)?;
            query.push((parameter.clone(), token));
        }
    }

    if !query.is_empty() {
        let mut pairs = url.query_pairs_mut();
        for (name, value) in &query {
            pairs.append_pair(name, value);
        }
    }

    let body = match &descriptor.body {
        Some(produce) => Some(produce().map_err(BuildError::BodyEncoding)?),
        None => None,
    };
    if body.is_some() && !headers.contains_key(CONTENT_TYPE) {
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    }

    Ok(WireRequest {
        method: descriptor.method.clone(),
        url,
        headers,
        body,
    })
}

fn require_token(
    token_source: Option<&dyn TokenSource>,
) -> std::result::Result<String, BuildError> {
    token_source
        .and_then(TokenSource::access_token)
        .filter(|token| !token.is_empty())
        .ok_or(BuildError::MissingAuthToken)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::StaticTokenSource;
    use serde::ser::Error as _;

    fn build(descriptor: &RequestDescriptor, base: &str) -> Result<WireRequest, BuildError> {
        assemble(descriptor, base, &HeaderMap::new(), None)
    }

    #[test]
    fn base_and_endpoint_join_with_single_separator() {
        let descriptor = RequestDescriptor::get("/users/123");
        let request = build(&descriptor, "https://api.test.com").unwrap();
        assert_eq!(request.url.as_str(), "https://api.test.com/users/123");
    }

    #[test]
    fn trailing_slash_on_base_is_not_duplicated() {
        let descriptor = RequestDescriptor::get("/users/123");
        let request = build(&descriptor, "https://api.test.com/").unwrap();
        assert_eq!(request.url.as_str(), "https://api.test.com/users/123");
    }

    #[test]
    fn endpoint_without_leading_separator_joins_correctly() {
        let descriptor = RequestDescriptor::get("users/123");
        let request = build(&descriptor, "https://api.test.com").unwrap();
        assert_eq!(request.url.as_str(), "https://api.test.com/users/123");
    }

    #[test]
    fn base_path_segments_are_kept() {
        let descriptor = RequestDescriptor::get("/users");
        let request = build(&descriptor, "https://api.test.com/v2").unwrap();
        assert_eq!(request.url.as_str(), "https://api.test.com/v2/users");
    }

    #[test]
    fn invalid_base_address_fails() {
        let descriptor = RequestDescriptor::get("/users");
        let result = build(&descriptor, "not a url");
        assert!(matches!(result, Err(BuildError::InvalidBaseAddress(_))));
    }

    #[test]
    fn empty_query_list_emits_no_question_mark() {
        let descriptor = RequestDescriptor::get("/users");
        let request = build(&descriptor, "https://api.test.com").unwrap();
        assert!(!request.url.as_str().contains('?'));
        assert_eq!(request.url.query(), None);
    }

    #[test]
    fn query_parameters_keep_order_and_duplicates() {
        let descriptor = RequestDescriptor::get("/search")
            .with_query("tag", "rust")
            .with_query("tag", "http")
            .with_query("page", "2");
        let request = build(&descriptor, "https://api.test.com").unwrap();
        assert_eq!(request.url.query(), Some("tag=rust&tag=http&page=2"));
    }

    #[test]
    fn bearer_auth_sets_the_authorization_header() {
        let tokens = StaticTokenSource::new("tok-123");
        let descriptor = RequestDescriptor::get("/me").with_auth(AuthMode::Bearer);
        let request = assemble(
            &descriptor,
            "https://api.test.com",
            &HeaderMap::new(),
            Some(&tokens),
        )
        .unwrap();
        assert_eq!(
            request.headers.get(AUTHORIZATION).unwrap(),
            "Bearer tok-123"
        );
        assert_eq!(request.url.query(), None);
    }

    #[test]
    fn api_key_auth_appends_after_declared_parameters() {
        let tokens = StaticTokenSource::new("k-9");
        let descriptor = RequestDescriptor::get("/feed")
            .with_query("page", "1")
            .with_auth(AuthMode::api_key_query("api_key"));
        let request = assemble(
            &descriptor,
            "https://api.test.com",
            &HeaderMap::new(),
            Some(&tokens),
        )
        .unwrap();
        assert_eq!(request.url.query(), Some("page=1&api_key=k-9"));
        assert!(request.headers.get(AUTHORIZATION).is_none());
    }

    #[test]
    fn bearer_without_a_token_source_fails_before_the_network() {
        let descriptor = RequestDescriptor::get("/me").with_auth(AuthMode::Bearer);
        let result = build(&descriptor, "https://api.test.com");
        assert!(matches!(result, Err(BuildError::MissingAuthToken)));
    }

    #[test]
    fn empty_token_counts_as_missing() {
        let tokens = StaticTokenSource::new("");
        let descriptor = RequestDescriptor::get("/me").with_auth(AuthMode::Bearer);
        let result = assemble(
            &descriptor,
            "https://api.test.com",
            &HeaderMap::new(),
            Some(&tokens),
        );
        assert!(matches!(result, Err(BuildError::MissingAuthToken)));
    }

    #[test]
    fn descriptor_headers_override_defaults() {
        let mut defaults = HeaderMap::new();
        defaults.insert("accept", HeaderValue::from_static("text/plain"));
        defaults.insert("x-client", HeaderValue::from_static("courier"));

        let descriptor = RequestDescriptor::get("/")
            .with_header("Accept", "application/json")
            .unwrap();
        let request = assemble(&descriptor, "https://api.test.com", &defaults, None).unwrap();

        assert_eq!(request.headers.get("accept").unwrap(), "application/json");
        assert_eq!(request.headers.get("x-client").unwrap(), "courier");
    }

    #[test]
    fn json_body_sets_content_type_and_bytes() {
        #[derive(serde::Serialize)]
        struct NewUser {
            name: &'static str,
        }

        let descriptor = RequestDescriptor::post("/users").with_json(NewUser { name: "A" });
        let request = build(&descriptor, "https://api.test.com").unwrap();
        assert_eq!(request.body.as_deref(), Some(&br#"{"name":"A"}"#[..]));
        assert_eq!(
            request.headers.get(CONTENT_TYPE).unwrap(),
            "application/json"
        );
    }

    #[test]
    fn body_producer_failure_becomes_a_build_error() {
        struct Broken;
        impl serde::Serialize for Broken {
            fn serialize<S: serde::Serializer>(&self, _: S) -> Result<S::Ok, S::Error> {
                Err(S::Error::custom("not serializable"))
            }
        }

        let descriptor = RequestDescriptor::post("/items").with_json(Broken);
        let result = build(&descriptor, "https://api.test.com");
        assert!(matches!(result, Err(BuildError::BodyEncoding(_))));
    }
}
