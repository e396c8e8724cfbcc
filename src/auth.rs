//! Authentication modes and token sourcing.
//!
//! A request declares *how* it authenticates via [`AuthMode`]; *where* the
//! credential comes from is the [`TokenSource`] collaborator injected once
//! at client construction. The request builder consults the source only
//! for modes that need a token, and fails the build — never reaching the
//! network — when one is required but unavailable.

/// How a request authenticates itself.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum AuthMode {
    /// No credentials are attached.
    #[default]
    None,

    /// The token is sent as `Authorization: Bearer <token>`.
    Bearer,

    /// The token is appended to the query string under the given
    /// parameter name.
    ApiKeyQuery {
        /// Query parameter name carrying the key.
        parameter: String,
    },
}

impl AuthMode {
    /// Convenience constructor for [`AuthMode::ApiKeyQuery`].
    pub fn api_key_query(parameter: impl Into<String>) -> Self {
        Self::ApiKeyQuery {
            parameter: parameter.into(),
        }
    }

    /// Whether this mode needs a token from the token source.
    pub fn requires_token(&self) -> bool {
        !matches!(self, Self::None)
    }
}

/// Supplies access tokens to the request builder.
///
/// Implementations are long-lived, shared collaborators and may be called
/// concurrently from simultaneous requests. Caching and refresh are the
/// implementation's concern; the builder only asks for the current token.
pub trait TokenSource: Send + Sync {
    /// Returns the current access token, or `None` when unavailable.
    fn access_token(&self) -> Option<String>;
}

impl<F> TokenSource for F
where
    F: Fn() -> Option<String> + Send + Sync,
{
    fn access_token(&self) -> Option<String> {
        self()
    }
}

/// A token source that always yields the same token.
#[derive(Debug, Clone)]
pub struct StaticTokenSource {
    token: String,
}

impl StaticTokenSource {
    /// Creates a source yielding `token` forever.
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

impl TokenSource for StaticTokenSource {
    fn access_token(&self) -> Option<String> {
        Some(self.token.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn static_source_yields_its_token() {
        let source = StaticTokenSource::new("s3cret");
        assert_eq!(source.access_token().as_deref(), Some("s3cret"));
    }

    #[test]
    fn closures_are_token_sources() {
        let source = || Some("from-closure".to_string());
        assert_eq!(source.access_token().as_deref(), Some("from-closure"));
    }

    #[test]
    fn only_none_mode_skips_the_token() {
        assert!(!AuthMode::None.requires_token());
        assert!(AuthMode::Bearer.requires_token());
        assert!(AuthMode::api_key_query("api_key").requires_token());
    }
}
