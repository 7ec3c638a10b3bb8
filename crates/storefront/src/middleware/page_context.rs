//! Per-request data every full page needs.

use axum::{extract::FromRequestParts, http::request::Parts};

use super::auth::OptionalConsumer;
use super::csp::CspNonce;

/// Navigation and security data shared by page templates.
#[derive(Debug, Clone, Default)]
pub struct PageContext {
    /// CSP nonce for `<script>` tags.
    pub nonce: String,
    /// Name of the signed-in consumer, if any.
    pub consumer_name: Option<String>,
    /// Request path, for highlighting the active nav link.
    pub path: String,
}

impl PageContext {
    /// Whether a consumer is signed in.
    #[must_use]
    pub const fn signed_in(&self) -> bool {
        self.consumer_name.is_some()
    }

    /// Whether the current path is under `prefix`.
    #[must_use]
    pub fn is_active(&self, prefix: &str) -> bool {
        if prefix == "/" {
            self.path == "/"
        } else {
            self.path.starts_with(prefix)
        }
    }
}

impl<S> FromRequestParts<S> for PageContext
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let CspNonce(nonce) = CspNonce::from_request_parts(parts, state).await?;
        let OptionalConsumer(consumer) = OptionalConsumer::from_request_parts(parts, state).await?;

        Ok(Self {
            nonce,
            consumer_name: consumer.map(|c| c.name),
            path: super::auth::original_uri(parts).path().to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_active() {
        let page = PageContext {
            path: "/stores/green-grocer".to_string(),
            ..PageContext::default()
        };
        assert!(page.is_active("/stores"));
        assert!(!page.is_active("/"));
        assert!(!page.is_active("/products"));
        assert!(!page.signed_in());
    }
}
