//! Per-request data every dashboard page needs.

use axum::{extract::FromRequestParts, http::request::Parts};

use super::auth::OptionalMerchant;
use super::csp::CspNonce;

/// Navigation and security data shared by page templates.
#[derive(Debug, Clone, Default)]
pub struct PageContext {
    /// CSP nonce for `<script>` tags.
    pub nonce: String,
    /// Name of the signed-in merchant, if any.
    pub merchant_name: Option<String>,
    /// Request path, for highlighting the active nav link.
    pub path: String,
}

impl PageContext {
    #[must_use]
    pub const fn signed_in(&self) -> bool {
        self.merchant_name.is_some()
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
        let OptionalMerchant(merchant) = OptionalMerchant::from_request_parts(parts, state).await?;

        Ok(Self {
            nonce,
            merchant_name: merchant.map(|m| m.name),
            path: super::auth::original_uri(parts).path().to_string(),
        })
    }
}
