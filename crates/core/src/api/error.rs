//! Errors returned by the marketplace backend client.

use thiserror::Error;

/// Message shown when a failure has nothing more useful to say.
const GENERIC_MESSAGE: &str = "Something went wrong. Please try again.";

/// Errors that can occur when talking to the marketplace backend.
#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP request failed before a response arrived (connect, timeout, body).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Backend answered with a non-success status.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Credentials are missing, invalid, or expired.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Rate limited by the backend.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// Backend answered `success: false`.
    #[error("Rejected: {0}")]
    Rejected(String),

    /// Successful envelope without the expected `data`.
    #[error("Response has no data")]
    MissingData,

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// The configured base URL cannot carry a path.
    #[error("Invalid endpoint: {0}")]
    InvalidEndpoint(String),
}

impl ApiError {
    /// Whether retrying the same request could succeed.
    ///
    /// Transport failures and 5xx responses are transient. Everything the
    /// backend deliberately answered (4xx, `success: false`) is not.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Http(_) => true,
            Self::Api { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// Whether the caller's token was refused.
    #[must_use]
    pub const fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized(_))
    }

    /// Whether the requested resource does not exist.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// Text safe to show to the person using the site.
    ///
    /// Backend-provided messages for client errors are passed through
    /// verbatim; server and transport failures get a generic message.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Api { status, message } if *status < 500 && !message.is_empty() => {
                message.clone()
            }
            Self::Unauthorized(message) | Self::NotFound(message) | Self::Rejected(message)
                if !message.is_empty() =>
            {
                message.clone()
            }
            Self::RateLimited(_) => "Too many requests. Please wait a moment and try again.".into(),
            Self::Http(e) if e.is_timeout() => {
                "The marketplace is taking too long to respond. Please try again.".into()
            }
            _ => GENERIC_MESSAGE.into(),
        }
    }
}
