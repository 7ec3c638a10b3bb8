//! Marketplace backend response conventions and HTTP plumbing.
//!
//! Every backend endpoint answers with the same envelope:
//!
//! ```json
//! { "success": true, "data": { ... }, "message": "optional text" }
//! ```
//!
//! List endpoints add a `pagination` object. Failures carry a human-readable
//! `message`, which the front ends render inline.

#[cfg(feature = "http")]
mod client;
#[cfg(feature = "http")]
mod error;

use std::time::Duration;

use serde::Deserialize;

#[cfg(feature = "http")]
pub use client::{ApiClient, ClientOptions};
#[cfg(feature = "http")]
pub use error::ApiError;

/// The backend's response wrapper.
#[derive(Debug, Deserialize)]
pub struct ApiEnvelope<T> {
    #[serde(default = "default_true")]
    pub success: bool,
    pub data: Option<T>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub pagination: Option<Pagination>,
}

impl<T> ApiEnvelope<T> {
    /// Envelope for an empty successful response (e.g. `204 No Content`).
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            success: true,
            data: None,
            message: None,
            pagination: None,
        }
    }
}

/// Pagination metadata attached to list responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: u32,
    pub total_pages: u32,
    #[serde(default)]
    pub total: Option<u64>,
}

/// One page of a list endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// 1-indexed page number.
    pub page: u32,
    pub total_pages: u32,
    pub total: Option<u64>,
}

impl<T> Page<T> {
    /// Build a page from list data and optional pagination metadata.
    ///
    /// Without metadata the list is treated as the only page.
    #[must_use]
    pub fn from_parts(items: Vec<T>, pagination: Option<Pagination>) -> Self {
        match pagination {
            Some(p) => Self {
                items,
                page: p.page.max(1),
                total_pages: p.total_pages.max(1),
                total: p.total,
            },
            None => Self {
                total: Some(items.len() as u64),
                items,
                page: 1,
                total_pages: 1,
            },
        }
    }

    /// An empty first page.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            items: Vec::new(),
            page: 1,
            total_pages: 1,
            total: Some(0),
        }
    }

    #[must_use]
    pub const fn has_next(&self) -> bool {
        self.page < self.total_pages
    }

    #[must_use]
    pub const fn has_previous(&self) -> bool {
        self.page > 1
    }
}

/// Fixed-delay retry for idempotent reads.
///
/// No backoff curve and no jitter: a failed read is retried after the same
/// delay until `max_attempts` total attempts have been made.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first one. Zero is treated as one.
    pub max_attempts: u32,
    /// Pause between attempts.
    pub delay: Duration,
}

impl RetryPolicy {
    /// Default number of attempts.
    pub const DEFAULT_ATTEMPTS: u32 = 3;
    /// Default pause between attempts.
    pub const DEFAULT_DELAY: Duration = Duration::from_secs(1);

    /// A policy that never retries.
    #[must_use]
    pub const fn none() -> Self {
        Self {
            max_attempts: 1,
            delay: Duration::ZERO,
        }
    }

    /// Whether another attempt is allowed after `attempt` attempts failed.
    #[must_use]
    pub const fn allows_another(&self, attempt: u32) -> bool {
        attempt < self.max_attempts
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: Self::DEFAULT_ATTEMPTS,
            delay: Self::DEFAULT_DELAY,
        }
    }
}

const fn default_true() -> bool {
    true
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_with_data() {
        let env: ApiEnvelope<Vec<u32>> =
            serde_json::from_str(r#"{"success": true, "data": [1, 2]}"#).unwrap();
        assert!(env.success);
        assert_eq!(env.data, Some(vec![1, 2]));
        assert!(env.pagination.is_none());
    }

    #[test]
    fn test_envelope_failure_message() {
        let env: ApiEnvelope<u32> =
            serde_json::from_str(r#"{"success": false, "message": "Out of stock"}"#).unwrap();
        assert!(!env.success);
        assert!(env.data.is_none());
        assert_eq!(env.message.as_deref(), Some("Out of stock"));
    }

    #[test]
    fn test_envelope_missing_success_is_success() {
        let env: ApiEnvelope<u32> = serde_json::from_str(r#"{"data": 7}"#).unwrap();
        assert!(env.success);
    }

    #[test]
    fn test_page_from_pagination() {
        let env: ApiEnvelope<Vec<u32>> = serde_json::from_str(
            r#"{"success": true, "data": [1], "pagination": {"page": 2, "totalPages": 3, "total": 25}}"#,
        )
        .unwrap();
        let page = Page::from_parts(env.data.unwrap(), env.pagination);
        assert_eq!(page.page, 2);
        assert!(page.has_next());
        assert!(page.has_previous());
        assert_eq!(page.total, Some(25));
    }

    #[test]
    fn test_page_without_pagination_is_single_page() {
        let page = Page::from_parts(vec!["a", "b"], None);
        assert_eq!(page.page, 1);
        assert_eq!(page.total_pages, 1);
        assert_eq!(page.total, Some(2));
        assert!(!page.has_next());
        assert!(!page.has_previous());
    }

    #[test]
    fn test_retry_policy_default_is_three_attempts_one_second() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts, 3);
        assert_eq!(policy.delay, Duration::from_secs(1));
        assert!(policy.allows_another(1));
        assert!(policy.allows_another(2));
        assert!(!policy.allows_another(3));
        assert!(!RetryPolicy::none().allows_another(1));
    }
}
