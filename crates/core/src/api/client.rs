//! REST client for the marketplace backend.
//!
//! One client is shared per process. It owns the connection pool, the base
//! URL and the retry policy; the caller passes the bearer token per request
//! since tokens belong to sessions, not to the process.

use std::sync::Arc;
use std::time::Duration;

use reqwest::{Method, StatusCode};
use serde::Serialize;
use serde::de::{DeserializeOwned, IgnoredAny};
use tracing::{debug, instrument, warn};
use url::Url;

use super::{ApiEnvelope, ApiError, Page, RetryPolicy};
use crate::types::AuthToken;

/// Bytes of a response body kept in logs.
const LOG_BODY_LIMIT: usize = 500;

/// Settings for [`ApiClient`].
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// Root of the REST API, e.g. `https://api.example.com/api/v1`.
    pub base_url: Url,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Retry policy for reads.
    pub retry: RetryPolicy,
    /// `User-Agent` sent with every request.
    pub user_agent: String,
}

impl ClientOptions {
    /// Options with default timeout and retry policy.
    #[must_use]
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            timeout: Duration::from_secs(10),
            retry: RetryPolicy::default(),
            user_agent: concat!("bazaar/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// Client for the marketplace REST API.
///
/// Cheap to clone. Reads (`GET`) are retried per the [`RetryPolicy`];
/// mutations are sent exactly once.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    http: reqwest::Client,
    base_url: Url,
    retry: RetryPolicy,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.inner.base_url.as_str())
            .field("retry", &self.inner.retry)
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    /// Create a new client.
    ///
    /// # Errors
    ///
    /// Returns error if the base URL cannot carry a path or the HTTP client
    /// fails to build.
    pub fn new(options: ClientOptions) -> Result<Self, ApiError> {
        if options.base_url.cannot_be_a_base() {
            return Err(ApiError::InvalidEndpoint(options.base_url.to_string()));
        }

        let http = reqwest::Client::builder()
            .timeout(options.timeout)
            .user_agent(options.user_agent)
            .build()?;

        Ok(Self {
            inner: Arc::new(ApiClientInner {
                http,
                base_url: options.base_url,
                retry: options.retry,
            }),
        })
    }

    /// The configured base URL.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    /// Build an endpoint URL from path segments and query pairs.
    ///
    /// Segments are percent-encoded individually, so ids and slugs cannot
    /// escape their position in the path. Empty segments are skipped.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::InvalidEndpoint`] if the base URL cannot carry a path.
    pub fn endpoint(&self, segments: &[&str], query: &[(&str, String)]) -> Result<Url, ApiError> {
        let mut url = self.inner.base_url.clone();
        {
            let mut path = url
                .path_segments_mut()
                .map_err(|()| ApiError::InvalidEndpoint(self.inner.base_url.to_string()))?;
            path.pop_if_empty()
                .extend(segments.iter().filter(|s| !s.is_empty()));
        }
        if !query.is_empty() {
            url.query_pairs_mut()
                .extend_pairs(query.iter().map(|(k, v)| (*k, v.as_str())));
        }
        Ok(url)
    }

    /// `GET` a single resource.
    ///
    /// # Errors
    ///
    /// Returns error if every attempt fails or the envelope has no data.
    pub async fn get<T: DeserializeOwned>(
        &self,
        segments: &[&str],
        query: &[(&str, String)],
        token: Option<&AuthToken>,
    ) -> Result<T, ApiError> {
        let url = self.endpoint(segments, query)?;
        self.read(url, token)
            .await?
            .data
            .ok_or(ApiError::MissingData)
    }

    /// `GET` a list resource with its pagination metadata.
    ///
    /// A missing `data` field is an empty list.
    ///
    /// # Errors
    ///
    /// Returns error if every attempt fails.
    pub async fn get_page<T: DeserializeOwned>(
        &self,
        segments: &[&str],
        query: &[(&str, String)],
        token: Option<&AuthToken>,
    ) -> Result<Page<T>, ApiError> {
        let url = self.endpoint(segments, query)?;
        let envelope = self.read::<Vec<T>>(url, token).await?;
        Ok(Page::from_parts(
            envelope.data.unwrap_or_default(),
            envelope.pagination,
        ))
    }

    /// `POST` a JSON body and decode the returned resource.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the envelope has no data.
    pub async fn post<B, T>(
        &self,
        segments: &[&str],
        body: &B,
        token: Option<&AuthToken>,
    ) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.write(Method::POST, segments, Some(body), token).await
    }

    /// `POST` a JSON body, ignoring any returned data.
    ///
    /// Returns the envelope's `message`, if the backend sent one.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the backend rejects it.
    pub async fn post_unit<B: Serialize + ?Sized>(
        &self,
        segments: &[&str],
        body: &B,
        token: Option<&AuthToken>,
    ) -> Result<Option<String>, ApiError> {
        let url = self.endpoint(segments, &[])?;
        let body = serde_json::to_value(body)?;
        let envelope = self
            .send::<IgnoredAny>(Method::POST, url, Some(&body), token)
            .await?;
        Ok(envelope.message)
    }

    /// `PUT` a JSON body and decode the returned resource.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the envelope has no data.
    pub async fn put<B, T>(
        &self,
        segments: &[&str],
        body: &B,
        token: Option<&AuthToken>,
    ) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.write(Method::PUT, segments, Some(body), token).await
    }

    /// `PATCH` a JSON body and decode the returned resource.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the envelope has no data.
    pub async fn patch<B, T>(
        &self,
        segments: &[&str],
        body: &B,
        token: Option<&AuthToken>,
    ) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.write(Method::PATCH, segments, Some(body), token).await
    }

    /// `DELETE` a resource.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the backend rejects it.
    pub async fn delete(&self, segments: &[&str], token: Option<&AuthToken>) -> Result<(), ApiError> {
        let url = self.endpoint(segments, &[])?;
        self.send::<IgnoredAny>(Method::DELETE, url, None, token)
            .await?;
        Ok(())
    }

    /// Send a mutation once and unwrap its data.
    async fn write<B, T>(
        &self,
        method: Method,
        segments: &[&str],
        body: Option<&B>,
        token: Option<&AuthToken>,
    ) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.endpoint(segments, &[])?;
        let body = body.map(serde_json::to_value).transpose()?;
        self.send(method, url, body.as_ref(), token)
            .await?
            .data
            .ok_or(ApiError::MissingData)
    }

    /// `GET` with the retry policy applied.
    async fn read<T: DeserializeOwned>(
        &self,
        url: Url,
        token: Option<&AuthToken>,
    ) -> Result<ApiEnvelope<T>, ApiError> {
        let policy = self.inner.retry;
        let mut attempt = 1;

        loop {
            match self.send(Method::GET, url.clone(), None, token).await {
                Err(err) if err.is_transient() && policy.allows_another(attempt) => {
                    warn!(
                        url = %url,
                        attempt,
                        max_attempts = policy.max_attempts,
                        error = %err,
                        "Backend read failed, retrying"
                    );
                    tokio::time::sleep(policy.delay).await;
                    attempt += 1;
                }
                result => return result,
            }
        }
    }

    /// Send one request and decode the envelope.
    #[instrument(skip_all, fields(method = %method, url = %url))]
    async fn send<T: DeserializeOwned>(
        &self,
        method: Method,
        url: Url,
        body: Option<&serde_json::Value>,
        token: Option<&AuthToken>,
    ) -> Result<ApiEnvelope<T>, ApiError> {
        let mut request = self
            .inner
            .http
            .request(method, url)
            .header(reqwest::header::ACCEPT, "application/json");
        if let Some(token) = token {
            request = request.bearer_auth(token.expose());
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(1);
            return Err(ApiError::RateLimited(retry_after));
        }

        let response_text = response.text().await?;

        if !status.is_success() {
            let message = error_message(&response_text).unwrap_or_else(|| {
                status
                    .canonical_reason()
                    .unwrap_or("Request failed")
                    .to_string()
            });
            debug!(
                status = %status,
                body = %truncate(&response_text),
                "Backend returned non-success status"
            );
            return Err(match status {
                StatusCode::UNAUTHORIZED => ApiError::Unauthorized(message),
                StatusCode::NOT_FOUND => ApiError::NotFound(message),
                _ => ApiError::Api {
                    status: status.as_u16(),
                    message,
                },
            });
        }

        if response_text.trim().is_empty() {
            return Ok(ApiEnvelope::empty());
        }

        let envelope: ApiEnvelope<T> = match serde_json::from_str(&response_text) {
            Ok(envelope) => envelope,
            Err(e) => {
                tracing::error!(
                    error = %e,
                    body = %truncate(&response_text),
                    "Failed to parse backend response"
                );
                return Err(ApiError::Parse(e));
            }
        };

        if !envelope.success {
            return Err(ApiError::Rejected(envelope.message.unwrap_or_default()));
        }

        Ok(envelope)
    }
}

/// Pull the human-readable message out of an error body.
fn error_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    ["message", "error"]
        .into_iter()
        .find_map(|key| value.get(key).and_then(serde_json::Value::as_str))
        .filter(|m| !m.trim().is_empty())
        .map(str::to_string)
}

fn truncate(body: &str) -> String {
    body.chars().take(LOG_BODY_LIMIT).collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn client(base: &str) -> ApiClient {
        ApiClient::new(ClientOptions::new(Url::parse(base).unwrap())).unwrap()
    }

    #[test]
    fn test_endpoint_joins_segments() {
        let api = client("https://api.example.com/api/v1");
        let url = api.endpoint(&["stores", "fresh-farm", "products"], &[]).unwrap();
        assert_eq!(url.as_str(), "https://api.example.com/api/v1/stores/fresh-farm/products");
    }

    #[test]
    fn test_endpoint_trailing_slash_base() {
        let api = client("https://api.example.com/api/v1/");
        let url = api.endpoint(&["zones"], &[]).unwrap();
        assert_eq!(url.as_str(), "https://api.example.com/api/v1/zones");
    }

    #[test]
    fn test_endpoint_encodes_segments() {
        let api = client("https://api.example.com");
        let url = api.endpoint(&["orders", "track", "../admin"], &[]).unwrap();
        assert_eq!(url.path(), "/orders/track/..%2Fadmin");
    }

    #[test]
    fn test_endpoint_query_pairs() {
        let api = client("https://api.example.com");
        let url = api
            .endpoint(
                &["products"],
                &[("search", "fresh bread".to_string()), ("page", "2".to_string())],
            )
            .unwrap();
        assert_eq!(url.query(), Some("search=fresh+bread&page=2"));
    }

    #[test]
    fn test_rejects_non_base_url() {
        let options = ClientOptions::new(Url::parse("mailto:ops@example.com").unwrap());
        assert!(matches!(
            ApiClient::new(options),
            Err(ApiError::InvalidEndpoint(_))
        ));
    }

    #[test]
    fn test_error_message_extraction() {
        assert_eq!(
            error_message(r#"{"success": false, "message": "Invalid credentials"}"#),
            Some("Invalid credentials".to_string())
        );
        assert_eq!(
            error_message(r#"{"error": "Store closed"}"#),
            Some("Store closed".to_string())
        );
        assert_eq!(error_message("<html>Bad Gateway</html>"), None);
        assert_eq!(error_message(r#"{"message": "  "}"#), None);
    }

    #[tokio::test]
    async fn test_connection_refused_is_transient() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let mut options = ClientOptions::new(Url::parse(&format!("http://{addr}/api/")).unwrap());
        options.retry = RetryPolicy {
            max_attempts: 2,
            delay: Duration::from_millis(5),
        };
        let api = ApiClient::new(options).unwrap();

        let err = api
            .get_page::<serde_json::Value>(&["zones"], &[], None)
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Http(_)));
        assert!(err.is_transient());
        assert_eq!(err.user_message(), "Something went wrong. Please try again.");
    }
}
