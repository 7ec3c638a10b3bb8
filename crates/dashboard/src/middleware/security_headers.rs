//! Security headers for dashboard responses.
//!
//! Stricter than a public site: nothing is cached, nothing is indexed and
//! no referrer leaves the dashboard. The CSP carries the request's nonce,
//! so this must run outside [`super::csp_nonce_middleware`].

use axum::{
    extract::Request,
    http::{
        HeaderName, HeaderValue,
        header::{
            CACHE_CONTROL, CONTENT_SECURITY_POLICY, REFERRER_POLICY, STRICT_TRANSPORT_SECURITY,
            X_CONTENT_TYPE_OPTIONS, X_FRAME_OPTIONS,
        },
    },
    middleware::Next,
    response::Response,
};

use super::CspNonce;

/// Origin htmx is loaded from.
pub const HTMX_ORIGIN: &str = "https://unpkg.com";

/// Build the `Content-Security-Policy` value for a nonce.
#[must_use]
pub fn content_security_policy(nonce: Option<&str>) -> String {
    let script_src = match nonce {
        Some(nonce) if !nonce.is_empty() => format!("'self' {HTMX_ORIGIN} 'nonce-{nonce}'"),
        _ => format!("'self' {HTMX_ORIGIN}"),
    };

    format!(
        "default-src 'none'; \
         script-src {script_src}; \
         style-src 'self'; \
         img-src 'self' https: data:; \
         connect-src 'self'; \
         object-src 'none'; \
         base-uri 'self'; \
         form-action 'self'; \
         frame-ancestors 'none'"
    )
}

/// Add security headers to all responses.
pub async fn security_headers_middleware(request: Request, next: Next) -> Response {
    let nonce = request.extensions().get::<CspNonce>().cloned();
    let secure = request
        .uri()
        .scheme_str()
        .is_some_and(|scheme| scheme == "https")
        || request
            .headers()
            .get("x-forwarded-proto")
            .is_some_and(|v| v.as_bytes() == b"https");
    let mut response = next.run(request).await;
    let headers = response.headers_mut();

    headers.insert(X_FRAME_OPTIONS, HeaderValue::from_static("DENY"));
    headers.insert(X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff"));
    headers.insert(REFERRER_POLICY, HeaderValue::from_static("no-referrer"));
    headers.insert(
        HeaderName::from_static("x-robots-tag"),
        HeaderValue::from_static("noindex, nofollow"),
    );

    if let Ok(csp) = HeaderValue::from_str(&content_security_policy(
        nonce.as_ref().map(CspNonce::value),
    )) {
        headers.insert(CONTENT_SECURITY_POLICY, csp);
    }

    // Static assets keep their own caching headers.
    if !headers.contains_key(CACHE_CONTROL) {
        headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-store"));
    }

    if secure {
        headers.insert(
            STRICT_TRANSPORT_SECURITY,
            HeaderValue::from_static("max-age=31536000; includeSubDomains"),
        );
    }

    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_csp_allows_htmx_with_nonce() {
        let csp = content_security_policy(Some("n0nce"));
        assert!(csp.contains("script-src 'self' https://unpkg.com 'nonce-n0nce'"));
        assert!(csp.contains("frame-ancestors 'none'"));
        assert!(!content_security_policy(Some("")).contains("nonce-"));
    }
}
