//! HTTP middleware stack for the dashboard.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (capture errors, transactions)
//! 2. `TraceLayer` (request tracing)
//! 3. Request ID (add unique ID to each request)
//! 4. CSP nonce (generate per-request nonce)
//! 5. Security headers (no caching, no indexing, no referrer)
//! 6. Session layer (tower-sessions with `PostgreSQL` store)
//! 7. Session expiry (sign out when the backend refuses the merchant's token)
//! 8. Rate limiting on login (governor)

pub mod auth;
pub mod csp;
pub mod page_context;
pub mod rate_limit;
pub mod request_id;
pub mod security_headers;
pub mod session;
pub mod session_expiry;

pub use auth::{
    OptionalMerchant, RequireMerchant, clear_current_merchant, is_htmx, redirect_browser,
    safe_next, set_current_merchant,
};
pub use csp::{CspNonce, csp_nonce_middleware};
pub use page_context::PageContext;
pub use rate_limit::login_rate_limiter;
pub use request_id::{RequestId, request_id_middleware};
pub use security_headers::security_headers_middleware;
pub use session::{create_session_layer, session_layer};
pub use session_expiry::{SessionExpired, session_expiry_middleware};
