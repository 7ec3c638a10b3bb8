//! Integration test support for Bazaar.
//!
//! Each test starts a [`FakeBackend`] (a scripted stand-in for the
//! marketplace REST API) and one of the web apps pointed at it. Apps keep
//! sessions in memory, so no database is needed; the `PostgreSQL` pool is
//! created lazily and never connected.
//!
//! ```rust,ignore
//! let backend = FakeBackend::start().await;
//! backend.on("GET", "/api/stores", Reply::page(json!([...]), 1, 1));
//!
//! let app = TestApp::storefront(&backend).await;
//! let response = app.get("/stores").await;
//! assert_eq!(backend.requests("GET", "/api/stores").len(), 1);
//! ```

use std::collections::{HashMap, VecDeque};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, PoisonError};

use axum::Router;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tower_sessions::MemoryStore;

/// Session database URL handed to the apps; never connected.
const UNUSED_DATABASE_URL: &str = "postgres://localhost/bazaar_integration";

// =============================================================================
// Fake backend
// =============================================================================

/// A canned backend response.
#[derive(Debug, Clone)]
pub struct Reply {
    pub status: u16,
    pub body: Value,
}

impl Reply {
    /// `200` envelope carrying `data`.
    #[must_use]
    pub fn ok(data: Value) -> Self {
        Self {
            status: 200,
            body: json!({ "success": true, "data": data }),
        }
    }

    /// `200` list envelope with pagination.
    #[must_use]
    pub fn page(items: Value, page: u32, total_pages: u32) -> Self {
        Self {
            status: 200,
            body: json!({
                "success": true,
                "data": items,
                "pagination": { "page": page, "totalPages": total_pages }
            }),
        }
    }

    /// Failure envelope with `message`.
    #[must_use]
    pub fn error(status: u16, message: &str) -> Self {
        Self {
            status,
            body: json!({ "success": false, "message": message }),
        }
    }
}

/// A request the fake backend received.
#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: String,
    pub path: String,
    pub query: Option<String>,
    pub authorization: Option<String>,
    pub body: Option<Value>,
}

impl Recorded {
    /// Value of query parameter `key`, if present.
    #[must_use]
    pub fn query_param(&self, key: &str) -> Option<String> {
        self.query.as_deref()?.split('&').find_map(|pair| {
            let (k, v) = pair.split_once('=').unwrap_or((pair, ""));
            (k == key).then(|| v.to_string())
        })
    }
}

#[derive(Default)]
struct Script {
    /// Replies per `METHOD /path`; the last reply repeats.
    replies: HashMap<String, VecDeque<Reply>>,
    received: Vec<Recorded>,
}

/// Scripted stand-in for the marketplace REST API.
#[derive(Clone)]
pub struct FakeBackend {
    /// Root to configure as `MARKETPLACE_API_URL`.
    pub api_url: String,
    script: Arc<Mutex<Script>>,
}

impl FakeBackend {
    /// Start the fake on an ephemeral port.
    ///
    /// # Panics
    ///
    /// Panics if no local port can be bound.
    pub async fn start() -> Self {
        let script = Arc::new(Mutex::new(Script::default()));
        let app = Router::new()
            .fallback(respond)
            .with_state(Arc::clone(&script));

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind fake backend");
        let addr = listener.local_addr().expect("fake backend address");
        tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });

        Self {
            api_url: format!("http://{addr}/api/"),
            script,
        }
    }

    /// Queue `reply` for `method path`. Once the queue is down to its last
    /// reply, that reply is served for every further request.
    pub fn on(&self, method: &str, path: &str, reply: Reply) {
        self.lock()
            .replies
            .entry(key(method, path))
            .or_default()
            .push_back(reply);
    }

    /// Every request received for `method path`, oldest first.
    #[must_use]
    pub fn requests(&self, method: &str, path: &str) -> Vec<Recorded> {
        self.lock()
            .received
            .iter()
            .filter(|r| r.method == method && r.path == path)
            .cloned()
            .collect()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Script> {
        self.script.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn key(method: &str, path: &str) -> String {
    format!("{} {path}", method.to_uppercase())
}

async fn respond(
    State(script): State<Arc<Mutex<Script>>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let mut script = script.lock().unwrap_or_else(PoisonError::into_inner);

    script.received.push(Recorded {
        method: method.to_string(),
        path: uri.path().to_string(),
        query: uri.query().map(str::to_string),
        authorization: headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
        body: serde_json::from_slice(&body).ok(),
    });

    let reply = script
        .replies
        .get_mut(&key(method.as_str(), uri.path()))
        .and_then(|queue| {
            if queue.len() > 1 {
                queue.pop_front()
            } else {
                queue.front().cloned()
            }
        })
        .unwrap_or_else(|| Reply::error(404, "Not found"));

    let status = StatusCode::from_u16(reply.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, axum::Json(reply.body)).into_response()
}

// =============================================================================
// Apps under test
// =============================================================================

/// A running web app and a browser-like client for it.
///
/// The client keeps cookies and does not follow redirects, so tests can
/// assert on `Location` headers.
pub struct TestApp {
    pub url: String,
    pub client: reqwest::Client,
}

impl TestApp {
    /// Start the storefront against `backend`.
    ///
    /// # Panics
    ///
    /// Panics if the app cannot be configured or bound.
    pub async fn storefront(backend: &FakeBackend) -> Self {
        use bazaar_storefront::{build_router, config::StorefrontConfig, middleware, state::AppState};

        let config = StorefrontConfig::from_lookup(&|key: &str| match key {
            "STOREFRONT_DATABASE_URL" => Some(UNUSED_DATABASE_URL.to_string()),
            "STOREFRONT_BASE_URL" => Some("http://127.0.0.1".to_string()),
            "ORDER_POLL_INTERVAL_SECS" => Some("15".to_string()),
            key => shared_setting(backend, key),
        })
        .expect("storefront config");
        let state = AppState::new(config, lazy_pool()).expect("storefront state");

        Self::serve(build_router(
            state,
            middleware::session_layer(MemoryStore::default(), false),
        ))
        .await
    }

    /// Start the merchant dashboard against `backend`.
    ///
    /// # Panics
    ///
    /// Panics if the app cannot be configured or bound.
    pub async fn dashboard(backend: &FakeBackend) -> Self {
        use bazaar_dashboard::{build_router, config::DashboardConfig, middleware, state::AppState};

        let config = DashboardConfig::from_lookup(&|key: &str| match key {
            "DASHBOARD_DATABASE_URL" => Some(UNUSED_DATABASE_URL.to_string()),
            "DASHBOARD_BASE_URL" => Some("http://127.0.0.1".to_string()),
            "DASHBOARD_REFRESH_INTERVAL_SECS" => Some("20".to_string()),
            key => shared_setting(backend, key),
        })
        .expect("dashboard config");
        let state = AppState::new(config, lazy_pool()).expect("dashboard state");

        Self::serve(build_router(
            state,
            middleware::session_layer(MemoryStore::default(), false),
        ))
        .await
    }

    async fn serve(app: Router) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind app");
        let addr = listener.local_addr().expect("app address");
        tokio::spawn(async move {
            axum::serve(
                listener,
                app.into_make_service_with_connect_info::<SocketAddr>(),
            )
            .await
            .ok();
        });

        let client = reqwest::Client::builder()
            .cookie_store(true)
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .expect("test client");

        Self {
            url: format!("http://{addr}"),
            client,
        }
    }

    /// `GET path`.
    ///
    /// # Panics
    ///
    /// Panics if the app does not answer.
    pub async fn get(&self, path: &str) -> reqwest::Response {
        self.client
            .get(format!("{}{path}", self.url))
            .send()
            .await
            .expect("GET request")
    }

    /// `GET path` as an HTMX request.
    ///
    /// # Panics
    ///
    /// Panics if the app does not answer.
    pub async fn htmx_get(&self, path: &str) -> reqwest::Response {
        self.client
            .get(format!("{}{path}", self.url))
            .header("HX-Request", "true")
            .send()
            .await
            .expect("HTMX request")
    }

    /// `POST path` with a form body.
    ///
    /// # Panics
    ///
    /// Panics if the app does not answer.
    pub async fn post_form(&self, path: &str, form: &[(&str, &str)]) -> reqwest::Response {
        self.client
            .post(format!("{}{path}", self.url))
            .form(form)
            .send()
            .await
            .expect("POST request")
    }

    /// `POST path` with a form body, as an HTMX request.
    ///
    /// # Panics
    ///
    /// Panics if the app does not answer.
    pub async fn htmx_post_form(&self, path: &str, form: &[(&str, &str)]) -> reqwest::Response {
        self.client
            .post(format!("{}{path}", self.url))
            .header("HX-Request", "true")
            .form(form)
            .send()
            .await
            .expect("HTMX POST request")
    }

    /// Sign in through the login form.
    ///
    /// # Panics
    ///
    /// Panics unless the app redirects after signing in.
    pub async fn sign_in(&self, email: &str) {
        let response = self
            .post_form("/login", &[("email", email), ("password", "correct horse")])
            .await;
        assert_eq!(response.status(), reqwest::StatusCode::SEE_OTHER, "sign in");
    }
}

/// Settings both apps read.
fn shared_setting(backend: &FakeBackend, key: &str) -> Option<String> {
    match key {
        "MARKETPLACE_API_URL" => Some(backend.api_url.clone()),
        "MARKETPLACE_API_RETRY_ATTEMPTS" => Some("3".to_string()),
        "MARKETPLACE_API_RETRY_DELAY_MS" => Some("10".to_string()),
        "MARKETPLACE_API_TIMEOUT_SECS" => Some("5".to_string()),
        _ => None,
    }
}

fn lazy_pool() -> sqlx::PgPool {
    sqlx::postgres::PgPoolOptions::new()
        .connect_lazy(UNUSED_DATABASE_URL)
        .expect("lazy pool")
}

/// Location header of a redirect.
///
/// # Panics
///
/// Panics if the response has no `Location`.
#[must_use]
pub fn location(response: &reqwest::Response) -> String {
    response
        .headers()
        .get("location")
        .and_then(|v| v.to_str().ok())
        .expect("location header")
        .to_string()
}
