// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-process mock of the agency REST API.

use agency_portal::auth::Navigator;
use agency_portal::config::Config;
use agency_portal::session::{MemoryTokenStore, StoredSession, TokenStore};
use agency_portal::time_utils::{Clock, ManualClock};
use agency_portal::Portal;
use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{delete, get, patch, post},
    Json, Router,
};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

#[allow(dead_code)]
pub const PASSWORD: &str = "correct-horse";

#[allow(dead_code)]
pub const INVITATION: &str = "invite-7f3a";

/// Mutable backend behaviour plus per-route hit counters.
pub struct BackendState {
    hits: Mutex<HashMap<&'static str, usize>>,
    access_token: Mutex<String>,
    refresh_token: Mutex<String>,
    issued: AtomicUsize,
    /// Refresh endpoint answers 401 when false
    pub refresh_ok: AtomicBool,
    /// Protected routes answer 401 even for the current token
    pub reject_all: AtomicBool,
    /// Profile endpoint answers 500
    pub profile_fails: AtomicBool,
    /// Services endpoint answers 500
    pub services_fail: AtomicBool,
    pub user_status: Mutex<String>,
    pub last_contact: Mutex<Option<Value>>,
}

impl Default for BackendState {
    fn default() -> Self {
        Self {
            hits: Mutex::new(HashMap::new()),
            access_token: Mutex::new("access-1".to_string()),
            refresh_token: Mutex::new("refresh-1".to_string()),
            issued: AtomicUsize::new(1),
            refresh_ok: AtomicBool::new(true),
            reject_all: AtomicBool::new(false),
            profile_fails: AtomicBool::new(false),
            services_fail: AtomicBool::new(false),
            user_status: Mutex::new("Active".to_string()),
            last_contact: Mutex::new(None),
        }
    }
}

impl BackendState {
    fn hit(&self, route: &'static str) {
        *self.hits.lock().unwrap().entry(route).or_default() += 1;
    }

    #[allow(dead_code)]
    pub fn hits(&self, route: &str) -> usize {
        self.hits.lock().unwrap().get(route).copied().unwrap_or(0)
    }

    #[allow(dead_code)]
    pub fn total_hits(&self) -> usize {
        self.hits.lock().unwrap().values().sum()
    }

    #[allow(dead_code)]
    pub fn current_access_token(&self) -> String {
        self.access_token.lock().unwrap().clone()
    }

    fn authorized(&self, headers: &HeaderMap) -> bool {
        if self.reject_all.load(Ordering::SeqCst) {
            return false;
        }
        let expected = format!("Bearer {}", self.access_token.lock().unwrap());
        headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v == expected)
    }

    fn issue_tokens(&self) -> Value {
        let n = self.issued.fetch_add(1, Ordering::SeqCst) + 1;
        let access = format!("access-{n}");
        let refresh = format!("refresh-{n}");
        *self.access_token.lock().unwrap() = access.clone();
        *self.refresh_token.lock().unwrap() = refresh.clone();
        json!({ "accessToken": access, "refreshToken": refresh, "role": "Client" })
    }
}

type Shared = Arc<BackendState>;

fn unauthorized() -> Response {
    (StatusCode::UNAUTHORIZED, "Token expired").into_response()
}

async fn login(State(s): State<Shared>, Json(body): Json<Value>) -> Response {
    s.hit("login");
    if body["password"] != PASSWORD {
        return (StatusCode::UNAUTHORIZED, "Invalid credentials").into_response();
    }
    Json(s.issue_tokens()).into_response()
}

async fn refresh(State(s): State<Shared>, Json(body): Json<Value>) -> Response {
    s.hit("refresh");
    let presented = body["refreshToken"].as_str().unwrap_or_default().to_string();
    let current = s.refresh_token.lock().unwrap().clone();
    if !s.refresh_ok.load(Ordering::SeqCst) || presented != current {
        return (StatusCode::UNAUTHORIZED, "Refresh token invalid").into_response();
    }
    Json(s.issue_tokens()).into_response()
}

async fn accept_invitation(State(s): State<Shared>, Json(body): Json<Value>) -> Response {
    s.hit("accept_invitation");
    if body["token"] != INVITATION {
        return (StatusCode::UNAUTHORIZED, "Invitation expired").into_response();
    }
    Json(s.issue_tokens()).into_response()
}

async fn profile(State(s): State<Shared>, headers: HeaderMap) -> Response {
    s.hit("profile");
    if !s.authorized(&headers) {
        return unauthorized();
    }
    if s.profile_fails.load(Ordering::SeqCst) {
        return (StatusCode::INTERNAL_SERVER_ERROR, "Profile service down").into_response();
    }
    Json(json!({
        "id": 42,
        "fullName": "Dana Reyes",
        "email": "dana@example.com",
        "role": "Client",
        "company": "Reyes Studio"
    }))
    .into_response()
}

async fn update_profile(State(s): State<Shared>, headers: HeaderMap) -> Response {
    s.hit("update_profile");
    if !s.authorized(&headers) {
        return unauthorized();
    }
    StatusCode::NO_CONTENT.into_response()
}

async fn services(State(s): State<Shared>) -> Response {
    s.hit("services");
    if s.services_fail.load(Ordering::SeqCst) {
        return (StatusCode::INTERNAL_SERVER_ERROR, "Database unavailable").into_response();
    }
    Json(json!([
        { "id": 1, "title": "Web Development" },
        { "id": 2, "title": "Branding", "description": "Logos and identity" }
    ]))
    .into_response()
}

async fn create_service(State(s): State<Shared>, headers: HeaderMap) -> Response {
    s.hit("create_service");
    if !s.authorized(&headers) {
        return unauthorized();
    }
    (StatusCode::CREATED, Json(json!({ "id": 3, "title": "SEO" }))).into_response()
}

async fn delete_service(
    State(s): State<Shared>,
    Path(_id): Path<String>,
    headers: HeaderMap,
) -> Response {
    s.hit("delete_service");
    if !s.authorized(&headers) {
        return unauthorized();
    }
    StatusCode::NO_CONTENT.into_response()
}

async fn projects(State(s): State<Shared>, headers: HeaderMap) -> Response {
    s.hit("projects");
    if !s.authorized(&headers) {
        return unauthorized();
    }
    Json(json!([{ "id": 1, "title": "Harbor Cafe", "imageUrl": "/img/harbor.png" }]))
        .into_response()
}

async fn pricing(State(s): State<Shared>) -> Response {
    s.hit("pricing");
    // Keep the request in flight long enough for overlapping callers
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    Json(json!([{ "id": 1, "name": "Starter", "price": 499.0, "features": ["5 pages"] }]))
        .into_response()
}

async fn users(State(s): State<Shared>, headers: HeaderMap) -> Response {
    s.hit("users");
    if !s.authorized(&headers) {
        return unauthorized();
    }
    let status = s.user_status.lock().unwrap().clone();
    Json(json!([{
        "id": 7,
        "fullName": "Sam Li",
        "email": "sam@example.com",
        "role": "Client",
        "status": status
    }]))
    .into_response()
}

async fn user_status(
    State(s): State<Shared>,
    Path(_id): Path<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    s.hit("user_status");
    if !s.authorized(&headers) {
        return unauthorized();
    }
    *s.user_status.lock().unwrap() = body["status"].as_str().unwrap_or("Active").to_string();
    StatusCode::NO_CONTENT.into_response()
}

async fn contact(State(s): State<Shared>, Json(body): Json<Value>) -> Response {
    s.hit("contact");
    *s.last_contact.lock().unwrap() = Some(body);
    (StatusCode::CREATED, Json(json!({ "id": 11 }))).into_response()
}

async fn empty_error(State(s): State<Shared>) -> Response {
    s.hit("empty_error");
    StatusCode::SERVICE_UNAVAILABLE.into_response()
}

fn router(state: Shared) -> Router {
    Router::new()
        .route("/api/auth/login", post(login))
        .route("/api/auth/refresh-token", post(refresh))
        .route("/api/auth/accept-invitation", post(accept_invitation))
        .route("/api/auth/profile", get(profile).put(update_profile))
        .route("/api/services", get(services).post(create_service))
        .route("/api/services/{id}", delete(delete_service))
        .route("/api/projects", get(projects))
        .route("/api/pricing", get(pricing))
        .route("/api/users", get(users))
        .route("/api/users/{id}/status", patch(user_status))
        .route("/api/contact", post(contact))
        .route("/api/empty-error", get(empty_error))
        .with_state(state)
}

/// A running mock backend.
pub struct MockBackend {
    pub base_url: String,
    pub state: Shared,
}

pub async fn spawn_backend() -> MockBackend {
    let state = Arc::new(BackendState::default());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind mock backend");
    let addr = listener.local_addr().unwrap();
    let app = router(state.clone());

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    MockBackend {
        base_url: format!("http://{}/api", addr),
        state,
    }
}

/// Navigator that remembers every requested route.
#[derive(Default)]
pub struct RecordingNavigator {
    routes: Mutex<Vec<String>>,
}

impl RecordingNavigator {
    #[allow(dead_code)]
    pub fn routes(&self) -> Vec<String> {
        self.routes.lock().unwrap().clone()
    }
}

impl Navigator for RecordingNavigator {
    fn navigate(&self, route: &str) {
        self.routes.lock().unwrap().push(route.to_string());
    }
}

/// Everything a test needs to drive a `Portal` against the mock backend.
#[allow(dead_code)]
pub struct TestPortal {
    pub portal: Portal,
    pub backend: MockBackend,
    pub store: Arc<dyn TokenStore>,
    pub navigator: Arc<RecordingNavigator>,
    pub clock: Arc<ManualClock>,
}

/// Stored session holding a token the backend no longer accepts.
#[allow(dead_code)]
pub fn stale_session() -> StoredSession {
    serde_json::from_value(json!({
        "accessToken": "stale-access",
        "refreshToken": "refresh-1",
        "userRole": "Client"
    }))
    .unwrap()
}

/// Stored session holding the backend's current token.
#[allow(dead_code)]
pub fn valid_session() -> StoredSession {
    serde_json::from_value(json!({
        "accessToken": "access-1",
        "refreshToken": "refresh-1",
        "userRole": "Client"
    }))
    .unwrap()
}

#[allow(dead_code)]
pub async fn test_portal(session: StoredSession) -> TestPortal {
    test_portal_with_store(Arc::new(MemoryTokenStore::with_session(session))).await
}

#[allow(dead_code)]
pub async fn test_portal_with_store(store: Arc<dyn TokenStore>) -> TestPortal {
    let backend = spawn_backend().await;
    let navigator = Arc::new(RecordingNavigator::default());
    let clock = Arc::new(ManualClock::new(chrono::Utc::now()));

    let portal = Portal::with_clock(
        Config::with_base_url(&backend.base_url),
        store.clone(),
        navigator.clone(),
        clock.clone() as Arc<dyn Clock>,
    )
    .expect("Failed to build portal");

    TestPortal {
        portal,
        backend,
        store,
        navigator,
        clock,
    }
}
