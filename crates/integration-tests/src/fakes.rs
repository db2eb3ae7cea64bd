//! Fake Identity Toolkit, SumUp and Cloudinary endpoints.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use serde_json::{Value, json};

// =============================================================================
// Identity Toolkit
// =============================================================================

#[derive(Clone)]
struct Account {
    local_id: String,
    password: String,
}

/// Email/password accounts answering `accounts:signUp` and
/// `accounts:signInWithPassword`.
#[derive(Clone, Default)]
pub struct FakeIdentity {
    accounts: Arc<Mutex<HashMap<String, Account>>>,
}

impl FakeIdentity {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an account directly, returning its `localId`.
    pub fn add_account(&self, email: &str, password: &str) -> String {
        let local_id = format!("uid{}", self.lock().len() + 1);
        self.lock().insert(
            email.to_lowercase(),
            Account {
                local_id: local_id.clone(),
                password: password.to_string(),
            },
        );
        local_id
    }

    pub fn router(&self) -> Router {
        Router::new()
            .route("/v1/accounts:signUp", post(sign_up))
            .route("/v1/accounts:signInWithPassword", post(sign_in))
            .with_state(self.clone())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Account>> {
        self.accounts.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn identity_error(message: &str) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({ "error": { "code": 400, "message": message, "errors": [] } })),
    )
        .into_response()
}

fn token(local_id: &str, email: &str) -> Response {
    Json(json!({
        "localId": local_id,
        "email": email,
        "idToken": format!("id-{local_id}"),
        "refreshToken": format!("refresh-{local_id}"),
        "expiresIn": "3600",
    }))
    .into_response()
}

fn credentials(body: &Value) -> (String, String) {
    let field = |name: &str| {
        body.get(name)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string()
    };
    (field("email").to_lowercase(), field("password"))
}

async fn sign_up(State(identity): State<FakeIdentity>, Json(body): Json<Value>) -> Response {
    let (email, password) = credentials(&body);
    if identity.lock().contains_key(&email) {
        return identity_error("EMAIL_EXISTS");
    }
    if password.len() < 6 {
        return identity_error("WEAK_PASSWORD : Password should be at least 6 characters");
    }
    let local_id = identity.add_account(&email, &password);
    token(&local_id, &email)
}

async fn sign_in(State(identity): State<FakeIdentity>, Json(body): Json<Value>) -> Response {
    let (email, password) = credentials(&body);
    let account = identity.lock().get(&email).cloned();
    match account {
        Some(account) if account.password == password => token(&account.local_id, &email),
        _ => identity_error("INVALID_LOGIN_CREDENTIALS"),
    }
}

// =============================================================================
// SumUp
// =============================================================================

/// A request the fake SumUp API received.
#[derive(Debug, Clone)]
pub struct SumUpCall {
    pub path: String,
    pub query: Option<String>,
    pub authorization: Option<String>,
}

/// SumUp API double.
///
/// Any path containing `missing` answers 404 with a SumUp-style error
/// body; everything else echoes the request back as the payload.
#[derive(Clone, Default)]
pub struct FakeSumUp {
    calls: Arc<Mutex<Vec<SumUpCall>>>,
}

impl FakeSumUp {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn router(&self) -> Router {
        Router::new().fallback(sumup).with_state(self.clone())
    }

    /// Requests received so far.
    #[must_use]
    pub fn calls(&self) -> Vec<SumUpCall> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

async fn sumup(State(fake): State<FakeSumUp>, headers: HeaderMap, uri: Uri) -> Response {
    let call = SumUpCall {
        path: uri.path().to_string(),
        query: uri.query().map(str::to_string),
        authorization: headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
    };
    fake.calls
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .push(call.clone());

    if call.path.contains("missing") {
        return (
            StatusCode::NOT_FOUND,
            Json(json!({ "error_code": "NOT_FOUND", "message": "Resource not found" })),
        )
            .into_response();
    }
    Json(json!({ "path": call.path, "query": call.query })).into_response()
}

// =============================================================================
// Cloudinary
// =============================================================================

/// Unsigned upload endpoint that accepts anything and returns a fixed URL.
pub fn cloudinary_router() -> Router {
    Router::new().route("/v1_1/{cloud}/image/upload", post(cloudinary_upload))
}

async fn cloudinary_upload(Path(cloud): Path<String>, body: Bytes) -> Response {
    if body.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": { "message": "Missing required parameter - file" } })),
        )
            .into_response();
    }
    Json(json!({
        "public_id": "catalog/test-image",
        "secure_url": format!("https://res.cloudinary.com/{cloud}/image/upload/v1/catalog/test-image.png"),
    }))
    .into_response()
}
