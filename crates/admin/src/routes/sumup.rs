//! SumUp payments proxy.
//!
//! Responses use a fixed envelope:
//!
//! ```text
//! 200                 {"success": true,  "data": <upstream JSON>}
//! upstream status     {"success": false, "error": "<message>", "details": <upstream body>}
//! 500 (no token)      {"success": false, "error": "SumUp bearer token is not configured", "details": null}
//! 502 (network/JSON)  {"success": false, "error": "<message>", "details": null}
//! ```
//!
//! Query strings are forwarded to SumUp verbatim.

use axum::{
    Json,
    extract::{Path, RawQuery, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::Value;
use tracing::{instrument, warn};

use crate::middleware::RequireAdminAuth;
use crate::state::AppState;
use crate::sumup::SumUpError;

/// JSON envelope for every proxy response.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum Envelope {
    Ok { success: bool, data: Value },
    Err { success: bool, error: String, details: Value },
}

impl Envelope {
    #[must_use]
    pub const fn ok(data: Value) -> Self {
        Self::Ok {
            success: true,
            data,
        }
    }

    #[must_use]
    pub const fn err(error: String, details: Value) -> Self {
        Self::Err {
            success: false,
            error,
            details,
        }
    }
}

/// Map a client error onto the proxy's status and envelope.
fn error_response(err: SumUpError) -> Response {
    let status = match &err {
        SumUpError::Upstream { status, .. } => {
            StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY)
        }
        SumUpError::NotConfigured => StatusCode::INTERNAL_SERVER_ERROR,
        SumUpError::Http(_) | SumUpError::Parse(_) => {
            let event_id = sentry::capture_error(&err);
            tracing::error!(error = %err, sentry_event_id = %event_id, "SumUp request failed");
            StatusCode::BAD_GATEWAY
        }
    };
    let message = err.to_string();
    let details = match err {
        SumUpError::Upstream { details, .. } => details,
        _ => Value::Null,
    };
    (status, Json(Envelope::err(message, details))).into_response()
}

fn respond(result: Result<Value, SumUpError>) -> Response {
    match result {
        Ok(data) => Json(Envelope::ok(data)).into_response(),
        Err(SumUpError::NotConfigured) => {
            warn!("SumUp called without a bearer token");
            error_response(SumUpError::NotConfigured)
        }
        Err(err) => error_response(err),
    }
}

/// `GET /api/sumup/transactions`
#[instrument(skip(state, _admin))]
pub async fn transactions(
    State(state): State<AppState>,
    RequireAdminAuth(_admin): RequireAdminAuth,
    RawQuery(query): RawQuery,
) -> Response {
    respond(state.sumup().transactions(query.as_deref()).await)
}

/// `GET /api/sumup/transactions/{id}`
#[instrument(skip(state, _admin))]
pub async fn transaction(
    State(state): State<AppState>,
    RequireAdminAuth(_admin): RequireAdminAuth,
    Path(id): Path<String>,
) -> Response {
    respond(state.sumup().transaction(&id).await)
}

/// `GET /api/sumup/checkouts`
#[instrument(skip(state, _admin))]
pub async fn checkouts(
    State(state): State<AppState>,
    RequireAdminAuth(_admin): RequireAdminAuth,
    RawQuery(query): RawQuery,
) -> Response {
    respond(state.sumup().checkouts(query.as_deref()).await)
}

/// `GET /api/sumup/checkouts/{id}`
#[instrument(skip(state, _admin))]
pub async fn checkout(
    State(state): State<AppState>,
    RequireAdminAuth(_admin): RequireAdminAuth,
    Path(id): Path<String>,
) -> Response {
    respond(state.sumup().checkout(&id).await)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::body::to_bytes;
    use serde_json::json;

    use super::*;

    async fn body_json(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_success_envelope() {
        let response = respond(Ok(json!({ "items": [] })));
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            body_json(response).await,
            json!({ "success": true, "data": { "items": [] } })
        );
    }

    #[tokio::test]
    async fn test_missing_token_is_500_with_null_details() {
        let response = respond(Err(SumUpError::NotConfigured));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            body_json(response).await,
            json!({
                "success": false,
                "error": "SumUp bearer token is not configured",
                "details": null
            })
        );
    }

    #[tokio::test]
    async fn test_upstream_status_passes_through() {
        let details = json!({ "error_code": "NOT_FOUND", "message": "Resource not found" });
        let response = respond(Err(SumUpError::Upstream {
            status: 404,
            message: "Resource not found".to_string(),
            details: details.clone(),
        }));
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            body_json(response).await,
            json!({ "success": false, "error": "Resource not found", "details": details })
        );
    }
}
