//! Service request queue (custom products and maintenance).

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    response::{IntoResponse, Redirect},
};
use serde::Deserialize;
use tracing::instrument;
use vapeshop_core::{RequestStatus, ServiceKind, UserId};

use super::{StatusFilter, local_redirect, status_notice};
use crate::db::UserRepository;
use crate::db::users::ServiceRecord;
use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::RequireAdminAuth;
use crate::models::CurrentAdmin;
use crate::state::AppState;

pub struct RequestRow {
    pub user_id: String,
    pub customer: String,
    pub phone: String,
    pub kind: ServiceKind,
    pub key: String,
    pub status: RequestStatus,
    pub created: String,
    pub subject: String,
    pub description: String,
}

impl From<ServiceRecord> for RequestRow {
    fn from(record: ServiceRecord) -> Self {
        let request = record.request;
        Self {
            user_id: record.user_id.into_inner(),
            customer: record.customer,
            phone: record.phone,
            kind: record.kind,
            key: record.key,
            status: request.status,
            created: request.created_at.format("%Y-%m-%d %H:%M").to_string(),
            subject: request.device.or(request.product).unwrap_or_default(),
            description: request.description,
        }
    }
}

#[derive(Template, WebTemplate)]
#[template(path = "services.html")]
pub struct ServicesTemplate {
    pub admin: CurrentAdmin,
    pub requests: Vec<RequestRow>,
    pub filter: String,
    pub statuses: [RequestStatus; 4],
    pub back: String,
    pub notice: Option<&'static str>,
}

#[derive(Debug, Deserialize)]
pub struct ServiceStatusForm {
    pub user: String,
    pub kind: String,
    pub key: String,
    pub status: RequestStatus,
    #[serde(default)]
    pub back: String,
}

/// Every service request, newest first, optionally filtered by `?status=`.
#[instrument(skip(state, admin))]
pub async fn index(
    State(state): State<AppState>,
    RequireAdminAuth(admin): RequireAdminAuth,
    Query(query): Query<StatusFilter>,
) -> Result<impl IntoResponse> {
    let status = query.status()?;
    let requests = UserRepository::new(state.database())
        .service_requests(status)
        .await?
        .into_iter()
        .map(RequestRow::from)
        .collect();

    Ok(ServicesTemplate {
        admin,
        requests,
        filter: status.map(|s| s.as_str().to_string()).unwrap_or_default(),
        statuses: RequestStatus::ALL,
        back: query.back_to("/services"),
        notice: status_notice(query.notice.as_deref()),
    })
}

/// Change one service request's status.
#[instrument(skip(state, _admin, form), fields(request = %form.key, status = %form.status))]
pub async fn update_status(
    State(state): State<AppState>,
    RequireAdminAuth(_admin): RequireAdminAuth,
    Form(form): Form<ServiceStatusForm>,
) -> Result<Redirect> {
    let user = UserId::parse(&form.user)
        .map_err(|e| AppError::BadRequest(format!("invalid user id: {e}")))?;
    let kind: ServiceKind = form.kind.parse().map_err(AppError::BadRequest)?;
    UserRepository::new(state.database())
        .set_service_status(&user, kind, &form.key, form.status)
        .await?;
    Ok(local_redirect(&form.back, "/services"))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use vapeshop_core::ServiceRequest;

    use super::*;

    #[test]
    fn test_request_row_uses_product_when_no_device() {
        let record = ServiceRecord {
            user_id: UserId::parse("uid-1").unwrap(),
            customer: "Ana".to_string(),
            phone: String::new(),
            kind: ServiceKind::ProductRequest,
            key: "-p1".to_string(),
            request: ServiceRequest {
                status: RequestStatus::Pending,
                description: "50ml bottle".to_string(),
                device: None,
                product: Some("Blue Razz".to_string()),
                created_at: chrono::DateTime::from_timestamp(1_700_000_000, 0).unwrap(),
                extra: serde_json::Map::new(),
            },
        };

        let row = RequestRow::from(record);
        assert_eq!(row.subject, "Blue Razz");
        assert_eq!(row.kind, ServiceKind::ProductRequest);
        assert_eq!(row.created, "2023-11-14 22:13");
    }
}
