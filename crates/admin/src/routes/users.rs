//! Customer list and detail pages.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
};
use serde::Deserialize;
use tracing::instrument;
use vapeshop_core::search::filter_by_name;
use vapeshop_core::{Order, RequestStatus, ServiceKind, ServiceRequest, UserId, UserProfile};

use crate::db::UserRepository;
use crate::db::users::UserRecord;
use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::RequireAdminAuth;
use crate::models::CurrentAdmin;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct UsersQuery {
    #[serde(default)]
    pub q: String,
}

pub struct UserRow {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub joined: String,
    pub orders: usize,
    pub requests: usize,
}

impl From<&UserRecord> for UserRow {
    fn from(record: &UserRecord) -> Self {
        let profile = &record.profile;
        Self {
            id: record.id.to_string(),
            name: profile.name.clone(),
            email: profile.email.clone(),
            phone: profile.phone.clone(),
            joined: profile.created_at.format("%Y-%m-%d").to_string(),
            orders: profile.orders.len(),
            requests: profile.services.product_requests.len()
                + profile.services.maintenance_requests.len(),
        }
    }
}

#[derive(Template, WebTemplate)]
#[template(path = "users/index.html")]
pub struct UsersTemplate {
    pub admin: CurrentAdmin,
    pub users: Vec<UserRow>,
    pub total: usize,
    pub query: String,
}

/// An order as shown on the customer page.
pub struct OrderView {
    pub key: String,
    pub status: RequestStatus,
    pub created: String,
    pub items: Vec<String>,
    pub notes: String,
}

impl OrderView {
    fn new(key: &str, order: &Order) -> Self {
        Self {
            key: key.to_string(),
            status: order.status,
            created: order.created_at.format("%Y-%m-%d %H:%M").to_string(),
            items: order
                .items
                .iter()
                .map(|i| format!("{} x {}", i.quantity, i.product))
                .collect(),
            notes: order.notes.clone(),
        }
    }
}

/// A service request as shown on the customer page.
pub struct RequestView {
    pub kind: ServiceKind,
    pub key: String,
    pub status: RequestStatus,
    pub created: String,
    pub subject: String,
    pub description: String,
}

impl RequestView {
    fn new(kind: ServiceKind, key: &str, request: &ServiceRequest) -> Self {
        Self {
            kind,
            key: key.to_string(),
            status: request.status,
            created: request.created_at.format("%Y-%m-%d %H:%M").to_string(),
            subject: request
                .device
                .clone()
                .or_else(|| request.product.clone())
                .unwrap_or_default(),
            description: request.description.clone(),
        }
    }
}

#[derive(Template, WebTemplate)]
#[template(path = "users/detail.html")]
pub struct UserDetailTemplate {
    pub admin: CurrentAdmin,
    pub id: String,
    pub profile: UserProfile,
    pub joined: String,
    pub orders: Vec<OrderView>,
    pub requests: Vec<RequestView>,
    pub statuses: [RequestStatus; 4],
}

/// List customers, filtered by name.
#[instrument(skip(state, admin))]
pub async fn index(
    State(state): State<AppState>,
    RequireAdminAuth(admin): RequireAdminAuth,
    Query(query): Query<UsersQuery>,
) -> Result<impl IntoResponse> {
    let records = UserRepository::new(state.database()).list().await?;
    let users = filter_by_name(&records, &query.q, |u| u.profile.name.as_str())
        .into_iter()
        .map(UserRow::from)
        .collect();

    Ok(UsersTemplate {
        admin,
        users,
        total: records.len(),
        query: query.q.trim().to_string(),
    })
}

/// One customer with their orders and service requests.
#[instrument(skip(state, admin))]
pub async fn show(
    State(state): State<AppState>,
    RequireAdminAuth(admin): RequireAdminAuth,
    Path(id): Path<String>,
) -> Result<impl IntoResponse> {
    let user_id = UserId::parse(&id).map_err(|_| AppError::NotFound(format!("user {id}")))?;
    let profile = UserRepository::new(state.database()).get(&user_id).await?;

    let orders = profile
        .orders_newest_first()
        .into_iter()
        .map(|(key, order)| OrderView::new(key, order))
        .collect();
    let requests = profile
        .requests_newest_first()
        .into_iter()
        .map(|(kind, key, request)| RequestView::new(kind, key, request))
        .collect();

    Ok(UserDetailTemplate {
        admin,
        id: user_id.into_inner(),
        joined: profile.created_at.format("%Y-%m-%d").to_string(),
        orders,
        requests,
        profile,
        statuses: RequestStatus::ALL,
    })
}
