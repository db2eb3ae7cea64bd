//! Account route handlers.
//!
//! These routes require authentication.

use askama::Template;
use askama_web::WebTemplate;
use axum::{extract::State, response::IntoResponse};
use tracing::instrument;
use vapeshop_core::{Order, ServiceKind, ServiceRequest, UserProfile};
use vapeshop_firebase::paths;

use crate::error::Result;
use crate::filters;
use crate::middleware::RequireAuth;
use crate::models::CurrentUser;
use crate::state::AppState;

const DATE_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Order display data for templates.
pub struct OrderView {
    pub key: String,
    pub status: &'static str,
    pub status_class: &'static str,
    pub created_at: String,
    pub summary: String,
    pub quantity: u32,
    pub notes: String,
}

impl OrderView {
    fn new(key: &str, order: &Order) -> Self {
        let summary = order
            .items
            .iter()
            .map(|item| format!("{} x {}", item.quantity, item.product))
            .collect::<Vec<_>>()
            .join(", ");
        Self {
            key: key.to_string(),
            status: order.status.label(),
            status_class: order.status.as_str(),
            created_at: order.created_at.format(DATE_FORMAT).to_string(),
            summary,
            quantity: order.total_quantity(),
            notes: order.notes.clone(),
        }
    }
}

/// Service request display data for templates.
pub struct RequestView {
    pub key: String,
    pub kind: &'static str,
    pub status: &'static str,
    pub status_class: &'static str,
    pub created_at: String,
    pub subject: String,
    pub description: String,
}

impl RequestView {
    fn new(kind: ServiceKind, key: &str, request: &ServiceRequest) -> Self {
        let subject = request
            .device
            .clone()
            .or_else(|| request.product.clone())
            .unwrap_or_default();
        Self {
            key: key.to_string(),
            kind: kind.label(),
            status: request.status.label(),
            status_class: request.status.as_str(),
            created_at: request.created_at.format(DATE_FORMAT).to_string(),
            subject,
            description: request.description.clone(),
        }
    }
}

/// Account overview page template.
#[derive(Template, WebTemplate)]
#[template(path = "account/index.html")]
pub struct AccountIndexTemplate {
    pub user: Option<CurrentUser>,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub member_since: Option<String>,
    pub orders: Vec<OrderView>,
    pub requests: Vec<RequestView>,
}

fn build_page(current_user: CurrentUser, profile: Option<&UserProfile>) -> AccountIndexTemplate {
    let (orders, requests) = profile.map_or_else(
        || (Vec::new(), Vec::new()),
        |p| {
            let orders = p
                .orders_newest_first()
                .into_iter()
                .map(|(key, order)| OrderView::new(key, order))
                .collect();
            let requests = p
                .requests_newest_first()
                .into_iter()
                .map(|(kind, key, request)| RequestView::new(kind, key, request))
                .collect();
            (orders, requests)
        },
    );

    AccountIndexTemplate {
        name: current_user.display_name().to_string(),
        email: current_user.email.to_string(),
        phone: profile.map_or_else(|| current_user.phone.clone(), |p| p.phone.clone()),
        member_since: profile.map(|p| p.created_at.format("%Y-%m-%d").to_string()),
        orders,
        requests,
        user: Some(current_user),
    }
}

/// Display the account overview: profile, orders and service requests.
#[instrument(skip_all, fields(user_id = %current_user.id))]
pub async fn index(
    State(state): State<AppState>,
    RequireAuth(current_user): RequireAuth,
) -> Result<impl IntoResponse> {
    let profile = state
        .database()
        .get::<UserProfile>(&paths::user(&current_user.id))
        .await?;

    Ok(build_page(current_user, profile.as_ref()))
}
