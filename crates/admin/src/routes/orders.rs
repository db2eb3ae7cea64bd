//! Order queue and status changes.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    response::{IntoResponse, Redirect},
};
use serde::Deserialize;
use tracing::instrument;
use vapeshop_core::{RequestStatus, UserId};

use super::{StatusFilter, local_redirect, status_notice};
use crate::db::UserRepository;
use crate::db::users::OrderRecord;
use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::RequireAdminAuth;
use crate::models::CurrentAdmin;
use crate::state::AppState;

pub struct OrderRow {
    pub user_id: String,
    pub customer: String,
    pub phone: String,
    pub key: String,
    pub status: RequestStatus,
    pub created: String,
    pub items: Vec<String>,
    pub quantity: u32,
    pub notes: String,
}

impl From<OrderRecord> for OrderRow {
    fn from(record: OrderRecord) -> Self {
        let order = record.order;
        Self {
            user_id: record.user_id.into_inner(),
            customer: record.customer,
            phone: record.phone,
            key: record.key,
            status: order.status,
            created: order.created_at.format("%Y-%m-%d %H:%M").to_string(),
            quantity: order.total_quantity(),
            items: order
                .items
                .iter()
                .map(|i| {
                    if i.brand.is_empty() {
                        format!("{} x {}", i.quantity, i.product)
                    } else {
                        format!("{} x {} ({})", i.quantity, i.product, i.brand)
                    }
                })
                .collect(),
            notes: order.notes,
        }
    }
}

#[derive(Template, WebTemplate)]
#[template(path = "orders.html")]
pub struct OrdersTemplate {
    pub admin: CurrentAdmin,
    pub orders: Vec<OrderRow>,
    pub filter: String,
    pub statuses: [RequestStatus; 4],
    pub back: String,
    pub notice: Option<&'static str>,
}

/// Status change submitted from the order queue or a customer page.
#[derive(Debug, Deserialize)]
pub struct OrderStatusForm {
    pub user: String,
    pub key: String,
    pub status: RequestStatus,
    #[serde(default)]
    pub back: String,
}

/// Every order, newest first, optionally filtered by `?status=`.
#[instrument(skip(state, admin))]
pub async fn index(
    State(state): State<AppState>,
    RequireAdminAuth(admin): RequireAdminAuth,
    Query(query): Query<StatusFilter>,
) -> Result<impl IntoResponse> {
    let status = query.status()?;
    let orders = UserRepository::new(state.database())
        .orders(status)
        .await?
        .into_iter()
        .map(OrderRow::from)
        .collect();

    Ok(OrdersTemplate {
        admin,
        orders,
        filter: status.map(|s| s.as_str().to_string()).unwrap_or_default(),
        statuses: RequestStatus::ALL,
        back: query.back_to("/orders"),
        notice: status_notice(query.notice.as_deref()),
    })
}

/// Change one order's status and return to the page it was changed from.
#[instrument(skip(state, _admin, form), fields(order = %form.key, status = %form.status))]
pub async fn update_status(
    State(state): State<AppState>,
    RequireAdminAuth(_admin): RequireAdminAuth,
    Form(form): Form<OrderStatusForm>,
) -> Result<Redirect> {
    let user = UserId::parse(&form.user)
        .map_err(|e| AppError::BadRequest(format!("invalid user id: {e}")))?;
    UserRepository::new(state.database())
        .set_order_status(&user, &form.key, form.status)
        .await?;
    Ok(local_redirect(&form.back, "/orders"))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use vapeshop_core::{Order, OrderItem};

    use super::*;

    #[test]
    fn test_order_row_formats_items() {
        let record = OrderRecord {
            user_id: UserId::parse("uid-1").unwrap(),
            customer: "Ana".to_string(),
            phone: "3001234567".to_string(),
            key: "-o1".to_string(),
            order: Order {
                status: RequestStatus::Pending,
                items: vec![
                    OrderItem {
                        brand: "Nasty".to_string(),
                        product: "Green Ape".to_string(),
                        quantity: 2,
                        ..OrderItem::default()
                    },
                    OrderItem {
                        product: "Coil 0.4".to_string(),
                        quantity: 1,
                        ..OrderItem::default()
                    },
                ],
                notes: "Deliver after 5".to_string(),
                created_at: chrono::DateTime::from_timestamp(1_700_000_000, 0).unwrap(),
                extra: serde_json::Map::new(),
            },
        };

        let row = OrderRow::from(record);
        assert_eq!(row.items, ["2 x Green Ape (Nasty)", "1 x Coil 0.4"]);
        assert_eq!(row.quantity, 3);
        assert_eq!(row.user_id, "uid-1");
    }

    #[test]
    fn test_status_form_parses_lowercase_status() {
        let form: OrderStatusForm = serde_json::from_value(serde_json::json!({
            "user": "uid-1",
            "key": "-o1",
            "status": "completed"
        }))
        .unwrap();
        assert_eq!(form.status, RequestStatus::Completed);
        assert!(form.back.is_empty());
    }
}
