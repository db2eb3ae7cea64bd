//! Order placement.
//!
//! The product page posts here. The order is stored under the customer's
//! profile first and the browser is then sent to WhatsApp with the order
//! details pre-filled, so the shop always has a record of what was asked.

use axum::{
    Form,
    extract::State,
    response::Redirect,
};
use chrono::Utc;
use serde::Deserialize;
use tracing::{info, instrument};
use vapeshop_core::{Catalog, NewOrder, OrderItem, whatsapp};
use vapeshop_firebase::paths;

use crate::error::{AppError, Result};
use crate::middleware::RequireAuth;
use crate::state::AppState;

/// Largest quantity accepted for a single product.
pub const MAX_QUANTITY: u32 = 99;

/// Order form data from the product page.
#[derive(Debug, Deserialize)]
pub struct OrderForm {
    pub section: String,
    pub brand: String,
    pub line: String,
    pub product: String,
    pub quantity: u32,
    #[serde(default)]
    pub notes: String,
}

/// Resolve the form against the catalog, returning the item with the
/// catalog's spelling of every name.
fn resolve_item(catalog: &Catalog, form: &OrderForm) -> Result<OrderItem> {
    if !(1..=MAX_QUANTITY).contains(&form.quantity) {
        return Err(AppError::BadRequest(format!(
            "quantity must be between 1 and {MAX_QUANTITY}"
        )));
    }

    let not_found = || {
        AppError::NotFound(format!(
            "product '{}' in {}/{}/{}",
            form.product, form.section, form.brand, form.line
        ))
    };
    let section = catalog.section(&form.section).ok_or_else(not_found)?;
    let brand = section.brand(&form.brand).ok_or_else(not_found)?;
    let line = brand.line(&form.line).ok_or_else(not_found)?;
    let product = line.product(&form.product).ok_or_else(not_found)?;

    Ok(OrderItem {
        section: form.section.clone(),
        brand: brand.name.clone(),
        line: line.name.clone(),
        product: product.name.clone(),
        quantity: form.quantity,
    })
}

/// Store an order and hand the customer off to WhatsApp.
#[instrument(skip_all, fields(user_id = %user.id, product = %form.product))]
pub async fn create(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Form(form): Form<OrderForm>,
) -> Result<Redirect> {
    let loaded = state.catalog().load().await?;
    let item = resolve_item(&loaded.catalog, &form)?;

    let order = NewOrder {
        items: vec![item],
        notes: form.notes,
    }
    .into_order(Utc::now());

    let key = state
        .database()
        .push(&paths::orders(&user.id), &order)
        .await?;
    info!(order = %key, quantity = order.total_quantity(), "order stored");

    let message = whatsapp::order_message(user.customer(), &key, &order);
    Ok(Redirect::to(&whatsapp::chat_link(
        &state.config().whatsapp_number,
        &message,
    )))
}
