//! WhatsApp hand-off.
//!
//! After an order or service request is stored, the customer is redirected to
//! `https://wa.me/<shop number>?text=<message>` so the conversation continues
//! in WhatsApp with the details pre-filled.

use std::fmt::Write as _;

use crate::types::{Phone, ServiceKind};
use crate::user::{Order, ServiceRequest};

/// Base URL for click-to-chat links.
pub const WA_ME_BASE: &str = "https://wa.me";

/// Who is writing, taken from the stored profile.
#[derive(Debug, Clone, Copy)]
pub struct Customer<'a> {
    pub name: &'a str,
    pub phone: &'a str,
}

/// Build a click-to-chat link with a pre-filled message.
#[must_use]
pub fn chat_link(shop: &Phone, message: &str) -> String {
    format!(
        "{WA_ME_BASE}/{}?text={}",
        shop.digits(),
        urlencoding::encode(message)
    )
}

/// Message text for a stored order.
#[must_use]
pub fn order_message(customer: Customer<'_>, order_key: &str, order: &Order) -> String {
    let mut msg = format!("Hi! I'd like to place an order (ref {order_key}).\n");
    for item in &order.items {
        let _ = write!(msg, "\n• {} x {}", item.quantity, item.product);
        let context: Vec<&str> = [item.brand.as_str(), item.line.as_str()]
            .into_iter()
            .filter(|s| !s.is_empty())
            .collect();
        if !context.is_empty() {
            let _ = write!(msg, " ({})", context.join(" / "));
        }
    }
    if !order.notes.is_empty() {
        let _ = write!(msg, "\n\nNotes: {}", order.notes);
    }
    push_signature(&mut msg, customer);
    msg
}

/// Message text for a stored service request.
#[must_use]
pub fn service_message(
    customer: Customer<'_>,
    kind: ServiceKind,
    request_key: &str,
    request: &ServiceRequest,
) -> String {
    let mut msg = format!("Hi! {} (ref {request_key}).\n", kind.label());
    if let Some(device) = &request.device {
        let _ = write!(msg, "\nDevice: {device}");
    }
    if let Some(product) = &request.product {
        let _ = write!(msg, "\nProduct: {product}");
    }
    if !request.description.is_empty() {
        let _ = write!(msg, "\nDetails: {}", request.description);
    }
    push_signature(&mut msg, customer);
    msg
}

fn push_signature(msg: &mut String, customer: Customer<'_>) {
    if !customer.name.is_empty() {
        let _ = write!(msg, "\n\nFrom: {}", customer.name);
        if !customer.phone.is_empty() {
            let _ = write!(msg, " ({})", customer.phone);
        }
    }
}
