//! HTTP route handlers for admin.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                 - Health check
//! GET  /health/ready           - Realtime Database readiness
//!
//! # Dashboard
//! GET  /                       - Visits, request counts and catalog totals
//!
//! # Auth (Firebase email/password, allowlisted admins only)
//! GET  /auth/login             - Login page
//! POST /auth/login             - Login action
//! POST /auth/logout            - Logout
//!
//! # Catalog
//! GET  /catalog                - Sections
//! POST /catalog/sections       - Create section
//! ...  /catalog/sections/{section}[/brands/{brand}[/lines/{line}[/products/{product}]]]
//!                              - View (GET), edit (POST) and `/delete` (POST)
//! GET  /search?q=              - Search brands, lines and products
//!
//! # Customers and requests
//! GET  /users?q=               - Customers
//! GET  /users/{id}             - Customer with orders and service requests
//! GET  /orders?status=         - Order queue
//! POST /orders/status          - Change an order's status
//! GET  /services?status=       - Service request queue
//! POST /services/status        - Change a service request's status
//!
//! # Uploads
//! POST /uploads                - Upload an image to Cloudinary (multipart `file`)
//!
//! # SumUp (JSON)
//! GET  /api/sumup/transactions          - Transaction history
//! GET  /api/sumup/transactions/{id}     - One transaction
//! GET  /api/sumup/checkouts             - Checkouts
//! GET  /api/sumup/checkouts/{id}        - One checkout
//! ```

pub mod auth;
pub mod catalog;
pub mod dashboard;
pub mod orders;
pub mod search;
pub mod services;
pub mod sumup;
pub mod uploads;
pub mod users;

use axum::{
    Router,
    response::Redirect,
    routing::{get, post},
};
use serde::Deserialize;
use vapeshop_core::RequestStatus;

use crate::error::{AppError, Result};
use crate::state::AppState;

/// `?status=` filter shared by the order and service queues.
#[derive(Debug, Default, Deserialize)]
pub struct StatusFilter {
    #[serde(default)]
    pub status: String,
    pub notice: Option<String>,
}

impl StatusFilter {
    /// The parsed filter; blank means every status.
    ///
    /// # Errors
    ///
    /// Returns `BadRequest` for an unknown status.
    pub fn status(&self) -> Result<Option<RequestStatus>> {
        let raw = self.status.trim();
        if raw.is_empty() {
            return Ok(None);
        }
        raw.parse().map(Some).map_err(AppError::BadRequest)
    }

    /// The current listing URL, kept in status forms so a change returns to
    /// the same filtered view.
    #[must_use]
    pub fn back_to(&self, base: &str) -> String {
        match self.status() {
            Ok(Some(status)) => format!("{base}?status={status}"),
            _ => base.to_string(),
        }
    }
}

#[must_use]
pub fn status_notice(code: Option<&str>) -> Option<&'static str> {
    match code {
        Some("updated") => Some("Status updated."),
        _ => None,
    }
}

/// Redirect to `back` when it is a path on this site, otherwise to
/// `fallback`, with an `updated` notice.
#[must_use]
pub fn local_redirect(back: &str, fallback: &str) -> Redirect {
    let is_local = back.starts_with('/') && !back.starts_with("//") && !back.contains('\\');
    let target = if is_local { back } else { fallback };
    let separator = if target.contains('?') { '&' } else { '?' };
    Redirect::to(&format!("{target}{separator}notice=updated"))
}

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/login", get(auth::login_page).post(auth::login))
        .route("/logout", post(auth::logout))
}

/// SumUp proxy routes, merged with full paths so the `/api/` prefix is
/// visible to the auth extractor.
pub fn sumup_routes() -> Router<AppState> {
    Router::new()
        .route("/api/sumup/transactions", get(sumup::transactions))
        .route("/api/sumup/transactions/{id}", get(sumup::transaction))
        .route("/api/sumup/checkouts", get(sumup::checkouts))
        .route("/api/sumup/checkouts/{id}", get(sumup::checkout))
}

/// Create all routes for admin.
pub fn routes() -> Router<AppState> {
    Router::new()
        // Dashboard
        .route("/", get(dashboard::index))
        // Auth routes
        .nest("/auth", auth_routes())
        // Catalog management
        .nest("/catalog", catalog::routes())
        .route("/search", get(search::index))
        // Customers and their requests
        .route("/users", get(users::index))
        .route("/users/{id}", get(users::show))
        .route("/orders", get(orders::index))
        .route("/orders/status", post(orders::update_status))
        .route("/services", get(services::index))
        .route("/services/status", post(services::update_status))
        // Image uploads
        .route(
            "/uploads",
            post(uploads::upload).layer(uploads::body_limit()),
        )
        // Payments
        .merge(sumup_routes())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::response::IntoResponse;

    use super::*;

    fn location(redirect: Redirect) -> String {
        redirect
            .into_response()
            .headers()
            .get("location")
            .unwrap()
            .to_str()
            .unwrap()
            .to_string()
    }

    #[test]
    fn test_local_redirect_keeps_site_paths() {
        assert_eq!(
            location(local_redirect("/orders?status=pending", "/orders")),
            "/orders?status=pending&notice=updated"
        );
        assert_eq!(
            location(local_redirect("/users/uid-1", "/orders")),
            "/users/uid-1?notice=updated"
        );
    }

    #[test]
    fn test_local_redirect_rejects_other_hosts() {
        assert_eq!(
            location(local_redirect("//evil.example/x", "/orders")),
            "/orders?notice=updated"
        );
        assert_eq!(
            location(local_redirect("https://evil.example", "/services")),
            "/services?notice=updated"
        );
        assert_eq!(location(local_redirect("", "/orders")), "/orders?notice=updated");
    }

    #[test]
    fn test_status_filter() {
        let blank = StatusFilter::default();
        assert_eq!(blank.status().unwrap(), None);
        assert_eq!(blank.back_to("/orders"), "/orders");

        let pending = StatusFilter {
            status: "Pending".to_string(),
            notice: None,
        };
        assert_eq!(pending.status().unwrap(), Some(RequestStatus::Pending));
        assert_eq!(pending.back_to("/orders"), "/orders?status=pending");

        let bad = StatusFilter {
            status: "shipped".to_string(),
            notice: None,
        };
        assert!(bad.status().is_err());
    }
}
