//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                       - Sections overview
//! GET  /health                 - Health check
//! GET  /health/ready           - Catalog readiness
//!
//! # Catalog
//! GET  /sections/{id}                                        - Brands of a section
//! GET  /sections/{id}/brands/{brand}                         - Lines of a brand
//! GET  /sections/{id}/brands/{brand}/lines/{line}            - Products of a line
//! GET  /sections/{id}/brands/{brand}/lines/{line}/products/{product} - Product detail
//! GET  /search?q=              - Search brands, lines and products
//!
//! # Auth
//! GET  /auth/login             - Login page
//! POST /auth/login             - Login action (rate limited)
//! GET  /auth/register          - Register page
//! POST /auth/register          - Register action (rate limited)
//! POST /auth/logout            - Logout action
//!
//! # Customer (requires auth)
//! GET  /account                - Profile, orders and service requests
//! POST /orders                 - Store an order, then redirect to WhatsApp
//! GET  /services               - Service request forms
//! POST /services               - Store a request, then redirect to WhatsApp
//! ```

pub mod account;
pub mod auth;
pub mod catalog;
pub mod orders;
pub mod search;
pub mod services;

use axum::{
    Router,
    routing::{get, post},
};

use crate::middleware::auth_rate_limiter;
use crate::state::AppState;

/// Create the auth routes router.
///
/// Only the credential posts are rate limited; the pages themselves are not.
pub fn auth_routes() -> Router<AppState> {
    let limiter = auth_rate_limiter();

    Router::new()
        .route(
            "/login",
            get(auth::login_page).merge(post(auth::login).layer(limiter.clone())),
        )
        .route(
            "/register",
            get(auth::register_page).merge(post(auth::register).layer(limiter)),
        )
        .route("/logout", post(auth::logout))
}

/// Create the catalog browsing routes router.
pub fn catalog_routes() -> Router<AppState> {
    Router::new()
        .route("/{id}", get(catalog::section))
        .route("/{id}/brands/{brand}", get(catalog::brand))
        .route("/{id}/brands/{brand}/lines/{line}", get(catalog::line))
        .route(
            "/{id}/brands/{brand}/lines/{line}/products/{product}",
            get(catalog::product),
        )
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        // Home page
        .route("/", get(catalog::home))
        // Catalog routes
        .nest("/sections", catalog_routes())
        .route("/search", get(search::search))
        // Account and hand-off routes
        .route("/account", get(account::index))
        .route("/orders", post(orders::create))
        .route("/services", get(services::page).post(services::create))
        // Auth routes
        .nest("/auth", auth_routes())
}
