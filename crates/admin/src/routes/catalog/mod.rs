//! Catalog management routes.
//!
//! Every write loads the affected section, applies the change in memory and
//! stores the section's `brands` array back in one PUT. Rule violations
//! (blank or duplicate names, items deleted meanwhile) redirect back to the
//! form with an `?error=` code instead of failing the request.

pub mod brands;
pub mod lines;
pub mod products;
pub mod sections;
pub mod types;

use axum::{
    Router,
    response::Redirect,
    routing::{get, post},
};
use tracing::warn;
use vapeshop_core::{CatalogError, SectionId};

use crate::db::RepositoryError;
use crate::error::{AppError, Result};
use crate::state::AppState;

fn enc(segment: &str) -> String {
    urlencoding::encode(segment).into_owned()
}

#[must_use]
pub fn section_href(section_id: &str) -> String {
    format!("/catalog/sections/{}", enc(section_id))
}

#[must_use]
pub fn brand_href(section_id: &str, brand: &str) -> String {
    format!("{}/brands/{}", section_href(section_id), enc(brand))
}

#[must_use]
pub fn line_href(section_id: &str, brand: &str, line: &str) -> String {
    format!("{}/lines/{}", brand_href(section_id, brand), enc(line))
}

#[must_use]
pub fn product_href(section_id: &str, brand: &str, line: &str, product: &str) -> String {
    format!("{}/products/{}", line_href(section_id, brand, line), enc(product))
}

/// Parse a section id from the path; malformed ids cannot exist, so 404.
pub(crate) fn parse_section_id(raw: &str) -> Result<SectionId> {
    SectionId::parse(raw).map_err(|_| AppError::NotFound(format!("section '{raw}'")))
}

/// Short code carried in `?error=` for a rejected write.
pub(crate) const fn error_code(err: &CatalogError) -> &'static str {
    match err {
        CatalogError::EmptyName(_) => "blank",
        CatalogError::Duplicate { .. } => "duplicate",
        CatalogError::NotFound { .. } => "missing",
    }
}

/// Text for an `?error=` code.
#[must_use]
pub fn error_message(code: &str) -> &'static str {
    match code {
        "blank" => "Name cannot be empty.",
        "duplicate" => "That name is already used here. Names must be unique, ignoring case.",
        "missing" => "That item no longer exists. It may have been removed in another tab.",
        "invalid_id" => "Section ids cannot be blank or contain . $ # [ ] or /.",
        _ => "The change could not be saved.",
    }
}

/// Text for a `?notice=` code.
#[must_use]
pub fn notice_message(code: &str) -> Option<&'static str> {
    match code {
        "created" => Some("Created."),
        "saved" => Some("Saved."),
        "deleted" => Some("Deleted."),
        _ => None,
    }
}

fn with_code(path: &str, key: &str, code: &str) -> Redirect {
    Redirect::to(&format!("{path}?{key}={code}"))
}

/// Turn the result of a catalog write into a redirect.
///
/// Success goes to `ok_to` with a notice; rule violations go back to
/// `err_to` with an error code; anything else is a real failure.
pub(crate) fn finish(
    result: std::result::Result<(), RepositoryError>,
    ok_to: &str,
    err_to: &str,
    notice: &str,
) -> Result<Redirect> {
    match result {
        Ok(()) => Ok(with_code(ok_to, "notice", notice)),
        Err(RepositoryError::Catalog(err)) => {
            warn!(error = %err, "catalog change rejected");
            Ok(with_code(err_to, "error", error_code(&err)))
        }
        Err(RepositoryError::InvalidKey(err)) => {
            warn!(error = %err, "catalog change rejected");
            Ok(with_code(err_to, "error", "invalid_id"))
        }
        Err(err) => Err(err.into()),
    }
}

/// Create the catalog routes router (mounted at `/catalog`).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(sections::index))
        .route("/sections", post(sections::create))
        .route("/sections/{section}", get(brands::index).post(brands::create))
        .route("/sections/{section}/delete", post(sections::delete))
        .route(
            "/sections/{section}/brands/{brand}",
            get(lines::index).post(brands::update),
        )
        .route("/sections/{section}/brands/{brand}/delete", post(brands::delete))
        .route("/sections/{section}/brands/{brand}/lines", post(lines::create))
        .route(
            "/sections/{section}/brands/{brand}/lines/{line}",
            get(products::index).post(lines::update),
        )
        .route(
            "/sections/{section}/brands/{brand}/lines/{line}/delete",
            post(lines::delete),
        )
        .route(
            "/sections/{section}/brands/{brand}/lines/{line}/products",
            post(products::create),
        )
        .route(
            "/sections/{section}/brands/{brand}/lines/{line}/products/{product}",
            get(products::edit).post(products::update),
        )
        .route(
            "/sections/{section}/brands/{brand}/lines/{line}/products/{product}/delete",
            post(products::delete),
        )
}
