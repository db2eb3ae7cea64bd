//! Catalog pages: sections, brands, lines and products.
//!
//! Names in paths are matched case-insensitively, the same way the admin
//! enforces uniqueness, so `/brands/nasty%20juice` finds "Nasty Juice".

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, State},
    response::IntoResponse,
};
use tracing::instrument;
use vapeshop_core::{Brand, Line, Product, Section};

use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::OptionalAuth;
use crate::models::CurrentUser;
use crate::state::AppState;

// =============================================================================
// Links
// =============================================================================

fn enc(s: &str) -> std::borrow::Cow<'_, str> {
    urlencoding::encode(s)
}

#[must_use]
pub fn section_href(section_id: &str) -> String {
    format!("/sections/{}", enc(section_id))
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

// =============================================================================
// Templates
// =============================================================================

/// Section card on the home page.
pub struct SectionCard {
    pub id: String,
    pub name: String,
    pub brand_count: usize,
}

/// Home page template.
#[derive(Template, WebTemplate)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub user: Option<CurrentUser>,
    pub sections: Vec<SectionCard>,
    pub offline: bool,
}

/// Section page: the brands in one section.
#[derive(Template, WebTemplate)]
#[template(path = "catalog/section.html")]
pub struct SectionTemplate {
    pub user: Option<CurrentUser>,
    pub section_id: String,
    pub section: Section,
}

/// Brand page: the lines of one brand.
#[derive(Template, WebTemplate)]
#[template(path = "catalog/brand.html")]
pub struct BrandTemplate {
    pub user: Option<CurrentUser>,
    pub section_id: String,
    pub section_name: String,
    pub brand: Brand,
}

/// Line page: the products of one line.
#[derive(Template, WebTemplate)]
#[template(path = "catalog/line.html")]
pub struct LineTemplate {
    pub user: Option<CurrentUser>,
    pub section_id: String,
    pub section_name: String,
    pub brand_name: String,
    pub line: Line,
}

/// Product detail with the order form.
#[derive(Template, WebTemplate)]
#[template(path = "catalog/product.html")]
pub struct ProductTemplate {
    pub user: Option<CurrentUser>,
    pub section_id: String,
    pub section_name: String,
    pub brand_name: String,
    pub line_name: String,
    pub product: Product,
}

// =============================================================================
// Lookups
// =============================================================================

fn find_section<'a>(catalog: &'a vapeshop_core::Catalog, id: &str) -> Result<&'a Section> {
    catalog
        .section(id)
        .ok_or_else(|| AppError::NotFound(format!("section '{id}'")))
}

fn find_brand<'a>(section: &'a Section, name: &str) -> Result<&'a Brand> {
    section
        .brand(name)
        .ok_or_else(|| AppError::NotFound(format!("brand '{name}'")))
}

fn find_line<'a>(brand: &'a Brand, name: &str) -> Result<&'a Line> {
    brand
        .line(name)
        .ok_or_else(|| AppError::NotFound(format!("line '{name}'")))
}

fn find_product<'a>(line: &'a Line, name: &str) -> Result<&'a Product> {
    line.product(name)
        .ok_or_else(|| AppError::NotFound(format!("product '{name}'")))
}

// =============================================================================
// Handlers
// =============================================================================

/// Display the home page with every section.
#[instrument(skip(state, user))]
pub async fn home(State(state): State<AppState>, OptionalAuth(user): OptionalAuth) -> Result<impl IntoResponse> {
    let loaded = state.catalog().load().await?;
    let sections = loaded
        .catalog
        .ordered_sections()
        .into_iter()
        .map(|(id, section)| SectionCard {
            id: id.to_owned(),
            name: section.name.clone(),
            brand_count: section.brands.len(),
        })
        .collect();

    Ok(HomeTemplate {
        user,
        sections,
        offline: loaded.source == crate::catalog::CatalogSource::Fallback,
    })
}

/// Display the brands of a section.
#[instrument(skip(state, user))]
pub async fn section(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
    Path(section_id): Path<String>,
) -> Result<impl IntoResponse> {
    let loaded = state.catalog().load().await?;
    let section = find_section(&loaded.catalog, &section_id)?;

    Ok(SectionTemplate {
        user,
        section_id,
        section: section.clone(),
    })
}

/// Display the lines of a brand.
#[instrument(skip(state, user))]
pub async fn brand(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
    Path((section_id, brand)): Path<(String, String)>,
) -> Result<impl IntoResponse> {
    let loaded = state.catalog().load().await?;
    let section = find_section(&loaded.catalog, &section_id)?;
    let brand = find_brand(section, &brand)?;

    Ok(BrandTemplate {
        user,
        section_name: section.name.clone(),
        section_id,
        brand: brand.clone(),
    })
}

/// Display the products of a line.
#[instrument(skip(state, user))]
pub async fn line(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
    Path((section_id, brand, line)): Path<(String, String, String)>,
) -> Result<impl IntoResponse> {
    let loaded = state.catalog().load().await?;
    let section = find_section(&loaded.catalog, &section_id)?;
    let brand = find_brand(section, &brand)?;
    let line = find_line(brand, &line)?;

    Ok(LineTemplate {
        user,
        section_name: section.name.clone(),
        section_id,
        brand_name: brand.name.clone(),
        line: line.clone(),
    })
}

/// Display one product.
#[instrument(skip(state, user))]
pub async fn product(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
    Path((section_id, brand, line, product)): Path<(String, String, String, String)>,
) -> Result<impl IntoResponse> {
    let loaded = state.catalog().load().await?;
    let section = find_section(&loaded.catalog, &section_id)?;
    let brand = find_brand(section, &brand)?;
    let line = find_line(brand, &line)?;
    let product = find_product(line, &product)?;

    Ok(ProductTemplate {
        user,
        section_name: section.name.clone(),
        section_id,
        brand_name: brand.name.clone(),
        line_name: line.name.clone(),
        product: product.clone(),
    })
}
