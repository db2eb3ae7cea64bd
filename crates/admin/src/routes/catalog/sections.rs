//! Section list, creation and deletion.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, Query, State},
    response::{IntoResponse, Redirect},
};
use tracing::instrument;
use vapeshop_core::{Catalog, SectionId, search::filter_by_name};

use super::types::{PageQuery, SectionForm};
use super::{finish, parse_section_id, section_href};
use crate::db::CatalogRepository;
use crate::error::Result;
use crate::filters;
use crate::middleware::RequireAdminAuth;
use crate::models::CurrentAdmin;
use crate::state::AppState;

/// Section row on the catalog overview.
pub struct SectionRow {
    pub id: String,
    pub name: String,
    pub order: u32,
    pub brands: usize,
    pub href: String,
}

/// Catalog overview template.
#[derive(Template, WebTemplate)]
#[template(path = "catalog/sections.html")]
pub struct SectionsTemplate {
    pub admin: CurrentAdmin,
    pub sections: Vec<SectionRow>,
    pub query: String,
    pub brand_count: usize,
    pub line_count: usize,
    pub product_count: usize,
    pub error: Option<&'static str>,
    pub notice: Option<&'static str>,
}

fn section_rows(catalog: &Catalog, query: &str) -> Vec<SectionRow> {
    let ordered = catalog.ordered_sections();
    filter_by_name(&ordered, query, |(_, section)| section.name.as_str())
        .into_iter()
        .map(|(id, section)| SectionRow {
            id: (*id).to_string(),
            name: section.name.clone(),
            order: section.order,
            brands: section.brands.len(),
            href: section_href(id),
        })
        .collect()
}

/// List sections.
#[instrument(skip(state, admin, query))]
pub async fn index(
    State(state): State<AppState>,
    RequireAdminAuth(admin): RequireAdminAuth,
    Query(query): Query<PageQuery>,
) -> Result<impl IntoResponse> {
    let catalog = CatalogRepository::new(state.database()).catalog().await?;

    Ok(SectionsTemplate {
        admin,
        sections: section_rows(&catalog, &query.q),
        query: query.q.trim().to_string(),
        brand_count: catalog.brand_count(),
        line_count: catalog.line_count(),
        product_count: catalog.product_count(),
        error: query.error(),
        notice: query.notice(),
    })
}

/// Create a section.
#[instrument(skip(state, _admin, form), fields(name = %form.name))]
pub async fn create(
    State(state): State<AppState>,
    RequireAdminAuth(_admin): RequireAdminAuth,
    Form(form): Form<SectionForm>,
) -> Result<Redirect> {
    let key = form.key();
    let result = match SectionId::parse(&key) {
        Ok(id) => {
            CatalogRepository::new(state.database())
                .create_section(&id, &form.name)
                .await
        }
        Err(e) => Err(e.into()),
    };
    let ok_to = section_href(&key);
    finish(result, &ok_to, "/catalog", "created")
}

/// Delete a section with everything under it.
#[instrument(skip(state, _admin))]
pub async fn delete(
    State(state): State<AppState>,
    RequireAdminAuth(_admin): RequireAdminAuth,
    Path(section): Path<String>,
) -> Result<Redirect> {
    let id = parse_section_id(&section)?;
    let result = CatalogRepository::new(state.database())
        .delete_section(&id)
        .await;
    finish(result, "/catalog", "/catalog", "deleted")
}
