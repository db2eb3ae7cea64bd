//! Brands of a section.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, Query, State},
    response::{IntoResponse, Redirect},
};
use tracing::instrument;
use vapeshop_core::{BrandDetails, Section, search::filter_by_name};

use super::types::{BrandForm, PageQuery};
use super::{brand_href, finish, parse_section_id, section_href};
use crate::db::CatalogRepository;
use crate::error::Result;
use crate::filters;
use crate::middleware::RequireAdminAuth;
use crate::models::CurrentAdmin;
use crate::state::AppState;

/// Brand row on the section page.
pub struct BrandRow {
    pub name: String,
    pub logo: String,
    pub lines: usize,
    pub href: String,
    pub delete_href: String,
}

/// Section page template.
#[derive(Template, WebTemplate)]
#[template(path = "catalog/section.html")]
pub struct SectionTemplate {
    pub admin: CurrentAdmin,
    pub section_id: String,
    pub section_name: String,
    pub brands: Vec<BrandRow>,
    pub total: usize,
    pub query: String,
    pub action: String,
    pub error: Option<&'static str>,
    pub notice: Option<&'static str>,
}

fn brand_rows(section_id: &str, section: &Section, query: &str) -> Vec<BrandRow> {
    filter_by_name(&section.brands, query, |brand| brand.name.as_str())
        .into_iter()
        .map(|brand| {
            let href = brand_href(section_id, &brand.name);
            BrandRow {
                name: brand.name.clone(),
                logo: brand.logo.clone(),
                lines: brand.lines.len(),
                delete_href: format!("{href}/delete"),
                href,
            }
        })
        .collect()
}

/// Show a section's brands with the new-brand form.
#[instrument(skip(state, admin, query))]
pub async fn index(
    State(state): State<AppState>,
    RequireAdminAuth(admin): RequireAdminAuth,
    Path(section): Path<String>,
    Query(query): Query<PageQuery>,
) -> Result<impl IntoResponse> {
    let id = parse_section_id(&section)?;
    let loaded = CatalogRepository::new(state.database()).section(&id).await?;

    Ok(SectionTemplate {
        admin,
        brands: brand_rows(id.as_str(), &loaded, &query.q),
        total: loaded.brands.len(),
        section_name: loaded.name,
        action: section_href(id.as_str()),
        section_id: id.into_inner(),
        query: query.q.trim().to_string(),
        error: query.error(),
        notice: query.notice(),
    })
}

/// Add a brand to a section.
#[instrument(skip(state, _admin, form), fields(brand = %form.name))]
pub async fn create(
    State(state): State<AppState>,
    RequireAdminAuth(_admin): RequireAdminAuth,
    Path(section): Path<String>,
    Form(form): Form<BrandForm>,
) -> Result<Redirect> {
    let id = parse_section_id(&section)?;
    let details = BrandDetails::from(form);
    let ok_to = brand_href(id.as_str(), details.name.trim());

    let result = CatalogRepository::new(state.database())
        .edit_section(&id, |s| s.add_brand(details))
        .await;
    finish(result, &ok_to, &section_href(id.as_str()), "created")
}

/// Edit a brand's details, including renaming it.
#[instrument(skip(state, _admin, form))]
pub async fn update(
    State(state): State<AppState>,
    RequireAdminAuth(_admin): RequireAdminAuth,
    Path((section, brand)): Path<(String, String)>,
    Form(form): Form<BrandForm>,
) -> Result<Redirect> {
    let id = parse_section_id(&section)?;
    let details = BrandDetails::from(form);
    let ok_to = brand_href(id.as_str(), details.name.trim());

    let result = CatalogRepository::new(state.database())
        .edit_section(&id, |s| s.update_brand(&brand, details))
        .await;
    finish(result, &ok_to, &brand_href(id.as_str(), &brand), "saved")
}

/// Remove a brand from its section. Other sections are not touched.
#[instrument(skip(state, _admin))]
pub async fn delete(
    State(state): State<AppState>,
    RequireAdminAuth(_admin): RequireAdminAuth,
    Path((section, brand)): Path<(String, String)>,
) -> Result<Redirect> {
    let id = parse_section_id(&section)?;
    let result = CatalogRepository::new(state.database())
        .edit_section(&id, |s| s.remove_brand(&brand).map(|_| ()))
        .await;
    let back = section_href(id.as_str());
    finish(result, &back, &back, "deleted")
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    #[test]
    fn test_brand_rows_filter_and_link() {
        let mut section = Section::default();
        for name in ["Nasty", "Drip Lab", "Dinner Lady"] {
            section
                .add_brand(BrandDetails {
                    name: name.to_string(),
                    ..BrandDetails::default()
                })
                .unwrap();
        }

        let rows = brand_rows("liquids", &section, "d");
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].href, "/catalog/sections/liquids/brands/Drip%20Lab");
        assert_eq!(
            rows[1].delete_href,
            "/catalog/sections/liquids/brands/Dinner%20Lady/delete"
        );
    }
}
