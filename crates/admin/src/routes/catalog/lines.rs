//! Brand page and its product lines.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, Query, State},
    response::{IntoResponse, Redirect},
};
use tracing::instrument;
use vapeshop_core::{Brand, CatalogError, EntityKind, LineDetails};

use super::types::{LineForm, PageQuery};
use super::{brand_href, finish, line_href, parse_section_id, section_href};
use crate::db::CatalogRepository;
use crate::error::Result;
use crate::filters;
use crate::middleware::RequireAdminAuth;
use crate::models::CurrentAdmin;
use crate::state::AppState;

/// Line row on the brand page.
pub struct LineRow {
    pub name: String,
    pub image: String,
    pub products: usize,
    pub href: String,
    pub delete_href: String,
}

/// Brand page template: brand form plus its lines.
#[derive(Template, WebTemplate)]
#[template(path = "catalog/brand.html")]
pub struct BrandTemplate {
    pub admin: CurrentAdmin,
    pub section_id: String,
    pub section_name: String,
    pub section_href: String,
    pub brand: Brand,
    pub action: String,
    pub delete_action: String,
    pub lines_action: String,
    pub lines: Vec<LineRow>,
    pub error: Option<&'static str>,
    pub notice: Option<&'static str>,
}

fn line_rows(section_id: &str, brand: &Brand) -> Vec<LineRow> {
    brand
        .lines
        .iter()
        .map(|line| {
            let href = line_href(section_id, &brand.name, &line.name);
            LineRow {
                name: line.name.clone(),
                image: line.image.clone(),
                products: line.products.len(),
                delete_href: format!("{href}/delete"),
                href,
            }
        })
        .collect()
}

/// Show a brand's edit form and its lines.
#[instrument(skip(state, admin, query))]
pub async fn index(
    State(state): State<AppState>,
    RequireAdminAuth(admin): RequireAdminAuth,
    Path((section, brand)): Path<(String, String)>,
    Query(query): Query<PageQuery>,
) -> Result<impl IntoResponse> {
    let id = parse_section_id(&section)?;
    let loaded = CatalogRepository::new(state.database()).section(&id).await?;
    let found = loaded.brand(&brand).cloned().ok_or(CatalogError::NotFound {
        kind: EntityKind::Brand,
        name: brand,
    })?;

    let action = brand_href(id.as_str(), &found.name);
    Ok(BrandTemplate {
        admin,
        lines: line_rows(id.as_str(), &found),
        section_href: section_href(id.as_str()),
        section_name: loaded.name,
        section_id: id.into_inner(),
        delete_action: format!("{action}/delete"),
        lines_action: format!("{action}/lines"),
        action,
        brand: found,
        error: query.error(),
        notice: query.notice(),
    })
}

/// Add a line to a brand.
#[instrument(skip(state, _admin, form), fields(line = %form.name))]
pub async fn create(
    State(state): State<AppState>,
    RequireAdminAuth(_admin): RequireAdminAuth,
    Path((section, brand)): Path<(String, String)>,
    Form(form): Form<LineForm>,
) -> Result<Redirect> {
    let id = parse_section_id(&section)?;
    let details = LineDetails::from(form);
    let ok_to = line_href(id.as_str(), &brand, details.name.trim());

    let result = CatalogRepository::new(state.database())
        .edit_section(&id, |s| s.require_brand_mut(&brand)?.add_line(details))
        .await;
    finish(result, &ok_to, &brand_href(id.as_str(), &brand), "created")
}

/// Edit a line, including renaming it.
#[instrument(skip(state, _admin, form))]
pub async fn update(
    State(state): State<AppState>,
    RequireAdminAuth(_admin): RequireAdminAuth,
    Path((section, brand, line)): Path<(String, String, String)>,
    Form(form): Form<LineForm>,
) -> Result<Redirect> {
    let id = parse_section_id(&section)?;
    let details = LineDetails::from(form);
    let ok_to = line_href(id.as_str(), &brand, details.name.trim());

    let result = CatalogRepository::new(state.database())
        .edit_section(&id, |s| s.require_brand_mut(&brand)?.update_line(&line, details))
        .await;
    finish(
        result,
        &ok_to,
        &line_href(id.as_str(), &brand, &line),
        "saved",
    )
}

/// Remove a line from its brand.
#[instrument(skip(state, _admin))]
pub async fn delete(
    State(state): State<AppState>,
    RequireAdminAuth(_admin): RequireAdminAuth,
    Path((section, brand, line)): Path<(String, String, String)>,
) -> Result<Redirect> {
    let id = parse_section_id(&section)?;
    let result = CatalogRepository::new(state.database())
        .edit_section(&id, |s| {
            s.require_brand_mut(&brand)?.remove_line(&line).map(|_| ())
        })
        .await;
    let back = brand_href(id.as_str(), &brand);
    finish(result, &back, &back, "deleted")
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    #[test]
    fn test_line_rows_link_under_brand() {
        let mut brand = Brand {
            name: "Nasty".to_string(),
            ..Brand::default()
        };
        brand
            .add_line(LineDetails {
                name: "Shisha Series".to_string(),
                image: String::new(),
            })
            .unwrap();

        let rows = line_rows("liquids", &brand);
        assert_eq!(rows.len(), 1);
        assert_eq!(
            rows[0].href,
            "/catalog/sections/liquids/brands/Nasty/lines/Shisha%20Series"
        );
        assert_eq!(rows[0].products, 0);
    }
}
