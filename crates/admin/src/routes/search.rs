//! Catalog-wide search for the back office.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Query, State},
    response::IntoResponse,
};
use serde::Deserialize;
use tracing::instrument;
use vapeshop_core::search::{HitKind, SearchHit, search_catalog};

use super::catalog::{brand_href, line_href, product_href};
use crate::db::CatalogRepository;
use crate::error::Result;
use crate::filters;
use crate::middleware::RequireAdminAuth;
use crate::models::CurrentAdmin;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
}

/// A hit linked to its edit page.
pub struct HitRow {
    pub kind: &'static str,
    pub title: String,
    pub context: String,
    pub image: Option<String>,
    pub href: String,
}

#[derive(Template, WebTemplate)]
#[template(path = "search.html")]
pub struct SearchTemplate {
    pub admin: CurrentAdmin,
    pub query: String,
    pub hits: Vec<HitRow>,
}

fn hit_row(hit: SearchHit) -> HitRow {
    let section = hit.section_id.as_str();
    match (hit.kind, hit.line, hit.product) {
        (HitKind::Product, Some(line), Some(product)) => HitRow {
            kind: "Product",
            href: product_href(section, &hit.brand, &line, &product),
            context: format!("{} / {} / {}", hit.section_name, hit.brand, line),
            title: product,
            image: hit.image,
        },
        (HitKind::Line | HitKind::Product, Some(line), _) => HitRow {
            kind: "Line",
            href: line_href(section, &hit.brand, &line),
            context: format!("{} / {}", hit.section_name, hit.brand),
            title: line,
            image: hit.image,
        },
        _ => HitRow {
            kind: "Brand",
            href: brand_href(section, &hit.brand),
            context: hit.section_name,
            title: hit.brand,
            image: hit.image,
        },
    }
}

/// Search brands, lines and products across every section.
#[instrument(skip(state, admin))]
pub async fn index(
    State(state): State<AppState>,
    RequireAdminAuth(admin): RequireAdminAuth,
    Query(query): Query<SearchQuery>,
) -> Result<impl IntoResponse> {
    let hits = if query.q.trim().is_empty() {
        Vec::new()
    } else {
        let catalog = CatalogRepository::new(state.database()).catalog().await?;
        search_catalog(&catalog, &query.q)
            .into_iter()
            .map(hit_row)
            .collect()
    };

    Ok(SearchTemplate {
        admin,
        query: query.q.trim().to_string(),
        hits,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use vapeshop_core::{BrandDetails, Catalog, LineDetails, Product, SectionId};

    use super::*;

    fn catalog() -> Catalog {
        let mut catalog = Catalog::default();
        let id = SectionId::parse("liquids").unwrap();
        catalog.add_section(&id, "Liquids").unwrap();
        let section = catalog.require_section_mut(id.as_str()).unwrap();
        section
            .add_brand(BrandDetails {
                name: "Nasty".to_string(),
                ..BrandDetails::default()
            })
            .unwrap();
        let brand = section.require_brand_mut("Nasty").unwrap();
        brand
            .add_line(LineDetails {
                name: "Nasty Ice".to_string(),
                image: String::new(),
            })
            .unwrap();
        brand
            .require_line_mut("Nasty Ice")
            .unwrap()
            .add_product(Product {
                name: "Nasty Mango".to_string(),
                ..Product::default()
            })
            .unwrap();
        catalog
    }

    #[test]
    fn test_hits_link_to_edit_pages() {
        let rows: Vec<HitRow> = search_catalog(&catalog(), "NASTY")
            .into_iter()
            .map(hit_row)
            .collect();

        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].kind, "Brand");
        assert_eq!(rows[0].href, "/catalog/sections/liquids/brands/Nasty");
        assert_eq!(rows[1].kind, "Line");
        assert_eq!(rows[1].context, "Liquids / Nasty");
        assert_eq!(rows[2].kind, "Product");
        assert_eq!(
            rows[2].href,
            "/catalog/sections/liquids/brands/Nasty/lines/Nasty%20Ice/products/Nasty%20Mango"
        );
    }
}
