//! Line page and its products.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, Query, State},
    response::{IntoResponse, Redirect},
};
use tracing::instrument;
use vapeshop_core::{CatalogError, EntityKind, Line, Product, Section};

use super::types::{PageQuery, ProductForm};
use super::{brand_href, finish, line_href, parse_section_id, product_href, section_href};
use crate::db::CatalogRepository;
use crate::error::Result;
use crate::filters;
use crate::middleware::RequireAdminAuth;
use crate::models::CurrentAdmin;
use crate::state::AppState;

/// Breadcrumb trail shared by the line and product pages.
pub struct Trail {
    pub section_name: String,
    pub section_href: String,
    pub brand_name: String,
    pub brand_href: String,
    pub line_name: String,
    pub line_href: String,
}

/// Product row on the line page.
pub struct ProductRow {
    pub name: String,
    pub flavor: String,
    pub cover: Option<String>,
    pub href: String,
    pub delete_href: String,
}

/// Line page template: line form plus its products.
#[derive(Template, WebTemplate)]
#[template(path = "catalog/line.html")]
pub struct LineTemplate {
    pub admin: CurrentAdmin,
    pub trail: Trail,
    pub line: Line,
    pub delete_action: String,
    pub products_action: String,
    pub products: Vec<ProductRow>,
    pub uploads_enabled: bool,
    pub error: Option<&'static str>,
    pub notice: Option<&'static str>,
}

/// Product edit template.
#[derive(Template, WebTemplate)]
#[template(path = "catalog/product.html")]
pub struct ProductTemplate {
    pub admin: CurrentAdmin,
    pub trail: Trail,
    pub product: Product,
    pub images: String,
    pub action: String,
    pub delete_action: String,
    pub uploads_enabled: bool,
    pub error: Option<&'static str>,
    pub notice: Option<&'static str>,
}

/// Find a line by brand and line name, as a 404 when missing.
fn find_line<'a>(section: &'a Section, brand: &str, line: &str) -> Result<(&'a str, &'a Line)> {
    let found_brand = section.brand(brand).ok_or_else(|| CatalogError::NotFound {
        kind: EntityKind::Brand,
        name: brand.to_string(),
    })?;
    let found_line = found_brand.line(line).ok_or_else(|| CatalogError::NotFound {
        kind: EntityKind::Line,
        name: line.to_string(),
    })?;
    Ok((found_brand.name.as_str(), found_line))
}

fn trail(section_id: &str, section: &Section, brand: &str, line: &str) -> Trail {
    Trail {
        section_name: section.name.clone(),
        section_href: section_href(section_id),
        brand_name: brand.to_string(),
        brand_href: brand_href(section_id, brand),
        line_name: line.to_string(),
        line_href: line_href(section_id, brand, line),
    }
}

fn product_rows(section_id: &str, brand: &str, line: &Line) -> Vec<ProductRow> {
    line.products
        .iter()
        .map(|product| {
            let href = product_href(section_id, brand, &line.name, &product.name);
            ProductRow {
                name: product.name.clone(),
                flavor: product.flavor.clone(),
                cover: product.cover().map(str::to_string),
                delete_href: format!("{href}/delete"),
                href,
            }
        })
        .collect()
}

/// Show a line's edit form and its products.
#[instrument(skip(state, admin, query))]
pub async fn index(
    State(state): State<AppState>,
    RequireAdminAuth(admin): RequireAdminAuth,
    Path((section, brand, line)): Path<(String, String, String)>,
    Query(query): Query<PageQuery>,
) -> Result<impl IntoResponse> {
    let id = parse_section_id(&section)?;
    let loaded = CatalogRepository::new(state.database()).section(&id).await?;
    let (brand_name, found) = find_line(&loaded, &brand, &line)?;

    let trail = trail(id.as_str(), &loaded, brand_name, &found.name);
    Ok(LineTemplate {
        admin,
        products: product_rows(id.as_str(), brand_name, found),
        delete_action: format!("{}/delete", trail.line_href),
        products_action: format!("{}/products", trail.line_href),
        trail,
        line: found.clone(),
        uploads_enabled: state.cloudinary().is_some(),
        error: query.error(),
        notice: query.notice(),
    })
}

/// Add a product to a line.
#[instrument(skip(state, _admin, form), fields(product = %form.name))]
pub async fn create(
    State(state): State<AppState>,
    RequireAdminAuth(_admin): RequireAdminAuth,
    Path((section, brand, line)): Path<(String, String, String)>,
    Form(form): Form<ProductForm>,
) -> Result<Redirect> {
    let id = parse_section_id(&section)?;
    let product = Product::from(form);
    let back = line_href(id.as_str(), &brand, &line);

    let result = CatalogRepository::new(state.database())
        .edit_section(&id, |s| {
            s.require_brand_mut(&brand)?
                .require_line_mut(&line)?
                .add_product(product)
        })
        .await;
    finish(result, &back, &back, "created")
}

/// Show the product edit form.
#[instrument(skip(state, admin, query))]
pub async fn edit(
    State(state): State<AppState>,
    RequireAdminAuth(admin): RequireAdminAuth,
    Path((section, brand, line, product)): Path<(String, String, String, String)>,
    Query(query): Query<PageQuery>,
) -> Result<impl IntoResponse> {
    let id = parse_section_id(&section)?;
    let loaded = CatalogRepository::new(state.database()).section(&id).await?;
    let (brand_name, found_line) = find_line(&loaded, &brand, &line)?;
    let found = found_line
        .product(&product)
        .cloned()
        .ok_or(CatalogError::NotFound {
            kind: EntityKind::Product,
            name: product,
        })?;

    let action = product_href(id.as_str(), brand_name, &found_line.name, &found.name);
    Ok(ProductTemplate {
        admin,
        trail: trail(id.as_str(), &loaded, brand_name, &found_line.name),
        images: found.images.join("\n"),
        delete_action: format!("{action}/delete"),
        action,
        product: found,
        uploads_enabled: state.cloudinary().is_some(),
        error: query.error(),
        notice: query.notice(),
    })
}

/// Save a product, including renaming it.
#[instrument(skip(state, _admin, form))]
pub async fn update(
    State(state): State<AppState>,
    RequireAdminAuth(_admin): RequireAdminAuth,
    Path((section, brand, line, product)): Path<(String, String, String, String)>,
    Form(form): Form<ProductForm>,
) -> Result<Redirect> {
    let id = parse_section_id(&section)?;
    let updated = Product::from(form);
    let ok_to = product_href(id.as_str(), &brand, &line, updated.name.trim());

    let result = CatalogRepository::new(state.database())
        .edit_section(&id, |s| {
            s.require_brand_mut(&brand)?
                .require_line_mut(&line)?
                .update_product(&product, updated)
        })
        .await;
    finish(
        result,
        &ok_to,
        &product_href(id.as_str(), &brand, &line, &product),
        "saved",
    )
}

/// Remove a product from its line.
#[instrument(skip(state, _admin))]
pub async fn delete(
    State(state): State<AppState>,
    RequireAdminAuth(_admin): RequireAdminAuth,
    Path((section, brand, line, product)): Path<(String, String, String, String)>,
) -> Result<Redirect> {
    let id = parse_section_id(&section)?;
    let result = CatalogRepository::new(state.database())
        .edit_section(&id, |s| {
            s.require_brand_mut(&brand)?
                .require_line_mut(&line)?
                .remove_product(&product)
                .map(|_| ())
        })
        .await;
    let back = line_href(id.as_str(), &brand, &line);
    finish(result, &back, &back, "deleted")
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use vapeshop_core::{BrandDetails, LineDetails};

    use super::*;

    fn section() -> Section {
        let mut section = Section {
            name: "Liquids".to_string(),
            ..Section::default()
        };
        section
            .add_brand(BrandDetails {
                name: "Nasty".to_string(),
                ..BrandDetails::default()
            })
            .unwrap();
        let brand = section.require_brand_mut("nasty").unwrap();
        brand
            .add_line(LineDetails {
                name: "Ice".to_string(),
                image: String::new(),
            })
            .unwrap();
        brand
            .require_line_mut("ice")
            .unwrap()
            .add_product(Product {
                name: "Green Ape".to_string(),
                flavor: "Apple".to_string(),
                images: vec!["https://img.example/ape.png".to_string()],
                ..Product::default()
            })
            .unwrap();
        section
    }

    #[test]
    fn test_find_line_is_case_insensitive() {
        let section = section();
        let (brand, line) = find_line(&section, "NASTY", "ice").unwrap();
        assert_eq!(brand, "Nasty");
        assert_eq!(line.name, "Ice");
        assert!(find_line(&section, "Nasty", "Shisha").is_err());
    }

    #[test]
    fn test_product_rows_carry_cover() {
        let section = section();
        let (brand, line) = find_line(&section, "Nasty", "Ice").unwrap();
        let rows = product_rows("liquids", brand, line);
        assert_eq!(rows[0].cover.as_deref(), Some("https://img.example/ape.png"));
        assert_eq!(
            rows[0].href,
            "/catalog/sections/liquids/brands/Nasty/lines/Ice/products/Green%20Ape"
        );
    }
}
