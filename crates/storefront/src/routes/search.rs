//! Search route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Query, State},
    response::IntoResponse,
};
use serde::Deserialize;
use tracing::instrument;
use vapeshop_core::search::{HitKind, SearchHit, search_catalog};

use crate::error::Result;
use crate::filters;
use crate::middleware::OptionalAuth;
use crate::models::CurrentUser;
use crate::routes::catalog::{brand_href, line_href, product_href};
use crate::state::AppState;

/// Hits beyond this many are dropped from the page.
const MAX_RESULTS: usize = 60;

/// Search query parameters.
#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
}

/// One rendered result row.
pub struct HitView {
    pub kind: &'static str,
    pub title: String,
    pub context: String,
    pub href: String,
    pub image: Option<String>,
}

impl From<SearchHit> for HitView {
    fn from(hit: SearchHit) -> Self {
        let line = hit.line.unwrap_or_default();
        match (hit.kind, hit.product) {
            (HitKind::Product, Some(product)) => Self {
                kind: "Product",
                href: product_href(&hit.section_id, &hit.brand, &line, &product),
                context: format!("{} · {} · {}", hit.section_name, hit.brand, line),
                title: product,
                image: hit.image,
            },
            (HitKind::Line, _) => Self {
                kind: "Line",
                href: line_href(&hit.section_id, &hit.brand, &line),
                context: format!("{} · {}", hit.section_name, hit.brand),
                title: line,
                image: hit.image,
            },
            _ => Self {
                kind: "Brand",
                href: brand_href(&hit.section_id, &hit.brand),
                context: hit.section_name,
                title: hit.brand,
                image: hit.image,
            },
        }
    }
}

/// Search results page template.
#[derive(Template, WebTemplate)]
#[template(path = "search.html")]
pub struct SearchTemplate {
    pub user: Option<CurrentUser>,
    pub query: String,
    pub hits: Vec<HitView>,
    pub truncated: bool,
}

/// Search brands, lines and products by name (and flavor).
#[instrument(skip(state, user, query), fields(q = %query.q))]
pub async fn search(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
    Query(query): Query<SearchQuery>,
) -> Result<impl IntoResponse> {
    let loaded = state.catalog().load().await?;
    let hits = search_catalog(&loaded.catalog, &query.q);
    let truncated = hits.len() > MAX_RESULTS;

    Ok(SearchTemplate {
        user,
        query: query.q.trim().to_string(),
        hits: hits.into_iter().take(MAX_RESULTS).map(HitView::from).collect(),
        truncated,
    })
}
