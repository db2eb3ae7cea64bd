//! Case-insensitive substring search over the in-memory catalog.
//!
//! The catalog is small enough that a linear scan per query is fine; there is
//! no index to keep in sync with admin edits.

use crate::catalog::{Brand, Catalog, Line, Product};

/// What a search hit points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitKind {
    Brand,
    Line,
    Product,
}

/// A match with enough context to link to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchHit {
    pub kind: HitKind,
    pub section_id: String,
    pub section_name: String,
    pub brand: String,
    /// Set for line and product hits.
    pub line: Option<String>,
    /// Set for product hits.
    pub product: Option<String>,
    /// Image to show next to the hit, if any.
    pub image: Option<String>,
}

/// Lowercased needle; `None` for a blank query.
fn needle(query: &str) -> Option<String> {
    let q = query.trim();
    (!q.is_empty()).then(|| q.to_lowercase())
}

fn contains(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(needle)
}

/// Keep the items whose name contains `query`, ignoring case.
///
/// A blank query keeps everything.
pub fn filter_by_name<'a, T, F>(items: &'a [T], query: &str, name: F) -> Vec<&'a T>
where
    F: Fn(&T) -> &str,
{
    match needle(query) {
        None => items.iter().collect(),
        Some(n) => items.iter().filter(|item| contains(name(item), &n)).collect(),
    }
}

fn brand_matches(brand: &Brand, n: &str) -> bool {
    contains(&brand.name, n)
}

fn line_matches(line: &Line, n: &str) -> bool {
    contains(&line.name, n)
}

fn product_matches(product: &Product, n: &str) -> bool {
    contains(&product.name, n) || contains(&product.flavor, n)
}

/// Search brands, lines and products (name, plus flavor for products).
///
/// Hits come back in catalog order: sections by position, then tree order.
/// A blank query returns no hits.
#[must_use]
pub fn search_catalog(catalog: &Catalog, query: &str) -> Vec<SearchHit> {
    let Some(n) = needle(query) else {
        return Vec::new();
    };

    let mut hits = Vec::new();
    for (section_id, section) in catalog.ordered_sections() {
        for brand in &section.brands {
            let base = SearchHit {
                kind: HitKind::Brand,
                section_id: section_id.to_owned(),
                section_name: section.name.clone(),
                brand: brand.name.clone(),
                line: None,
                product: None,
                image: None,
            };
            if brand_matches(brand, &n) {
                hits.push(SearchHit {
                    image: (!brand.logo.is_empty()).then(|| brand.logo.clone()),
                    ..base.clone()
                });
            }
            for line in &brand.lines {
                if line_matches(line, &n) {
                    hits.push(SearchHit {
                        kind: HitKind::Line,
                        line: Some(line.name.clone()),
                        image: (!line.image.is_empty()).then(|| line.image.clone()),
                        ..base.clone()
                    });
                }
                for product in &line.products {
                    if product_matches(product, &n) {
                        hits.push(SearchHit {
                            kind: HitKind::Product,
                            line: Some(line.name.clone()),
                            product: Some(product.name.clone()),
                            image: product.cover().map(str::to_owned),
                            ..base.clone()
                        });
                    }
                }
            }
        }
    }
    hits
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    fn catalog() -> Catalog {
        serde_json::from_value(serde_json::json!({
            "sections": {
                "liquids": {
                    "name": "Liquids",
                    "brands": [{
                        "name": "Nasty Juice",
                        "lines": [{
                            "name": "Ice Series",
                            "products": [
                                { "name": "Green Ape", "flavor": "Apple ICE" },
                                { "name": "Slow Blow", "flavor": "Pineapple lime" }
                            ]
                        }]
                    }]
                }
            }
        }))
        .unwrap()
    }

    #[test]
    fn test_blank_query_has_no_hits() {
        assert!(search_catalog(&catalog(), "   ").is_empty());
    }

    #[test]
    fn test_matches_are_case_insensitive_substrings() {
        let hits = search_catalog(&catalog(), "ice");
        let kinds: Vec<HitKind> = hits.iter().map(|h| h.kind).collect();
        // "Nasty Juice", "Ice Series", and "Green Ape" via flavor "Apple ICE"
        assert_eq!(kinds, vec![HitKind::Brand, HitKind::Line, HitKind::Product]);
        assert_eq!(hits[2].product.as_deref(), Some("Green Ape"));
        assert_eq!(hits[2].section_id, "liquids");
    }

    #[test]
    fn test_flavor_match() {
        let hits = search_catalog(&catalog(), "PINEAPPLE");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].product.as_deref(), Some("Slow Blow"));
    }

    #[test]
    fn test_brand_match() {
        let hits = search_catalog(&catalog(), "nasty");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].kind, HitKind::Brand);
    }

    #[test]
    fn test_filter_by_name() {
        let names = vec!["Alpha".to_string(), "beta".to_string(), "ALPINE".to_string()];
        let kept = filter_by_name(&names, "alp", String::as_str);
        assert_eq!(kept, vec![&names[0], &names[2]]);
        assert_eq!(filter_by_name(&names, "", String::as_str).len(), 3);
    }
}
