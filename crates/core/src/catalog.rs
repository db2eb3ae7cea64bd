//! The catalog tree: sections → brands → lines → products.
//!
//! Stored in the Realtime Database under `catalog/sections/<sectionId>`. Each
//! section owns its brands as an array, and every admin save rewrites that
//! whole array; there are no per-brand keys. Names are the only identity
//! below a section and must be unique (case-insensitively) among siblings.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::SectionId;
use crate::types::list::{deserialize_keyed, deserialize_list};

/// Which level of the tree an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Section,
    Brand,
    Line,
    Product,
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Section => "section",
            Self::Brand => "brand",
            Self::Line => "line",
            Self::Product => "product",
        })
    }
}

/// Errors from catalog mutations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    /// A name (or section id) was blank.
    #[error("{0} name cannot be empty")]
    EmptyName(EntityKind),

    /// A sibling with the same name already exists.
    #[error("{kind} '{name}' already exists")]
    Duplicate { kind: EntityKind, name: String },

    /// The addressed entity does not exist.
    #[error("{kind} '{name}' not found")]
    NotFound { kind: EntityKind, name: String },
}

/// The whole catalog as read from `catalog`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    #[serde(default, deserialize_with = "deserialize_keyed")]
    pub sections: BTreeMap<String, Section>,
}

/// Top-level category such as liquids or devices.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Section {
    pub name: String,
    /// Sort position on the home page; ties fall back to the section id.
    #[serde(default)]
    pub order: u32,
    #[serde(default, deserialize_with = "deserialize_list")]
    pub brands: Vec<Brand>,
}

/// A manufacturer within a section.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Brand {
    pub name: String,
    #[serde(default)]
    pub logo: String,
    #[serde(default)]
    pub website: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, deserialize_with = "deserialize_list")]
    pub lines: Vec<Line>,
}

/// Editable brand fields; lines are managed separately.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BrandDetails {
    pub name: String,
    pub logo: String,
    pub website: String,
    pub description: String,
}

/// A named product line under a brand.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Line {
    pub name: String,
    #[serde(default)]
    pub image: String,
    #[serde(default, deserialize_with = "deserialize_list")]
    pub products: Vec<Product>,
}

/// Editable line fields; products are managed separately.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LineDetails {
    pub name: String,
    pub image: String,
}

/// A single product.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Flavor or profile notes.
    #[serde(default)]
    pub flavor: String,
    #[serde(default, deserialize_with = "deserialize_list")]
    pub images: Vec<String>,
}

trait Named {
    const KIND: EntityKind;
    fn name(&self) -> &str;
}

impl Named for Brand {
    const KIND: EntityKind = EntityKind::Brand;
    fn name(&self) -> &str {
        &self.name
    }
}

impl Named for Line {
    const KIND: EntityKind = EntityKind::Line;
    fn name(&self) -> &str {
        &self.name
    }
}

impl Named for Product {
    const KIND: EntityKind = EntityKind::Product;
    fn name(&self) -> &str {
        &self.name
    }
}

fn same_name(a: &str, b: &str) -> bool {
    a.trim().to_lowercase() == b.trim().to_lowercase()
}

fn clean_name(name: &str, kind: EntityKind) -> Result<String, CatalogError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(CatalogError::EmptyName(kind));
    }
    Ok(name.to_owned())
}

fn position<T: Named>(items: &[T], name: &str) -> Result<usize, CatalogError> {
    items
        .iter()
        .position(|item| same_name(item.name(), name))
        .ok_or_else(|| CatalogError::NotFound {
            kind: T::KIND,
            name: name.trim().to_owned(),
        })
}

/// Fail if `name` is taken by a sibling other than the one at `except`.
fn ensure_unique<T: Named>(
    items: &[T],
    name: &str,
    except: Option<usize>,
) -> Result<(), CatalogError> {
    let clash = items
        .iter()
        .enumerate()
        .any(|(i, item)| Some(i) != except && same_name(item.name(), name));
    if clash {
        return Err(CatalogError::Duplicate {
            kind: T::KIND,
            name: name.to_owned(),
        });
    }
    Ok(())
}

fn find<'a, T: Named>(items: &'a [T], name: &str) -> Option<&'a T> {
    items.iter().find(|item| same_name(item.name(), name))
}

fn find_mut<'a, T: Named>(items: &'a mut [T], name: &str) -> Option<&'a mut T> {
    items.iter_mut().find(|item| same_name(item.name(), name))
}

impl Catalog {
    /// Sections sorted by `order`, then by id.
    #[must_use]
    pub fn ordered_sections(&self) -> Vec<(&str, &Section)> {
        let mut sections: Vec<(&str, &Section)> = self
            .sections
            .iter()
            .map(|(id, section)| (id.as_str(), section))
            .collect();
        sections.sort_by(|a, b| a.1.order.cmp(&b.1.order).then_with(|| a.0.cmp(b.0)));
        sections
    }

    #[must_use]
    pub fn section(&self, id: &str) -> Option<&Section> {
        self.sections.get(id)
    }

    pub fn section_mut(&mut self, id: &str) -> Option<&mut Section> {
        self.sections.get_mut(id)
    }

    /// Look up a section or fail with `NotFound`.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::NotFound` when no section has this id.
    pub fn require_section_mut(&mut self, id: &str) -> Result<&mut Section, CatalogError> {
        self.sections
            .get_mut(id)
            .ok_or_else(|| CatalogError::NotFound {
                kind: EntityKind::Section,
                name: id.to_owned(),
            })
    }

    /// Add an empty section under `id`.
    ///
    /// # Errors
    ///
    /// Returns `EmptyName` for a blank name and `Duplicate` when the id is
    /// already used.
    pub fn add_section(&mut self, id: &SectionId, name: &str) -> Result<(), CatalogError> {
        let name = clean_name(name, EntityKind::Section)?;
        if self.sections.contains_key(id.as_str()) {
            return Err(CatalogError::Duplicate {
                kind: EntityKind::Section,
                name: id.to_string(),
            });
        }
        let order = self
            .sections
            .values()
            .map(|s| s.order.saturating_add(1))
            .max()
            .unwrap_or(0);
        self.sections.insert(
            id.to_string(),
            Section {
                name,
                order,
                brands: Vec::new(),
            },
        );
        Ok(())
    }

    /// Remove a section and everything under it.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` when no section has this id.
    pub fn remove_section(&mut self, id: &str) -> Result<Section, CatalogError> {
        self.sections
            .remove(id)
            .ok_or_else(|| CatalogError::NotFound {
                kind: EntityKind::Section,
                name: id.to_owned(),
            })
    }

    #[must_use]
    pub fn brand_count(&self) -> usize {
        self.sections.values().map(|s| s.brands.len()).sum()
    }

    #[must_use]
    pub fn line_count(&self) -> usize {
        self.sections
            .values()
            .flat_map(|s| &s.brands)
            .map(|b| b.lines.len())
            .sum()
    }

    #[must_use]
    pub fn product_count(&self) -> usize {
        self.sections
            .values()
            .flat_map(|s| &s.brands)
            .flat_map(|b| &b.lines)
            .map(|l| l.products.len())
            .sum()
    }
}

impl Section {
    #[must_use]
    pub fn brand(&self, name: &str) -> Option<&Brand> {
        find(&self.brands, name)
    }

    pub fn brand_mut(&mut self, name: &str) -> Option<&mut Brand> {
        find_mut(&mut self.brands, name)
    }

    /// Look up a brand or fail with `NotFound`.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::NotFound` when no brand has this name.
    pub fn require_brand_mut(&mut self, name: &str) -> Result<&mut Brand, CatalogError> {
        let idx = position(&self.brands, name)?;
        self.brands.get_mut(idx).ok_or_else(|| CatalogError::NotFound {
            kind: EntityKind::Brand,
            name: name.to_owned(),
        })
    }

    /// Append a brand with no lines.
    ///
    /// # Errors
    ///
    /// Returns `EmptyName` or `Duplicate`.
    pub fn add_brand(&mut self, details: BrandDetails) -> Result<(), CatalogError> {
        let name = clean_name(&details.name, EntityKind::Brand)?;
        ensure_unique(&self.brands, &name, None)?;
        self.brands.push(Brand {
            name,
            logo: details.logo.trim().to_owned(),
            website: details.website.trim().to_owned(),
            description: details.description.trim().to_owned(),
            lines: Vec::new(),
        });
        Ok(())
    }

    /// Replace a brand's editable fields, keeping its lines.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` when `current` does not exist, `EmptyName` or
    /// `Duplicate` when the new name is blank or taken by another brand.
    pub fn update_brand(&mut self, current: &str, details: BrandDetails) -> Result<(), CatalogError> {
        let idx = position(&self.brands, current)?;
        let name = clean_name(&details.name, EntityKind::Brand)?;
        ensure_unique(&self.brands, &name, Some(idx))?;
        if let Some(brand) = self.brands.get_mut(idx) {
            brand.name = name;
            brand.logo = details.logo.trim().to_owned();
            brand.website = details.website.trim().to_owned();
            brand.description = details.description.trim().to_owned();
        }
        Ok(())
    }

    /// Remove a brand by name, keeping sibling order.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` when no brand has this name.
    pub fn remove_brand(&mut self, name: &str) -> Result<Brand, CatalogError> {
        let idx = position(&self.brands, name)?;
        Ok(self.brands.remove(idx))
    }
}

impl Brand {
    #[must_use]
    pub fn line(&self, name: &str) -> Option<&Line> {
        find(&self.lines, name)
    }

    pub fn line_mut(&mut self, name: &str) -> Option<&mut Line> {
        find_mut(&mut self.lines, name)
    }

    /// Look up a line or fail with `NotFound`.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::NotFound` when no line has this name.
    pub fn require_line_mut(&mut self, name: &str) -> Result<&mut Line, CatalogError> {
        let idx = position(&self.lines, name)?;
        self.lines.get_mut(idx).ok_or_else(|| CatalogError::NotFound {
            kind: EntityKind::Line,
            name: name.to_owned(),
        })
    }

    #[must_use]
    pub fn details(&self) -> BrandDetails {
        BrandDetails {
            name: self.name.clone(),
            logo: self.logo.clone(),
            website: self.website.clone(),
            description: self.description.clone(),
        }
    }

    /// Append a line with no products.
    ///
    /// # Errors
    ///
    /// Returns `EmptyName` or `Duplicate`.
    pub fn add_line(&mut self, details: LineDetails) -> Result<(), CatalogError> {
        let name = clean_name(&details.name, EntityKind::Line)?;
        ensure_unique(&self.lines, &name, None)?;
        self.lines.push(Line {
            name,
            image: details.image.trim().to_owned(),
            products: Vec::new(),
        });
        Ok(())
    }

    /// Replace a line's editable fields, keeping its products.
    ///
    /// # Errors
    ///
    /// Returns `NotFound`, `EmptyName` or `Duplicate`.
    pub fn update_line(&mut self, current: &str, details: LineDetails) -> Result<(), CatalogError> {
        let idx = position(&self.lines, current)?;
        let name = clean_name(&details.name, EntityKind::Line)?;
        ensure_unique(&self.lines, &name, Some(idx))?;
        if let Some(line) = self.lines.get_mut(idx) {
            line.name = name;
            line.image = details.image.trim().to_owned();
        }
        Ok(())
    }

    /// Remove a line by name.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` when no line has this name.
    pub fn remove_line(&mut self, name: &str) -> Result<Line, CatalogError> {
        let idx = position(&self.lines, name)?;
        Ok(self.lines.remove(idx))
    }
}

impl Line {
    #[must_use]
    pub fn product(&self, name: &str) -> Option<&Product> {
        find(&self.products, name)
    }

    #[must_use]
    pub fn details(&self) -> LineDetails {
        LineDetails {
            name: self.name.clone(),
            image: self.image.clone(),
        }
    }

    /// Append a product.
    ///
    /// # Errors
    ///
    /// Returns `EmptyName` or `Duplicate`.
    pub fn add_product(&mut self, product: Product) -> Result<(), CatalogError> {
        let product = product.cleaned()?;
        ensure_unique(&self.products, &product.name, None)?;
        self.products.push(product);
        Ok(())
    }

    /// Overwrite a product, optionally renaming it.
    ///
    /// # Errors
    ///
    /// Returns `NotFound`, `EmptyName` or `Duplicate`.
    pub fn update_product(&mut self, current: &str, product: Product) -> Result<(), CatalogError> {
        let idx = position(&self.products, current)?;
        let product = product.cleaned()?;
        ensure_unique(&self.products, &product.name, Some(idx))?;
        if let Some(slot) = self.products.get_mut(idx) {
            *slot = product;
        }
        Ok(())
    }

    /// Remove a product by name.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` when no product has this name.
    pub fn remove_product(&mut self, name: &str) -> Result<Product, CatalogError> {
        let idx = position(&self.products, name)?;
        Ok(self.products.remove(idx))
    }
}

impl Product {
    /// First image, used as the card thumbnail.
    #[must_use]
    pub fn cover(&self) -> Option<&str> {
        self.images.first().map(String::as_str)
    }

    fn cleaned(self) -> Result<Self, CatalogError> {
        Ok(Self {
            name: clean_name(&self.name, EntityKind::Product)?,
            description: self.description.trim().to_owned(),
            flavor: self.flavor.trim().to_owned(),
            images: self
                .images
                .into_iter()
                .map(|url| url.trim().to_owned())
                .filter(|url| !url.is_empty())
                .collect(),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    fn brand(name: &str) -> BrandDetails {
        BrandDetails {
            name: name.to_string(),
            ..BrandDetails::default()
        }
    }

    fn sample() -> Catalog {
        let json = serde_json::json!({
            "sections": {
                "liquids": {
                    "name": "Liquids",
                    "order": 1,
                    "brands": [
                        {
                            "name": "Cloud Co",
                            "logo": "https://img/cloud.png",
                            "lines": [
                                {
                                    "name": "Ice",
                                    "products": [
                                        { "name": "Mint Ice", "flavor": "Cool mint", "images": ["a.jpg"] }
                                    ]
                                }
                            ]
                        },
                        { "name": "Drip Lab" }
                    ]
                },
                "devices": {
                    "name": "Devices",
                    "order": 0,
                    "brands": { "0": { "name": "Vaporesso" } }
                }
            }
        });
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn test_decodes_firebase_shapes() {
        let catalog = sample();
        assert_eq!(catalog.sections.len(), 2);
        assert_eq!(catalog.section("devices").unwrap().brands[0].name, "Vaporesso");
        assert_eq!(catalog.product_count(), 1);
        assert_eq!(catalog.line_count(), 1);
        assert_eq!(catalog.brand_count(), 3);
    }

    #[test]
    fn test_ordered_sections() {
        let catalog = sample();
        let ids: Vec<&str> = catalog.ordered_sections().iter().map(|(id, _)| *id).collect();
        assert_eq!(ids, vec!["devices", "liquids"]);
    }

    #[test]
    fn test_lookup_is_case_insensitive() {
        let catalog = sample();
        let section = catalog.section("liquids").unwrap();
        let line = section.brand("cloud co").unwrap().line("ICE").unwrap();
        assert_eq!(line.product(" mint ice ").unwrap().cover(), Some("a.jpg"));
    }

    #[test]
    fn test_add_brand_rejects_duplicates() {
        let mut catalog = sample();
        let section = catalog.section_mut("liquids").unwrap();
        let err = section.add_brand(brand("CLOUD CO")).unwrap_err();
        assert!(matches!(err, CatalogError::Duplicate { kind: EntityKind::Brand, .. }));
        assert_eq!(
            section.add_brand(brand("   ")),
            Err(CatalogError::EmptyName(EntityKind::Brand))
        );
        section.add_brand(brand(" New Brand ")).unwrap();
        assert_eq!(section.brands.last().unwrap().name, "New Brand");
    }

    #[test]
    fn test_same_brand_name_allowed_in_other_section() {
        let mut catalog = sample();
        let devices = catalog.section_mut("devices").unwrap();
        assert!(devices.add_brand(brand("Cloud Co")).is_ok());
    }

    #[test]
    fn test_remove_brand_leaves_other_sections_untouched() {
        let mut catalog = sample();
        let devices_before = catalog.section("devices").unwrap().clone();

        let removed = catalog
            .section_mut("liquids")
            .unwrap()
            .remove_brand("cloud co")
            .unwrap();

        assert_eq!(removed.name, "Cloud Co");
        let liquids = catalog.section("liquids").unwrap();
        assert_eq!(liquids.brands.len(), 1);
        assert_eq!(liquids.brands[0].name, "Drip Lab");
        assert_eq!(catalog.section("devices").unwrap(), &devices_before);
    }

    #[test]
    fn test_remove_missing_brand() {
        let mut catalog = sample();
        let err = catalog
            .section_mut("liquids")
            .unwrap()
            .remove_brand("Nope")
            .unwrap_err();
        assert!(matches!(err, CatalogError::NotFound { kind: EntityKind::Brand, .. }));
    }

    #[test]
    fn test_update_brand_keeps_lines_and_checks_rename() {
        let mut catalog = sample();
        let section = catalog.section_mut("liquids").unwrap();

        let err = section
            .update_brand("Cloud Co", brand("drip lab"))
            .unwrap_err();
        assert!(matches!(err, CatalogError::Duplicate { .. }));

        section
            .update_brand(
                "Cloud Co",
                BrandDetails {
                    name: "Cloud Company".to_string(),
                    website: "https://cloud.example".to_string(),
                    ..BrandDetails::default()
                },
            )
            .unwrap();
        let updated = section.brand("cloud company").unwrap();
        assert_eq!(updated.lines.len(), 1);
        assert_eq!(updated.website, "https://cloud.example");
    }

    #[test]
    fn test_line_and_product_mutations() {
        let mut catalog = sample();
        let brand = catalog
            .section_mut("liquids")
            .unwrap()
            .require_brand_mut("Cloud Co")
            .unwrap();
        brand
            .add_line(LineDetails {
                name: "Fruit".to_string(),
                image: String::new(),
            })
            .unwrap();

        let line = brand.require_line_mut("fruit").unwrap();
        line.add_product(Product {
            name: "Mango".to_string(),
            images: vec![" ".to_string(), "m.jpg".to_string()],
            ..Product::default()
        })
        .unwrap();
        assert_eq!(line.products[0].images, vec!["m.jpg"]);

        line.update_product(
            "mango",
            Product {
                name: "Mango Ice".to_string(),
                flavor: "Mango, menthol".to_string(),
                ..Product::default()
            },
        )
        .unwrap();
        assert_eq!(line.product("mango ice").unwrap().flavor, "Mango, menthol");

        line.remove_product("Mango Ice").unwrap();
        assert!(line.products.is_empty());

        brand.remove_line("Fruit").unwrap();
        assert_eq!(brand.lines.len(), 1);
    }

    #[test]
    fn test_add_and_remove_section() {
        let mut catalog = sample();
        let id = SectionId::parse("pods").unwrap();
        catalog.add_section(&id, "Pods").unwrap();
        assert_eq!(catalog.section("pods").unwrap().order, 2);
        assert!(matches!(
            catalog.add_section(&id, "Pods again"),
            Err(CatalogError::Duplicate { .. })
        ));
        catalog.remove_section("pods").unwrap();
        assert!(catalog.remove_section("pods").is_err());
    }
}
