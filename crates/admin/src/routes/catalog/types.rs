//! Form and query types shared by the catalog pages.

use serde::Deserialize;
use vapeshop_core::{BrandDetails, LineDetails, Product};

use super::{error_message, notice_message};

/// `?error=`, `?notice=` and `?q=` on catalog pages.
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub error: Option<String>,
    pub notice: Option<String>,
    #[serde(default)]
    pub q: String,
}

impl PageQuery {
    #[must_use]
    pub fn error(&self) -> Option<&'static str> {
        self.error.as_deref().map(error_message)
    }

    #[must_use]
    pub fn notice(&self) -> Option<&'static str> {
        self.notice.as_deref().and_then(notice_message)
    }
}

/// New section form. A blank id is derived from the name.
#[derive(Debug, Deserialize)]
pub struct SectionForm {
    #[serde(default)]
    pub id: String,
    pub name: String,
}

impl SectionForm {
    /// The key to store the section under.
    #[must_use]
    pub fn key(&self) -> String {
        let id = self.id.trim();
        if id.is_empty() {
            vapeshop_core::slugify(&self.name)
        } else {
            id.to_string()
        }
    }
}

/// Brand create/edit form.
#[derive(Debug, Deserialize)]
pub struct BrandForm {
    pub name: String,
    #[serde(default)]
    pub logo: String,
    #[serde(default)]
    pub website: String,
    #[serde(default)]
    pub description: String,
}

impl From<BrandForm> for BrandDetails {
    fn from(form: BrandForm) -> Self {
        Self {
            name: form.name,
            logo: form.logo,
            website: form.website,
            description: form.description,
        }
    }
}

/// Line create/edit form.
#[derive(Debug, Deserialize)]
pub struct LineForm {
    pub name: String,
    #[serde(default)]
    pub image: String,
}

impl From<LineForm> for LineDetails {
    fn from(form: LineForm) -> Self {
        Self {
            name: form.name,
            image: form.image,
        }
    }
}

/// Product create/edit form. Images are one URL per line.
#[derive(Debug, Deserialize)]
pub struct ProductForm {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub flavor: String,
    #[serde(default)]
    pub images: String,
}

impl From<ProductForm> for Product {
    fn from(form: ProductForm) -> Self {
        Self {
            name: form.name,
            description: form.description,
            flavor: form.flavor,
            images: form
                .images
                .lines()
                .map(str::trim)
                .filter(|url| !url.is_empty())
                .map(str::to_string)
                .collect(),
        }
    }
}
