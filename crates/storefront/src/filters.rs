//! Custom Askama template filters.

use std::fmt::Display;

/// Returns the current year.
///
/// Usage in templates: `{{ ""|current_year }}`
#[allow(clippy::unnecessary_wraps)]
#[askama::filter_fn]
pub fn current_year(_value: impl Display, _env: &dyn askama::Values) -> askama::Result<i32> {
    use chrono::Datelike;
    Ok(chrono::Utc::now().year())
}

/// Percent-encodes a catalog name for use as a URL path segment.
///
/// Usage in templates: `<a href="/sections/{{ id }}/brands/{{ brand.name|segment }}">`
#[allow(clippy::unnecessary_wraps)]
#[askama::filter_fn]
pub fn segment(value: impl Display, _env: &dyn askama::Values) -> askama::Result<String> {
    Ok(urlencoding::encode(&value.to_string()).into_owned())
}
