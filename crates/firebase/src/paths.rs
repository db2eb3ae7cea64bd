//! Database paths.
//!
//! A [`DbPath`] is a list of validated key segments. Segments are checked
//! against the Realtime Database key rules when the path is built, so a
//! user-supplied key can never escape into a sibling node.
//!
//! The helpers at the bottom of this module name every location the shop
//! reads or writes.

use chrono::NaiveDate;
use vapeshop_core::{KeyError, SectionId, ServiceKind, UserId, validate_key};

/// A slash-separated location in the database.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct DbPath {
    segments: Vec<String>,
}

impl DbPath {
    /// The database root.
    #[must_use]
    pub const fn root() -> Self {
        Self {
            segments: Vec::new(),
        }
    }

    /// Build a path from individual segments.
    ///
    /// # Errors
    ///
    /// Returns the first segment's [`KeyError`] if any segment is not a valid key.
    pub fn from_segments<I, S>(segments: I) -> Result<Self, KeyError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut path = Self::root();
        for segment in segments {
            path = path.child(segment.as_ref())?;
        }
        Ok(path)
    }

    /// Parse a slash-separated path such as `catalog/sections`.
    ///
    /// Leading and trailing slashes are ignored; empty inner segments are not.
    ///
    /// # Errors
    ///
    /// Returns a [`KeyError`] if any segment is invalid.
    pub fn parse(path: &str) -> Result<Self, KeyError> {
        let trimmed = path.trim().trim_matches('/');
        if trimmed.is_empty() {
            return Ok(Self::root());
        }
        Self::from_segments(trimmed.split('/'))
    }

    /// Append one segment.
    ///
    /// # Errors
    ///
    /// Returns a [`KeyError`] if the segment is not a valid key.
    pub fn child(mut self, segment: &str) -> Result<Self, KeyError> {
        validate_key(segment)?;
        self.segments.push(segment.to_owned());
        Ok(self)
    }

    /// Segments from the root down.
    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    #[must_use]
    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// Path relative to `ancestor`, as used for multi-path update keys.
    #[must_use]
    pub fn relative_to(&self, ancestor: &Self) -> Option<String> {
        self.segments
            .strip_prefix(ancestor.segments.as_slice())
            .map(|rest| rest.join("/"))
    }

    /// Segments of keys that were validated when their newtype was parsed.
    fn trusted<const N: usize>(segments: [&str; N]) -> Self {
        Self {
            segments: segments.iter().map(|s| (*s).to_owned()).collect(),
        }
    }
}

impl std::fmt::Display for DbPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "/{}", self.segments.join("/"))
    }
}

impl std::str::FromStr for DbPath {
    type Err = KeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// `catalog`
#[must_use]
pub fn catalog() -> DbPath {
    DbPath::trusted(["catalog"])
}

/// `catalog/sections`
#[must_use]
pub fn sections() -> DbPath {
    DbPath::trusted(["catalog", "sections"])
}

/// `catalog/sections/<id>`
#[must_use]
pub fn section(id: &SectionId) -> DbPath {
    DbPath::trusted(["catalog", "sections", id.as_str()])
}

/// `catalog/sections/<id>/brands`
#[must_use]
pub fn section_brands(id: &SectionId) -> DbPath {
    DbPath::trusted(["catalog", "sections", id.as_str(), "brands"])
}

/// `users`
#[must_use]
pub fn users() -> DbPath {
    DbPath::trusted(["users"])
}

/// `users/<id>`
#[must_use]
pub fn user(id: &UserId) -> DbPath {
    DbPath::trusted(["users", id.as_str()])
}

/// `users/<id>/orders`
#[must_use]
pub fn orders(user: &UserId) -> DbPath {
    DbPath::trusted(["users", user.as_str(), "orders"])
}

/// `users/<id>/orders/<key>`
///
/// # Errors
///
/// Returns a [`KeyError`] if `order` is not a valid key.
pub fn order(user: &UserId, order: &str) -> Result<DbPath, KeyError> {
    orders(user).child(order)
}

/// `users/<id>/services/<kind>`
#[must_use]
pub fn services(user: &UserId, kind: ServiceKind) -> DbPath {
    DbPath::trusted(["users", user.as_str(), "services", kind.path_segment()])
}

/// `users/<id>/services/<kind>/<key>`
///
/// # Errors
///
/// Returns a [`KeyError`] if `request` is not a valid key.
pub fn service(user: &UserId, kind: ServiceKind, request: &str) -> Result<DbPath, KeyError> {
    services(user, kind).child(request)
}

/// `stats/totalVisits`
#[must_use]
pub fn total_visits() -> DbPath {
    DbPath::trusted(["stats", "totalVisits"])
}

/// `dailyStats`
#[must_use]
pub fn daily_stats() -> DbPath {
    DbPath::trusted(["dailyStats"])
}

/// `dailyStats/<YYYY-MM-DD>`
#[must_use]
pub fn daily_visits(date: NaiveDate) -> DbPath {
    let key = date.format("%Y-%m-%d").to_string();
    DbPath::trusted(["dailyStats", key.as_str()])
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_trims_slashes() {
        let path = DbPath::parse("/catalog/sections/").unwrap();
        assert_eq!(path, sections());
        assert_eq!(path.to_string(), "/catalog/sections");
        assert!(DbPath::parse("").unwrap().is_root());
    }

    #[test]
    fn test_rejects_forbidden_segments() {
        assert_eq!(DbPath::parse("a//b"), Err(KeyError::Empty));
        assert_eq!(
            DbPath::root().child("a.b"),
            Err(KeyError::ForbiddenChar('.'))
        );
        let uid = UserId::parse("u1").unwrap();
        assert_eq!(order(&uid, "x/y"), Err(KeyError::ForbiddenChar('/')));
    }

    #[test]
    fn test_relative_to() {
        let uid = UserId::parse("u1").unwrap();
        let target = order(&uid, "-N1").unwrap().child("status").unwrap();
        assert_eq!(
            target.relative_to(&users()).as_deref(),
            Some("u1/orders/-N1/status")
        );
        assert_eq!(target.relative_to(&sections()), None);
        assert_eq!(
            total_visits().relative_to(&DbPath::root()).as_deref(),
            Some("stats/totalVisits")
        );
    }

    #[test]
    fn test_named_locations() {
        let uid = UserId::parse("abc").unwrap();
        assert_eq!(
            services(&uid, ServiceKind::Maintenance).to_string(),
            "/users/abc/services/maintenance-requests"
        );
        let date = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
        assert_eq!(daily_visits(date).to_string(), "/dailyStats/2024-03-09");
    }
}
