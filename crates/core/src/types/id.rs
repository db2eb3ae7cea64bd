//! Newtype keys for type-safe entity references.
//!
//! Every entity in the Realtime Database is addressed by a string key. Use the
//! `define_key!` macro to create wrappers that prevent accidentally mixing keys
//! from different entity types.

use thiserror::Error;

/// Characters Firebase forbids inside a single key segment.
pub const FORBIDDEN_KEY_CHARS: &[char] = &['.', '$', '#', '[', ']', '/'];

/// Maximum key length in bytes accepted by the Realtime Database.
pub const MAX_KEY_BYTES: usize = 768;

/// Errors that can occur when parsing a key.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeyError {
    /// The key is empty or whitespace.
    #[error("key cannot be empty")]
    Empty,
    /// The key is longer than the database allows.
    #[error("key must be at most {MAX_KEY_BYTES} bytes")]
    TooLong,
    /// The key contains a character Firebase reserves.
    #[error("key contains forbidden character '{0}'")]
    ForbiddenChar(char),
}

/// Validate a single database key segment.
///
/// # Errors
///
/// Returns a [`KeyError`] if the segment is empty, too long, or contains one
/// of `. $ # [ ] /`.
pub fn validate_key(key: &str) -> Result<(), KeyError> {
    if key.trim().is_empty() {
        return Err(KeyError::Empty);
    }
    if key.len() > MAX_KEY_BYTES {
        return Err(KeyError::TooLong);
    }
    if let Some(c) = key.chars().find(|c| FORBIDDEN_KEY_CHARS.contains(c)) {
        return Err(KeyError::ForbiddenChar(c));
    }
    Ok(())
}

/// Turn a display name into a key candidate: lowercase, ASCII alphanumerics
/// kept, everything else collapsed into single dashes.
///
/// ```
/// use vapeshop_core::slugify;
///
/// assert_eq!(slugify("Líquidos & Sales"), "l-quidos-sales");
/// assert_eq!(slugify("  Pods  "), "pods");
/// ```
#[must_use]
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    for c in name.trim().chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.ends_with('-') && !slug.is_empty() {
            slug.push('-');
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    slug
}

/// Macro to define a type-safe key wrapper.
///
/// Creates a newtype wrapper around `String` with:
/// - `Serialize`/`Deserialize` with `#[serde(transparent)]`
/// - `Debug`, `Clone`, `PartialEq`, `Eq`, `Hash`, `PartialOrd`, `Ord`
/// - `parse()` validating database key rules, `as_str()`, `into_inner()`
/// - `Display` and `AsRef<str>`
///
/// # Example
///
/// ```rust
/// # use vapeshop_core::define_key;
/// define_key!(FlavorId);
///
/// let id = FlavorId::parse("mango-ice").unwrap();
/// assert_eq!(id.as_str(), "mango-ice");
/// assert!(FlavorId::parse("a/b").is_err());
/// ```
#[macro_export]
macro_rules! define_key {
    ($name:ident) => {
        #[derive(
            Debug,
            Clone,
            PartialEq,
            Eq,
            Hash,
            PartialOrd,
            Ord,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Parse a key, validating it against database key rules.
            ///
            /// # Errors
            ///
            /// Returns a [`KeyError`]($crate::KeyError) when the key is empty,
            /// too long, or contains a reserved character.
            pub fn parse(key: &str) -> ::core::result::Result<Self, $crate::KeyError> {
                $crate::validate_key(key)?;
                Ok(Self(key.to_owned()))
            }

            /// Returns the key as a string slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consumes the key and returns its inner string.
            #[must_use]
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl ::core::str::FromStr for $name {
            type Err = $crate::KeyError;

            fn from_str(s: &str) -> ::core::result::Result<Self, Self::Err> {
                Self::parse(s)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

define_key!(SectionId);
define_key!(UserId);
define_key!(OrderId);
define_key!(ServiceRequestId);

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_key_accepts_push_ids() {
        assert!(validate_key("-NxQ1b2c3d4e5f6g7h8").is_ok());
        assert!(validate_key("liquids").is_ok());
    }

    #[test]
    fn test_validate_key_rejects_reserved() {
        assert_eq!(validate_key("a.b"), Err(KeyError::ForbiddenChar('.')));
        assert_eq!(validate_key("a/b"), Err(KeyError::ForbiddenChar('/')));
        assert_eq!(validate_key("$x"), Err(KeyError::ForbiddenChar('$')));
        assert_eq!(validate_key("   "), Err(KeyError::Empty));
        assert_eq!(validate_key(&"k".repeat(769)), Err(KeyError::TooLong));
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Devices"), "devices");
        assert_eq!(slugify("Salt Nic / 20mg"), "salt-nic-20mg");
        assert_eq!(slugify("---"), "");
    }

    #[test]
    fn test_key_serde_is_transparent() {
        let id = UserId::parse("uid123").unwrap();
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"uid123\"");
        let back: UserId = serde_json::from_str("\"uid123\"").unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn test_key_from_str() {
        let id: SectionId = "liquids".parse().unwrap();
        assert_eq!(id.to_string(), "liquids");
        assert!("".parse::<SectionId>().is_err());
    }
}
