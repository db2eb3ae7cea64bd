//! Phone number type.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`Phone`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PhoneError {
    /// The input contained no digits.
    #[error("phone number cannot be empty")]
    Empty,
    /// The input contained characters other than digits, spaces, `+`, `-`, `(`, `)`.
    #[error("phone number contains invalid character '{0}'")]
    InvalidChar(char),
    /// Fewer than 7 or more than 15 digits (E.164 bounds).
    #[error("phone number must have between 7 and 15 digits")]
    InvalidLength,
}

/// A phone number stored as its digits only.
///
/// WhatsApp links (`wa.me/<digits>`) want the international number without
/// `+`, spaces or punctuation, so that is the canonical form.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct Phone(String);

impl Phone {
    /// Parse a phone number, discarding formatting characters.
    ///
    /// # Errors
    ///
    /// Returns a [`PhoneError`] when the input has no digits, contains
    /// letters or other symbols, or has an implausible digit count.
    pub fn parse(s: &str) -> Result<Self, PhoneError> {
        let mut digits = String::with_capacity(s.len());
        for c in s.trim().chars() {
            match c {
                '0'..='9' => digits.push(c),
                ' ' | '+' | '-' | '(' | ')' | '.' => {}
                other => return Err(PhoneError::InvalidChar(other)),
            }
        }
        if digits.is_empty() {
            return Err(PhoneError::Empty);
        }
        if !(7..=15).contains(&digits.len()) {
            return Err(PhoneError::InvalidLength);
        }
        Ok(Self(digits))
    }

    /// Returns the digits.
    #[must_use]
    pub fn digits(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Phone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "+{}", self.0)
    }
}

impl std::str::FromStr for Phone {
    type Err = PhoneError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_strips_formatting() {
        let phone = Phone::parse("+57 (300) 123-4567").unwrap();
        assert_eq!(phone.digits(), "573001234567");
        assert_eq!(phone.to_string(), "+573001234567");
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(Phone::parse(" "), Err(PhoneError::Empty));
        assert_eq!(Phone::parse("300abc"), Err(PhoneError::InvalidChar('a')));
        assert_eq!(Phone::parse("12345"), Err(PhoneError::InvalidLength));
        assert_eq!(
            Phone::parse("1234567890123456"),
            Err(PhoneError::InvalidLength)
        );
    }
}
