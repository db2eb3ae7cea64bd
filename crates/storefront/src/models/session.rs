//! Session-related types.
//!
//! Types stored in the session for authentication state.

use serde::{Deserialize, Serialize};
use vapeshop_core::{Email, UserId, UserProfile, whatsapp::Customer};

/// Session-stored user identity.
///
/// Name and phone are copied from the profile at sign-in so the WhatsApp
/// hand-off does not need a database read.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentUser {
    /// Firebase account id (`localId`).
    pub id: UserId,
    pub email: Email,
    pub name: String,
    pub phone: String,
}

impl CurrentUser {
    /// Build from a stored profile, if one exists.
    #[must_use]
    pub fn new(id: UserId, email: Email, profile: Option<&UserProfile>) -> Self {
        Self {
            id,
            email,
            name: profile.map(|p| p.name.clone()).unwrap_or_default(),
            phone: profile.map(|p| p.phone.clone()).unwrap_or_default(),
        }
    }

    /// Greeting name, falling back to the email address.
    #[must_use]
    pub fn display_name(&self) -> &str {
        if self.name.is_empty() {
            self.email.as_str()
        } else {
            &self.name
        }
    }

    #[must_use]
    pub fn customer(&self) -> Customer<'_> {
        Customer {
            name: self.display_name(),
            phone: &self.phone,
        }
    }
}

/// Session keys.
pub mod keys {
    /// Key for storing the current logged-in user.
    pub const CURRENT_USER: &str = "current_user";

    /// Set once this browser session has been counted as a visit.
    pub const VISIT_COUNTED: &str = "visit_counted";
}
