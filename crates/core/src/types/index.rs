//! Global email/mobile registration index.

use serde::{Deserialize, Serialize};

/// Contents of the sentinel document listing every registered email and
/// mobile number.
///
/// Both lists are maintained with set-union appends, so they hold no exact
/// duplicates.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailMobileIndex {
    #[serde(default)]
    pub emails: Vec<String>,
    #[serde(default)]
    pub mobiles: Vec<String>,
}

impl EmailMobileIndex {
    /// Whether the email is already registered.
    #[must_use]
    pub fn contains_email(&self, email: &str) -> bool {
        self.emails.iter().any(|e| e == email)
    }

    /// Whether the mobile number is already registered.
    #[must_use]
    pub fn contains_mobile(&self, mobile: &str) -> bool {
        self.mobiles.iter().any(|m| m == mobile)
    }

    /// Whether neither list has entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.emails.is_empty() && self.mobiles.is_empty()
    }
}
