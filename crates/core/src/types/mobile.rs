//! Mobile phone number type.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`Mobile`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum MobileError {
    /// The input string is empty.
    #[error("mobile number cannot be empty")]
    Empty,
    /// The input contains something other than digits and separators.
    #[error("mobile number contains invalid character `{0}`")]
    InvalidCharacter(char),
    /// Too few or too many digits.
    #[error("mobile number must have between {min} and {max} digits (got {got})")]
    DigitCount {
        /// Minimum digit count.
        min: usize,
        /// Maximum digit count (E.164).
        max: usize,
        /// Digits found in the input.
        got: usize,
    },
}

/// A mobile phone number in compact form.
///
/// Accepts an optional leading `+` followed by digits, with spaces, dashes
/// and parentheses allowed as separators. Separators are dropped, so the
/// stored value is what the `mobile` equality query matches against.
/// Deserialization goes through [`Mobile::parse`] as well, so documents and
/// seed files are normalized the same way as query arguments.
///
/// ```
/// use basket_core::Mobile;
///
/// let mobile = Mobile::parse("+91 (987) 654-3210").unwrap();
/// assert_eq!(mobile.as_str(), "+919876543210");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(try_from = "String", into = "String")]
pub struct Mobile(String);

impl Mobile {
    /// Minimum number of digits.
    pub const MIN_DIGITS: usize = 7;
    /// Maximum number of digits (E.164).
    pub const MAX_DIGITS: usize = 15;

    /// Parse a `Mobile` from user input.
    ///
    /// # Errors
    ///
    /// Returns a [`MobileError`] if the input is empty, contains letters or
    /// other symbols, or has a digit count outside 7..=15.
    pub fn parse(s: &str) -> Result<Self, MobileError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(MobileError::Empty);
        }

        let mut compact = String::with_capacity(s.len());
        for (i, c) in s.chars().enumerate() {
            match c {
                '+' if i == 0 => compact.push(c),
                '0'..='9' => compact.push(c),
                ' ' | '-' | '(' | ')' => {}
                other => return Err(MobileError::InvalidCharacter(other)),
            }
        }

        let digits = compact.chars().filter(char::is_ascii_digit).count();
        if !(Self::MIN_DIGITS..=Self::MAX_DIGITS).contains(&digits) {
            return Err(MobileError::DigitCount {
                min: Self::MIN_DIGITS,
                max: Self::MAX_DIGITS,
                got: digits,
            });
        }

        Ok(Self(compact))
    }

    /// Returns the number as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the `Mobile` and returns its inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for Mobile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for Mobile {
    type Err = MobileError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Mobile {
    type Error = MobileError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<Mobile> for String {
    fn from(mobile: Mobile) -> Self {
        mobile.0
    }
}

impl AsRef<str> for Mobile {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_strips_separators() {
        assert_eq!(Mobile::parse("555-0100 22").unwrap().as_str(), "555010022");
        assert_eq!(
            Mobile::parse(" +1 (415) 555-2671 ").unwrap().as_str(),
            "+14155552671"
        );
    }

    #[test]
    fn test_plus_only_leading() {
        assert_eq!(
            Mobile::parse("1+4155552671"),
            Err(MobileError::InvalidCharacter('+'))
        );
    }

    #[test]
    fn test_rejects_letters() {
        assert_eq!(
            Mobile::parse("98765x4321"),
            Err(MobileError::InvalidCharacter('x'))
        );
    }

    #[test]
    fn test_digit_bounds() {
        assert_eq!(Mobile::parse(""), Err(MobileError::Empty));
        assert!(matches!(
            Mobile::parse("12345"),
            Err(MobileError::DigitCount { got: 5, .. })
        ));
        assert!(matches!(
            Mobile::parse("+1234567890123456"),
            Err(MobileError::DigitCount { got: 16, .. })
        ));
        assert!(Mobile::parse("1234567").is_ok());
    }

    #[test]
    fn test_deserialize_normalizes() {
        let mobile: Mobile = serde_json::from_str("\"98765 43210\"").unwrap();
        assert_eq!(mobile.as_str(), "9876543210");
        assert_eq!(serde_json::to_string(&mobile).unwrap(), "\"9876543210\"");
    }

    #[test]
    fn test_deserialize_rejects_invalid() {
        assert!(serde_json::from_str::<Mobile>("\"not a phone\"").is_err());
        assert!(serde_json::from_str::<Mobile>("\"123\"").is_err());
    }
}
