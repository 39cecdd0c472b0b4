//! Shopify shop domain type.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`ShopDomain`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ShopDomainError {
    /// The input string is empty.
    #[error("shop domain cannot be empty")]
    Empty,
    /// The input string is too long.
    #[error("shop domain must be at most {max} characters")]
    TooLong {
        /// Maximum allowed length.
        max: usize,
    },
    /// The domain does not end in `.myshopify.com`.
    #[error("shop domain must end with {suffix}")]
    WrongSuffix {
        /// Required suffix.
        suffix: &'static str,
    },
    /// The store name contains characters other than ASCII alphanumerics and `-`.
    #[error("shop name contains invalid characters")]
    InvalidName,
}

/// A `*.myshopify.com` shop domain.
///
/// Shop domains are normalized to lower case and trimmed. The store name
/// (the part before `.myshopify.com`) must be non-empty, consist of ASCII
/// alphanumerics and hyphens, and must not start with a hyphen. This keeps
/// outbound OAuth calls pinned to Shopify hosts.
///
/// ## Examples
///
/// ```
/// use section_forge_core::ShopDomain;
///
/// assert!(ShopDomain::parse("cool-store.myshopify.com").is_ok());
/// assert!(ShopDomain::parse(" Cool-Store.MyShopify.com ").is_ok());
///
/// assert!(ShopDomain::parse("").is_err());
/// assert!(ShopDomain::parse("evil.example.com").is_err());
/// assert!(ShopDomain::parse("a/b.myshopify.com").is_err());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(try_from = "String", into = "String")]
pub struct ShopDomain(String);

impl ShopDomain {
    /// Required domain suffix.
    pub const SUFFIX: &'static str = ".myshopify.com";

    /// Maximum length of a shop domain.
    pub const MAX_LENGTH: usize = 255;

    /// Parse a `ShopDomain` from a string.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is empty, too long, not a
    /// `.myshopify.com` domain, or has an invalid store name.
    pub fn parse(s: &str) -> Result<Self, ShopDomainError> {
        let normalized = s.trim().to_ascii_lowercase();

        if normalized.is_empty() {
            return Err(ShopDomainError::Empty);
        }

        if normalized.len() > Self::MAX_LENGTH {
            return Err(ShopDomainError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }

        let name = normalized
            .strip_suffix(Self::SUFFIX)
            .ok_or(ShopDomainError::WrongSuffix {
                suffix: Self::SUFFIX,
            })?;

        let valid_name = !name.is_empty()
            && !name.starts_with('-')
            && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '-');
        if !valid_name {
            return Err(ShopDomainError::InvalidName);
        }

        Ok(Self(normalized))
    }

    /// Returns the domain as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the store name (the part before `.myshopify.com`).
    #[must_use]
    pub fn store_name(&self) -> &str {
        self.0.strip_suffix(Self::SUFFIX).unwrap_or(&self.0)
    }

    /// Consumes the `ShopDomain` and returns its inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for ShopDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for ShopDomain {
    type Err = ShopDomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for ShopDomain {
    type Error = ShopDomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ShopDomain> for String {
    fn from(shop: ShopDomain) -> Self {
        shop.0
    }
}

impl AsRef<str> for ShopDomain {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid() {
        let shop = ShopDomain::parse("a.myshopify.com").unwrap();
        assert_eq!(shop.as_str(), "a.myshopify.com");
        assert_eq!(shop.store_name(), "a");
    }

    #[test]
    fn test_parse_normalizes_case_and_whitespace() {
        let shop = ShopDomain::parse("  My-Store.MYSHOPIFY.com\n").unwrap();
        assert_eq!(shop.as_str(), "my-store.myshopify.com");
    }

    #[test]
    fn test_parse_empty() {
        assert_eq!(ShopDomain::parse("   "), Err(ShopDomainError::Empty));
    }

    #[test]
    fn test_parse_wrong_suffix() {
        assert!(matches!(
            ShopDomain::parse("store.example.com"),
            Err(ShopDomainError::WrongSuffix { .. })
        ));
        // Suffix must be a real label boundary
        assert!(matches!(
            ShopDomain::parse("storemyshopify.com"),
            Err(ShopDomainError::WrongSuffix { .. })
        ));
    }

    #[test]
    fn test_parse_invalid_name() {
        assert_eq!(
            ShopDomain::parse(".myshopify.com"),
            Err(ShopDomainError::InvalidName)
        );
        assert_eq!(
            ShopDomain::parse("-store.myshopify.com"),
            Err(ShopDomainError::InvalidName)
        );
        assert_eq!(
            ShopDomain::parse("evil.com/x.myshopify.com"),
            Err(ShopDomainError::InvalidName)
        );
        assert_eq!(
            ShopDomain::parse("a.b.myshopify.com"),
            Err(ShopDomainError::InvalidName)
        );
    }

    #[test]
    fn test_parse_too_long() {
        let long = format!("{}.myshopify.com", "a".repeat(300));
        assert!(matches!(
            ShopDomain::parse(&long),
            Err(ShopDomainError::TooLong { .. })
        ));
    }

    #[test]
    fn test_serde_round_trip_validates() {
        let shop: ShopDomain = serde_json::from_str("\"a.myshopify.com\"").unwrap();
        assert_eq!(serde_json::to_string(&shop).unwrap(), "\"a.myshopify.com\"");

        let bad: Result<ShopDomain, _> = serde_json::from_str("\"a.example.com\"");
        assert!(bad.is_err());
    }
}
