//! Display price parsed from free-form client input.

use core::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`Price`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PriceError {
    /// Input was blank.
    #[error("price cannot be empty")]
    Empty,
    /// Input is not a decimal number.
    #[error("price is not a number: {0}")]
    Invalid(String),
    /// Negative amounts are not displayable prices.
    #[error("price cannot be negative")]
    Negative,
}

/// A non-negative price in the store's currency, displayed with two decimals.
///
/// Clients send prices as strings ("29.99", "$29.99", "1,299") or numbers;
/// currency symbols, thousands separators and whitespace are stripped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Price {
    /// Amount in the currency's standard unit (e.g., dollars, not cents).
    pub amount: Decimal,
}

impl Price {
    /// Create a new price.
    #[must_use]
    pub const fn new(amount: Decimal) -> Self {
        Self { amount }
    }

    /// Parse a client-supplied price string.
    ///
    /// # Errors
    ///
    /// Returns an error if the cleaned input is empty, not a number, or negative.
    pub fn parse(s: &str) -> Result<Self, PriceError> {
        let cleaned: String = s
            .chars()
            .filter(|c| c.is_ascii_digit() || matches!(c, '.' | '-'))
            .collect();

        if cleaned.is_empty() {
            return Err(PriceError::Empty);
        }

        let amount =
            Decimal::from_str(&cleaned).map_err(|_| PriceError::Invalid(s.trim().to_owned()))?;
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(PriceError::Negative);
        }

        Ok(Self { amount })
    }

    /// Amount with exactly two decimal places, no currency symbol.
    #[must_use]
    pub fn amount_string(&self) -> String {
        let mut rounded = self.amount.round_dp(2);
        rounded.rescale(2);
        rounded.to_string()
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${}", self.amount_string())
    }
}

impl FromStr for Price {
    type Err = PriceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
