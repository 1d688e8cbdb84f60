//! Currency codes and exchange-rate updates.
//!
//! Prices themselves travel as [`rust_decimal::Decimal`] so that values like
//! `19.99` are stored exactly.

use core::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`CurrencyCode`] or rate.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CurrencyError {
    /// The code is not exactly three characters.
    #[error("currency code must be exactly 3 characters")]
    InvalidLength,
    /// The code contains something other than ASCII letters.
    #[error("currency code must contain only letters")]
    InvalidCharacter,
    /// The rate is below the smallest accepted value.
    #[error("currency rate must be at least {min}")]
    RateTooLow {
        /// Minimum accepted rate.
        min: Decimal,
    },
}

/// ISO 4217 currency code, normalized to upper case.
///
/// ## Examples
///
/// ```
/// use ocsync_core::CurrencyCode;
///
/// assert_eq!(CurrencyCode::parse("usd").unwrap().as_str(), "USD");
/// assert!(CurrencyCode::parse("EURO").is_err());
/// assert!(CurrencyCode::parse("U$D").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CurrencyCode(String);

impl CurrencyCode {
    /// Length of every ISO 4217 alphabetic code.
    pub const LENGTH: usize = 3;

    /// Parse a currency code.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is not three ASCII letters.
    pub fn parse(s: &str) -> Result<Self, CurrencyError> {
        let trimmed = s.trim();
        if trimmed.len() != Self::LENGTH {
            return Err(CurrencyError::InvalidLength);
        }
        if !trimmed.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(CurrencyError::InvalidCharacter);
        }
        Ok(Self(trimmed.to_ascii_uppercase()))
    }

    /// Returns the code as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for CurrencyCode {
    type Error = CurrencyError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<CurrencyCode> for String {
    fn from(code: CurrencyCode) -> Self {
        code.0
    }
}

/// Exchange-rate update for one storefront currency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrencyRate {
    pub code: CurrencyCode,
    pub rate: Decimal,
}

impl CurrencyRate {
    /// Smallest rate accepted from clients.
    pub const MIN_RATE: Decimal = Decimal::from_parts(1, 0, 0, false, 3);

    /// Check the rate bound.
    ///
    /// # Errors
    ///
    /// Returns [`CurrencyError::RateTooLow`] if the rate is below `0.001`.
    pub fn validate(&self) -> Result<(), CurrencyError> {
        if self.rate < Self::MIN_RATE {
            return Err(CurrencyError::RateTooLow {
                min: Self::MIN_RATE,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_normalizes_case() {
        assert_eq!(CurrencyCode::parse("eur").unwrap().as_str(), "EUR");
        assert_eq!(CurrencyCode::parse(" gbp ").unwrap().as_str(), "GBP");
    }

    #[test]
    fn test_parse_rejects_bad_codes() {
        assert_eq!(CurrencyCode::parse(""), Err(CurrencyError::InvalidLength));
        assert_eq!(CurrencyCode::parse("EURO"), Err(CurrencyError::InvalidLength));
        assert_eq!(
            CurrencyCode::parse("U1D"),
            Err(CurrencyError::InvalidCharacter)
        );
    }

    #[test]
    fn test_deserialize_validates() {
        let ok: Result<CurrencyRate, _> =
            serde_json::from_str(r#"{"code":"usd","rate":"1.25"}"#);
        assert_eq!(ok.unwrap().code.as_str(), "USD");

        let bad: Result<CurrencyRate, _> =
            serde_json::from_str(r#"{"code":"dollars","rate":"1.25"}"#);
        assert!(bad.is_err());
    }

    #[test]
    fn test_rate_minimum() {
        let code = CurrencyCode::parse("USD").unwrap();
        let low = CurrencyRate {
            code: code.clone(),
            rate: Decimal::new(5, 4),
        };
        assert!(low.validate().is_err());

        let ok = CurrencyRate {
            code,
            rate: Decimal::new(1, 3),
        };
        assert!(ok.validate().is_ok());
    }
}
