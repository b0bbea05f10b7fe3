//! Non-negative quantity using decimal arithmetic.
//!
//! Inventory stock levels and chemical adjustment amounts are both
//! `Quantity` values. Arithmetic is exact (no float drift when decrementing
//! stock), and the JSON representation is a decimal string so that no
//! digits are lost to binary floating point. Plain JSON numbers are still
//! accepted on input.

use core::fmt;
use core::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Errors that can occur when constructing a [`Quantity`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum QuantityError {
    /// The value is below zero.
    #[error("quantity cannot be negative (got {0})")]
    Negative(Decimal),
    /// The value is NaN or infinite.
    #[error("quantity must be a finite number")]
    NotFinite,
    /// The input string is not a number.
    #[error("invalid quantity: {0}")]
    Invalid(String),
}

/// A non-negative decimal amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Quantity(Decimal);

impl Quantity {
    /// The zero quantity.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Create a quantity from a decimal value.
    ///
    /// # Errors
    ///
    /// Returns `QuantityError::Negative` if `value < 0`.
    pub fn new(value: Decimal) -> Result<Self, QuantityError> {
        if value.is_sign_negative() && !value.is_zero() {
            return Err(QuantityError::Negative(value));
        }
        Ok(Self(value.normalize()))
    }

    /// Create a quantity from a whole number.
    #[must_use]
    pub fn from_whole(value: u32) -> Self {
        Self(Decimal::from(value))
    }

    /// Create a quantity from a float, as returned by JSON APIs.
    ///
    /// # Errors
    ///
    /// Returns `QuantityError::NotFinite` for NaN/infinity and
    /// `QuantityError::Negative` for negative values.
    pub fn from_f64(value: f64) -> Result<Self, QuantityError> {
        if !value.is_finite() {
            return Err(QuantityError::NotFinite);
        }
        let decimal = Decimal::try_from(value).map_err(|_| QuantityError::NotFinite)?;
        Self::new(decimal)
    }

    /// Returns the underlying decimal value.
    #[must_use]
    pub const fn value(&self) -> Decimal {
        self.0
    }

    /// Subtract `amount`, clamping the result at zero.
    #[must_use]
    pub fn saturating_sub(self, amount: Self) -> Self {
        if amount.0 >= self.0 {
            Self::ZERO
        } else {
            Self((self.0 - amount.0).normalize())
        }
    }

    /// Apply a signed delta, clamping the result at zero.
    #[must_use]
    pub fn saturating_apply(self, delta: Decimal) -> Self {
        let next = self.0 + delta;
        if next.is_sign_negative() {
            Self::ZERO
        } else {
            Self(next.normalize())
        }
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Quantity {
    type Err = QuantityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let decimal =
            Decimal::from_str(s.trim()).map_err(|_| QuantityError::Invalid(s.to_owned()))?;
        Self::new(decimal)
    }
}

impl TryFrom<Decimal> for Quantity {
    type Error = QuantityError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Quantity> for Decimal {
    fn from(quantity: Quantity) -> Self {
        quantity.0
    }
}

impl Serialize for Quantity {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        rust_decimal::serde::str::serialize(&self.0, serializer)
    }
}

impl<'de> Deserialize<'de> for Quantity {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = <Decimal as Deserialize>::deserialize(deserializer)?;
        Self::new(value).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_negative_rejected() {
        assert!(matches!(
            Quantity::new(Decimal::from(-1)),
            Err(QuantityError::Negative(_))
        ));
        assert!(Quantity::from_f64(-0.5).is_err());
        assert!(Quantity::from_f64(f64::NAN).is_err());
    }

    #[test]
    fn test_saturating_sub_clamps() {
        let two = Quantity::from_whole(2);
        let five = Quantity::from_whole(5);
        assert_eq!(two.saturating_sub(five), Quantity::ZERO);
        assert_eq!(five.saturating_sub(two), Quantity::from_whole(3));
    }

    #[test]
    fn test_saturating_apply() {
        let one = Quantity::from_whole(1);
        assert_eq!(one.saturating_apply(Decimal::from(-3)), Quantity::ZERO);
        assert_eq!(one.saturating_apply(Decimal::ONE), Quantity::from_whole(2));
    }

    #[test]
    fn test_decimal_subtraction_is_exact() {
        let stock: Quantity = "0.3".parse().expect("parse");
        let used: Quantity = "0.1".parse().expect("parse");
        assert_eq!(stock.saturating_sub(used), "0.2".parse().expect("parse"));
    }

    #[test]
    fn test_serializes_as_string() {
        let q: Quantity = "2.5".parse().expect("parse");
        assert_eq!(serde_json::to_string(&q).expect("serialize"), "\"2.5\"");

        let back: Quantity = serde_json::from_str("\"2.5\"").expect("deserialize");
        assert_eq!(back, q);
    }

    #[test]
    fn test_accepts_plain_numbers() {
        let half: Quantity = serde_json::from_str("2.5").expect("deserialize");
        assert_eq!(half, "2.5".parse().expect("parse"));

        let whole: Quantity = serde_json::from_str("10").expect("deserialize");
        assert_eq!(whole, Quantity::from_whole(10));
    }

    #[test]
    fn test_high_precision_survives_json() {
        let q: Quantity = "0.12345678901234567891".parse().expect("parse");
        let json = serde_json::to_string(&q).expect("serialize");
        assert_eq!(json, "\"0.12345678901234567891\"");

        let back: Quantity = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, q);
        assert_eq!(back.to_string(), "0.12345678901234567891");
    }

    #[test]
    fn test_deserialize_rejects_negative() {
        assert!(serde_json::from_str::<Quantity>("-4").is_err());
        assert!(serde_json::from_str::<Quantity>("\"-4\"").is_err());
    }
}
