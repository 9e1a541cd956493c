//! Type-safe price representation using decimal arithmetic.
//!
//! Prices are never negative. Arithmetic on prices stays in `Decimal` so
//! totals like `0.1 + 0.2` are exact.

use core::fmt;
use core::iter::Sum;
use core::ops::Add;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Errors that can occur when constructing a [`Price`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PriceError {
    /// The amount is below zero.
    #[error("price cannot be negative (got {0})")]
    Negative(Decimal),
}

/// A non-negative amount in the store's currency.
///
/// Serializes as a decimal string (`"12.50"`) and accepts either a string or
/// a JSON number on input.
///
/// ```
/// use pideai_core::Price;
/// use rust_decimal::Decimal;
///
/// let base = Price::from_cents(1000).unwrap();
/// let extra = Price::from_cents(150).unwrap();
/// assert_eq!((base + extra).amount(), Decimal::new(1150, 2));
/// assert!(Price::from_cents(-1).is_err());
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Price(Decimal);

impl Price {
    /// A price of zero.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Create a new price.
    ///
    /// # Errors
    ///
    /// Returns `PriceError::Negative` if `amount` is below zero.
    pub fn new(amount: Decimal) -> Result<Self, PriceError> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(PriceError::Negative(amount));
        }
        Ok(Self(amount))
    }

    /// Create a price from an amount in cents.
    ///
    /// # Errors
    ///
    /// Returns `PriceError::Negative` if `cents` is below zero.
    pub fn from_cents(cents: i64) -> Result<Self, PriceError> {
        Self::new(Decimal::new(cents, 2))
    }

    /// The underlying decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// This price multiplied by a line quantity.
    #[must_use]
    pub fn times(self, quantity: u32) -> Self {
        Self(self.0 * Decimal::from(quantity))
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

impl TryFrom<Decimal> for Price {
    type Error = PriceError;

    fn try_from(amount: Decimal) -> Result<Self, Self::Error> {
        Self::new(amount)
    }
}

impl From<Price> for Decimal {
    fn from(price: Price) -> Self {
        price.0
    }
}

impl Add for Price {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl Sum for Price {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

impl<'a> Sum<&'a Self> for Price {
    fn sum<I: Iterator<Item = &'a Self>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_negative() {
        assert!(matches!(
            Price::new(Decimal::new(-1, 2)),
            Err(PriceError::Negative(_))
        ));
    }

    #[test]
    fn test_zero_is_valid() {
        assert_eq!(Price::new(Decimal::ZERO).unwrap(), Price::ZERO);
    }

    #[test]
    fn test_decimal_sum_is_exact() {
        let total: Price = [Price::from_cents(10).unwrap(), Price::from_cents(20).unwrap()]
            .into_iter()
            .sum();
        assert_eq!(total.amount(), Decimal::new(30, 2));
    }

    #[test]
    fn test_times() {
        let price = Price::from_cents(1250).unwrap();
        assert_eq!(price.times(3).amount(), Decimal::new(3750, 2));
        assert_eq!(price.times(0), Price::ZERO);
    }

    #[test]
    fn test_display_two_places() {
        assert_eq!(Price::from_cents(150).unwrap().to_string(), "1.50");
        assert_eq!(Price::new(Decimal::from(10)).unwrap().to_string(), "10.00");
    }

    #[test]
    fn test_serde_accepts_number_and_string() {
        let from_number: Price = serde_json::from_str("1.5").unwrap();
        let from_string: Price = serde_json::from_str("\"1.5\"").unwrap();
        assert_eq!(from_number, from_string);

        let negative: Result<Price, _> = serde_json::from_str("-2");
        assert!(negative.is_err());
    }
}
