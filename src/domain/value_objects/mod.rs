//! Value Objects for the storefront

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Product identifier, unique within a catalog and within a cart
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProductId(String);

impl ProductId {
    pub fn new(value: impl Into<String>) -> Self { Self(value.into()) }
    pub fn as_str(&self) -> &str { &self.0 }
}

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.0) }
}

impl From<&str> for ProductId {
    fn from(value: &str) -> Self { Self::new(value) }
}

/// ISO 4217 currencies the storefront can price in.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Currency {
    #[default]
    USD,
    EUR,
    GBP,
    VND,
}

impl Currency {
    pub fn code(&self) -> &'static str {
        match self { Self::USD => "USD", Self::EUR => "EUR", Self::GBP => "GBP", Self::VND => "VND" }
    }

    pub fn symbol(&self) -> &'static str {
        match self { Self::USD => "$", Self::EUR => "€", Self::GBP => "£", Self::VND => "₫" }
    }
}

impl FromStr for Currency {
    type Err = MoneyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "USD" => Ok(Self::USD),
            "EUR" => Ok(Self::EUR),
            "GBP" => Ok(Self::GBP),
            "VND" => Ok(Self::VND),
            other => Err(MoneyError::UnknownCurrency(other.to_string())),
        }
    }
}

/// Money value object
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Money { amount: Decimal, currency: Currency }

impl Money {
    pub fn new(amount: Decimal, currency: Currency) -> Self { Self { amount, currency } }
    pub fn usd(amount: Decimal) -> Self { Self::new(amount, Currency::USD) }
    pub fn zero(currency: Currency) -> Self { Self::new(Decimal::ZERO, currency) }
    pub fn amount(&self) -> Decimal { self.amount }
    pub fn currency(&self) -> Currency { self.currency }
    pub fn is_zero(&self) -> bool { self.amount.is_zero() }

    pub fn add(&self, other: &Money) -> Result<Money, MoneyError> {
        self.same_currency(other)?;
        Ok(Money::new(self.amount + other.amount, self.currency))
    }

    pub fn sub(&self, other: &Money) -> Result<Money, MoneyError> {
        self.same_currency(other)?;
        Ok(Money::new(self.amount - other.amount, self.currency))
    }

    pub fn multiply(&self, qty: Quantity) -> Money { Money::new(self.amount * Decimal::from(qty.value()), self.currency) }

    /// Scales the amount by a plain factor (tax rates, percentages).
    pub fn scale(&self, factor: Decimal) -> Money { Money::new(self.amount * factor, self.currency) }

    /// Negative amounts collapse to zero.
    pub fn clamp_non_negative(&self) -> Money { Money::new(self.amount.max(Decimal::ZERO), self.currency) }

    /// Rounds to whole cents, half away from zero.
    pub fn round_cents(&self) -> Money {
        Money::new(self.amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero), self.currency)
    }

    fn same_currency(&self, other: &Money) -> Result<(), MoneyError> {
        if self.currency != other.currency {
            return Err(MoneyError::CurrencyMismatch { left: self.currency, right: other.currency });
        }
        Ok(())
    }
}

impl Default for Money { fn default() -> Self { Self::zero(Currency::default()) } }

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{:.2}", self.currency.symbol(), self.round_cents().amount)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MoneyError {
    #[error("currency mismatch: {} vs {}", .left.code(), .right.code())]
    CurrencyMismatch { left: Currency, right: Currency },
    #[error("unknown currency: {0}")]
    UnknownCurrency(String),
}

/// Quantity value object. Always at least one; zero is not representable.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct Quantity(u32);

impl Quantity {
    pub const ONE: Quantity = Quantity(1);

    pub fn new(value: u32) -> Option<Self> { (value >= 1).then_some(Self(value)) }
    pub fn value(&self) -> u32 { self.0 }
    pub fn add(&self, other: Quantity) -> Self { Self(self.0.saturating_add(other.0)) }

    /// `None` when the decrement would reach zero.
    pub fn decrement(&self) -> Option<Self> { Self::new(self.0 - 1) }
}

impl TryFrom<u32> for Quantity {
    type Error = String;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::new(value).ok_or_else(|| "quantity must be at least 1".to_string())
    }
}

impl From<Quantity> for u32 {
    fn from(value: Quantity) -> Self { value.0 }
}

/// Percentage between 0 and 100 inclusive
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Percent(Decimal);

impl Percent {
    pub fn new(value: Decimal) -> Result<Self, PercentError> {
        if value < Decimal::ZERO || value > Decimal::ONE_HUNDRED { return Err(PercentError::OutOfRange(value)); }
        Ok(Self(value))
    }
    /// Whole percentages above 100 saturate.
    pub fn whole(value: u8) -> Self { Self(Decimal::from(value.min(100))) }
    pub fn value(&self) -> Decimal { self.0 }
    pub fn of(&self, money: &Money) -> Money { money.scale(self.0 / Decimal::ONE_HUNDRED) }
}

impl fmt::Display for Percent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}%", self.0.normalize()) }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PercentError {
    #[error("percentage {0} is outside 0..=100")]
    OutOfRange(Decimal),
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_money_add() {
        let a = Money::usd(dec!(100));
        let b = Money::usd(dec!(50));
        assert_eq!(a.add(&b).unwrap().amount(), dec!(150));
    }

    #[test]
    fn test_money_currency_mismatch() {
        let a = Money::usd(dec!(1));
        let b = Money::new(dec!(1), Currency::EUR);
        assert!(matches!(a.add(&b), Err(MoneyError::CurrencyMismatch { .. })));
    }

    #[test]
    fn test_money_display_rounds_to_cents() {
        assert_eq!(Money::usd(dec!(203.9976)).to_string(), "$204.00");
        assert_eq!(Money::usd(dec!(9.99)).to_string(), "$9.99");
    }

    #[test]
    fn test_quantity_never_zero() {
        assert!(Quantity::new(0).is_none());
        assert_eq!(Quantity::ONE.decrement(), None);
        assert_eq!(Quantity::new(3).unwrap().decrement(), Quantity::new(2));
        assert!(serde_json::from_str::<Quantity>("0").is_err());
    }

    #[test]
    fn test_percent_bounds() {
        assert!(Percent::new(dec!(101)).is_err());
        assert!(Percent::new(dec!(-1)).is_err());
        let twenty = Percent::new(dec!(20)).unwrap();
        assert_eq!(twenty.of(&Money::usd(dec!(1000))).amount(), dec!(200));
        assert_eq!(twenty.to_string(), "20%");
    }

    #[test]
    fn test_currency_parse() {
        assert_eq!("usd".parse::<Currency>().unwrap(), Currency::USD);
        assert!("xyz".parse::<Currency>().is_err());
    }
}
