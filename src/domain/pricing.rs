//! Pricing calculator
//!
//! Totals are derived on every read from the current line items, the selected
//! shipping method, the tax rate and the discount. Nothing here is cached.

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::domain::aggregates::LineItem;
use crate::domain::value_objects::{Currency, Money};

/// Delivery tiers, each a flat fee.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ShippingMethod {
    #[default]
    Standard,
    Express,
    SameDay,
}

impl ShippingMethod {
    pub const ALL: [ShippingMethod; 3] = [Self::Standard, Self::Express, Self::SameDay];

    pub fn fee(&self, currency: Currency) -> Money {
        let amount = match self {
            Self::Standard => Decimal::new(999, 2),
            Self::Express => Decimal::new(1999, 2),
            Self::SameDay => Decimal::new(2999, 2),
        };
        Money::new(amount, currency)
    }

    pub fn label(&self) -> &'static str {
        match self { Self::Standard => "standard", Self::Express => "express", Self::SameDay => "same-day" }
    }

    /// Standard arrives in five days, express in two, same-day at 20:00 UTC today.
    pub fn estimated_delivery(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        match self {
            Self::Standard => now + Duration::days(5),
            Self::Express => now + Duration::days(2),
            Self::SameDay => now.date_naive().and_hms_opt(20, 0, 0).map_or(now, |cutoff| cutoff.and_utc()),
        }
    }
}

impl fmt::Display for ShippingMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.label()) }
}

impl FromStr for ShippingMethod {
    type Err = PricingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "standard" => Ok(Self::Standard),
            "express" => Ok(Self::Express),
            "same-day" | "same_day" | "sameday" => Ok(Self::SameDay),
            other => Err(PricingError::UnknownShippingMethod(other.to_string())),
        }
    }
}

/// Flat tax rate as a fraction (0.08 is 8%).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxRate(Decimal);

impl TaxRate {
    pub fn new(rate: Decimal) -> Result<Self, PricingError> {
        if rate < Decimal::ZERO || rate > Decimal::ONE { return Err(PricingError::InvalidTaxRate(rate)); }
        Ok(Self(rate))
    }
    pub fn value(&self) -> Decimal { self.0 }
}

impl Default for TaxRate {
    fn default() -> Self { Self(Decimal::new(8, 2)) }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PricingError {
    #[error("unknown shipping method: {0}")]
    UnknownShippingMethod(String),
    #[error("tax rate {0} must be between 0 and 1")]
    InvalidTaxRate(Decimal),
}

/// Derived totals. Never stored; recompute with [`compute`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingSnapshot {
    pub subtotal: Money,
    pub shipping: Money,
    pub tax: Money,
    pub discount: Money,
    pub total: Money,
}

impl PricingSnapshot {
    pub fn empty(currency: Currency) -> Self {
        let zero = Money::zero(currency);
        Self { subtotal: zero, shipping: zero, tax: zero, discount: zero, total: zero }
    }

    pub fn currency(&self) -> Currency { self.total.currency() }

    /// Every figure rounded to cents for display.
    pub fn rounded(&self) -> Self {
        Self {
            subtotal: self.subtotal.round_cents(),
            shipping: self.shipping.round_cents(),
            tax: self.tax.round_cents(),
            discount: self.discount.round_cents(),
            total: self.total.round_cents(),
        }
    }
}

/// Sums line totals in the discount's currency; a cart only ever holds one currency.
pub fn subtotal(items: &[LineItem], currency: Currency) -> Money {
    let amount = items.iter().map(|i| i.line_total().amount()).sum::<Decimal>();
    Money::new(amount, currency)
}

/// Derives a snapshot. An empty cart ships free, and the total never drops below zero.
pub fn compute(items: &[LineItem], shipping_method: ShippingMethod, tax_rate: TaxRate, discount: Money) -> PricingSnapshot {
    let currency = discount.currency();
    if items.is_empty() {
        return PricingSnapshot::empty(currency);
    }
    let subtotal = subtotal(items, currency);
    let shipping = shipping_method.fee(currency);
    let tax = subtotal.scale(tax_rate.value());
    let discount = discount.clamp_non_negative();
    let total = Money::new(subtotal.amount() + shipping.amount() + tax.amount() - discount.amount(), currency)
        .clamp_non_negative();
    PricingSnapshot { subtotal, shipping, tax, discount, total }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_objects::Quantity;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn item(id: &str, price: Decimal, qty: u32) -> LineItem {
        LineItem::new(id, id, Money::usd(price), Quantity::new(qty).unwrap())
    }

    fn techhub_cart() -> Vec<LineItem> {
        vec![item("1", dec!(1299.99), 1), item("2", dec!(249.99), 1), item("4", dec!(999.99), 1)]
    }

    #[test]
    fn test_cart_page_totals() {
        let snapshot = compute(&techhub_cart(), ShippingMethod::Standard, TaxRate::default(), Money::zero(Currency::USD));
        assert_eq!(snapshot.subtotal.amount(), dec!(2549.97));
        assert_eq!(snapshot.shipping.amount(), dec!(9.99));
        assert_eq!(snapshot.tax.amount(), dec!(203.9976));
        assert_eq!(snapshot.discount.amount(), dec!(0));

        let rounded = snapshot.rounded();
        assert_eq!(rounded.tax.amount(), dec!(204.00));
        assert_eq!(rounded.total.amount(), dec!(2763.96));
    }

    #[test]
    fn test_subtotal_is_exact() {
        let items = vec![item("a", dec!(0.10), 3), item("b", dec!(0.20), 7), item("c", dec!(19.99), 13)];
        assert_eq!(subtotal(&items, Currency::USD).amount(), dec!(261.57));
    }

    #[test]
    fn test_total_never_negative() {
        let snapshot = compute(&techhub_cart(), ShippingMethod::SameDay, TaxRate::default(), Money::usd(dec!(1000000)));
        assert_eq!(snapshot.total.amount(), Decimal::ZERO);
        assert_eq!(snapshot.discount.amount(), dec!(1000000));
    }

    #[test]
    fn test_empty_cart_is_all_zero() {
        let snapshot = compute(&[], ShippingMethod::Express, TaxRate::default(), Money::usd(dec!(5)));
        assert_eq!(snapshot, PricingSnapshot::empty(Currency::USD));
    }

    #[test]
    fn test_shipping_tiers() {
        let items = vec![item("1", dec!(100), 1)];
        let fees: Vec<_> = ShippingMethod::ALL
            .iter()
            .map(|m| compute(&items, *m, TaxRate::default(), Money::zero(Currency::USD)).shipping.amount())
            .collect();
        assert_eq!(fees, [dec!(9.99), dec!(19.99), dec!(29.99)]);
    }

    #[test]
    fn test_shipping_method_parse() {
        assert_eq!("Same-Day".parse::<ShippingMethod>().unwrap(), ShippingMethod::SameDay);
        assert!("drone".parse::<ShippingMethod>().is_err());
    }

    #[test]
    fn test_tax_rate_bounds() {
        assert!(TaxRate::new(dec!(-0.01)).is_err());
        assert!(TaxRate::new(dec!(1.5)).is_err());
        assert_eq!(TaxRate::default().value(), dec!(0.08));
    }

    #[test]
    fn test_estimated_delivery() {
        let now = Utc.with_ymd_and_hms(2024, 3, 1, 9, 30, 0).unwrap();
        assert_eq!(ShippingMethod::Standard.estimated_delivery(now), now + Duration::days(5));
        assert_eq!(ShippingMethod::Express.estimated_delivery(now), now + Duration::days(2));
        assert_eq!(
            ShippingMethod::SameDay.estimated_delivery(now),
            Utc.with_ymd_and_hms(2024, 3, 1, 20, 0, 0).unwrap()
        );
    }
}
