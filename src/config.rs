//! Runtime configuration
//!
//! Read from `STOREFRONT_*` environment variables, with a `.env` file loaded
//! first when present. Unset variables fall back to the storefront defaults.

use rust_decimal::Decimal;
use std::fmt::Display;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

use crate::domain::pricing::TaxRate;
use crate::domain::promo::DiscountPolicy;
use crate::domain::value_objects::Currency;

pub const CURRENCY: &str = "STOREFRONT_CURRENCY";
pub const TAX_RATE: &str = "STOREFRONT_TAX_RATE";
pub const DISCOUNT_POLICY: &str = "STOREFRONT_DISCOUNT_POLICY";
pub const STEP_LATENCY_MS: &str = "STOREFRONT_STEP_LATENCY_MS";
pub const PROMO_LATENCY_MS: &str = "STOREFRONT_PROMO_LATENCY_MS";
pub const ORDER_LATENCY_MS: &str = "STOREFRONT_ORDER_LATENCY_MS";
pub const SEARCH_LATENCY_MS: &str = "STOREFRONT_SEARCH_LATENCY_MS";
pub const FLASH_SALE_SECS: &str = "STOREFRONT_FLASH_SALE_SECS";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StorefrontConfig {
    pub currency: Currency,
    pub tax_rate: TaxRate,
    pub discount_policy: DiscountPolicy,
    pub step_latency: Duration,
    pub promo_latency: Duration,
    pub order_latency: Duration,
    pub search_latency: Duration,
    /// Flash-sale countdown length; restarts from here when it runs out.
    pub flash_sale: Duration,
}

impl Default for StorefrontConfig {
    fn default() -> Self {
        Self {
            currency: Currency::USD,
            tax_rate: TaxRate::default(),
            discount_policy: DiscountPolicy::Recompute,
            step_latency: Duration::from_millis(800),
            promo_latency: Duration::from_millis(1000),
            order_latency: Duration::from_millis(1500),
            search_latency: Duration::from_millis(800),
            // 2d 14h 36m 45s
            flash_sale: Duration::from_secs(2 * 86_400 + 14 * 3_600 + 36 * 60 + 45),
        }
    }
}

impl StorefrontConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let tax_rate = match parse::<Decimal>(&lookup, TAX_RATE)? {
            Some(rate) => TaxRate::new(rate).map_err(|e| invalid(TAX_RATE, rate.to_string(), e))?,
            None => defaults.tax_rate,
        };
        Ok(Self {
            currency: parse(&lookup, CURRENCY)?.unwrap_or(defaults.currency),
            tax_rate,
            discount_policy: parse(&lookup, DISCOUNT_POLICY)?.unwrap_or(defaults.discount_policy),
            step_latency: millis(&lookup, STEP_LATENCY_MS)?.unwrap_or(defaults.step_latency),
            promo_latency: millis(&lookup, PROMO_LATENCY_MS)?.unwrap_or(defaults.promo_latency),
            order_latency: millis(&lookup, ORDER_LATENCY_MS)?.unwrap_or(defaults.order_latency),
            search_latency: millis(&lookup, SEARCH_LATENCY_MS)?.unwrap_or(defaults.search_latency),
            flash_sale: parse::<u64>(&lookup, FLASH_SALE_SECS)?.map(Duration::from_secs).unwrap_or(defaults.flash_sale),
        })
    }

    /// No simulated latency anywhere.
    pub fn instant() -> Self {
        Self {
            step_latency: Duration::ZERO,
            promo_latency: Duration::ZERO,
            order_latency: Duration::ZERO,
            search_latency: Duration::ZERO,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("invalid value {value:?} for {key}: {reason}")]
    Invalid { key: &'static str, value: String, reason: String },
}

fn invalid(key: &'static str, value: String, reason: impl Display) -> ConfigError {
    ConfigError::Invalid { key, value, reason: reason.to_string() }
}

fn parse<T>(lookup: &impl Fn(&str) -> Option<String>, key: &'static str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: Display,
{
    match lookup(key) {
        Some(raw) if !raw.trim().is_empty() => raw.trim().parse().map(Some).map_err(|e| invalid(key, raw, e)),
        _ => Ok(None),
    }
}

fn millis(lookup: &impl Fn(&str) -> Option<String>, key: &'static str) -> Result<Option<Duration>, ConfigError> {
    Ok(parse::<u64>(lookup, key)?.map(Duration::from_millis))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = StorefrontConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, StorefrontConfig::default());
        assert_eq!(config.tax_rate.value(), dec!(0.08));
        assert_eq!(config.flash_sale.as_secs(), 225_405);
    }

    #[test]
    fn test_overrides() {
        let config = StorefrontConfig::from_lookup(lookup(&[
            (CURRENCY, "eur"),
            (TAX_RATE, "0.2"),
            (DISCOUNT_POLICY, "freeze"),
            (STEP_LATENCY_MS, "0"),
            (FLASH_SALE_SECS, "45"),
        ]))
        .unwrap();
        assert_eq!(config.currency, Currency::EUR);
        assert_eq!(config.tax_rate.value(), dec!(0.2));
        assert_eq!(config.discount_policy, DiscountPolicy::Freeze);
        assert_eq!(config.step_latency, Duration::ZERO);
        assert_eq!(config.flash_sale, Duration::from_secs(45));
        assert_eq!(config.promo_latency, Duration::from_millis(1000));
    }

    #[test]
    fn test_invalid_values_are_reported() {
        let err = StorefrontConfig::from_lookup(lookup(&[(TAX_RATE, "8%")])).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: TAX_RATE, .. }));
        let err = StorefrontConfig::from_lookup(lookup(&[(TAX_RATE, "1.5")])).unwrap_err();
        assert!(err.to_string().contains("STOREFRONT_TAX_RATE"));
        assert!(StorefrontConfig::from_lookup(lookup(&[(ORDER_LATENCY_MS, "-5")])).is_err());
    }
}
