//! Promo codes
//!
//! Codes are matched case-insensitively against a static [`PromoBook`]. A rule
//! discounts a percentage of the subtotal.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::domain::value_objects::{Money, Percent};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscountRule {
    code: String,
    percent_off: Percent,
}

impl DiscountRule {
    pub fn new(code: impl AsRef<str>, percent_off: Percent) -> Self {
        Self { code: code.as_ref().to_uppercase(), percent_off }
    }

    pub fn code(&self) -> &str { &self.code }
    pub fn percent_off(&self) -> Percent { self.percent_off }
    pub fn matches(&self, code: &str) -> bool { code.to_uppercase() == self.code }
    pub fn discount_on(&self, subtotal: &Money) -> Money { self.percent_off.of(subtotal) }
}

/// Result of trying a code. Rejected codes carry a zero discount.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct PromoOutcome {
    pub discount: Money,
    pub accepted: bool,
}

/// The static rule table, fixed once built.
#[derive(Clone, Debug)]
pub struct PromoBook {
    rules: Vec<DiscountRule>,
}

impl PromoBook {
    pub fn new(rules: impl IntoIterator<Item = DiscountRule>) -> Self {
        Self { rules: rules.into_iter().collect() }
    }

    pub fn rules(&self) -> &[DiscountRule] { &self.rules }

    pub fn find(&self, code: &str) -> Option<&DiscountRule> {
        self.rules.iter().find(|r| r.matches(code))
    }

    pub fn apply(&self, code: &str, subtotal: Money) -> PromoOutcome {
        match self.find(code) {
            Some(rule) => PromoOutcome { discount: rule.discount_on(&subtotal), accepted: true },
            None => PromoOutcome { discount: Money::zero(subtotal.currency()), accepted: false },
        }
    }
}

impl Default for PromoBook {
    fn default() -> Self {
        Self::new([DiscountRule::new("TECH20", Percent::whole(20))])
    }
}

/// Whether an accepted discount follows later subtotal changes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiscountPolicy {
    #[default]
    Recompute,
    Freeze,
}

impl FromStr for DiscountPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "recompute" => Ok(Self::Recompute),
            "freeze" => Ok(Self::Freeze),
            other => Err(format!("unknown discount policy: {other}")),
        }
    }
}

/// A code accepted into a checkout.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AppliedPromo {
    rule: DiscountRule,
    policy: DiscountPolicy,
    frozen: Money,
}

impl AppliedPromo {
    pub fn new(rule: DiscountRule, policy: DiscountPolicy, subtotal_at_apply: Money) -> Self {
        let frozen = rule.discount_on(&subtotal_at_apply);
        Self { rule, policy, frozen }
    }

    pub fn code(&self) -> &str { self.rule.code() }
    pub fn policy(&self) -> DiscountPolicy { self.policy }

    pub fn discount_for(&self, subtotal: &Money) -> Money {
        match self.policy {
            DiscountPolicy::Recompute => self.rule.discount_on(subtotal),
            DiscountPolicy::Freeze => self.frozen,
        }
    }
}
