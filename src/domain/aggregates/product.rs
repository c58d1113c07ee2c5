//! Product Aggregate

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use crate::domain::aggregates::LineItem;
use crate::domain::value_objects::{Money, ProductId, Quantity};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Product {
    id: ProductId,
    name: String,
    category: String,
    price: Money,
    compare_at_price: Option<Money>,
    rating: Decimal,
    review_count: u32,
    badge: Option<String>,
}

impl Product {
    pub fn new(id: impl Into<ProductId>, name: impl Into<String>, category: impl Into<String>, price: Money) -> Self {
        Self {
            id: id.into(), name: name.into(), category: category.into(), price,
            compare_at_price: None, rating: Decimal::ZERO, review_count: 0, badge: None,
        }
    }

    pub fn with_rating(mut self, rating: Decimal, review_count: u32) -> Self {
        self.rating = rating;
        self.review_count = review_count;
        self
    }

    pub fn with_badge(mut self, badge: impl Into<String>) -> Self { self.badge = Some(badge.into()); self }

    /// Marks the product as discounted from `original`. Ignored unless `original` is higher.
    pub fn on_sale_from(mut self, original: Money) -> Self {
        if original.currency() == self.price.currency() && original.amount() > self.price.amount() {
            self.compare_at_price = Some(original);
        }
        self
    }

    pub fn id(&self) -> &ProductId { &self.id }
    pub fn name(&self) -> &str { &self.name }
    pub fn category(&self) -> &str { &self.category }
    pub fn price(&self) -> &Money { &self.price }
    pub fn compare_at_price(&self) -> Option<&Money> { self.compare_at_price.as_ref() }
    pub fn rating(&self) -> Decimal { self.rating }
    pub fn review_count(&self) -> u32 { self.review_count }
    pub fn badge(&self) -> Option<&str> { self.badge.as_deref() }
    pub fn is_on_sale(&self) -> bool { self.compare_at_price.is_some() }

    /// Whole percent saved against the compare-at price, rounded half up.
    pub fn percent_off(&self) -> Option<u32> {
        let original = self.compare_at_price?.amount();
        let saved = (original - self.price.amount()) / original * Decimal::ONE_HUNDRED;
        saved.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero).try_into().ok()
    }

    pub fn savings(&self) -> Option<Money> {
        self.compare_at_price.and_then(|original| original.sub(&self.price).ok())
    }

    pub fn matches(&self, needle: &str) -> bool {
        let needle = needle.to_lowercase();
        self.name.to_lowercase().contains(&needle) || self.category.to_lowercase().contains(&needle)
    }

    pub fn to_line_item(&self, quantity: Quantity) -> LineItem {
        LineItem::new(self.id.clone(), self.name.clone(), self.price, quantity)
    }
}
