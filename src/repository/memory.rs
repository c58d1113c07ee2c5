//! In-memory repositories backing the demo storefront and the tests.

use rust_decimal::Decimal;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::RwLock;

use crate::domain::aggregates::{Order, Product};
use crate::domain::value_objects::{Currency, Money, ProductId};
use crate::repository::{OrderRepository, ProductRepository};
use crate::Result;

#[derive(Clone, Debug, Default)]
pub struct InMemoryCatalog {
    products: Vec<Product>,
}

impl InMemoryCatalog {
    pub fn new(products: impl IntoIterator<Item = Product>) -> Self {
        Self { products: products.into_iter().collect() }
    }

    /// The TechHub catalog: eight regular lines plus three deal-only items.
    pub fn techhub() -> Self {
        let usd = |cents: i64| Money::new(Decimal::new(cents, 2), Currency::USD);
        let rated = |rating: i64, reviews: u32| (Decimal::new(rating, 1), reviews);
        let seed = [
            ("1", "Ultra Slim Laptop Pro", "Laptops", 129_999, None, rated(48, 124), Some("New")),
            ("2", "Wireless Noise-Cancelling Headphones", "Audio", 24_999, Some(34_999), rated(47, 89), Some("Bestseller")),
            ("3", "Smart 4K Ultra HD TV", "TVs", 79_999, Some(99_999), rated(45, 56), Some("Sale")),
            ("4", "Premium Smartphone X", "Smartphones", 99_999, Some(129_999), rated(49, 203), Some("Featured")),
            ("5", "Wireless Gaming Mouse", "Accessories", 7_999, Some(9_999), rated(46, 78), None),
            ("6", "Smart Home Security Camera", "Smart Home", 14_999, Some(19_999), rated(44, 42), None),
            ("7", "Portable Bluetooth Speaker", "Audio", 12_999, Some(17_999), rated(43, 65), None),
            ("8", "Fitness Smartwatch", "Wearables", 19_999, Some(24_999), rated(47, 112), None),
            ("9", "Mechanical Gaming Keyboard", "Accessories", 8_999, Some(14_999), rated(48, 94), Some("Weekly Deal")),
            ("10", "Wireless Earbuds", "Audio", 7_999, Some(12_999), rated(45, 156), Some("Weekly Deal")),
            ("11", "External SSD 1TB", "Storage", 12_999, Some(19_999), rated(47, 87), Some("Weekly Deal")),
        ];
        Self::new(seed.into_iter().map(|(id, name, category, price, original, (rating, reviews), badge)| {
            let mut product = Product::new(id, name, category, usd(price)).with_rating(rating, reviews);
            if let Some(original) = original { product = product.on_sale_from(usd(original)); }
            if let Some(badge) = badge { product = product.with_badge(badge); }
            product
        }))
    }
}

impl ProductRepository for InMemoryCatalog {
    async fn list(&self) -> Result<Vec<Product>> {
        Ok(self.products.clone())
    }

    async fn find(&self, id: &ProductId) -> Result<Option<Product>> {
        Ok(self.products.iter().find(|p| p.id() == id).cloned())
    }
}

#[derive(Debug)]
pub struct InMemoryOrders {
    orders: RwLock<Vec<Order>>,
    sequence: AtomicU64,
}

impl InMemoryOrders {
    pub fn new() -> Self { Self::starting_at(10_001) }

    pub fn starting_at(first_number: u64) -> Self {
        Self { orders: RwLock::new(Vec::new()), sequence: AtomicU64::new(first_number) }
    }

    pub async fn len(&self) -> usize { self.orders.read().await.len() }
}

impl Default for InMemoryOrders {
    fn default() -> Self { Self::new() }
}

impl OrderRepository for InMemoryOrders {
    async fn next_order_number(&self) -> Result<String> {
        Ok(format!("ORD-{}", self.sequence.fetch_add(1, Ordering::Relaxed)))
    }

    async fn save(&self, order: Order) -> Result<()> {
        let mut orders = self.orders.write().await;
        match orders.iter_mut().find(|o| o.id() == order.id()) {
            Some(existing) => *existing = order,
            None => orders.push(order),
        }
        Ok(())
    }

    async fn find(&self, order_number: &str) -> Result<Option<Order>> {
        Ok(self.orders.read().await.iter().find(|o| o.order_number() == order_number).cloned())
    }

    async fn history(&self, email: &str) -> Result<Vec<Order>> {
        let orders = self.orders.read().await;
        Ok(orders.iter().rev().filter(|o| o.email().eq_ignore_ascii_case(email)).cloned().collect())
    }
}
