//! Data access seams. Services depend on these traits, never on a concrete store.

use std::future::Future;

use crate::domain::aggregates::{Order, Product};
use crate::domain::value_objects::ProductId;
use crate::Result;

pub mod memory;

pub use memory::{InMemoryCatalog, InMemoryOrders};

pub trait ProductRepository: Send + Sync {
    fn list(&self) -> impl Future<Output = Result<Vec<Product>>> + Send;
    fn find(&self, id: &ProductId) -> impl Future<Output = Result<Option<Product>>> + Send;
}

pub trait OrderRepository: Send + Sync {
    /// Reserves the next human-facing order number, e.g. `ORD-10001`.
    fn next_order_number(&self) -> impl Future<Output = Result<String>> + Send;
    fn save(&self, order: Order) -> impl Future<Output = Result<()>> + Send;
    fn find(&self, order_number: &str) -> impl Future<Output = Result<Option<Order>>> + Send;
    /// Orders placed with `email`, newest first.
    fn history(&self, email: &str) -> impl Future<Output = Result<Vec<Order>>> + Send;
}
