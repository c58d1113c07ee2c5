//! Domain events
use crate::domain::value_objects::{Money, ProductId};
use serde::Serialize;

#[derive(Clone, Debug, PartialEq, Serialize)]
pub enum DomainEvent {
    Cart(CartEvent),
    Order(OrderEvent),
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub enum CartEvent {
    ItemAdded { product_id: ProductId, quantity: u32 },
    QuantityChanged { product_id: ProductId, from: u32, to: u32 },
    ItemRemoved { product_id: ProductId },
    Cleared { items: usize },
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub enum OrderEvent {
    Placed { order_id: String, order_number: String, total: Money },
    Confirmed { order_id: String, total: Money },
    Cancelled { order_id: String },
}
