//! Cart Aggregate
//!
//! The line-item store behind the cart, shipping and checkout screens. Items keep
//! insertion order and every state change raises a [`CartEvent`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use crate::domain::events::{CartEvent, DomainEvent};
use crate::domain::value_objects::{Currency, Money, ProductId, Quantity};

#[derive(Clone, Debug)]
pub struct Cart {
    id: String,
    currency: Currency,
    items: Vec<LineItem>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    events: Vec<DomainEvent>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    pub id: ProductId,
    pub name: String,
    pub unit_price: Money,
    pub quantity: Quantity,
}

impl LineItem {
    pub fn new(id: impl Into<ProductId>, name: impl Into<String>, unit_price: Money, quantity: Quantity) -> Self {
        Self { id: id.into(), name: name.into(), unit_price, quantity }
    }

    pub fn line_total(&self) -> Money { self.unit_price.multiply(self.quantity) }
}

impl Cart {
    pub fn new(currency: Currency) -> Self {
        let now = Utc::now();
        Self { id: Uuid::new_v4().to_string(), currency, items: vec![], created_at: now, updated_at: now, events: vec![] }
    }

    pub fn with_items(currency: Currency, items: impl IntoIterator<Item = LineItem>) -> Self {
        let mut cart = Self::new(currency);
        for item in items { cart.add(item); }
        cart.events.clear();
        cart
    }

    pub fn id(&self) -> &str { &self.id }
    pub fn currency(&self) -> Currency { self.currency }
    pub fn items(&self) -> &[LineItem] { &self.items }
    pub fn get(&self, id: &ProductId) -> Option<&LineItem> { self.items.iter().find(|i| &i.id == id) }
    pub fn is_empty(&self) -> bool { self.items.is_empty() }
    pub fn created_at(&self) -> DateTime<Utc> { self.created_at }
    pub fn updated_at(&self) -> DateTime<Utc> { self.updated_at }

    /// Total number of units across all lines.
    pub fn unit_count(&self) -> u32 { self.items.iter().map(|i| i.quantity.value()).sum() }

    /// Inserts the item, or merges its quantity into an existing line with the same id.
    pub fn add(&mut self, item: LineItem) {
        let added = item.quantity.value();
        let product_id = item.id.clone();
        if let Some(existing) = self.items.iter_mut().find(|i| i.id == item.id) {
            let from = existing.quantity.value();
            existing.quantity = existing.quantity.add(item.quantity);
            let to = existing.quantity.value();
            self.raise_event(DomainEvent::Cart(CartEvent::QuantityChanged { product_id, from, to }));
        } else {
            self.items.push(item);
            self.raise_event(DomainEvent::Cart(CartEvent::ItemAdded { product_id, quantity: added }));
        }
        self.touch();
    }

    /// Replaces a line's quantity. Quantities below one and unknown ids are ignored.
    pub fn set_quantity(&mut self, id: &ProductId, quantity: u32) -> bool {
        let Some(quantity) = Quantity::new(quantity) else { return false };
        let Some(item) = self.items.iter_mut().find(|i| &i.id == id) else { return false };
        if item.quantity == quantity { return false; }
        let from = item.quantity.value();
        item.quantity = quantity;
        self.raise_event(DomainEvent::Cart(CartEvent::QuantityChanged { product_id: id.clone(), from, to: quantity.value() }));
        self.touch();
        true
    }

    pub fn increment(&mut self, id: &ProductId) -> bool {
        match self.get(id) {
            Some(item) => { let next = item.quantity.value().saturating_add(1); self.set_quantity(id, next) }
            None => false,
        }
    }

    /// Decrementing a single unit removes the line.
    pub fn decrement(&mut self, id: &ProductId) -> bool {
        match self.get(id).map(|i| i.quantity.decrement()) {
            Some(Some(next)) => self.set_quantity(id, next.value()),
            Some(None) => self.remove(id),
            None => false,
        }
    }

    pub fn remove(&mut self, id: &ProductId) -> bool {
        let before = self.items.len();
        self.items.retain(|i| &i.id != id);
        if self.items.len() == before { return false; }
        self.raise_event(DomainEvent::Cart(CartEvent::ItemRemoved { product_id: id.clone() }));
        self.touch();
        true
    }

    /// Takes ordered lines out of the cart. Units added after the order was
    /// taken stay behind.
    pub fn deduct(&mut self, ordered: &[LineItem]) -> bool {
        let mut changed = false;
        for line in ordered {
            let Some(current) = self.get(&line.id).map(|i| i.quantity.value()) else { continue };
            changed |= match current.checked_sub(line.quantity.value()).filter(|left| *left > 0) {
                Some(left) => self.set_quantity(&line.id, left),
                None => self.remove(&line.id),
            };
        }
        changed
    }

    pub fn clear(&mut self) {
        if self.items.is_empty() { return; }
        let items = self.items.len();
        self.items.clear();
        self.raise_event(DomainEvent::Cart(CartEvent::Cleared { items }));
        self.touch();
    }

    pub fn take_events(&mut self) -> Vec<DomainEvent> { std::mem::take(&mut self.events) }
    fn raise_event(&mut self, e: DomainEvent) { self.events.push(e); }
    fn touch(&mut self) { self.updated_at = Utc::now(); }
}
