//! Order Aggregate

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;
use validator::{Validate, ValidationErrors};
use crate::domain::aggregates::LineItem;
use crate::domain::events::{DomainEvent, OrderEvent};
use crate::domain::pricing::{PricingSnapshot, ShippingMethod};

#[derive(Clone, Debug, Serialize)]
pub struct Order {
    id: String,
    order_number: String,
    contact: Contact,
    ship_to: ShippingAddress,
    status: OrderStatus,
    items: Vec<LineItem>,
    shipping_method: ShippingMethod,
    pricing: PricingSnapshot,
    promo_code: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    #[serde(skip)]
    events: Vec<DomainEvent>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct Contact {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 7, max = 20))]
    pub phone: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct ShippingAddress {
    #[validate(length(min = 1))]
    pub first_name: String,
    #[validate(length(min = 1))]
    pub last_name: String,
    #[validate(length(min = 1))]
    pub address: String,
    pub apartment: Option<String>,
    #[validate(length(min = 1))]
    pub city: String,
    #[validate(length(min = 1))]
    pub state: String,
    #[validate(length(min = 3, max = 10))]
    pub zip_code: String,
    #[validate(length(min = 2))]
    pub country: String,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderStatus { #[default] Pending, Confirmed, Cancelled }

/// Everything a finished checkout hands over.
#[derive(Clone, Debug)]
pub struct NewOrder {
    pub order_number: String,
    pub contact: Contact,
    pub ship_to: ShippingAddress,
    pub items: Vec<LineItem>,
    pub shipping_method: ShippingMethod,
    pub pricing: PricingSnapshot,
    pub promo_code: Option<String>,
}

impl Order {
    pub fn place(new: NewOrder) -> Result<Self, OrderError> {
        if new.items.is_empty() { return Err(OrderError::NoItems); }
        validate_details(&new.contact, &new.ship_to)?;
        let id = Uuid::now_v7().to_string();
        let now = Utc::now();
        let mut order = Self {
            id: id.clone(), order_number: new.order_number.clone(), contact: new.contact, ship_to: new.ship_to,
            status: OrderStatus::Pending, items: new.items, shipping_method: new.shipping_method,
            pricing: new.pricing, promo_code: new.promo_code, created_at: now, updated_at: now, events: vec![],
        };
        order.raise_event(DomainEvent::Order(OrderEvent::Placed { order_id: id, order_number: new.order_number, total: new.pricing.total }));
        Ok(order)
    }

    pub fn id(&self) -> &str { &self.id }
    pub fn order_number(&self) -> &str { &self.order_number }
    pub fn email(&self) -> &str { &self.contact.email }
    pub fn ship_to(&self) -> &ShippingAddress { &self.ship_to }
    pub fn status(&self) -> OrderStatus { self.status }
    pub fn items(&self) -> &[LineItem] { &self.items }
    pub fn shipping_method(&self) -> ShippingMethod { self.shipping_method }
    pub fn pricing(&self) -> &PricingSnapshot { &self.pricing }
    pub fn promo_code(&self) -> Option<&str> { self.promo_code.as_deref() }
    pub fn created_at(&self) -> DateTime<Utc> { self.created_at }

    pub fn confirm(&mut self) -> Result<(), OrderError> {
        if self.status != OrderStatus::Pending { return Err(OrderError::InvalidTransition { from: self.status, to: OrderStatus::Confirmed }); }
        self.status = OrderStatus::Confirmed;
        self.touch();
        self.raise_event(DomainEvent::Order(OrderEvent::Confirmed { order_id: self.id.clone(), total: self.pricing.total }));
        Ok(())
    }

    pub fn cancel(&mut self) -> Result<(), OrderError> {
        if self.status == OrderStatus::Cancelled { return Err(OrderError::InvalidTransition { from: self.status, to: OrderStatus::Cancelled }); }
        self.status = OrderStatus::Cancelled;
        self.touch();
        self.raise_event(DomainEvent::Order(OrderEvent::Cancelled { order_id: self.id.clone() }));
        Ok(())
    }

    pub fn take_events(&mut self) -> Vec<DomainEvent> { std::mem::take(&mut self.events) }
    fn raise_event(&mut self, e: DomainEvent) { self.events.push(e); }
    fn touch(&mut self) { self.updated_at = Utc::now(); }
}

/// Checks the contact and delivery details an order would be placed with.
pub fn validate_details(contact: &Contact, ship_to: &ShippingAddress) -> Result<(), OrderError> {
    contact.validate()?;
    ship_to.validate()?;
    Ok(())
}

#[derive(Debug, Clone, Error)]
pub enum OrderError {
    #[error("order has no items")]
    NoItems,
    #[error("cannot move order from {from:?} to {to:?}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },
    #[error("invalid order details: {0}")]
    Invalid(#[from] ValidationErrors),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::pricing::{compute, TaxRate};
    use crate::domain::value_objects::{Currency, Money, Quantity};
    use rust_decimal_macros::dec;

    fn new_order() -> NewOrder {
        let items = vec![LineItem::new("P1", "Widget", Money::usd(dec!(10)), Quantity::new(2).unwrap())];
        let pricing = compute(&items, ShippingMethod::Standard, TaxRate::default(), Money::zero(Currency::USD));
        NewOrder {
            order_number: "ORD-10001".into(),
            contact: Contact { email: "test@example.com".into(), phone: "5551234567".into() },
            ship_to: ShippingAddress {
                first_name: "Jane".into(), last_name: "Doe".into(), address: "1 Main St".into(), apartment: None,
                city: "Springfield".into(), state: "IL".into(), zip_code: "62701".into(), country: "United States".into(),
            },
            items, shipping_method: ShippingMethod::Standard, pricing, promo_code: None,
        }
    }

    #[test]
    fn test_order_workflow() {
        let mut order = Order::place(new_order()).unwrap();
        assert_eq!(order.status(), OrderStatus::Pending);
        assert_eq!(order.pricing().total.amount(), dec!(31.59));
        order.confirm().unwrap();
        assert_eq!(order.status(), OrderStatus::Confirmed);
        order.cancel().unwrap();
        assert!(order.cancel().is_err());
        let events = order.take_events();
        assert_eq!(events.len(), 3);
        assert!(matches!(events[1], DomainEvent::Order(OrderEvent::Confirmed { ref total, .. }) if total.amount() == dec!(31.59)));
        assert!(matches!(events[2], DomainEvent::Order(OrderEvent::Cancelled { .. })));
    }

    #[test]
    fn test_empty_order_rejected() {
        let mut new = new_order();
        new.items.clear();
        assert!(matches!(Order::place(new), Err(OrderError::NoItems)));
    }

    #[test]
    fn test_contact_is_validated() {
        let mut new = new_order();
        new.contact.email = "nobody".into();
        let Err(OrderError::Invalid(errors)) = Order::place(new) else { panic!("expected validation failure") };
        assert!(errors.field_errors().contains_key("email"));
    }
}
