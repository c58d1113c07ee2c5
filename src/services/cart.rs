//! Shared cart store.
//!
//! One [`CartHandle`] is created per shopping session and cloned into every
//! screen that shows or edits the cart, so the cart, shipping and checkout views
//! always read the same line items. Each change bumps a revision on a watch
//! channel; subscribers re-derive their pricing when it moves.

use std::sync::Arc;
use tokio::sync::{watch, RwLock};
use tracing::debug;

use crate::domain::aggregates::{Cart, LineItem};
use crate::domain::events::DomainEvent;
use crate::domain::pricing::{compute, PricingSnapshot, ShippingMethod, TaxRate};
use crate::domain::value_objects::{Currency, Money, ProductId};

#[derive(Clone, Debug)]
pub struct CartHandle {
    cart: Arc<RwLock<Cart>>,
    revision: Arc<watch::Sender<u64>>,
}

impl CartHandle {
    pub fn new(cart: Cart) -> Self {
        Self { cart: Arc::new(RwLock::new(cart)), revision: Arc::new(watch::channel(0).0) }
    }

    pub fn empty(currency: Currency) -> Self { Self::new(Cart::new(currency)) }

    /// Revision counter, incremented after every effective change.
    pub fn subscribe(&self) -> watch::Receiver<u64> { self.revision.subscribe() }
    pub fn revision(&self) -> u64 { *self.revision.borrow() }

    pub async fn add(&self, item: LineItem) {
        self.mutate(|cart| cart.add(item)).await
    }

    pub async fn set_quantity(&self, id: &ProductId, quantity: u32) -> bool {
        self.mutate(|cart| cart.set_quantity(id, quantity)).await
    }

    pub async fn increment(&self, id: &ProductId) -> bool {
        self.mutate(|cart| cart.increment(id)).await
    }

    pub async fn decrement(&self, id: &ProductId) -> bool {
        self.mutate(|cart| cart.decrement(id)).await
    }

    pub async fn remove(&self, id: &ProductId) -> bool {
        self.mutate(|cart| cart.remove(id)).await
    }

    /// Removes what an order took, leaving anything added since.
    pub async fn deduct(&self, ordered: &[LineItem]) -> bool {
        self.mutate(|cart| cart.deduct(ordered)).await
    }

    pub async fn clear(&self) {
        self.mutate(Cart::clear).await
    }

    pub async fn items(&self) -> Vec<LineItem> { self.cart.read().await.items().to_vec() }
    pub async fn currency(&self) -> Currency { self.cart.read().await.currency() }
    pub async fn is_empty(&self) -> bool { self.cart.read().await.is_empty() }
    pub async fn unit_count(&self) -> u32 { self.cart.read().await.unit_count() }

    pub async fn read<R>(&self, f: impl FnOnce(&Cart) -> R) -> R {
        f(&*self.cart.read().await)
    }

    /// Prices the cart as it stands right now.
    pub async fn price(&self, shipping_method: ShippingMethod, tax_rate: TaxRate, discount: Option<Money>) -> PricingSnapshot {
        let cart = self.cart.read().await;
        let discount = discount.unwrap_or_else(|| Money::zero(cart.currency()));
        compute(cart.items(), shipping_method, tax_rate, discount)
    }

    async fn mutate<R>(&self, f: impl FnOnce(&mut Cart) -> R) -> R {
        let mut cart = self.cart.write().await;
        let out = f(&mut cart);
        let events = cart.take_events();
        drop(cart);
        if !events.is_empty() {
            for event in &events {
                if let DomainEvent::Cart(change) = event {
                    debug!(?change, "cart changed");
                }
            }
            self.revision.send_modify(|rev| *rev += 1);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_objects::Quantity;
    use rust_decimal_macros::dec;

    fn laptop() -> LineItem {
        LineItem::new("1", "Ultra Slim Laptop Pro", Money::usd(dec!(1299.99)), Quantity::ONE)
    }

    #[tokio::test]
    async fn test_clones_share_one_cart() {
        let cart_page = CartHandle::empty(Currency::USD);
        let checkout_page = cart_page.clone();
        cart_page.add(laptop()).await;
        cart_page.increment(&ProductId::from("1")).await;
        assert_eq!(checkout_page.unit_count().await, 2);
        let snapshot = checkout_page.price(ShippingMethod::Standard, TaxRate::default(), None).await;
        assert_eq!(snapshot.subtotal.amount(), dec!(2599.98));
    }

    #[tokio::test]
    async fn test_revision_moves_only_on_change() {
        let handle = CartHandle::empty(Currency::USD);
        let mut rx = handle.subscribe();
        handle.add(laptop()).await;
        assert!(rx.has_changed().unwrap());
        let _ = rx.borrow_and_update();

        assert!(!handle.set_quantity(&ProductId::from("1"), 0).await);
        assert!(!handle.remove(&ProductId::from("missing")).await);
        assert!(!rx.has_changed().unwrap());
        assert_eq!(handle.revision(), 1);

        handle.clear().await;
        assert!(rx.has_changed().unwrap());
        assert!(handle.is_empty().await);
    }

    #[tokio::test]
    async fn test_empty_cart_prices_to_zero() {
        let handle = CartHandle::empty(Currency::USD);
        let snapshot = handle.price(ShippingMethod::SameDay, TaxRate::default(), None).await;
        assert_eq!(snapshot, PricingSnapshot::empty(Currency::USD));
    }
}
