//! Saved-for-later products, toggled from product cards and the product page
//! and listed on the profile screen.

use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

use crate::domain::aggregates::{LineItem, Product};
use crate::domain::value_objects::{ProductId, Quantity};
use crate::services::cart::CartHandle;
use crate::{Result, StorefrontError};

/// Clones share one list, in the order products were saved.
#[derive(Clone, Debug, Default)]
pub struct Wishlist {
    items: Arc<RwLock<Vec<Product>>>,
}

impl Wishlist {
    pub fn new() -> Self { Self::default() }

    /// Saves the product, or unsaves it when already saved. Returns whether it is saved now.
    pub async fn toggle(&self, product: &Product) -> bool {
        let mut items = self.items.write().await;
        if let Some(pos) = items.iter().position(|p| p.id() == product.id()) {
            items.remove(pos);
            debug!(product_id = %product.id(), "removed from wishlist");
            false
        } else {
            items.push(product.clone());
            debug!(product_id = %product.id(), "added to wishlist");
            true
        }
    }

    pub async fn contains(&self, id: &ProductId) -> bool { self.items.read().await.iter().any(|p| p.id() == id) }
    pub async fn list(&self) -> Vec<Product> { self.items.read().await.clone() }
    pub async fn len(&self) -> usize { self.items.read().await.len() }
    pub async fn is_empty(&self) -> bool { self.items.read().await.is_empty() }

    pub async fn remove(&self, id: &ProductId) -> bool {
        let mut items = self.items.write().await;
        let before = items.len();
        items.retain(|p| p.id() != id);
        items.len() != before
    }

    /// Puts one unit of a saved product in the cart and drops it from the list.
    pub async fn move_to_cart(&self, id: &ProductId, cart: &CartHandle) -> Result<LineItem> {
        let product = {
            let mut items = self.items.write().await;
            let pos = items.iter().position(|p| p.id() == id)
                .ok_or_else(|| StorefrontError::ProductNotFound(id.clone()))?;
            items.remove(pos)
        };
        let line = product.to_line_item(Quantity::ONE);
        cart.add(line.clone()).await;
        debug!(product_id = %id, "moved from wishlist to cart");
        Ok(line)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_objects::{Currency, Money};
    use rust_decimal_macros::dec;

    fn mouse() -> Product {
        Product::new("5", "Wireless Gaming Mouse", "Accessories", Money::usd(dec!(79.99)))
    }

    fn keyboard() -> Product {
        Product::new("9", "Mechanical Gaming Keyboard", "Accessories", Money::usd(dec!(89.99)))
    }

    #[tokio::test]
    async fn test_toggle_saves_then_unsaves() {
        let wishlist = Wishlist::new();
        assert!(wishlist.toggle(&mouse()).await);
        assert!(wishlist.contains(&"5".into()).await);
        assert!(!wishlist.toggle(&mouse()).await);
        assert!(!wishlist.contains(&"5".into()).await);
        assert!(wishlist.is_empty().await);
    }

    #[tokio::test]
    async fn test_list_keeps_saved_order_across_clones() {
        let product_card = Wishlist::new();
        let profile = product_card.clone();
        product_card.toggle(&keyboard()).await;
        product_card.toggle(&mouse()).await;
        let names: Vec<String> = profile.list().await.iter().map(|p| p.name().to_string()).collect();
        assert_eq!(names, ["Mechanical Gaming Keyboard", "Wireless Gaming Mouse"]);
        assert!(profile.remove(&"9".into()).await);
        assert!(!profile.remove(&"9".into()).await);
        assert_eq!(product_card.len().await, 1);
    }

    #[tokio::test]
    async fn test_move_to_cart() {
        let wishlist = Wishlist::new();
        let cart = CartHandle::empty(Currency::USD);
        wishlist.toggle(&mouse()).await;
        cart.add(mouse().to_line_item(Quantity::ONE)).await;

        let line = wishlist.move_to_cart(&"5".into(), &cart).await.unwrap();
        assert_eq!(line.unit_price.amount(), dec!(79.99));
        assert_eq!(cart.unit_count().await, 2);
        assert!(wishlist.is_empty().await);
        assert!(matches!(
            wishlist.move_to_cart(&"5".into(), &cart).await,
            Err(StorefrontError::ProductNotFound(_))
        ));
    }
}
