//! TechHub Storefront - scripted shopping session
//!
//! Browses the catalog, fills the cart, applies a promo code, walks the
//! checkout and places an order, logging each stage.

use anyhow::Result;
use chrono::Utc;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use techhub_storefront::domain::countdown::{Clock, Countdown};
use techhub_storefront::repository::{InMemoryCatalog, InMemoryOrders};
use techhub_storefront::services::catalog::suggestions;
use techhub_storefront::services::{CartHandle, CatalogService, CheckoutSession, SearchQuery, SimulatedLatency, SortOrder, Wishlist};
use techhub_storefront::{Quantity, ShippingMethod, StorefrontConfig};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    let config = StorefrontConfig::from_env()?;
    tracing::info!(currency = %config.currency.code(), tax = %config.tax_rate.value(), "🛒 TechHub storefront session starting");

    let flash_sale = Countdown::flash_sale(config.flash_sale).spawn();
    let mut flash_rx = flash_sale.subscribe();

    let catalog = CatalogService::new(Arc::new(InMemoryCatalog::techhub()), SimulatedLatency::new(config.search_latency));
    tracing::info!(suggestions = ?suggestions("headphones"), "typing 'headphones'");
    let hits = catalog.search(&SearchQuery::text("wireless").sorted(SortOrder::PriceLowHigh)).await?;
    for product in &hits {
        tracing::info!(id = %product.id(), name = product.name(), price = %product.price(), "search hit");
    }
    for deal in catalog.deals().await?.iter().take(3) {
        tracing::info!(name = deal.name(), percent_off = ?deal.percent_off(), "deal");
    }

    let cart = CartHandle::empty(config.currency);
    let wishlist = Wishlist::new();
    wishlist.toggle(&catalog.find(&"4".into()).await?).await;
    for id in ["1", "2"] {
        let product = catalog.find(&id.into()).await?;
        cart.add(product.to_line_item(Quantity::ONE)).await;
    }
    let moved = wishlist.move_to_cart(&"4".into(), &cart).await?;
    tracing::info!(name = %moved.name, "moved from wishlist to cart");
    tracing::info!(units = cart.unit_count().await, "cart filled");

    let orders = Arc::new(InMemoryOrders::new());
    let checkout = CheckoutSession::new(cart, orders, &config);
    let outcome = checkout.apply_promo("tech20").await?;
    tracing::info!(accepted = outcome.accepted, discount = %outcome.discount.round_cents(), "promo");
    tracing::info!(pricing = %serde_json::to_string(&checkout.pricing().await.rounded())?, "cart totals");

    for (name, value) in [
        ("email", "jane@example.com"), ("phone", "(555) 010-7788"), ("first_name", "Jane"), ("last_name", "Doe"),
        ("address", "1 Main St"), ("city", "Springfield"), ("state", "IL"), ("zip_code", "62701"),
    ] {
        checkout.set_field(name, value).await;
    }
    checkout.advance().await?;
    checkout.select_shipping(ShippingMethod::Express).await;
    checkout.advance().await?;
    for (name, value) in [
        ("card_name", "Jane Doe"), ("card_number", "4242 4242 4242 4242"), ("card_expiry", "12/27"), ("card_cvc", "123"),
    ] {
        checkout.set_field(name, value).await;
    }

    let eta = checkout.delivery_countdown(Utc::now()).await;
    let order = checkout.place_order().await?;
    tracing::info!(order = %serde_json::to_string_pretty(&order)?, "order confirmed");
    tracing::info!(delivery_in = %eta.clock(), method = %order.shipping_method(), "delivery estimate");

    flash_rx.changed().await?;
    tracing::info!(remaining = %Clock::from_secs(flash_rx.borrow().as_secs()), "flash sale ends in");
    Ok(())
}
