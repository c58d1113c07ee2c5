//! TechHub Storefront
//!
//! Client-side commerce logic for the TechHub storefront, without a backend.
//!
//! ## Features
//! - Line-item cart shared by the cart, shipping and checkout screens
//! - Pricing snapshots (subtotal, shipping tier, flat tax, discount, total)
//! - Promo codes resolved against a static rule table
//! - Step wizards with per-step validation (checkout, password recovery)
//! - Flash-sale and delivery countdowns
//! - Catalog search, suggestions and deals
//! - Wishlist with move-to-cart

use thiserror::Error;

pub mod config;
pub mod domain;
pub mod repository;
pub mod services;

pub use config::{ConfigError, StorefrontConfig};
pub use domain::aggregates::{Cart, LineItem, Order, Product};
pub use domain::pricing::{compute, PricingSnapshot, ShippingMethod, TaxRate};
pub use domain::promo::{DiscountPolicy, DiscountRule, PromoBook, PromoOutcome};
pub use domain::value_objects::{Currency, Money, ProductId, Quantity};
pub use domain::wizard::{CheckoutStep, RecoveryStep, StepChange, Wizard, WizardError};

// =============================================================================
// Error Types
// =============================================================================

#[derive(Error, Debug)]
pub enum StorefrontError {
    #[error("Product not found: {0}")]
    ProductNotFound(ProductId),

    #[error("Cart is empty")]
    EmptyCart,

    #[error("Checkout has not reached the payment step (currently at {0})")]
    PaymentStepNotReached(CheckoutStep),

    #[error("Another request is still in progress")]
    Busy,

    #[error("Request cancelled")]
    Cancelled,

    #[error(transparent)]
    Wizard(#[from] WizardError),

    #[error(transparent)]
    Order(#[from] domain::aggregates::OrderError),

    #[error(transparent)]
    Money(#[from] domain::value_objects::MoneyError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

pub type Result<T> = std::result::Result<T, StorefrontError>;
