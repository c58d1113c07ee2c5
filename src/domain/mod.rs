//! Storefront domain: aggregates, value objects and the pure calculators the
//! services compose.
pub mod aggregates;
pub mod countdown;
pub mod events;
pub mod pricing;
pub mod promo;
pub mod value_objects;
pub mod wizard;
