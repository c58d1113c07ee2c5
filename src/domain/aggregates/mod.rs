//! Aggregates module
pub mod product;
pub mod order;
pub mod cart;

pub use product::Product;
pub use order::{validate_details, Contact, NewOrder, Order, OrderError, OrderStatus, ShippingAddress};
pub use cart::{Cart, LineItem};
