//! Screen-level services over the domain model.

pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod latency;
pub mod wishlist;

pub use cart::CartHandle;
pub use catalog::{CatalogService, RecentSearches, SearchQuery, SortOrder};
pub use checkout::CheckoutSession;
pub use latency::{BusyFlag, Cancellation, SimulatedLatency};
pub use wishlist::Wishlist;
