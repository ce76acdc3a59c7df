//! Sponsorship marketplace backend: campaign lifecycle, negotiation ledger,
//! content approval and delivery reporting between podcast producers and
//! advertisers.
//!
//! Data stored in DashMap; each campaign and everything it owns lives in one
//! entry so mutations commit atomically.

#![warn(clippy::unwrap_used)]

pub mod auth;
pub mod authz;
pub mod handlers;
pub mod ledger;
pub mod lifecycle;
pub mod models;
pub mod registry;
pub mod router;
pub mod store;

pub use handlers::MarketplaceState;
pub use registry::{InMemoryRegistry, OwnershipRegistry};
pub use router::{marketplace_router, marketplace_router_with_state};
pub use store::MarketplaceStore;
