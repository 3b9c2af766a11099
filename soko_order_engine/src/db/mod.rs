//! Database management and control.
//!
//! This module defines the interface contracts of the order engine's storage *backends*, and the SQLite backend
//! itself.
//!
//! ## Traits
//! * [`traits::MarketplaceDatabase`] defines the flow-level primitives: the inventory guard's atomic
//!   reserve/release/consume operations, the cart snapshot reads, order persistence, the conditional updates that
//!   make payment settlement and fulfillment transitions idempotent, and the seller ledger counters.
//! * [`traits::OrderManagement`] defines the read side for orders.
//! * [`traits::UserManagement`] defines the read side for users (authorization roles, seller counters).
//!
//! Backends implement these traits; everything above this layer is backend-agnostic.
pub mod traits;

#[cfg(feature = "sqlite")]
pub mod sqlite;
