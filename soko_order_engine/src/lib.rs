//! Soko Order Engine
//!
//! The order engine is the reconciliation core of the Soko marketplace. It owns the order lifecycle from cart
//! checkout to delivery: reserving single-quantity inventory with conditional updates, recording mobile money
//! payment initiations, settling payments idempotently from either of two racing sources (the provider callback and
//! the status poll), and running the fulfillment state machine with its exactly-once side effects (seller crediting
//! on delivery, reservation release on cancellation). It is provider-agnostic; mapping provider payloads onto
//! [`db_types::PaymentResult`] is the caller's job.
//!
//! The library is divided into two main sections:
//! 1. Database management and control ([`mod@db`]). Currently, SQLite is the supported backend. You should never
//!    need to access the database directly. Instead, use the public API provided by the engine. The exception is
//!    the data types used in the database. These are defined in the `db_types` module and are public.
//! 2. The engine public API ([`mod@soe_api`]). This provides the public-facing functionality: placing orders,
//!    payment reconciliation, fulfillment and order queries. Specific backends need to implement the traits in the
//!    [`mod@db`] module in order to act as a backend for the payment server.
//!
//! The engine also provides a set of events that can be subscribed to. These events are emitted when certain
//! actions occur, for example when a payment settles and the order becomes paid. A simple actor framework is used
//! so that you can easily hook into these events and perform custom actions.
mod db;

pub mod db_types;
pub mod events;
pub mod helpers;
mod soe_api;

#[cfg(any(feature = "test_utils", test))]
pub mod test_utils;

#[cfg(feature = "sqlite")]
pub use db::sqlite::SqliteDatabase;
pub use db::traits::{
    MarketplaceDatabase,
    OrderFlowError,
    OrderManagement,
    OrderQueryError,
    PaymentRequest,
    ReservationResult,
    SettlementUpdate,
    UserManagement,
};
pub use soe_api::{
    market_query_api::MarketQueryApi,
    order_flow_api::OrderFlowApi,
    order_objects,
    payment_objects,
};
