//! # Order engine public API
//!
//! The `soe_api` module exposes the programmatic API for the order engine. The API is modular, so clients can pick
//! and choose the functionality they want.
//!
//! * [`order_flow_api`] is the primary API for the order lifecycle: placing orders against the cart, recording
//!   payment initiations, settling payments idempotently from either reconciliation source, and moving orders
//!   through fulfillment with their side effects.
//! * [`market_query_api`] provides the read side: fetching orders and their items, searching order history, and
//!   resolving users.
//!
//! The pattern for using the APIs is the same. An API instance is created by supplying a database backend that
//! implements the specific backend traits required by the API. `SqliteDatabase` implements all of them.
pub mod market_query_api;
pub mod order_flow_api;
pub mod order_objects;
pub mod payment_objects;
