//! # Soko payment server
//! This module hosts the HTTP surface of the Soko order and payment reconciliation service. It is responsible for:
//! * Order endpoints: creating orders from the buyer's cart, fetching them, and driving fulfillment transitions.
//! * Payment endpoints: initiating mobile money STK pushes, receiving the provider's asynchronous result callback,
//!   and serving (and, when necessary, actively polling) payment status.
//!
//! All business rules live in `soko_order_engine`; this crate translates HTTP into engine calls and engine errors
//! into status codes. Authentication happens upstream: a gateway verifies the caller and asserts their identity via
//! trusted headers (see [`mod@auth`]).
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more information.
pub mod auth;
pub mod cli;
pub mod config;
pub mod data_objects;
pub mod errors;
pub mod helpers;
pub mod integrations;
pub mod routes;
pub mod server;

#[cfg(test)]
mod endpoint_tests;
