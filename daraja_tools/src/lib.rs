//! Daraja tools
//!
//! A thin client for the Safaricom Daraja (M-Pesa) API, covering the two calls the payment gateway needs:
//! initiating an STK push to the payer's handset, and querying the outcome of a push that has not called back yet.
//!
//! The provider is treated as unreliable: requests carry a bounded timeout, responses are surfaced verbatim to the
//! caller, and nothing in this crate retries on its own.
mod api;
mod config;
pub mod data_objects;
mod error;
pub mod helpers;

pub use api::DarajaApi;
pub use config::DarajaConfig;
pub use data_objects::{
    CallbackAck,
    StkCallback,
    StkCallbackEnvelope,
    StkPushResponse,
    StkQueryResponse,
    RESULT_CODE_CANCELLED_BY_USER,
    RESULT_CODE_SUCCESS,
};
pub use error::DarajaApiError;
