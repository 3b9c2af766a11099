//! Mapping between provider payloads and engine settlement events.
//!
//! The engine is provider-agnostic; everything it needs to know about a settlement fits in
//! [`PaymentResult`]. This module owns the translation from the provider's result codes, so the rest of the server
//! never inspects raw codes.
use daraja_tools::{StkCallback, StkQueryResponse, RESULT_CODE_CANCELLED_BY_USER, RESULT_CODE_SUCCESS};
use soko_common::Shillings;
use soko_order_engine::db_types::PaymentResult;

/// Maps the asynchronous result callback onto a settlement event. Successful callbacks carry the receipt number
/// and the paid amount in their metadata items.
pub fn callback_to_result(callback: &StkCallback) -> PaymentResult {
    match callback.result_code {
        RESULT_CODE_SUCCESS => PaymentResult::Success {
            receipt_number: callback.receipt_number(),
            amount: callback.amount().map(Shillings::from),
        },
        RESULT_CODE_CANCELLED_BY_USER => PaymentResult::CancelledByPayer,
        code => PaymentResult::Failed { code, description: callback.result_desc.clone() },
    }
}

/// Maps a status poll response onto a settlement event. The query response never carries the receipt number or
/// amount; a successful settlement recorded from a poll keeps whatever receipt a callback may later confirm.
pub fn query_to_result(response: &StkQueryResponse) -> PaymentResult {
    match response.result_code_value() {
        RESULT_CODE_SUCCESS => PaymentResult::Success { receipt_number: None, amount: None },
        RESULT_CODE_CANCELLED_BY_USER => PaymentResult::CancelledByPayer,
        code => PaymentResult::Failed { code, description: response.result_desc.clone() },
    }
}
