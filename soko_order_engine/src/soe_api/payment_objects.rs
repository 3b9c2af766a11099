use soko_common::Shillings;

use crate::{
    db::traits::SettlementUpdate,
    db_types::{Order, OrderStatusType, PaymentResult, PaymentStatus, PaymentSubStatus},
};

/// A validated, ready-to-send payment instruction. The order flow API produces this after checking the order,
/// the amount and the payer; the caller then dispatches it to the payment provider and records the provider's
/// references with [`record_payment_request`](crate::OrderFlowApi::record_payment_request).
#[derive(Debug, Clone)]
pub struct PaymentInstruction {
    pub order: Order,
    /// The payer's phone number, normalized to international format.
    pub msisdn: String,
    pub amount: Shillings,
}

/// Maps a settlement event onto the column values the backend should apply.
pub fn settlement_update_for(result: &PaymentResult) -> SettlementUpdate {
    match result {
        PaymentResult::Success { receipt_number, .. } => SettlementUpdate {
            sub_status: PaymentSubStatus::Completed,
            payment_status: PaymentStatus::Completed,
            receipt_number: receipt_number.clone(),
            advance_order_to: Some(OrderStatusType::Processing),
        },
        PaymentResult::CancelledByPayer => SettlementUpdate {
            sub_status: PaymentSubStatus::Cancelled,
            payment_status: PaymentStatus::Failed,
            receipt_number: None,
            advance_order_to: None,
        },
        PaymentResult::Failed { .. } => SettlementUpdate {
            sub_status: PaymentSubStatus::Failed,
            payment_status: PaymentStatus::Failed,
            receipt_number: None,
            advance_order_to: None,
        },
    }
}
