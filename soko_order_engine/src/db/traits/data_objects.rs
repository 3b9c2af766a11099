use soko_common::Shillings;

use crate::db_types::{OrderStatusType, PaymentStatus, PaymentSubStatus};

/// Outcome of an attempt to reserve a product for an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReservationResult {
    /// The caller won the reservation; the product moved `Available → Pending`.
    Reserved,
    /// The product was not `Available`. Somebody else holds it, or it is already sold.
    Unavailable,
}

/// The provider references recorded against an order when a payment is initiated (or re-initiated after a failed
/// attempt).
#[derive(Debug, Clone)]
pub struct PaymentRequest {
    pub checkout_ref: String,
    pub merchant_ref: String,
    pub amount: Shillings,
    pub payer_phone: String,
}

/// The column values a settlement event wants to apply. Backends must apply this as a single conditional update
/// guarded on the payment sub-status still being `Pending`; the boolean result of that update is what makes dual
/// -source settlement idempotent.
#[derive(Debug, Clone)]
pub struct SettlementUpdate {
    pub sub_status: PaymentSubStatus,
    pub payment_status: PaymentStatus,
    pub receipt_number: Option<String>,
    /// On success the order advances to `Processing`, but only if it is still `Pending` — a settlement must never
    /// resurrect an order an admin cancelled while the payment was in flight.
    pub advance_order_to: Option<OrderStatusType>,
}
