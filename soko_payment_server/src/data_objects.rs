use serde::{Deserialize, Serialize};
use soko_common::Shillings;
use soko_order_engine::db_types::{Order, OrderId, OrderStatusType, Payment, PaymentStatus, PaymentSubStatus};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewOrderRequest {
    pub shipping_address: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderStatusUpdateRequest {
    pub order_status: OrderStatusType,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitiatePaymentRequest {
    pub order_id: OrderId,
    pub phone_number: String,
    /// Must equal the order total exactly; the client restates it as a safeguard against paying against a stale
    /// view of the order.
    pub amount: Shillings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitiatePaymentResponse {
    pub success: bool,
    pub message: String,
    pub checkout_ref: String,
    pub merchant_ref: String,
}

/// The body of `GET /payments/status/{order_id}`: the order-level verdict plus the transaction details nested under
/// `transaction`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentStatusResponse {
    pub order_id: OrderId,
    pub order_status: OrderStatusType,
    pub payment_status: PaymentStatus,
    pub transaction: TransactionView,
}

/// Client-facing view of an order's payment sub-record. The optional fields are absent until a payment has been
/// initiated (and the receipt until one has settled successfully).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionView {
    pub payment_sub_status: PaymentSubStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checkout_ref: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub receipt_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<Shillings>,
}

impl From<&Payment> for TransactionView {
    fn from(payment: &Payment) -> Self {
        Self {
            payment_sub_status: payment.sub_status,
            checkout_ref: payment.checkout_ref.clone(),
            receipt_number: payment.receipt_number.clone(),
            amount: payment.amount,
        }
    }
}

impl From<&Order> for PaymentStatusResponse {
    fn from(order: &Order) -> Self {
        Self {
            order_id: order.order_id.clone(),
            order_status: order.order_status,
            payment_status: order.payment_status,
            transaction: TransactionView::from(&order.payment),
        }
    }
}
