use thiserror::Error;
use soko_common::Shillings;

use crate::{
    db_types::{CartItem, NewOrder, Order, OrderId, OrderStatusType, Product},
    db::traits::{
        data_objects::{PaymentRequest, ReservationResult, SettlementUpdate},
        order_management::OrderQueryError,
        OrderManagement,
    },
    helpers::PhoneNumberError,
};

/// This trait defines the highest level of behaviour for backends supporting the order engine.
///
/// This behaviour includes:
/// * The inventory guard: conditional reserve/release/consume updates over single-quantity products.
/// * Reading and clearing a buyer's cart snapshot.
/// * Persisting orders and their line items.
/// * Recording payment initiations and applying settlements idempotently.
/// * Guarded fulfillment status transitions and the seller ledger counters.
///
/// Every mutation here is a *conditional* single-statement update whose affected-row count tells the caller whether
/// it won the race. There are no multi-statement transactions; the order flow API composes these primitives with
/// compensating actions instead.
#[allow(async_fn_in_trait)]
pub trait MarketplaceDatabase: Clone + OrderManagement {
    /// The URL of the database
    fn url(&self) -> &str;

    /// Fetches the product with the given id, or `None` if it does not exist.
    async fn fetch_product(&self, product_id: &str) -> Result<Option<Product>, OrderFlowError>;

    /// Attempts to move the product `Available → Pending`. Exactly one concurrent caller can win this update;
    /// everyone else receives [`ReservationResult::Unavailable`].
    async fn try_reserve_product(&self, product_id: &str) -> Result<ReservationResult, OrderFlowError>;

    /// Moves the product `Pending → Available` again. Used when an order is rolled back or cancelled.
    /// Releasing a product that is not `Pending` is a no-op.
    async fn release_product(&self, product_id: &str) -> Result<(), OrderFlowError>;

    /// Moves the product `Pending → Sold` when the order containing it is delivered.
    /// Consuming a product that is already `Sold` is a no-op, so replayed delivery transitions stay harmless.
    async fn consume_product(&self, product_id: &str) -> Result<(), OrderFlowError>;

    /// Returns the buyer's current cart contents, oldest entries first.
    async fn cart_for_buyer(&self, buyer_id: &str) -> Result<Vec<CartItem>, OrderFlowError>;

    /// Empties the buyer's cart. Called only after the order row has been persisted.
    async fn clear_cart(&self, buyer_id: &str) -> Result<(), OrderFlowError>;

    /// Stores the order and its line items and returns the full order record.
    async fn insert_order(&self, order: NewOrder) -> Result<Order, OrderFlowError>;

    /// Fetches the order holding the given provider checkout reference, if any. Settlement events are keyed on this
    /// reference rather than on the order id.
    async fn fetch_order_by_checkout_ref(&self, checkout_ref: &str) -> Result<Option<Order>, OrderFlowError>;

    /// Records the provider references for a freshly initiated payment against the order. Re-initiating after a
    /// failed or cancelled attempt resets the payment sub-status to `Pending` and clears the old receipt.
    async fn attach_payment_request(&self, order_id: &OrderId, request: PaymentRequest)
        -> Result<(), OrderFlowError>;

    /// Applies a settlement as a single conditional update, guarded on the payment sub-status still being `Pending`
    /// for the given checkout reference.
    ///
    /// Returns `true` if this call performed the settlement, and `false` if another settlement source already
    /// finalized the payment. Only the `true` caller may trigger downstream side effects.
    async fn try_settle_payment(&self, checkout_ref: &str, update: SettlementUpdate)
        -> Result<bool, OrderFlowError>;

    /// Moves the order to `to`, but only if its current status is one of `from`. Returns `true` if the transition
    /// was applied, and `false` if the order was no longer in an eligible state.
    async fn try_advance_order_status(
        &self,
        order_id: &OrderId,
        from: &[OrderStatusType],
        to: OrderStatusType,
    ) -> Result<bool, OrderFlowError>;

    /// Adds `amount` to the seller's total income and bumps their exchange counter by one.
    async fn credit_seller(&self, seller_id: &str, amount: Shillings) -> Result<(), OrderFlowError>;

    /// Closes the database connection.
    async fn close(&mut self) -> Result<(), OrderFlowError> {
        Ok(())
    }
}

#[derive(Debug, Clone, Error)]
pub enum OrderFlowError {
    #[error("We have an internal database engine error (configuration/uptime etc.): {0}")]
    DatabaseError(String),
    #[error("The cart is empty. There is nothing to order.")]
    EmptyCart,
    #[error("A shipping address is required to place an order.")]
    ShippingAddressRequired,
    #[error("The requested product {0} does not exist")]
    ProductNotFound(String),
    #[error("Product '{name}' is no longer available")]
    ItemUnavailable { product_id: String, name: String },
    #[error("The requested order {0} does not exist")]
    OrderNotFound(OrderId),
    #[error("{0}")]
    QueryError(#[from] OrderQueryError),
    #[error("{0}")]
    InvalidPhoneNumber(#[from] PhoneNumberError),
    #[error("The payment amount does not match the order total. Expected {expected}, got {supplied}")]
    AmountMismatch { expected: Shillings, supplied: Shillings },
    #[error("Order {0} has already been paid")]
    OrderAlreadyPaid(OrderId),
    #[error("No payment has been initiated for order {0}")]
    PaymentNotInitiated(OrderId),
    #[error("You are not authorized to perform this action. {0}")]
    NotAuthorized(String),
    #[error("The requested order change would result in a no-op.")]
    OrderModificationNoOp,
    #[error("The order cannot move from {from} to {to}")]
    OrderModificationForbidden { from: OrderStatusType, to: OrderStatusType },
}

impl From<sqlx::Error> for OrderFlowError {
    fn from(e: sqlx::Error) -> Self {
        OrderFlowError::DatabaseError(e.to_string())
    }
}
