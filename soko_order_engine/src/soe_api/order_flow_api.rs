use std::fmt::Debug;

use log::*;
use soko_common::Shillings;

use crate::{
    db::traits::{MarketplaceDatabase, OrderFlowError, PaymentRequest, ReservationResult},
    db_types::{
        ActingUser,
        NewOrder,
        NewOrderItem,
        Order,
        OrderId,
        OrderStatusType,
        PaymentResult,
        PaymentStatus,
        Product,
        SettlementOutcome,
    },
    events::{EventProducers, OrderCancelledEvent, OrderDeliveredEvent, OrderPaidEvent},
    helpers::{new_order_id, normalize_msisdn},
    soe_api::{
        order_objects::OrderResult,
        payment_objects::{settlement_update_for, PaymentInstruction},
    },
};

/// `OrderFlowApi` is the primary API for the order lifecycle: placing orders against the buyer's cart, recording
/// payment initiations, settling payments from either reconciliation source, and moving orders through fulfillment.
pub struct OrderFlowApi<B> {
    db: B,
    producers: EventProducers,
}

impl<B> Debug for OrderFlowApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OrderFlowApi")
    }
}

impl<B> OrderFlowApi<B> {
    pub fn new(db: B, producers: EventProducers) -> Self {
        Self { db, producers }
    }
}

impl<B> OrderFlowApi<B>
where B: MarketplaceDatabase
{
    /// Places a new order from the buyer's current cart snapshot.
    ///
    /// Every product in the cart is reserved with a conditional update before the order is persisted. There is no
    /// wrapping transaction; if any reservation fails, or the order cannot be stored, the reservations already won
    /// are released again and the error is returned. The cart is only cleared once the order row exists.
    pub async fn place_order(
        &self,
        buyer_id: &str,
        shipping_address: &str,
        shipping_fee: Shillings,
    ) -> Result<OrderResult, OrderFlowError> {
        let address = shipping_address.trim();
        if address.is_empty() {
            return Err(OrderFlowError::ShippingAddressRequired);
        }
        let cart = self.db.cart_for_buyer(buyer_id).await?;
        if cart.is_empty() {
            return Err(OrderFlowError::EmptyCart);
        }
        let mut order = NewOrder::new(new_order_id(), buyer_id.to_string(), address.to_string(), shipping_fee);
        let mut reserved = Vec::with_capacity(cart.len());
        for line in &cart {
            match self.reserve_line(&line.product_id).await {
                Ok(product) => {
                    order.add_item(NewOrderItem::from(&product));
                    reserved.push(product.id);
                },
                Err(e) => {
                    info!("🔄️📦️ Order for buyer {buyer_id} aborted ({e}). Rolling back {} reservation(s).", reserved.len());
                    self.rollback_reservations(&reserved).await;
                    return Err(e);
                },
            }
        }
        let order = match self.db.insert_order(order).await {
            Ok(order) => order,
            Err(e) => {
                error!("🔄️📦️ Could not store the order for buyer {buyer_id}: {e}. Rolling back reservations.");
                self.rollback_reservations(&reserved).await;
                return Err(e);
            },
        };
        if let Err(e) = self.db.clear_cart(buyer_id).await {
            // The order stands. The buyer ends up with stale cart lines pointing at reserved products, which the
            // next place_order attempt will report as unavailable.
            warn!("🔄️🛒️ Order [{}] was placed but the cart for buyer {buyer_id} was not cleared: {e}", order.order_id);
        }
        let items = self.db.fetch_order_items(order.id).await?;
        debug!(
            "🔄️📦️ Order [{}] placed for buyer {buyer_id}. {} item(s), total {}",
            order.order_id,
            items.len(),
            order.total_amount
        );
        Ok(OrderResult { order, items })
    }

    async fn reserve_line(&self, product_id: &str) -> Result<Product, OrderFlowError> {
        let product = self
            .db
            .fetch_product(product_id)
            .await?
            .ok_or_else(|| OrderFlowError::ProductNotFound(product_id.to_string()))?;
        match self.db.try_reserve_product(product_id).await? {
            ReservationResult::Reserved => Ok(product),
            ReservationResult::Unavailable => {
                Err(OrderFlowError::ItemUnavailable { product_id: product.id, name: product.name })
            },
        }
    }

    async fn rollback_reservations(&self, product_ids: &[String]) {
        for id in product_ids {
            if let Err(e) = self.db.release_product(id).await {
                error!("🔄️📦️ Could not release the reservation on product {id} during rollback: {e}");
            }
        }
    }

    /// Validates a payment request against the order and returns a ready-to-send [`PaymentInstruction`].
    ///
    /// Only the order's buyer may pay for it, the amount must match the order total exactly, and the order must
    /// still be awaiting payment. The phone number is normalized to international format here, so the caller can
    /// pass it to the provider verbatim.
    pub async fn prepare_payment(
        &self,
        order_id: &OrderId,
        buyer_id: &str,
        phone: &str,
        amount: Shillings,
    ) -> Result<PaymentInstruction, OrderFlowError> {
        let order = self
            .db
            .fetch_order_by_order_id(order_id)
            .await?
            .ok_or_else(|| OrderFlowError::OrderNotFound(order_id.clone()))?;
        if order.buyer_id != buyer_id {
            return Err(OrderFlowError::NotAuthorized("Only the buyer may pay for this order.".to_string()));
        }
        if order.payment_status == PaymentStatus::Completed {
            return Err(OrderFlowError::OrderAlreadyPaid(order_id.clone()));
        }
        if order.order_status != OrderStatusType::Pending {
            return Err(OrderFlowError::OrderModificationForbidden {
                from: order.order_status,
                to: OrderStatusType::Processing,
            });
        }
        if amount != order.total_amount {
            return Err(OrderFlowError::AmountMismatch { expected: order.total_amount, supplied: amount });
        }
        let msisdn = normalize_msisdn(phone)?;
        Ok(PaymentInstruction { order, msisdn, amount })
    }

    /// Records the provider references for a dispatched payment against the order. Re-initiating after a failed
    /// attempt re-arms the settlement guard for the new checkout reference.
    pub async fn record_payment_request(
        &self,
        order_id: &OrderId,
        request: PaymentRequest,
    ) -> Result<(), OrderFlowError> {
        self.db.attach_payment_request(order_id, request).await
    }

    /// Settles a payment from either reconciliation source (provider callback or status poll).
    ///
    /// This is idempotent: the first event to arrive for a checkout reference wins a conditional update and
    /// triggers the side effects; any later event for the same reference is reported as
    /// [`SettlementOutcome::AlreadySettled`] and changes nothing. A reference no order carries is acknowledged as
    /// [`SettlementOutcome::UnknownOrder`] rather than treated as an error.
    pub async fn settle_payment(
        &self,
        checkout_ref: &str,
        result: PaymentResult,
    ) -> Result<SettlementOutcome, OrderFlowError> {
        let Some(order) = self.db.fetch_order_by_checkout_ref(checkout_ref).await? else {
            info!("🔄️💰️ A settlement arrived for unknown checkout reference {checkout_ref}. Acknowledged and dropped.");
            return Ok(SettlementOutcome::UnknownOrder(checkout_ref.to_string()));
        };
        if let PaymentResult::Success { amount: Some(paid), .. } = &result {
            if *paid != order.total_amount {
                warn!(
                    "🔄️💰️ Settlement for order [{}] reports {paid} paid, but the order total is {}. Recording the \
                     settlement anyway; flagging for manual review.",
                    order.order_id, order.total_amount
                );
            }
        }
        let applied = self.db.try_settle_payment(checkout_ref, settlement_update_for(&result)).await?;
        let order_id = order.order_id.clone();
        let order = self
            .db
            .fetch_order_by_order_id(&order_id)
            .await?
            .ok_or(OrderFlowError::OrderNotFound(order_id))?;
        if !applied {
            debug!(
                "🔄️💰️ Settlement for checkout reference {checkout_ref} was already finalized as {}. No-op.",
                order.payment.sub_status
            );
            return Ok(SettlementOutcome::AlreadySettled(order));
        }
        debug!(
            "🔄️💰️ Payment for order [{}] settled as {}. Order is now {}.",
            order.order_id, order.payment.sub_status, order.order_status
        );
        if matches!(result, PaymentResult::Success { .. }) {
            self.call_order_paid_hook(&order).await;
        }
        Ok(SettlementOutcome::Applied(order))
    }

    /// Moves an order through the fulfillment state machine on behalf of `acting`.
    ///
    /// Only an admin or a seller with an item on the order may change its status. The delivered transition consumes
    /// the order's inventory and credits each item's seller exactly once; cancellation releases the reservations.
    /// Both side-effect transitions are guarded by a conditional update, so a replayed request reports a no-op
    /// instead of crediting or releasing twice.
    pub async fn update_order_status(
        &self,
        order_id: &OrderId,
        new_status: OrderStatusType,
        acting: &ActingUser,
    ) -> Result<Order, OrderFlowError> {
        use OrderStatusType::*;
        let order = self
            .db
            .fetch_order_by_order_id(order_id)
            .await?
            .ok_or_else(|| OrderFlowError::OrderNotFound(order_id.clone()))?;
        let items = self.db.fetch_order_items(order.id).await?;
        if !acting.is_admin() && !items.iter().any(|item| item.seller_id == acting.id) {
            return Err(OrderFlowError::NotAuthorized(
                "Only a seller on this order or an admin may change its status.".to_string(),
            ));
        }
        let old_status = order.order_status;
        if old_status == new_status {
            return Err(OrderFlowError::OrderModificationNoOp);
        }
        let eligible_from: &[OrderStatusType] = match (old_status, new_status) {
            (Pending, Processing) => &[Pending],
            (Processing, Shipped) => &[Processing],
            (Processing, Delivered) | (Shipped, Delivered) => &[Processing, Shipped],
            (Pending, Cancelled) | (Processing, Cancelled) | (Shipped, Cancelled) => {
                &[Pending, Processing, Shipped]
            },
            (from, to) => return Err(OrderFlowError::OrderModificationForbidden { from, to }),
        };
        let applied = self.db.try_advance_order_status(order_id, eligible_from, new_status).await?;
        if !applied {
            // Somebody else moved the order between our read and the guarded update.
            debug!("🔄️📦️ Order [{order_id}] was no longer eligible for {old_status} → {new_status}. No-op.");
            return Err(OrderFlowError::OrderModificationNoOp);
        }
        match new_status {
            Delivered => {
                for item in &items {
                    self.db.consume_product(&item.product_id).await?;
                    self.db.credit_seller(&item.seller_id, item.price).await?;
                }
                info!(
                    "🔄️📦️ Order [{order_id}] delivered. {} product(s) consumed and their sellers credited.",
                    items.len()
                );
            },
            Cancelled => {
                for item in &items {
                    self.db.release_product(&item.product_id).await?;
                }
                info!("🔄️📦️ Order [{order_id}] cancelled. {} reservation(s) released.", items.len());
            },
            _ => {},
        }
        let order = self
            .db
            .fetch_order_by_order_id(order_id)
            .await?
            .ok_or_else(|| OrderFlowError::OrderNotFound(order_id.clone()))?;
        match new_status {
            Delivered => self.call_order_delivered_hook(&order).await,
            Cancelled => self.call_order_cancelled_hook(&order).await,
            _ => {},
        }
        Ok(order)
    }

    async fn call_order_paid_hook(&self, order: &Order) {
        for emitter in &self.producers.order_paid_producer {
            debug!("🔄️💰️ Notifying order paid hook subscribers");
            let event = OrderPaidEvent::new(order.clone());
            emitter.publish_event(event).await;
        }
    }

    async fn call_order_delivered_hook(&self, order: &Order) {
        for emitter in &self.producers.order_delivered_producer {
            debug!("🔄️📦️ Notifying order delivered hook subscribers");
            let event = OrderDeliveredEvent::new(order.clone());
            emitter.publish_event(event).await;
        }
    }

    async fn call_order_cancelled_hook(&self, order: &Order) {
        for emitter in &self.producers.order_cancelled_producer {
            debug!("🔄️📦️ Notifying order cancelled hook subscribers");
            let event = OrderCancelledEvent::new(order.clone());
            emitter.publish_event(event).await;
        }
    }

    /// Returns a reference to the database this API instance uses.
    pub fn db(&self) -> &B {
        &self.db
    }

    pub fn db_mut(&mut self) -> &mut B {
        &mut self.db
    }
}
