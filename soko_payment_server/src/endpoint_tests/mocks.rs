use chrono::{TimeZone, Utc};
use mockall::mock;
use soko_common::Shillings;
use soko_order_engine::{
    db_types::{
        CartItem,
        ListingType,
        NewOrder,
        Order,
        OrderId,
        OrderItem,
        OrderStatusType,
        Payment,
        PaymentStatus,
        PaymentSubStatus,
        Product,
        User,
    },
    order_objects::OrderQueryFilter,
    MarketplaceDatabase,
    OrderFlowError,
    OrderManagement,
    OrderQueryError,
    PaymentRequest,
    ReservationResult,
    SettlementUpdate,
    UserManagement,
};

mock! {
    pub MarketDb {}

    impl Clone for MarketDb {
        fn clone(&self) -> Self;
    }

    impl OrderManagement for MarketDb {
        async fn fetch_order_by_order_id(&self, order_id: &OrderId) -> Result<Option<Order>, OrderQueryError>;
        async fn fetch_order_items(&self, order_row_id: i64) -> Result<Vec<OrderItem>, OrderQueryError>;
        async fn search_orders(&self, query: OrderQueryFilter) -> Result<Vec<Order>, OrderQueryError>;
    }

    impl UserManagement for MarketDb {
        async fn fetch_user(&self, user_id: &str) -> Result<Option<User>, OrderQueryError>;
    }

    impl MarketplaceDatabase for MarketDb {
        fn url(&self) -> &str;
        async fn fetch_product(&self, product_id: &str) -> Result<Option<Product>, OrderFlowError>;
        async fn try_reserve_product(&self, product_id: &str) -> Result<ReservationResult, OrderFlowError>;
        async fn release_product(&self, product_id: &str) -> Result<(), OrderFlowError>;
        async fn consume_product(&self, product_id: &str) -> Result<(), OrderFlowError>;
        async fn cart_for_buyer(&self, buyer_id: &str) -> Result<Vec<CartItem>, OrderFlowError>;
        async fn clear_cart(&self, buyer_id: &str) -> Result<(), OrderFlowError>;
        async fn insert_order(&self, order: NewOrder) -> Result<Order, OrderFlowError>;
        async fn fetch_order_by_checkout_ref(&self, checkout_ref: &str) -> Result<Option<Order>, OrderFlowError>;
        async fn attach_payment_request(&self, order_id: &OrderId, request: PaymentRequest) -> Result<(), OrderFlowError>;
        async fn try_settle_payment(&self, checkout_ref: &str, update: SettlementUpdate) -> Result<bool, OrderFlowError>;
        async fn try_advance_order_status(&self, order_id: &OrderId, from: &[OrderStatusType], to: OrderStatusType) -> Result<bool, OrderFlowError>;
        async fn credit_seller(&self, seller_id: &str, amount: Shillings) -> Result<(), OrderFlowError>;
        async fn close(&mut self) -> Result<(), OrderFlowError>;
    }
}

//--------------------------------------      Fixtures      ----------------------------------------------------------

/// A 2600/= order for buyer `wanjiku`, with no payment attempt recorded yet.
pub fn order_fixture(status: OrderStatusType) -> Order {
    let ts = Utc.with_ymd_and_hms(2024, 9, 12, 10, 30, 0).unwrap();
    Order {
        id: 1,
        order_id: OrderId("SO-1".into()),
        buyer_id: "wanjiku".to_string(),
        shipping_address: "14 Riverside Dr, Nairobi".to_string(),
        shipping_fee: Shillings::from(600),
        total_amount: Shillings::from(2600),
        order_status: status,
        payment_status: PaymentStatus::Pending,
        payment: Payment {
            checkout_ref: None,
            merchant_ref: None,
            amount: None,
            payer_phone: None,
            receipt_number: None,
            sub_status: PaymentSubStatus::Pending,
            initiated_at: None,
            settled_at: None,
        },
        created_at: ts,
        updated_at: ts,
    }
}

/// The same order with a payment push outstanding against `checkout_ref`.
pub fn order_awaiting_settlement(checkout_ref: &str) -> Order {
    let mut order = order_fixture(OrderStatusType::Pending);
    order.payment.checkout_ref = Some(checkout_ref.to_string());
    order.payment.merchant_ref = Some("29115-34620561-1".to_string());
    order.payment.amount = Some(Shillings::from(2600));
    order.payment.payer_phone = Some("254712345678".to_string());
    order.payment.initiated_at = Some(order.created_at);
    order
}

/// The same order after a successful settlement.
pub fn settled_order(checkout_ref: &str) -> Order {
    let mut order = order_awaiting_settlement(checkout_ref);
    order.order_status = OrderStatusType::Processing;
    order.payment_status = PaymentStatus::Completed;
    order.payment.sub_status = PaymentSubStatus::Completed;
    order.payment.receipt_number = Some("NLJ7RT61SV".to_string());
    order.payment.settled_at = Some(order.created_at);
    order
}

pub fn items_fixture() -> Vec<OrderItem> {
    vec![
        OrderItem {
            id: 1,
            order_id: 1,
            product_id: "phone-case".to_string(),
            seller_id: "otieno".to_string(),
            name: "Phone case".to_string(),
            price: Shillings::from(500),
            listing_type: ListingType::Resale,
            category: "Electronics".to_string(),
        },
        OrderItem {
            id: 2,
            order_id: 1,
            product_id: "kettle".to_string(),
            seller_id: "amina".to_string(),
            name: "Electric kettle".to_string(),
            price: Shillings::from(1500),
            listing_type: ListingType::Resale,
            category: "Appliances".to_string(),
        },
    ]
}

pub fn product_fixture(id: &str, seller_id: &str, price: i64) -> Product {
    let ts = Utc.with_ymd_and_hms(2024, 9, 1, 8, 0, 0).unwrap();
    Product {
        id: id.to_string(),
        seller_id: seller_id.to_string(),
        name: format!("Product {id}"),
        price: Shillings::from(price),
        listing_type: ListingType::Resale,
        category: "General".to_string(),
        status: soko_order_engine::db_types::ProductStatus::Available,
        is_ordered: false,
        created_at: ts,
        updated_at: ts,
    }
}
