use actix_web::{http::StatusCode, test::TestRequest, web, web::ServiceConfig};
use mockall::Sequence;
use serde_json::json;
use soko_order_engine::{
    db_types::{Order, OrderStatusType, Payment, PaymentStatus, PaymentSubStatus},
    events::EventProducers,
    MarketQueryApi,
    OrderFlowApi,
    ReservationResult,
};

use super::{
    helpers::{identify, send_request},
    mocks::{items_fixture, order_fixture, product_fixture, MockMarketDb},
};
use crate::{
    config::ServerConfig,
    routes::{CreateOrderRoute, MyOrdersRoute, OrderByIdRoute, UpdateOrderStatusRoute},
};

#[actix_web::test]
async fn create_order_requires_an_identity() {
    let req = TestRequest::post().uri("/orders").set_json(json!({"shippingAddress": "14 Riverside Dr"}));
    let (status, body) = send_request(req, configure_no_calls).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body.contains("did not assert a caller identity"), "{body}");
}

#[actix_web::test]
async fn create_order_places_the_cart_and_returns_201() {
    let req = identify(TestRequest::post(), "wanjiku", "Buyer")
        .uri("/orders")
        .set_json(json!({"shippingAddress": "14 Riverside Dr, Nairobi"}));
    let (status, body) = send_request(req, configure_happy_cart).await;
    assert_eq!(status, StatusCode::CREATED);
    let order: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(order["buyer_id"], "wanjiku");
    assert_eq!(order["total_amount"], 2600);
    assert_eq!(order["items"].as_array().unwrap().len(), 2);
}

#[actix_web::test]
async fn create_order_rolls_back_when_an_item_is_taken() {
    let req = identify(TestRequest::post(), "wanjiku", "Buyer")
        .uri("/orders")
        .set_json(json!({"shippingAddress": "14 Riverside Dr, Nairobi"}));
    let (status, body) = send_request(req, configure_contested_cart).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("no longer available"), "{body}");
}

#[actix_web::test]
async fn empty_cart_is_a_bad_request() {
    let req = identify(TestRequest::post(), "wanjiku", "Buyer")
        .uri("/orders")
        .set_json(json!({"shippingAddress": "14 Riverside Dr, Nairobi"}));
    let (status, body) = send_request(req, configure_empty_cart).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("cart is empty"), "{body}");
}

#[actix_web::test]
async fn my_orders_returns_the_buyers_history() {
    let req = identify(TestRequest::get(), "wanjiku", "Buyer").uri("/orders");
    let (status, body) = send_request(req, configure_order_reads).await;
    assert_eq!(status, StatusCode::OK);
    let orders: serde_json::Value = serde_json::from_str(&body).unwrap();
    let orders = orders.as_array().unwrap();
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0]["order_id"], "SO-1");
    assert_eq!(orders[0]["items"].as_array().unwrap().len(), 2);
}

#[actix_web::test]
async fn order_by_id_is_404_when_it_does_not_exist() {
    let req = identify(TestRequest::get(), "wanjiku", "Buyer").uri("/orders/SO-404");
    let (status, body) = send_request(req, configure_missing_order).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body.contains("SO-404"), "{body}");
}

#[actix_web::test]
async fn order_by_id_is_hidden_from_strangers() {
    let req = identify(TestRequest::get(), "mwangi", "Buyer").uri("/orders/SO-1");
    let (status, body) = send_request(req, configure_order_reads).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(body.contains("your own orders"), "{body}");
}

#[actix_web::test]
async fn order_by_id_is_visible_to_a_seller_on_the_order() {
    let req = identify(TestRequest::get(), "otieno", "Seller").uri("/orders/SO-1");
    let (status, body) = send_request(req, configure_order_reads).await;
    assert_eq!(status, StatusCode::OK);
    let order: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(order["order_id"], "SO-1");
}

#[actix_web::test]
async fn a_seller_can_ship_a_processing_order() {
    let req = identify(TestRequest::put(), "otieno", "Seller")
        .uri("/orders/SO-1/status")
        .set_json(json!({"orderStatus": "Shipped"}));
    let (status, body) = send_request(req, configure_shipping_transition).await;
    assert_eq!(status, StatusCode::OK);
    let order: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(order["order_status"], "Shipped");
}

#[actix_web::test]
async fn transitions_out_of_a_terminal_state_are_rejected() {
    let req = identify(TestRequest::put(), "otieno", "Seller")
        .uri("/orders/SO-1/status")
        .set_json(json!({"orderStatus": "Processing"}));
    let (status, body) = send_request(req, configure_delivered_order).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("cannot move"), "{body}");
}

#[actix_web::test]
async fn bystanders_cannot_transition_an_order() {
    let req = identify(TestRequest::put(), "mwangi", "Seller")
        .uri("/orders/SO-1/status")
        .set_json(json!({"orderStatus": "Shipped"}));
    let (status, body) = send_request(req, configure_processing_order).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(body.contains("not authorized"), "{body}");
}

//--------------------------------------  Service configurations  ----------------------------------------------------

fn order_flow_app(cfg: &mut ServiceConfig, db: MockMarketDb) {
    let api = OrderFlowApi::new(db, EventProducers::default());
    cfg.service(CreateOrderRoute::<MockMarketDb>::new())
        .service(UpdateOrderStatusRoute::<MockMarketDb>::new())
        .app_data(web::Data::new(api))
        .app_data(web::Data::new(ServerConfig::default()));
}

fn configure_no_calls(cfg: &mut ServiceConfig) {
    order_flow_app(cfg, MockMarketDb::new());
}

fn configure_happy_cart(cfg: &mut ServiceConfig) {
    let mut db = MockMarketDb::new();
    db.expect_cart_for_buyer().returning(|_| {
        Ok(vec![
            soko_order_engine::db_types::CartItem { product_id: "phone-case".to_string(), quantity: 1 },
            soko_order_engine::db_types::CartItem { product_id: "kettle".to_string(), quantity: 1 },
        ])
    });
    db.expect_fetch_product().returning(|id| {
        let (seller, price) = if id == "kettle" { ("amina", 1500) } else { ("otieno", 500) };
        Ok(Some(product_fixture(id, seller, price)))
    });
    db.expect_try_reserve_product().times(2).returning(|_| Ok(ReservationResult::Reserved));
    db.expect_insert_order().returning(|new_order| Ok(order_from_new(new_order)));
    db.expect_clear_cart().times(1).returning(|_| Ok(()));
    db.expect_fetch_order_items().returning(|_| Ok(items_fixture()));
    order_flow_app(cfg, db);
}

fn configure_contested_cart(cfg: &mut ServiceConfig) {
    let mut db = MockMarketDb::new();
    db.expect_cart_for_buyer().returning(|_| {
        Ok(vec![
            soko_order_engine::db_types::CartItem { product_id: "phone-case".to_string(), quantity: 1 },
            soko_order_engine::db_types::CartItem { product_id: "kettle".to_string(), quantity: 1 },
        ])
    });
    db.expect_fetch_product().returning(|id| Ok(Some(product_fixture(id, "otieno", 500))));
    db.expect_try_reserve_product().returning(|id| {
        if id == "phone-case" {
            Ok(ReservationResult::Reserved)
        } else {
            Ok(ReservationResult::Unavailable)
        }
    });
    // The reservation won on the first item must be released again.
    db.expect_release_product().times(1).withf(|id| id == "phone-case").returning(|_| Ok(()));
    order_flow_app(cfg, db);
}

fn configure_empty_cart(cfg: &mut ServiceConfig) {
    let mut db = MockMarketDb::new();
    db.expect_cart_for_buyer().returning(|_| Ok(vec![]));
    order_flow_app(cfg, db);
}

fn configure_order_reads(cfg: &mut ServiceConfig) {
    let mut db = MockMarketDb::new();
    db.expect_search_orders().returning(|_| Ok(vec![order_fixture(OrderStatusType::Processing)]));
    db.expect_fetch_order_by_order_id().returning(|_| Ok(Some(order_fixture(OrderStatusType::Processing))));
    db.expect_fetch_order_items().returning(|_| Ok(items_fixture()));
    let api = MarketQueryApi::new(db);
    cfg.service(MyOrdersRoute::<MockMarketDb>::new())
        .service(OrderByIdRoute::<MockMarketDb>::new())
        .app_data(web::Data::new(api));
}

fn configure_missing_order(cfg: &mut ServiceConfig) {
    let mut db = MockMarketDb::new();
    db.expect_fetch_order_by_order_id().returning(|_| Ok(None));
    let api = MarketQueryApi::new(db);
    cfg.service(OrderByIdRoute::<MockMarketDb>::new()).app_data(web::Data::new(api));
}

fn configure_shipping_transition(cfg: &mut ServiceConfig) {
    let mut db = MockMarketDb::new();
    let mut seq = Sequence::new();
    db.expect_fetch_order_by_order_id()
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_| Ok(Some(order_fixture(OrderStatusType::Processing))));
    db.expect_fetch_order_items().returning(|_| Ok(items_fixture()));
    db.expect_try_advance_order_status()
        .times(1)
        .withf(|_, from, to| *from == [OrderStatusType::Processing] && *to == OrderStatusType::Shipped)
        .returning(|_, _, _| Ok(true));
    db.expect_fetch_order_by_order_id()
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_| Ok(Some(order_fixture(OrderStatusType::Shipped))));
    order_flow_app(cfg, db);
}

fn configure_delivered_order(cfg: &mut ServiceConfig) {
    let mut db = MockMarketDb::new();
    db.expect_fetch_order_by_order_id().returning(|_| Ok(Some(order_fixture(OrderStatusType::Delivered))));
    db.expect_fetch_order_items().returning(|_| Ok(items_fixture()));
    order_flow_app(cfg, db);
}

fn configure_processing_order(cfg: &mut ServiceConfig) {
    let mut db = MockMarketDb::new();
    db.expect_fetch_order_by_order_id().returning(|_| Ok(Some(order_fixture(OrderStatusType::Processing))));
    db.expect_fetch_order_items().returning(|_| Ok(items_fixture()));
    order_flow_app(cfg, db);
}

/// Builds the stored order a successful insert would return.
fn order_from_new(new_order: soko_order_engine::db_types::NewOrder) -> Order {
    let ts = chrono::Utc::now();
    Order {
        id: 1,
        order_id: new_order.order_id,
        buyer_id: new_order.buyer_id,
        shipping_address: new_order.shipping_address,
        shipping_fee: new_order.shipping_fee,
        total_amount: new_order.total_amount,
        order_status: OrderStatusType::Pending,
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
