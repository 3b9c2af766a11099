use actix_web::{http::StatusCode, test::TestRequest, web, web::ServiceConfig};
use daraja_tools::{DarajaApi, DarajaConfig};
use serde_json::json;
use soko_order_engine::{
    db_types::{OrderStatusType, PaymentSubStatus},
    events::EventProducers,
    MarketQueryApi,
    OrderFlowApi,
};

use super::{
    helpers::{identify, send_request},
    mocks::{items_fixture, order_awaiting_settlement, order_fixture, settled_order, MockMarketDb},
};
use crate::routes::{InitiatePaymentRoute, PaymentCallbackRoute, PaymentStatusRoute};

const CHECKOUT_REF: &str = "ws_CO_191220191020363925";

#[actix_web::test]
async fn initiation_rejects_an_amount_mismatch() {
    let req = identify(TestRequest::post(), "wanjiku", "Buyer")
        .uri("/payments/initiate")
        .set_json(json!({"orderId": "SO-1", "phoneNumber": "0712345678", "amount": 999}));
    let (status, body) = send_request(req, configure_pending_order).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("does not match the order total"), "{body}");
}

#[actix_web::test]
async fn only_the_buyer_may_initiate_a_payment() {
    let req = identify(TestRequest::post(), "mwangi", "Buyer")
        .uri("/payments/initiate")
        .set_json(json!({"orderId": "SO-1", "phoneNumber": "0712345678", "amount": 2600}));
    let (status, body) = send_request(req, configure_pending_order).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(body.contains("Only the buyer"), "{body}");
}

#[actix_web::test]
async fn initiation_rejects_an_unusable_phone_number() {
    let req = identify(TestRequest::post(), "wanjiku", "Buyer")
        .uri("/payments/initiate")
        .set_json(json!({"orderId": "SO-1", "phoneNumber": "12345", "amount": 2600}));
    let (status, body) = send_request(req, configure_pending_order).await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
}

#[actix_web::test]
async fn a_paid_order_rejects_further_initiations() {
    let req = identify(TestRequest::post(), "wanjiku", "Buyer")
        .uri("/payments/initiate")
        .set_json(json!({"orderId": "SO-1", "phoneNumber": "0712345678", "amount": 2600}));
    let (status, body) = send_request(req, configure_settled_order).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("already been paid"), "{body}");
}

#[actix_web::test]
async fn a_malformed_callback_is_still_acknowledged() {
    let req = TestRequest::post().uri("/payments/callback").set_payload("this is not json");
    let (status, body) = send_request(req, configure_callback_no_settlement).await;
    assert_eq!(status, StatusCode::OK);
    let ack: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(ack["ResultCode"], 0);
}

#[actix_web::test]
async fn a_successful_callback_settles_the_payment() {
    let req = TestRequest::post().uri("/payments/callback").set_json(json!({
        "Body": {
            "stkCallback": {
                "MerchantRequestID": "29115-34620561-1",
                "CheckoutRequestID": CHECKOUT_REF,
                "ResultCode": 0,
                "ResultDesc": "The service request is processed successfully.",
                "CallbackMetadata": {
                    "Item": [
                        { "Name": "Amount", "Value": 2600.00 },
                        { "Name": "MpesaReceiptNumber", "Value": "NLJ7RT61SV" },
                        { "Name": "PhoneNumber", "Value": 254712345678u64 }
                    ]
                }
            }
        }
    }));
    let (status, body) = send_request(req, configure_callback_settles).await;
    assert_eq!(status, StatusCode::OK);
    let ack: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(ack["ResultCode"], 0);
}

#[actix_web::test]
async fn a_callback_for_an_unknown_reference_is_acknowledged() {
    let req = TestRequest::post().uri("/payments/callback").set_json(json!({
        "Body": {
            "stkCallback": {
                "MerchantRequestID": "29115-34620561-1",
                "CheckoutRequestID": "ws_CO_never_heard_of_it",
                "ResultCode": 1032,
                "ResultDesc": "Request cancelled by user"
            }
        }
    }));
    let (status, body) = send_request(req, configure_callback_unknown_ref).await;
    assert_eq!(status, StatusCode::OK);
    let ack: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(ack["ResultCode"], 0);
}

#[actix_web::test]
async fn settled_payments_report_their_receipt() {
    let req = identify(TestRequest::get(), "wanjiku", "Buyer").uri("/payments/status/SO-1");
    let (status, body) = send_request(req, configure_settled_order).await;
    assert_eq!(status, StatusCode::OK);
    let response: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(response["paymentStatus"], "Completed");
    assert_eq!(response["orderStatus"], "Processing");
    assert_eq!(response["transaction"]["receiptNumber"], "NLJ7RT61SV");
    assert_eq!(response["transaction"]["checkoutRef"], CHECKOUT_REF);
}

#[actix_web::test]
async fn uninitiated_payments_report_pending_without_a_poll() {
    let req = identify(TestRequest::get(), "wanjiku", "Buyer").uri("/payments/status/SO-1");
    let (status, body) = send_request(req, configure_pending_order).await;
    assert_eq!(status, StatusCode::OK);
    let response: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(response["transaction"]["paymentSubStatus"], "Pending");
    assert!(response["transaction"].get("checkoutRef").is_none());
}

#[actix_web::test]
async fn a_status_poll_settles_a_pending_payment() {
    let provider = spawn_provider_stub();
    let mut db = MockMarketDb::new();
    db.expect_fetch_order_by_checkout_ref().returning(|_| Ok(Some(order_awaiting_settlement(CHECKOUT_REF))));
    db.expect_try_settle_payment()
        .times(1)
        .withf(|checkout_ref, update| {
            // The query response never carries a receipt; only a callback can supply one
            checkout_ref == CHECKOUT_REF &&
                update.sub_status == PaymentSubStatus::Completed &&
                update.receipt_number.is_none()
        })
        .returning(|_, _| Ok(true));
    db.expect_fetch_order_by_order_id().returning(|_| Ok(Some(settled_order(CHECKOUT_REF))));
    let mut queries = MockMarketDb::new();
    queries.expect_fetch_order_by_order_id().returning(|_| Ok(Some(order_awaiting_settlement(CHECKOUT_REF))));
    queries.expect_fetch_order_items().returning(|_| Ok(items_fixture()));
    let daraja_config = DarajaConfig { base_url: format!("http://{provider}"), ..Default::default() };

    let req = identify(TestRequest::get(), "wanjiku", "Buyer").uri("/payments/status/SO-1");
    let (status, body) = send_request(req, move |cfg| payments_app_with_provider(cfg, db, queries, daraja_config)).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let response: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(response["paymentStatus"], "Completed");
    assert_eq!(response["orderStatus"], "Processing");
    assert_eq!(response["transaction"]["paymentSubStatus"], "Completed");
}

#[actix_web::test]
async fn payment_status_is_hidden_from_strangers() {
    let req = identify(TestRequest::get(), "mwangi", "Buyer").uri("/payments/status/SO-1");
    let (status, body) = send_request(req, configure_settled_order).await;
    assert_eq!(status, StatusCode::FORBIDDEN, "{body}");
}

//--------------------------------------  Service configurations  ----------------------------------------------------

/// A local Daraja stand-in serving the oauth and stkpushquery endpoints, reporting every transaction as successful.
/// Returns the address the stub is listening on.
fn spawn_provider_stub() -> std::net::SocketAddr {
    use actix_web::{App, HttpResponse, HttpServer};
    let server = HttpServer::new(|| {
        App::new()
            .route(
                "/oauth/v1/generate",
                web::get().to(|| async {
                    HttpResponse::Ok().json(json!({ "access_token": "sandbox-token", "expires_in": "3599" }))
                }),
            )
            .route(
                "/mpesa/stkpushquery/v1/query",
                web::post().to(|| async {
                    HttpResponse::Ok().json(json!({
                        "ResponseCode": "0",
                        "ResponseDescription": "The service request has been accepted successfully",
                        "MerchantRequestID": "29115-34620561-1",
                        "CheckoutRequestID": CHECKOUT_REF,
                        "ResultCode": "0",
                        "ResultDesc": "The service request is processed successfully."
                    }))
                }),
            )
    })
    .workers(1)
    .bind(("127.0.0.1", 0))
    .unwrap();
    let addr = server.addrs()[0];
    actix_web::rt::spawn(server.run());
    addr
}

fn payments_app(cfg: &mut ServiceConfig, db: MockMarketDb, queries: MockMarketDb) {
    payments_app_with_provider(cfg, db, queries, DarajaConfig::default());
}

fn payments_app_with_provider(
    cfg: &mut ServiceConfig,
    db: MockMarketDb,
    queries: MockMarketDb,
    daraja_config: DarajaConfig,
) {
    let api = OrderFlowApi::new(db, EventProducers::default());
    let queries_api = MarketQueryApi::new(queries);
    let daraja = DarajaApi::new(daraja_config).unwrap();
    cfg.service(InitiatePaymentRoute::<MockMarketDb>::new())
        .service(PaymentStatusRoute::<MockMarketDb>::new())
        .service(web::scope("/payments").service(PaymentCallbackRoute::<MockMarketDb>::new()))
        .app_data(web::Data::new(api))
        .app_data(web::Data::new(queries_api))
        .app_data(web::Data::new(daraja));
}

fn configure_pending_order(cfg: &mut ServiceConfig) {
    let mut db = MockMarketDb::new();
    db.expect_fetch_order_by_order_id().returning(|_| Ok(Some(order_fixture(OrderStatusType::Pending))));
    let mut queries = MockMarketDb::new();
    queries.expect_fetch_order_by_order_id().returning(|_| Ok(Some(order_fixture(OrderStatusType::Pending))));
    queries.expect_fetch_order_items().returning(|_| Ok(items_fixture()));
    payments_app(cfg, db, queries);
}

fn configure_settled_order(cfg: &mut ServiceConfig) {
    let mut db = MockMarketDb::new();
    db.expect_fetch_order_by_order_id().returning(|_| Ok(Some(settled_order(CHECKOUT_REF))));
    let mut queries = MockMarketDb::new();
    queries.expect_fetch_order_by_order_id().returning(|_| Ok(Some(settled_order(CHECKOUT_REF))));
    queries.expect_fetch_order_items().returning(|_| Ok(items_fixture()));
    payments_app(cfg, db, queries);
}

fn configure_callback_no_settlement(cfg: &mut ServiceConfig) {
    payments_app(cfg, MockMarketDb::new(), MockMarketDb::new());
}

fn configure_callback_settles(cfg: &mut ServiceConfig) {
    let mut db = MockMarketDb::new();
    db.expect_fetch_order_by_checkout_ref().returning(|_| Ok(Some(order_awaiting_settlement(CHECKOUT_REF))));
    db.expect_try_settle_payment()
        .times(1)
        .withf(|checkout_ref, update| {
            checkout_ref == CHECKOUT_REF && update.sub_status == PaymentSubStatus::Completed
        })
        .returning(|_, _| Ok(true));
    db.expect_fetch_order_by_order_id().returning(|_| Ok(Some(settled_order(CHECKOUT_REF))));
    payments_app(cfg, db, MockMarketDb::new());
}

fn configure_callback_unknown_ref(cfg: &mut ServiceConfig) {
    let mut db = MockMarketDb::new();
    db.expect_fetch_order_by_checkout_ref().returning(|_| Ok(None));
    payments_app(cfg, db, MockMarketDb::new());
}
