//! Request handler definitions
//!
//! Define each route and its handler here.
//! Handlers that are more than a line or two MUST go into a separate module. Keep this module neat and tidy 🙏
//!
//! A note about performance:
//! Since each worker thread processes its requests sequentially, handlers which block the current thread will cause
//! the current worker to stop processing new requests. For this reason, any long, non-cpu-bound operation (e.g. I/O,
//! database operations, provider calls, etc.) must be expressed as futures or asynchronous functions, so worker
//! threads can handle other requests while they are in flight.
use actix_web::{get, web, HttpResponse, Responder};
use daraja_tools::{CallbackAck, DarajaApi, StkCallbackEnvelope};
use log::*;
use soko_order_engine::{
    db_types::{OrderId, PaymentSubStatus},
    order_objects::OrderResult,
    MarketQueryApi,
    MarketplaceDatabase,
    OrderFlowApi,
    OrderManagement,
    PaymentRequest,
    UserManagement,
};

use crate::{
    auth::AuthenticatedUser,
    config::ServerConfig,
    data_objects::{InitiatePaymentRequest, InitiatePaymentResponse, NewOrderRequest, OrderStatusUpdateRequest, PaymentStatusResponse},
    errors::ServerError,
    integrations::daraja::{callback_to_result, query_to_result},
};

// Web-actix cannot handle generics in handlers, so it's implemented manually using the `route!` macro.
// `$name` is the handler function, `$route` the unit struct to register it with, and the trailing trait list the
// bounds the backend must satisfy.
#[macro_export]
macro_rules! route {
    ($name:ident as $route:ident => $method:ident $path:literal impl $($bounds:path),+) => {
        pub struct $route<B>(core::marker::PhantomData<fn() -> B>);
        impl<B> $route<B> {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self(core::marker::PhantomData)
            }
        }
        impl<B> actix_web::dev::HttpServiceFactory for $route<B>
        where B: $($bounds +)+ 'static
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::<B>);
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }
    };
}

// ----------------------------------------------   Health  ----------------------------------------------------
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

//----------------------------------------------   Orders  ----------------------------------------------------
route!(create_order as CreateOrderRoute => Post "/orders" impl MarketplaceDatabase);
/// Route handler for creating a new order from the caller's cart.
///
/// Every product in the cart is reserved before the order is stored; if any product has been taken in the meantime,
/// the whole order is rejected with a 400 and nothing stays reserved. On success the order is returned with its
/// line items and a 201.
pub async fn create_order<B: MarketplaceDatabase>(
    user: AuthenticatedUser,
    body: web::Json<NewOrderRequest>,
    api: web::Data<OrderFlowApi<B>>,
    config: web::Data<ServerConfig>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️📦️ POST order for buyer {}", user.id());
    let result = api.place_order(user.id(), &body.shipping_address, config.shipping_fee).await?;
    Ok(HttpResponse::Created().json(result))
}

route!(my_orders as MyOrdersRoute => Get "/orders" impl OrderManagement, UserManagement);
pub async fn my_orders<B: OrderManagement + UserManagement>(
    user: AuthenticatedUser,
    api: web::Data<MarketQueryApi<B>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️📦️ GET orders for {}", user.id());
    let orders = api.orders_for_buyer(user.id()).await?;
    Ok(HttpResponse::Ok().json(orders))
}

route!(order_by_id as OrderByIdRoute => Get "/orders/{order_id}" impl OrderManagement, UserManagement);
/// Route handler for fetching a single order.
///
/// Only the order's buyer, a seller with an item on the order, or an admin may view it.
pub async fn order_by_id<B: OrderManagement + UserManagement>(
    user: AuthenticatedUser,
    path: web::Path<String>,
    api: web::Data<MarketQueryApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let order_id = OrderId::from(path.into_inner());
    debug!("💻️📦️ GET order {order_id} for {}", user.id());
    let result = fetch_order_for(&user, &order_id, api.as_ref()).await?;
    Ok(HttpResponse::Ok().json(result))
}

route!(update_order_status as UpdateOrderStatusRoute => Put "/orders/{order_id}/status" impl MarketplaceDatabase);
/// Route handler for fulfillment transitions.
///
/// The engine enforces who may transition (a seller on the order, or an admin), which transitions are legal, and
/// the delivery/cancellation side effects. Replayed transitions come back as a 400 no-op, never as duplicated
/// side effects.
pub async fn update_order_status<B: MarketplaceDatabase>(
    user: AuthenticatedUser,
    path: web::Path<String>,
    body: web::Json<OrderStatusUpdateRequest>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let order_id = OrderId::from(path.into_inner());
    debug!("💻️📦️ PUT order {order_id} status to {} by {}", body.order_status, user.id());
    let order = api.update_order_status(&order_id, body.order_status, &user.acting).await?;
    Ok(HttpResponse::Ok().json(order))
}

async fn fetch_order_for<B: OrderManagement + UserManagement>(
    user: &AuthenticatedUser,
    order_id: &OrderId,
    api: &MarketQueryApi<B>,
) -> Result<OrderResult, ServerError> {
    let result = api
        .fetch_order(order_id)
        .await?
        .ok_or_else(|| ServerError::NoRecordFound(format!("Order {order_id} does not exist")))?;
    let allowed = user.is_admin() ||
        result.order.buyer_id == user.id() ||
        result.items.iter().any(|item| item.seller_id == user.id());
    if !allowed {
        debug!("💻️📦️ {} may not view order {order_id}", user.id());
        return Err(ServerError::InsufficientPermissions("You may only view your own orders.".to_string()));
    }
    Ok(result)
}

//----------------------------------------------   Payments  ----------------------------------------------------
route!(initiate_payment as InitiatePaymentRoute => Post "/payments/initiate" impl MarketplaceDatabase);
/// Route handler for initiating a mobile money payment for an order.
///
/// The engine validates the request (buyer, amount, order state) before anything is sent to the provider. Only
/// once the provider accepts the push are its references recorded against the order; settlement then arrives
/// asynchronously via the callback, or via the status poll, whichever lands first.
pub async fn initiate_payment<B: MarketplaceDatabase>(
    user: AuthenticatedUser,
    body: web::Json<InitiatePaymentRequest>,
    api: web::Data<OrderFlowApi<B>>,
    daraja: web::Data<DarajaApi>,
) -> Result<HttpResponse, ServerError> {
    let body = body.into_inner();
    debug!("💻️💰️ POST initiate payment of {} for order {} by {}", body.amount, body.order_id, user.id());
    let instruction = api.prepare_payment(&body.order_id, user.id(), &body.phone_number, body.amount).await?;
    let response =
        daraja.stk_push(&instruction.msisdn, instruction.amount.value(), body.order_id.as_str()).await.map_err(|e| {
            warn!("💻️💰️ The provider did not accept the push for order {}. {e}", body.order_id);
            ServerError::PaymentProviderError(e.to_string())
        })?;
    let request = PaymentRequest {
        checkout_ref: response.checkout_request_id.clone(),
        merchant_ref: response.merchant_request_id.clone(),
        amount: instruction.amount,
        payer_phone: instruction.msisdn,
    };
    api.record_payment_request(&body.order_id, request).await?;
    info!("💻️💰️ Payment push {} dispatched for order {}", response.checkout_request_id, body.order_id);
    Ok(HttpResponse::Ok().json(InitiatePaymentResponse {
        success: true,
        message: response.customer_message,
        checkout_ref: response.checkout_request_id,
        merchant_ref: response.merchant_request_id,
    }))
}

route!(payment_callback as PaymentCallbackRoute => Post "/callback" impl MarketplaceDatabase);
/// Route handler for the provider's asynchronous result callback.
///
/// The provider treats any non-200 as a delivery failure and retries, so this handler acknowledges *everything*:
/// unparseable payloads, unknown checkout references and internal errors are logged and dropped, never surfaced.
/// The settlement itself is idempotent, so a retried callback is harmless.
pub async fn payment_callback<B: MarketplaceDatabase>(
    body: web::Bytes,
    api: web::Data<OrderFlowApi<B>>,
) -> impl Responder {
    let envelope = match serde_json::from_slice::<StkCallbackEnvelope>(&body) {
        Ok(envelope) => envelope,
        Err(e) => {
            warn!("💻️🪝️ A payment callback payload could not be parsed. Acknowledged and dropped. {e}");
            return HttpResponse::Ok().json(CallbackAck::accepted());
        },
    };
    let callback = envelope.body.stk_callback;
    let checkout_ref = callback.checkout_request_id.clone();
    debug!("💻️🪝️ Payment callback received for {checkout_ref} (result code {})", callback.result_code);
    match api.settle_payment(&checkout_ref, callback_to_result(&callback)).await {
        Ok(outcome) => trace!("💻️🪝️ Callback for {checkout_ref} handled: {outcome:?}"),
        Err(e) => {
            error!("💻️🪝️ Could not settle the callback for {checkout_ref}: {e}. Acknowledged anyway; the status \
                    poll will reconcile.")
        },
    }
    HttpResponse::Ok().json(CallbackAck::accepted())
}

route!(payment_status as PaymentStatusRoute => Get "/payments/status/{order_id}" impl MarketplaceDatabase, UserManagement);
/// Route handler for payment status, the second reconciliation source.
///
/// If the payment is still pending, the provider is polled on the spot and any verdict settles through the same
/// idempotent path the callback uses, so the two sources can never double-apply. A poll that fails (or reports the
/// transaction still processing) leaves the payment pending.
pub async fn payment_status<B: MarketplaceDatabase + UserManagement>(
    user: AuthenticatedUser,
    path: web::Path<String>,
    queries: web::Data<MarketQueryApi<B>>,
    api: web::Data<OrderFlowApi<B>>,
    daraja: web::Data<DarajaApi>,
) -> Result<HttpResponse, ServerError> {
    let order_id = OrderId::from(path.into_inner());
    debug!("💻️💰️ GET payment status of {order_id} for {}", user.id());
    let result = fetch_order_for(&user, &order_id, queries.as_ref()).await?;
    let mut order = result.order;
    if order.payment.sub_status == PaymentSubStatus::Pending {
        if let Some(checkout_ref) = order.payment.checkout_ref.clone() {
            match daraja.stk_query(&checkout_ref).await {
                Ok(response) => {
                    let outcome = api.settle_payment(&checkout_ref, query_to_result(&response)).await?;
                    if let Some(settled) = outcome.order() {
                        order = settled.clone();
                    }
                },
                Err(e) => {
                    // Covers "still being processed" responses as well as provider downtime. Either way the
                    // payment stays pending and the caller can ask again.
                    debug!("💻️💰️ Status poll for {checkout_ref} did not settle the payment: {e}");
                },
            }
        }
    }
    Ok(HttpResponse::Ok().json(PaymentStatusResponse::from(&order)))
}
