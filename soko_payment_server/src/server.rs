use std::time::Duration;

use actix_web::{
    dev::{Server, Service},
    http::KeepAlive,
    middleware::Logger,
    web,
    App,
    HttpServer,
};
use daraja_tools::DarajaApi;
use futures::{future::ok, FutureExt};
use log::{info, warn};
use soko_order_engine::{
    events::{EventHandlers, EventHooks, EventProducers},
    MarketQueryApi,
    OrderFlowApi,
    SqliteDatabase,
};

use crate::{
    config::ServerConfig,
    errors::{AuthError, ServerError, ServerError::AuthenticationError},
    helpers::get_remote_ip,
    routes::{
        health,
        CreateOrderRoute,
        InitiatePaymentRoute,
        MyOrdersRoute,
        OrderByIdRoute,
        PaymentCallbackRoute,
        PaymentStatusRoute,
        UpdateOrderStatusRoute,
    },
};

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let db = SqliteDatabase::new_with_url(&config.database_url, 25)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let mut hooks = EventHooks::default();
    hooks.on_order_paid(|ev| {
        async move {
            info!("📣️ Order {} is paid and ready for fulfillment", ev.order.order_id);
        }
        .boxed()
    });
    let handlers = EventHandlers::new(64, hooks);
    let producers = handlers.producers();
    handlers.start_handlers().await;
    let srv = create_server_instance(config, db, producers)?;
    srv.await.map_err(|e| ServerError::Unspecified(e.to_string()))
}

pub fn create_server_instance(
    config: ServerConfig,
    db: SqliteDatabase,
    producers: EventProducers,
) -> Result<Server, ServerError> {
    let daraja = DarajaApi::new(config.daraja.clone()).map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let bind_addr = (config.host.clone(), config.port);
    let srv = HttpServer::new(move || {
        let orders_api = OrderFlowApi::new(db.clone(), producers.clone());
        let queries_api = MarketQueryApi::new(db.clone());
        let app = App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("sps::access_log"))
            .app_data(web::Data::new(orders_api))
            .app_data(web::Data::new(queries_api))
            .app_data(web::Data::new(daraja.clone()))
            .app_data(web::Data::new(config.clone()));
        let use_x_forwarded_for = config.use_x_forwarded_for;
        let use_forwarded = config.use_forwarded;
        let callback_whitelist = config.callback_whitelist.clone();
        // The provider callback is unauthenticated by nature, so it gets its own scope with an optional IP
        // whitelist in front of it. The whitelist is advisory; the settlement logic itself is idempotent and only
        // ever trusts the checkout reference, never the payload's word for it.
        let callback_scope = web::scope("/payments")
            .wrap_fn(move |req, srv| {
                let peer_ip = get_remote_ip(req.request(), use_x_forwarded_for, use_forwarded);
                let whitelisted = match (peer_ip, &callback_whitelist) {
                    (Some(ip), Some(whitelist)) => {
                        info!("Payment callback from {ip}");
                        whitelist.contains(&ip)
                    },
                    (_, None) => true,
                    (None, Some(_)) => {
                        warn!("No IP address found in the callback peer request, denying access.");
                        false
                    },
                };
                if whitelisted {
                    srv.call(req)
                } else {
                    ok(req.error_response(AuthenticationError(AuthError::ForbiddenPeer))).boxed_local()
                }
            })
            .service(PaymentCallbackRoute::<SqliteDatabase>::new());
        app.service(health)
            .service(CreateOrderRoute::<SqliteDatabase>::new())
            .service(MyOrdersRoute::<SqliteDatabase>::new())
            .service(OrderByIdRoute::<SqliteDatabase>::new())
            .service(UpdateOrderStatusRoute::<SqliteDatabase>::new())
            .service(InitiatePaymentRoute::<SqliteDatabase>::new())
            .service(PaymentStatusRoute::<SqliteDatabase>::new())
            // Registered last: the scope claims the whole /payments prefix, so the concrete /payments/* resources
            // above must get first crack at matching.
            .service(callback_scope)
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind(bind_addr)?
    .run();
    Ok(srv)
}
