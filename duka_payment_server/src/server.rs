use std::time::Duration;

use actix_web::{dev::Server, http::KeepAlive, middleware::Logger, web, App, HttpServer};
use daraja_tools::DarajaApi;
use duka_payment_engine::{
    events::{EventHandlers, EventHooks, EventProducers},
    sqlite::run_migrations,
    OrderApi,
    SettlementApi,
    SqliteDatabase,
};
use log::*;

use crate::{
    config::{ServerConfig, ServerOptions},
    errors::ServerError,
    routes::{health, CheckoutRoute, OrderStatusRoute, PaymentCallbackRoute, SubmitPaymentRoute},
};

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let db = SqliteDatabase::new_with_url(&config.database_url, 25)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    run_migrations(db.pool()).await.map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let mut hooks = EventHooks::default();
    hooks.on_order_paid(|ev| {
        Box::pin(async move {
            info!(
                "📬️ Order {} paid in full. Receipt: {}",
                ev.order.order_number,
                ev.order.provider_txid.as_deref().unwrap_or("-")
            );
        })
    });
    hooks.on_payment_failed(|ev| {
        Box::pin(async move {
            info!(
                "📬️ Payment attempt {} failed with code {}",
                ev.attempt.checkout_request_id,
                ev.attempt.result_code.as_deref().unwrap_or("-")
            );
        })
    });
    let handlers = EventHandlers::new(100, hooks);
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
    let options = ServerOptions::from(&config);
    let daraja_config = config.daraja.clone();
    let srv = HttpServer::new(move || {
        let orders_api = OrderApi::new(db.clone());
        let settlement_api = SettlementApi::new(db.clone(), producers.clone());
        let gateway = match DarajaApi::new(daraja_config.clone()) {
            Ok(api) => api,
            Err(e) => {
                // The client only fails to build on a broken TLS stack. Nothing to do but bail.
                panic!("Could not create Daraja client: {e}");
            },
        };
        let options = options.clone();
        App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("dps::access_log"))
            .app_data(web::Data::new(orders_api))
            .app_data(web::Data::new(settlement_api))
            .app_data(web::Data::new(gateway))
            .app_data(web::Data::new(options))
            .service(health)
            .service(CheckoutRoute::<SqliteDatabase>::new())
            .service(SubmitPaymentRoute::<SqliteDatabase>::new())
            .service(PaymentCallbackRoute::<SqliteDatabase>::new())
            .service(OrderStatusRoute::<SqliteDatabase>::new())
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((config.host.as_str(), config.port))?
    .run();
    Ok(srv)
}
