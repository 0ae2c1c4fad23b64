use actix_web::{body::MessageBody, http::StatusCode, test, test::TestRequest, web, App};
use daraja_tools::{DarajaApi, DarajaConfig};
use dps_common::Cents;
use duka_payment_engine::{
    events::EventProducers,
    test_utils::prepare_env::{prepare_test_env, random_db_path},
    OrderApi,
    SettlementApi,
    SqliteDatabase,
};

use crate::{
    config::ServerOptions,
    routes::{health, CheckoutRoute, OrderStatusRoute, PaymentCallbackRoute, SubmitPaymentRoute},
};

pub async fn test_db() -> SqliteDatabase {
    let _ = env_logger::try_init();
    let url = random_db_path();
    prepare_test_env(&url).await;
    SqliteDatabase::new_with_url(&url, 5).await.expect("Error creating test database")
}

pub fn test_options() -> ServerOptions {
    ServerOptions { shipping_fee: Cents::from_shillings(200), country_prefix: "254".to_string() }
}

/// Stand up the full route table against `db` and execute a single request. The gateway client is
/// configured with empty credentials, so any handler that reaches for Daraja fails with a
/// configuration error before any network traffic.
pub async fn request(req: TestRequest, db: SqliteDatabase) -> (StatusCode, String) {
    let gateway = DarajaApi::new(DarajaConfig::default()).expect("Error creating Daraja client");
    let app = App::new()
        .app_data(web::Data::new(OrderApi::new(db.clone())))
        .app_data(web::Data::new(SettlementApi::new(db.clone(), EventProducers::default())))
        .app_data(web::Data::new(gateway))
        .app_data(web::Data::new(test_options()))
        .service(health)
        .service(CheckoutRoute::<SqliteDatabase>::new())
        .service(SubmitPaymentRoute::<SqliteDatabase>::new())
        .service(PaymentCallbackRoute::<SqliteDatabase>::new())
        .service(OrderStatusRoute::<SqliteDatabase>::new());
    let service = test::init_service(app).await;
    let res = test::call_service(&service, req.to_request()).await;
    let status = res.status();
    let body = String::from_utf8_lossy(&res.into_body().try_into_bytes().unwrap()).into_owned();
    (status, body)
}
