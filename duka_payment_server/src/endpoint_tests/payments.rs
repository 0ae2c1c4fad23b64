use actix_web::{http::StatusCode, test::TestRequest};
use dps_common::Cents;
use duka_payment_engine::{
    db_types::{NewOrder, NewPaymentAttempt, Order, PaymentMethod},
    events::EventProducers,
    OrderApi,
    SettlementApi,
    SqliteDatabase,
};
use serde_json::{json, Value};

use super::helpers::{request, test_db};

const ACK: &str = r#"{"ResultCode":0,"ResultDesc":"Accepted"}"#;

async fn place_order(db: &SqliteDatabase) -> Order {
    let api = OrderApi::new(db.clone());
    let order = NewOrder::new(PaymentMethod::MobileMoney, Cents::from_shillings(1000), Cents::from_shillings(200));
    api.create_order(order).await.expect("Error creating order")
}

fn success_callback(correlation_id: &str, receipt: &str) -> Value {
    json!({
        "Body": {
            "stkCallback": {
                "MerchantRequestID": "29115-34620561-1",
                "CheckoutRequestID": correlation_id,
                "ResultCode": 0,
                "ResultDesc": "The service request is processed successfully.",
                "CallbackMetadata": {
                    "Item": [
                        { "Name": "Amount", "Value": 1200.0 },
                        { "Name": "MpesaReceiptNumber", "Value": receipt },
                        { "Name": "PhoneNumber", "Value": 254712345678u64 }
                    ]
                }
            }
        }
    })
}

#[actix_web::test]
async fn invalid_phone_number_is_rejected_before_the_gateway() {
    let db = test_db().await;
    let order = place_order(&db).await;
    let req = TestRequest::post()
        .uri("/payments/stk")
        .set_json(json!({"order_id": order.order_id.as_str(), "phone": "12345"}));
    let (status, body) = request(req, db).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("Invalid phone number"), "body: {body}");
}

#[actix_web::test]
async fn payment_for_unknown_order_is_404() {
    let db = test_db().await;
    let req = TestRequest::post()
        .uri("/payments/stk")
        .set_json(json!({"order_id": "deadbeef", "phone": "0712345678"}));
    let (status, body) = request(req, db).await;
    assert_eq!(status, StatusCode::NOT_FOUND, "body: {body}");
}

#[actix_web::test]
async fn unconfigured_gateway_credentials_are_a_server_error() {
    // The test client has empty consumer credentials, so the submission must die with a
    // configuration error before any network traffic.
    let db = test_db().await;
    let order = place_order(&db).await;
    let req = TestRequest::post()
        .uri("/payments/stk")
        .set_json(json!({"order_id": order.order_id.as_str(), "phone": "0712345678"}));
    let (status, body) = request(req, db).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body.contains("configuration"), "body: {body}");
}

#[actix_web::test]
async fn malformed_callback_is_still_acknowledged() {
    let db = test_db().await;
    let req = TestRequest::post().uri("/payments/callback").set_payload("this is not json");
    let (status, body) = request(req, db).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, ACK);
}

#[actix_web::test]
async fn callback_for_unknown_correlation_id_is_acknowledged() {
    let db = test_db().await;
    let req =
        TestRequest::post().uri("/payments/callback").set_json(success_callback("ws_CO_never_issued", "QAA0AA00AA"));
    let (status, body) = request(req, db).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, ACK);
}

#[actix_web::test]
async fn success_callback_settles_the_order() {
    let db = test_db().await;
    let order = place_order(&db).await;
    let settlements = SettlementApi::new(db.clone(), EventProducers::default());
    settlements
        .record_submission(NewPaymentAttempt::new(
            order.id,
            "ws_CO_191220191020363925".to_string(),
            "29115-34620561-1".to_string(),
            order.total,
            "254712345678".to_string(),
        ))
        .await
        .expect("Error recording submission");

    let req = TestRequest::post()
        .uri("/payments/callback")
        .set_json(success_callback("ws_CO_191220191020363925", "NLJ7RT61SV"));
    let (status, body) = request(req, db.clone()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, ACK);

    let (status, body) = request(TestRequest::get().uri(&format!("/orders/{}", order.order_number)), db.clone()).await;
    assert_eq!(status, StatusCode::OK);
    let result: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(result["payment_status"], "paid");
    assert_eq!(result["status"], "confirmed");
    assert_eq!(result["receipt"], "NLJ7RT61SV");
    assert_eq!(result["checkout_request_id"], "ws_CO_191220191020363925");

    // The duplicate delivery changes nothing and is acked all the same.
    let req = TestRequest::post()
        .uri("/payments/callback")
        .set_json(success_callback("ws_CO_191220191020363925", "NLJ7RT61SV"));
    let (status, body) = request(req, db).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, ACK);
}
