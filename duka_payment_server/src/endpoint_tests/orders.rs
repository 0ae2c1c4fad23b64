use actix_web::{http::StatusCode, test::TestRequest};
use serde_json::{json, Value};

use super::helpers::{request, test_db};

#[actix_web::test]
async fn health_check() {
    let db = test_db().await;
    let (status, body) = request(TestRequest::get().uri("/health"), db).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "👍️\n");
}

#[actix_web::test]
async fn checkout_creates_a_pending_order() {
    let db = test_db().await;
    let req = TestRequest::post().uri("/orders").set_json(json!({"subtotal": 100_000}));
    let (status, body) = request(req, db).await;
    assert_eq!(status, StatusCode::CREATED);
    let order: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(order["order_number"], "DPS-00000001");
    assert_eq!(order["status"], "pending");
    assert_eq!(order["payment_status"], "pending");
    assert_eq!(order["payment_method"], "mobile_money");
    assert_eq!(order["subtotal"], 100_000);
    assert_eq!(order["shipping_fee"], 20_000);
    assert_eq!(order["total"], 120_000);
}

#[actix_web::test]
async fn order_status_is_surfaced_by_reference() {
    let db = test_db().await;
    let req = TestRequest::post().uri("/orders").set_json(json!({"subtotal": 50_000, "payment_method": "card"}));
    let (status, body) = request(req, db.clone()).await;
    assert_eq!(status, StatusCode::CREATED);
    let order: Value = serde_json::from_str(&body).unwrap();
    let reference = order["order_number"].as_str().unwrap().to_string();

    let (status, body) = request(TestRequest::get().uri(&format!("/orders/{reference}")), db).await;
    assert_eq!(status, StatusCode::OK);
    let result: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(result["order_number"], reference.as_str());
    assert_eq!(result["payment_method"], "card");
    assert_eq!(result["payment_status"], "pending");
    assert!(result["checkout_request_id"].is_null());
    assert!(result["receipt"].is_null());
}

#[actix_web::test]
async fn unknown_order_reference_is_404() {
    let db = test_db().await;
    let (status, body) = request(TestRequest::get().uri("/orders/DPS-99999999"), db).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body.contains("was not found"), "body: {body}");
}

#[actix_web::test]
async fn negative_subtotal_is_rejected() {
    let db = test_db().await;
    let req = TestRequest::post().uri("/orders").set_json(json!({"subtotal": -5000}));
    let (status, body) = request(req, db).await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "body: {body}");
}
