use std::{
    future::Future,
    pin::Pin,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
};

use dps_common::Cents;
use duka_payment_engine::{
    db_types::{AttemptStatus, NewOrder, NewPaymentAttempt, Order, OrderStatus, PaymentMethod, PaymentStatus},
    events::{EventHandlers, EventHooks, EventProducers},
    test_utils::prepare_env::{prepare_test_env, random_db_path},
    OrderApi,
    PaymentGatewayError,
    SettlementApi,
    SettlementDatabase,
    SettlementNotice,
    SettlementOutcome,
    SqliteDatabase,
};

async fn new_db() -> SqliteDatabase {
    let url = random_db_path();
    prepare_test_env(&url).await;
    SqliteDatabase::new_with_url(&url, 5).await.expect("Error creating database")
}

async fn place_order(db: &SqliteDatabase, subtotal_shillings: i64) -> Order {
    let api = OrderApi::new(db.clone());
    let order =
        NewOrder::new(PaymentMethod::MobileMoney, Cents::from_shillings(subtotal_shillings), Cents::from_shillings(200));
    api.create_order(order).await.expect("Error creating order")
}

fn success_notice(correlation_id: &str, receipt: &str) -> SettlementNotice {
    SettlementNotice {
        correlation_id: Some(correlation_id.to_string()),
        result_code: "0".to_string(),
        result_desc: "The service request is processed successfully.".to_string(),
        receipt: Some(receipt.to_string()),
    }
}

fn failure_notice(correlation_id: &str) -> SettlementNotice {
    SettlementNotice {
        correlation_id: Some(correlation_id.to_string()),
        result_code: "1032".to_string(),
        result_desc: "Request cancelled by user".to_string(),
        receipt: None,
    }
}

#[tokio::test]
async fn successful_settlement_confirms_the_order() {
    let db = new_db().await;
    let order = place_order(&db, 800).await;
    assert_eq!(order.total, Cents::from_shillings(1000));
    assert_eq!(order.payment_status, PaymentStatus::Pending);

    let api = SettlementApi::new(db.clone(), EventProducers::default());
    let attempt = api
        .record_submission(NewPaymentAttempt::new(
            order.id,
            "ws_CO_0001".to_string(),
            "mr_0001".to_string(),
            order.total,
            "254712345678".to_string(),
        ))
        .await
        .expect("Error recording submission");
    assert_eq!(attempt.status, AttemptStatus::Pending);
    assert_eq!(attempt.amount, Cents::from_shillings(1000));

    let outcome = api.process_settlement(success_notice("ws_CO_0001", "QGH7SK61SU")).await.unwrap();
    let SettlementOutcome::PaymentConfirmed(paid) = outcome else {
        panic!("Expected PaymentConfirmed, got {outcome:?}");
    };
    assert_eq!(paid.payment_status, PaymentStatus::Paid);
    assert_eq!(paid.status, OrderStatus::Confirmed);
    assert_eq!(paid.provider_txid.as_deref(), Some("QGH7SK61SU"));

    let attempt = db.attempt_by_correlation_id("ws_CO_0001").await.unwrap().unwrap();
    assert_eq!(attempt.status, AttemptStatus::Success);
    assert_eq!(attempt.receipt.as_deref(), Some("QGH7SK61SU"));
    assert_eq!(attempt.result_code.as_deref(), Some("0"));
}

#[tokio::test]
async fn duplicate_success_notice_is_a_no_op() {
    let db = new_db().await;
    let order = place_order(&db, 500).await;
    let api = SettlementApi::new(db.clone(), EventProducers::default());
    api.record_submission(NewPaymentAttempt::new(
        order.id,
        "ws_CO_0002".to_string(),
        "mr_0002".to_string(),
        order.total,
        "254712345678".to_string(),
    ))
    .await
    .unwrap();

    let first = api.process_settlement(success_notice("ws_CO_0002", "QAB1CD23EF")).await.unwrap();
    assert!(matches!(first, SettlementOutcome::PaymentConfirmed(_)));
    let second = api.process_settlement(success_notice("ws_CO_0002", "QAB1CD23EF")).await.unwrap();
    assert!(matches!(second, SettlementOutcome::AlreadySettled));

    let confirmed = db.order_by_id(order.id).await.unwrap().unwrap();
    assert_eq!(confirmed.payment_status, PaymentStatus::Paid);
    assert_eq!(confirmed.provider_txid.as_deref(), Some("QAB1CD23EF"));
}

#[tokio::test]
async fn unknown_correlation_id_is_discarded() {
    let db = new_db().await;
    let api = SettlementApi::new(db.clone(), EventProducers::default());
    let outcome = api.process_settlement(success_notice("ws_CO_does_not_exist", "QXX0XX00XX")).await.unwrap();
    assert!(matches!(outcome, SettlementOutcome::UnknownCorrelation));

    let outcome = api
        .process_settlement(SettlementNotice {
            correlation_id: None,
            result_code: "0".to_string(),
            result_desc: "ok".to_string(),
            receipt: None,
        })
        .await
        .unwrap();
    assert!(matches!(outcome, SettlementOutcome::Discarded));
}

#[tokio::test]
async fn failed_settlement_leaves_the_order_payable() {
    let db = new_db().await;
    let order = place_order(&db, 750).await;
    let api = SettlementApi::new(db.clone(), EventProducers::default());
    api.record_submission(NewPaymentAttempt::new(
        order.id,
        "ws_CO_0003".to_string(),
        "mr_0003".to_string(),
        order.total,
        "254712345678".to_string(),
    ))
    .await
    .unwrap();

    let outcome = api.process_settlement(failure_notice("ws_CO_0003")).await.unwrap();
    let SettlementOutcome::PaymentFailed(attempt) = outcome else {
        panic!("Expected PaymentFailed, got {outcome:?}");
    };
    assert_eq!(attempt.status, AttemptStatus::Failed);
    assert_eq!(attempt.result_code.as_deref(), Some("1032"));
    assert!(attempt.receipt.is_none());

    let order = db.order_by_id(order.id).await.unwrap().unwrap();
    assert_eq!(order.payment_status, PaymentStatus::Pending);
    assert_eq!(order.status, OrderStatus::Pending);
    assert!(order.provider_txid.is_none());

    // The shopper retries with a fresh correlation id and this time it succeeds.
    api.record_submission(NewPaymentAttempt::new(
        order.id,
        "ws_CO_0004".to_string(),
        "mr_0004".to_string(),
        order.total,
        "254712345678".to_string(),
    ))
    .await
    .unwrap();
    let outcome = api.process_settlement(success_notice("ws_CO_0004", "QRE7RY99TT")).await.unwrap();
    assert!(matches!(outcome, SettlementOutcome::PaymentConfirmed(_)));
}

#[tokio::test]
async fn correlation_ids_are_unique() {
    let db = new_db().await;
    let order = place_order(&db, 100).await;
    let other = place_order(&db, 250).await;
    let api = SettlementApi::new(db.clone(), EventProducers::default());
    api.record_submission(NewPaymentAttempt::new(
        order.id,
        "ws_CO_0005".to_string(),
        "mr_0005".to_string(),
        order.total,
        "254712345678".to_string(),
    ))
    .await
    .unwrap();
    let err = api
        .record_submission(NewPaymentAttempt::new(
            other.id,
            "ws_CO_0005".to_string(),
            "mr_0006".to_string(),
            other.total,
            "254798765432".to_string(),
        ))
        .await
        .unwrap_err();
    assert!(matches!(err, PaymentGatewayError::DuplicateCorrelationId(id) if id == "ws_CO_0005"));
}

#[tokio::test]
async fn concurrent_duplicate_deliveries_confirm_exactly_once() {
    let db = new_db().await;
    let order = place_order(&db, 1000).await;
    let api = SettlementApi::new(db.clone(), EventProducers::default());
    api.record_submission(NewPaymentAttempt::new(
        order.id,
        "ws_CO_0007".to_string(),
        "mr_0007".to_string(),
        order.total,
        "254712345678".to_string(),
    ))
    .await
    .unwrap();

    let api2 = SettlementApi::new(db.clone(), EventProducers::default());
    let notice = success_notice("ws_CO_0007", "QZZ9ZZ99ZZ");
    let (a, b) = tokio::join!(api.process_settlement(notice.clone()), api2.process_settlement(notice));
    let outcomes = [a.unwrap(), b.unwrap()];
    let confirmed = outcomes.iter().filter(|o| matches!(o, SettlementOutcome::PaymentConfirmed(_))).count();
    assert_eq!(confirmed, 1, "exactly one delivery may advance the order: {outcomes:?}");

    let order = db.order_by_id(order.id).await.unwrap().unwrap();
    assert_eq!(order.payment_status, PaymentStatus::Paid);
}

#[tokio::test]
async fn order_paid_hook_fires_once_per_order() {
    let db = new_db().await;
    let order = place_order(&db, 300).await;

    let count = Arc::new(AtomicUsize::new(0));
    let c2 = count.clone();
    let mut hooks = EventHooks::default();
    hooks.on_order_paid(move |_ev| {
        let count = c2.clone();
        Box::pin(async move {
            count.fetch_add(1, Ordering::SeqCst);
        }) as Pin<Box<dyn Future<Output = ()> + Send>>
    });
    let handlers = EventHandlers::new(10, hooks);
    let api = SettlementApi::new(db.clone(), handlers.producers());

    api.record_submission(NewPaymentAttempt::new(
        order.id,
        "ws_CO_0008".to_string(),
        "mr_0008".to_string(),
        order.total,
        "254712345678".to_string(),
    ))
    .await
    .unwrap();
    api.process_settlement(success_notice("ws_CO_0008", "QME5ME55ME")).await.unwrap();
    api.process_settlement(success_notice("ws_CO_0008", "QME5ME55ME")).await.unwrap();

    // Dropping the api drops the last producer, letting the handler drain and shut down.
    drop(api);
    handlers.on_order_paid.unwrap().start_handler().await;
    assert_eq!(count.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn terminal_orders_cannot_change_status() {
    let db = new_db().await;
    let order = place_order(&db, 400).await;
    let orders = OrderApi::new(db.clone());
    let settlements = SettlementApi::new(db.clone(), EventProducers::default());
    settlements
        .record_submission(NewPaymentAttempt::new(
            order.id,
            "ws_CO_0009".to_string(),
            "mr_0009".to_string(),
            order.total,
            "254712345678".to_string(),
        ))
        .await
        .unwrap();
    settlements.process_settlement(success_notice("ws_CO_0009", "QFI1NA11LL")).await.unwrap();

    for status in [OrderStatus::Processing, OrderStatus::Shipped, OrderStatus::Delivered] {
        let updated = orders.advance_status(&order.order_id, status).await.unwrap();
        assert_eq!(updated.status, status);
    }
    let err = orders.advance_status(&order.order_id, OrderStatus::Cancelled).await.unwrap_err();
    assert!(matches!(
        err,
        PaymentGatewayError::OrderModificationForbidden { status: OrderStatus::Delivered, .. }
    ));
}

#[tokio::test]
async fn order_numbers_are_assigned_in_sequence() {
    let db = new_db().await;
    let first = place_order(&db, 100).await;
    let second = place_order(&db, 200).await;
    assert_eq!(first.order_number, format!("DPS-{:08}", first.id));
    assert_eq!(second.order_number, format!("DPS-{:08}", second.id));
    assert!(second.id > first.id);

    let api = OrderApi::new(db.clone());
    let found = api.order_by_reference(&first.order_number).await.unwrap().unwrap();
    assert_eq!(found.order_id, first.order_id);
    assert!(api.order_by_reference("DPS-99999999").await.unwrap().is_none());
}
