use log::trace;
use sqlx::SqliteConnection;

use crate::{
    db_types::{NewOrder, Order, OrderId, OrderStatus},
    traits::PaymentGatewayError,
};

const ORDER_COLUMNS: &str = "id, order_id, order_number, status, payment_status, payment_method, subtotal, \
                             shipping_fee, total, checkout_request_id, payer_phone, provider_txid, created_at, \
                             updated_at";

/// Inserts a new order and assigns its reference number from the autoincrement id. This is not
/// atomic on its own; callers run it inside a transaction and pass `&mut *tx` as the connection.
pub async fn insert_order(order: NewOrder, conn: &mut SqliteConnection) -> Result<i64, PaymentGatewayError> {
    let total = order.total();
    let id = sqlx::query_scalar::<_, i64>(
        r#"
            INSERT INTO orders (order_id, payment_method, subtotal, shipping_fee, total, status, payment_status)
            VALUES ($1, $2, $3, $4, $5, 'pending', 'pending')
            RETURNING id;
        "#,
    )
    .bind(&order.order_id)
    .bind(order.payment_method)
    .bind(order.subtotal)
    .bind(order.shipping_fee)
    .bind(total)
    .fetch_one(&mut *conn)
    .await?;
    // The reference number is derived from the autoincrement id, so it is monotonic by construction.
    sqlx::query("UPDATE orders SET order_number = printf('DPS-%08d', id) WHERE id = $1")
        .bind(id)
        .execute(&mut *conn)
        .await?;
    Ok(id)
}

pub async fn fetch_order_by_pk(id: i64, conn: &mut SqliteConnection) -> Result<Option<Order>, PaymentGatewayError> {
    let order = sqlx::query_as::<_, Order>(&format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1"))
        .bind(id)
        .fetch_optional(conn)
        .await?;
    Ok(order)
}

pub async fn fetch_order_by_order_id(
    order_id: &OrderId,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, PaymentGatewayError> {
    let order = sqlx::query_as::<_, Order>(&format!("SELECT {ORDER_COLUMNS} FROM orders WHERE order_id = $1"))
        .bind(order_id)
        .fetch_optional(conn)
        .await?;
    Ok(order)
}

pub async fn fetch_order_by_reference(
    reference: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, PaymentGatewayError> {
    let order = sqlx::query_as::<_, Order>(&format!("SELECT {ORDER_COLUMNS} FROM orders WHERE order_number = $1"))
        .bind(reference)
        .fetch_optional(conn)
        .await?;
    Ok(order)
}

/// Stamp the correlation id and payer phone of the latest push submission onto the order.
pub async fn stamp_submission(
    order_pk: i64,
    checkout_request_id: &str,
    phone: &str,
    conn: &mut SqliteConnection,
) -> Result<(), PaymentGatewayError> {
    sqlx::query(
        "UPDATE orders SET checkout_request_id = $1, payer_phone = $2, updated_at = CURRENT_TIMESTAMP WHERE id = $3",
    )
    .bind(checkout_request_id)
    .bind(phone)
    .bind(order_pk)
    .execute(conn)
    .await?;
    Ok(())
}

/// The order-advancing side of a successful settlement: `payment_status` pending -> paid and
/// `status` -> confirmed, recording the gateway receipt.
///
/// The `payment_status = 'pending'` guard makes this a compare-and-swap. Of two concurrent
/// deliveries of the same success callback, exactly one observes a row count of 1.
pub async fn confirm_payment(
    order_pk: i64,
    receipt: &str,
    conn: &mut SqliteConnection,
) -> Result<bool, PaymentGatewayError> {
    let result = sqlx::query(
        r#"
            UPDATE orders
            SET payment_status = 'paid', status = 'confirmed', provider_txid = $1, updated_at = CURRENT_TIMESTAMP
            WHERE id = $2 AND payment_status = 'pending'
        "#,
    )
    .bind(receipt)
    .bind(order_pk)
    .execute(conn)
    .await?;
    trace!("🗃️ confirm_payment for order #{order_pk} affected {} row(s)", result.rows_affected());
    Ok(result.rows_affected() == 1)
}

/// Administrative status update. The guard on the current status keeps it race-free: the update
/// only applies if the order is still in the state the caller read.
pub async fn update_status(
    order_pk: i64,
    from: OrderStatus,
    to: OrderStatus,
    conn: &mut SqliteConnection,
) -> Result<bool, PaymentGatewayError> {
    let result =
        sqlx::query("UPDATE orders SET status = $1, updated_at = CURRENT_TIMESTAMP WHERE id = $2 AND status = $3")
            .bind(to)
            .bind(order_pk)
            .bind(from)
            .execute(conn)
            .await?;
    Ok(result.rows_affected() == 1)
}
