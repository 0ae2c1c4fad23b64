use sqlx::SqliteConnection;

use crate::{
    db_types::{NewPaymentAttempt, PaymentAttempt},
    traits::{PaymentGatewayError, SettlementPatch},
};

const ATTEMPT_COLUMNS: &str = "id, order_id, checkout_request_id, merchant_request_id, amount, phone, status, \
                               result_code, result_desc, receipt, created_at, updated_at";

pub async fn insert_attempt(
    attempt: NewPaymentAttempt,
    conn: &mut SqliteConnection,
) -> Result<i64, PaymentGatewayError> {
    let existing = sqlx::query_scalar::<_, i64>("SELECT id FROM payment_attempts WHERE checkout_request_id = $1")
        .bind(&attempt.checkout_request_id)
        .fetch_optional(&mut *conn)
        .await?;
    if existing.is_some() {
        return Err(PaymentGatewayError::DuplicateCorrelationId(attempt.checkout_request_id));
    }
    let id = sqlx::query_scalar::<_, i64>(
        r#"
            INSERT INTO payment_attempts (order_id, checkout_request_id, merchant_request_id, amount, phone, status)
            VALUES ($1, $2, $3, $4, $5, 'pending')
            RETURNING id;
        "#,
    )
    .bind(attempt.order_id)
    .bind(&attempt.checkout_request_id)
    .bind(&attempt.merchant_request_id)
    .bind(attempt.amount)
    .bind(&attempt.phone)
    .fetch_one(conn)
    .await?;
    Ok(id)
}

pub async fn fetch_attempt_by_pk(
    id: i64,
    conn: &mut SqliteConnection,
) -> Result<Option<PaymentAttempt>, PaymentGatewayError> {
    let attempt = sqlx::query_as::<_, PaymentAttempt>(&format!(
        "SELECT {ATTEMPT_COLUMNS} FROM payment_attempts WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(conn)
    .await?;
    Ok(attempt)
}

pub async fn fetch_attempt_by_correlation_id(
    correlation_id: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<PaymentAttempt>, PaymentGatewayError> {
    let attempt = sqlx::query_as::<_, PaymentAttempt>(&format!(
        "SELECT {ATTEMPT_COLUMNS} FROM payment_attempts WHERE checkout_request_id = $1"
    ))
    .bind(correlation_id)
    .fetch_optional(conn)
    .await?;
    Ok(attempt)
}

/// Conditionally move a ledger entry out of `pending`. Returns whether the update applied. The
/// `status = 'pending'` guard is what makes duplicate callback deliveries no-ops.
pub async fn settle(
    correlation_id: &str,
    patch: &SettlementPatch,
    conn: &mut SqliteConnection,
) -> Result<bool, PaymentGatewayError> {
    let result = sqlx::query(
        r#"
            UPDATE payment_attempts
            SET status = $1, result_code = $2, result_desc = $3, receipt = $4, updated_at = CURRENT_TIMESTAMP
            WHERE checkout_request_id = $5 AND status = 'pending'
        "#,
    )
    .bind(patch.status)
    .bind(&patch.result_code)
    .bind(&patch.result_desc)
    .bind(&patch.receipt)
    .bind(correlation_id)
    .execute(conn)
    .await?;
    Ok(result.rows_affected() == 1)
}
