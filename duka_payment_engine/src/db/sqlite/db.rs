use std::fmt::Debug;

use log::debug;
use sqlx::SqlitePool;

use crate::{
    db::sqlite::{attempts, new_pool, orders},
    db_types::{NewOrder, NewPaymentAttempt, Order, OrderId, OrderStatus, PaymentAttempt},
    traits::{PaymentGatewayError, SettlementDatabase, SettlementPatch, SettlementUpdate},
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SqliteDatabase ({})", self.url)
    }
}

impl SqliteDatabase {
    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, PaymentGatewayError> {
        let pool = new_pool(url, max_connections).await?;
        Ok(Self { url: url.to_string(), pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

impl SettlementDatabase for SqliteDatabase {
    fn url(&self) -> &str {
        self.url.as_str()
    }

    async fn insert_order(&self, order: NewOrder) -> Result<Order, PaymentGatewayError> {
        let mut tx = self.pool.begin().await?;
        let id = orders::insert_order(order, &mut tx).await?;
        let order = orders::fetch_order_by_pk(id, &mut tx).await?.ok_or(PaymentGatewayError::OrderIdNotFound(id))?;
        tx.commit().await?;
        debug!("🗃️ Order {} inserted with reference {}", order.order_id, order.order_number);
        Ok(order)
    }

    async fn order_by_id(&self, id: i64) -> Result<Option<Order>, PaymentGatewayError> {
        let mut conn = self.pool.acquire().await?;
        orders::fetch_order_by_pk(id, &mut conn).await
    }

    async fn order_by_order_id(&self, order_id: &OrderId) -> Result<Option<Order>, PaymentGatewayError> {
        let mut conn = self.pool.acquire().await?;
        orders::fetch_order_by_order_id(order_id, &mut conn).await
    }

    async fn order_by_reference(&self, reference: &str) -> Result<Option<Order>, PaymentGatewayError> {
        let mut conn = self.pool.acquire().await?;
        orders::fetch_order_by_reference(reference, &mut conn).await
    }

    async fn insert_payment_attempt(
        &self,
        attempt: NewPaymentAttempt,
    ) -> Result<PaymentAttempt, PaymentGatewayError> {
        let mut tx = self.pool.begin().await?;
        let order_pk = attempt.order_id;
        let correlation_id = attempt.checkout_request_id.clone();
        let phone = attempt.phone.clone();
        let id = attempts::insert_attempt(attempt, &mut tx).await?;
        orders::stamp_submission(order_pk, &correlation_id, &phone, &mut tx).await?;
        let attempt = attempts::fetch_attempt_by_pk(id, &mut tx)
            .await?
            .ok_or_else(|| PaymentGatewayError::AttemptNotFound(correlation_id.clone()))?;
        tx.commit().await?;
        debug!("🗃️ Ledger entry {correlation_id} recorded against order #{order_pk}");
        Ok(attempt)
    }

    async fn attempt_by_correlation_id(
        &self,
        correlation_id: &str,
    ) -> Result<Option<PaymentAttempt>, PaymentGatewayError> {
        let mut conn = self.pool.acquire().await?;
        attempts::fetch_attempt_by_correlation_id(correlation_id, &mut conn).await
    }

    async fn settle_attempt(
        &self,
        correlation_id: &str,
        patch: SettlementPatch,
    ) -> Result<SettlementUpdate, PaymentGatewayError> {
        let mut tx = self.pool.begin().await?;
        let applied = attempts::settle(correlation_id, &patch, &mut tx).await?;
        let attempt = attempts::fetch_attempt_by_correlation_id(correlation_id, &mut tx).await?;
        tx.commit().await?;
        let update = match (applied, attempt) {
            (true, Some(attempt)) => SettlementUpdate::Applied(attempt),
            (false, Some(attempt)) => SettlementUpdate::AlreadyTerminal(attempt),
            (_, None) => SettlementUpdate::NotFound,
        };
        Ok(update)
    }

    async fn confirm_order_payment(
        &self,
        order_pk: i64,
        receipt: &str,
    ) -> Result<Option<Order>, PaymentGatewayError> {
        let mut tx = self.pool.begin().await?;
        let applied = orders::confirm_payment(order_pk, receipt, &mut tx).await?;
        let order = if applied {
            let order = orders::fetch_order_by_pk(order_pk, &mut tx)
                .await?
                .ok_or(PaymentGatewayError::OrderIdNotFound(order_pk))?;
            Some(order)
        } else {
            None
        };
        tx.commit().await?;
        Ok(order)
    }

    async fn update_order_status(
        &self,
        order_id: &OrderId,
        status: OrderStatus,
    ) -> Result<Order, PaymentGatewayError> {
        let mut tx = self.pool.begin().await?;
        let order = orders::fetch_order_by_order_id(order_id, &mut tx)
            .await?
            .ok_or_else(|| PaymentGatewayError::OrderNotFound(order_id.clone()))?;
        if order.status.is_terminal() {
            return Err(PaymentGatewayError::OrderModificationForbidden {
                order_id: order_id.clone(),
                status: order.status,
            });
        }
        let applied = orders::update_status(order.id, order.status, status, &mut tx).await?;
        if !applied {
            // Lost a race with a concurrent transition. Report the state we read.
            return Err(PaymentGatewayError::OrderModificationForbidden {
                order_id: order_id.clone(),
                status: order.status,
            });
        }
        let order = orders::fetch_order_by_pk(order.id, &mut tx)
            .await?
            .ok_or_else(|| PaymentGatewayError::OrderNotFound(order_id.clone()))?;
        tx.commit().await?;
        debug!("🗃️ Order {} moved to {}", order.order_number, order.status);
        Ok(order)
    }

    async fn close(&mut self) -> Result<(), PaymentGatewayError> {
        self.pool.close().await;
        Ok(())
    }
}
