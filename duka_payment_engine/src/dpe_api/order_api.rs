use std::fmt::Debug;

use log::*;

use crate::{
    db_types::{NewOrder, Order, OrderId, OrderStatus},
    traits::{PaymentGatewayError, SettlementDatabase},
};

/// `OrderApi` covers the order lifecycle outside of settlement: checkout creation, status lookups
/// and administrative status changes. Moving an order from `pending` to `confirmed` is the
/// reconciler's job, not this API's.
pub struct OrderApi<B> {
    db: B,
}

impl<B> Debug for OrderApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OrderApi")
    }
}

impl<B> OrderApi<B> {
    pub fn new(db: B) -> Self {
        Self { db }
    }
}

impl<B> OrderApi<B>
where B: SettlementDatabase
{
    /// Create a new order at checkout. The caller provides the frozen subtotal; the total is
    /// computed once here and never recalculated. The order starts out `pending`/`pending` and is
    /// assigned the next reference number.
    pub async fn create_order(&self, order: NewOrder) -> Result<Order, PaymentGatewayError> {
        if order.subtotal.is_negative() || order.shipping_fee.is_negative() {
            return Err(PaymentGatewayError::InvalidAmount(format!(
                "subtotal {} / shipping fee {}",
                order.subtotal, order.shipping_fee
            )));
        }
        let order = self.db.insert_order(order).await?;
        debug!("🔄️📦️ Order {} created with total {}", order.order_number, order.total);
        Ok(order)
    }

    pub async fn order_by_id(&self, id: i64) -> Result<Option<Order>, PaymentGatewayError> {
        self.db.order_by_id(id).await
    }

    pub async fn order_by_order_id(&self, order_id: &OrderId) -> Result<Option<Order>, PaymentGatewayError> {
        self.db.order_by_order_id(order_id).await
    }

    pub async fn order_by_reference(&self, reference: &str) -> Result<Option<Order>, PaymentGatewayError> {
        self.db.order_by_reference(reference).await
    }

    /// Administrative status change (confirmed -> processing -> shipped -> delivered, or a
    /// cancellation). Terminal states may not be re-entered; the backend enforces the guard.
    pub async fn advance_status(
        &self,
        order_id: &OrderId,
        status: OrderStatus,
    ) -> Result<Order, PaymentGatewayError> {
        let order = self.db.update_order_status(order_id, status).await?;
        info!("🔄️📦️ Order {} is now {}", order.order_number, order.status);
        Ok(order)
    }
}
