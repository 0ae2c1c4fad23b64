use serde::{Deserialize, Serialize};

use crate::db_types::{Order, PaymentAttempt};

/// Fired exactly once per order, when its payment is confirmed. Duplicate callback deliveries do
/// not re-fire this event because the underlying state transition is a conditional update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderPaidEvent {
    pub order: Order,
}

impl OrderPaidEvent {
    pub fn new(order: Order) -> Self {
        Self { order }
    }
}

/// Fired when the gateway reports a push-payment attempt as failed. The order itself stays
/// payable; the shopper can retry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentFailedEvent {
    pub attempt: PaymentAttempt,
}

impl PaymentFailedEvent {
    pub fn new(attempt: PaymentAttempt) -> Self {
        Self { attempt }
    }
}
