use chrono::{DateTime, Utc};
use dps_common::Cents;
use duka_payment_engine::db_types::{Order, OrderStatus, PaymentMethod, PaymentStatus};
use serde::{Deserialize, Serialize};

/// Checkout payload. The subtotal is the frozen cart total; cart arithmetic happens upstream.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutRequest {
    pub subtotal: Cents,
    #[serde(default = "default_payment_method")]
    pub payment_method: PaymentMethod,
}

fn default_payment_method() -> PaymentMethod {
    PaymentMethod::MobileMoney
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitPaymentRequest {
    /// The opaque order id handed out at checkout.
    pub order_id: String,
    /// The payer's phone number, in any of the accepted local formats.
    pub phone: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitPaymentResponse {
    pub order_number: String,
    pub checkout_request_id: String,
    pub merchant_request_id: String,
    pub amount: Cents,
}

/// The fixed acknowledgement the gateway expects at the callback URL, success or not.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallbackAck {
    #[serde(rename = "ResultCode")]
    pub result_code: i64,
    #[serde(rename = "ResultDesc")]
    pub result_desc: String,
}

impl CallbackAck {
    pub fn accepted() -> Self {
        Self { result_code: 0, result_desc: "Accepted".to_string() }
    }
}

/// The publicly surfaced order fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderStatusResult {
    pub order_number: String,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub payment_method: PaymentMethod,
    pub subtotal: Cents,
    pub shipping_fee: Cents,
    pub total: Cents,
    pub checkout_request_id: Option<String>,
    pub receipt: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Order> for OrderStatusResult {
    fn from(order: Order) -> Self {
        Self {
            order_number: order.order_number,
            status: order.status,
            payment_status: order.payment_status,
            payment_method: order.payment_method,
            subtotal: order.subtotal,
            shipping_fee: order.shipping_fee,
            total: order.total,
            checkout_request_id: order.checkout_request_id,
            receipt: order.provider_txid,
            created_at: order.created_at,
            updated_at: order.updated_at,
        }
    }
}
