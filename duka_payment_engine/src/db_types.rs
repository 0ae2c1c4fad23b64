use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
use dps_common::Cents;
use log::error;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use thiserror::Error;

use crate::helpers::new_order_id;

#[derive(Debug, Clone, Error)]
#[error("Invalid conversion: {0}")]
pub struct ConversionError(String);

//--------------------------------------        OrderId        --------------------------------------------------------
/// The opaque, globally unique identifier of an order. Assigned at checkout and never reused.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct OrderId(pub String);

impl FromStr for OrderId {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.to_string()))
    }
}

impl From<String> for OrderId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl Display for OrderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl OrderId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

//--------------------------------------     OrderStatus       --------------------------------------------------------
/// The fulfilment lifecycle of an order.
///
/// The settlement core only ever drives `pending -> confirmed`. All other transitions are
/// administrative and arrive via [`crate::OrderApi::advance_status`], which refuses to leave a
/// terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
    Refunded,
}

impl OrderStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled | OrderStatus::Refunded)
    }
}

impl Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Confirmed => "confirmed",
            OrderStatus::Processing => "processing",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
            OrderStatus::Refunded => "refunded",
        };
        write!(f, "{s}")
    }
}

impl FromStr for OrderStatus {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "confirmed" => Ok(Self::Confirmed),
            "processing" => Ok(Self::Processing),
            "shipped" => Ok(Self::Shipped),
            "delivered" => Ok(Self::Delivered),
            "cancelled" => Ok(Self::Cancelled),
            "refunded" => Ok(Self::Refunded),
            s => Err(ConversionError(format!("Invalid order status: {s}"))),
        }
    }
}

impl From<String> for OrderStatus {
    fn from(value: String) -> Self {
        value.parse().unwrap_or_else(|_| {
            error!("Invalid order status: {value}. But this conversion cannot fail. Defaulting to pending");
            OrderStatus::Pending
        })
    }
}

//--------------------------------------    PaymentStatus      --------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Paid,
    Failed,
    Refunded,
}

impl PaymentStatus {
    /// Whether the order can still accept a push-payment submission.
    pub fn awaits_payment(&self) -> bool {
        matches!(self, PaymentStatus::Pending | PaymentStatus::Failed)
    }
}

impl Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Paid => "paid",
            PaymentStatus::Failed => "failed",
            PaymentStatus::Refunded => "refunded",
        };
        write!(f, "{s}")
    }
}

//--------------------------------------    PaymentMethod      --------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    MobileMoney,
    Card,
    CashOnDelivery,
}

impl Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            PaymentMethod::MobileMoney => "mobile_money",
            PaymentMethod::Card => "card",
            PaymentMethod::CashOnDelivery => "cash_on_delivery",
        };
        write!(f, "{s}")
    }
}

//--------------------------------------        Order          --------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Order {
    /// Internal autoincrement key. Use `order_id` or `order_number` to refer to orders externally.
    pub id: i64,
    pub order_id: OrderId,
    /// Human-readable reference, monotonically assigned at creation (e.g. `DPS-00000042`). This is
    /// also the account reference the payer sees on their device during an STK push.
    pub order_number: String,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub payment_method: PaymentMethod,
    pub subtotal: Cents,
    pub shipping_fee: Cents,
    /// Frozen at creation. Always equals `subtotal + shipping_fee`.
    pub total: Cents,
    /// Correlation id of the most recent push-payment submission, if any.
    pub checkout_request_id: Option<String>,
    pub payer_phone: Option<String>,
    /// The gateway receipt number, set when a settlement confirms the order.
    pub provider_txid: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

//--------------------------------------       NewOrder        --------------------------------------------------------
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub order_id: OrderId,
    pub payment_method: PaymentMethod,
    pub subtotal: Cents,
    pub shipping_fee: Cents,
}

impl NewOrder {
    pub fn new(payment_method: PaymentMethod, subtotal: Cents, shipping_fee: Cents) -> Self {
        Self { order_id: OrderId(new_order_id()), payment_method, subtotal, shipping_fee }
    }

    pub fn total(&self) -> Cents {
        self.subtotal + self.shipping_fee
    }
}

//--------------------------------------    AttemptStatus      --------------------------------------------------------
/// Ledger entry state. `pending` transitions to exactly one of the terminal states, exactly once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum AttemptStatus {
    Pending,
    Success,
    Failed,
}

impl AttemptStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, AttemptStatus::Pending)
    }
}

impl Display for AttemptStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            AttemptStatus::Pending => "pending",
            AttemptStatus::Success => "success",
            AttemptStatus::Failed => "failed",
        };
        write!(f, "{s}")
    }
}

//--------------------------------------    PaymentAttempt     --------------------------------------------------------
/// One entry in the transaction ledger: a single push-payment submission for an order.
///
/// An order can accumulate several attempts (failed first try, user retries), but at most one of
/// them ever moves the order to `paid`.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct PaymentAttempt {
    pub id: i64,
    /// Internal id of the owning order.
    pub order_id: i64,
    /// Provider-issued correlation id. Globally unique and immutable once assigned.
    pub checkout_request_id: String,
    pub merchant_request_id: String,
    /// Equals the order total at submission time.
    pub amount: Cents,
    /// Canonical MSISDN the push was sent to.
    pub phone: String,
    pub status: AttemptStatus,
    pub result_code: Option<String>,
    pub result_desc: Option<String>,
    /// Provider receipt identifier. Present only on success.
    pub receipt: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

//--------------------------------------  NewPaymentAttempt    --------------------------------------------------------
#[derive(Debug, Clone)]
pub struct NewPaymentAttempt {
    pub order_id: i64,
    pub checkout_request_id: String,
    pub merchant_request_id: String,
    pub amount: Cents,
    pub phone: String,
}

impl NewPaymentAttempt {
    pub fn new(
        order_id: i64,
        checkout_request_id: String,
        merchant_request_id: String,
        amount: Cents,
        phone: String,
    ) -> Self {
        Self { order_id, checkout_request_id, merchant_request_id, amount, phone }
    }
}
