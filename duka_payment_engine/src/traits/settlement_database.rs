use thiserror::Error;

use crate::db_types::{
    AttemptStatus, NewOrder, NewPaymentAttempt, Order, OrderId, OrderStatus, PaymentAttempt,
};

/// This trait defines the behaviour a storage backend must provide to support the settlement core.
///
/// This includes:
/// * Creating and fetching orders
/// * Maintaining the transaction ledger of push-payment attempts
/// * The conditional state transitions (ledger entry pending -> terminal, order pending -> paid)
///   that keep callback handling idempotent.
#[allow(async_fn_in_trait)]
pub trait SettlementDatabase: Clone {
    /// The URL of the database
    fn url(&self) -> &str;

    /// Insert a new order and assign its monotonically increasing reference number, in a single
    /// atomic transaction. The order starts out `pending`/`pending`.
    async fn insert_order(&self, order: NewOrder) -> Result<Order, PaymentGatewayError>;

    async fn order_by_id(&self, id: i64) -> Result<Option<Order>, PaymentGatewayError>;

    async fn order_by_order_id(&self, order_id: &OrderId) -> Result<Option<Order>, PaymentGatewayError>;

    /// Fetch an order by its human-readable reference (e.g. `DPS-00000042`).
    async fn order_by_reference(&self, reference: &str) -> Result<Option<Order>, PaymentGatewayError>;

    /// Record a new ledger entry for a push-payment submission and stamp the correlation id and
    /// payer phone onto the owning order, atomically.
    ///
    /// Fails with [`PaymentGatewayError::DuplicateCorrelationId`] if an entry with the same
    /// correlation id already exists. Correlation ids are provider-global and immutable.
    async fn insert_payment_attempt(&self, attempt: NewPaymentAttempt) -> Result<PaymentAttempt, PaymentGatewayError>;

    async fn attempt_by_correlation_id(&self, correlation_id: &str)
        -> Result<Option<PaymentAttempt>, PaymentGatewayError>;

    /// Move a ledger entry out of `pending` into the terminal state described by `patch`.
    ///
    /// The write is a conditional update on `status = 'pending'`, never read-then-write, so two
    /// concurrent deliveries of the same callback cannot both apply. An entry that is already
    /// terminal is reported as [`SettlementUpdate::AlreadyTerminal`] and left untouched.
    async fn settle_attempt(
        &self,
        correlation_id: &str,
        patch: SettlementPatch,
    ) -> Result<SettlementUpdate, PaymentGatewayError>;

    /// Conditionally advance an order to `paid`/`confirmed` and record the gateway receipt.
    ///
    /// The update only applies while `payment_status = 'pending'`; `None` is returned when the
    /// guard does not hold (the order was already settled, or a stray duplicate arrived late).
    async fn confirm_order_payment(&self, order_pk: i64, receipt: &str) -> Result<Option<Order>, PaymentGatewayError>;

    /// Administrative status change. Refuses to move an order out of a terminal state.
    async fn update_order_status(&self, order_id: &OrderId, status: OrderStatus)
        -> Result<Order, PaymentGatewayError>;

    /// Closes the database connection.
    async fn close(&mut self) -> Result<(), PaymentGatewayError> {
        Ok(())
    }
}

//--------------------------------------   SettlementPatch     --------------------------------------------------------
/// The terminal state to apply to a ledger entry, with the provider-supplied result details.
#[derive(Debug, Clone)]
pub struct SettlementPatch {
    pub status: AttemptStatus,
    pub result_code: String,
    pub result_desc: String,
    pub receipt: Option<String>,
}

impl SettlementPatch {
    pub fn success(result_code: String, result_desc: String, receipt: String) -> Self {
        Self { status: AttemptStatus::Success, result_code, result_desc, receipt: Some(receipt) }
    }

    pub fn failure(result_code: String, result_desc: String) -> Self {
        Self { status: AttemptStatus::Failed, result_code, result_desc, receipt: None }
    }
}

//--------------------------------------   SettlementUpdate    --------------------------------------------------------
/// Result of a conditional ledger update.
#[derive(Debug, Clone)]
pub enum SettlementUpdate {
    /// The entry transitioned out of `pending` as part of this call.
    Applied(PaymentAttempt),
    /// The entry was already terminal; nothing was changed.
    AlreadyTerminal(PaymentAttempt),
    /// No ledger entry matches the correlation id.
    NotFound,
}

//------------------------------------   PaymentGatewayError   --------------------------------------------------------
#[derive(Debug, Clone, Error)]
pub enum PaymentGatewayError {
    #[error("Internal database error: {0}")]
    DatabaseError(String),
    #[error("Order {0} does not exist")]
    OrderNotFound(OrderId),
    #[error("The requested order (internal id {0}) does not exist")]
    OrderIdNotFound(i64),
    #[error("A payment attempt with correlation id {0} already exists")]
    DuplicateCorrelationId(String),
    #[error("No payment attempt matches correlation id {0}")]
    AttemptNotFound(String),
    #[error("Monetary amounts may not be negative: {0}")]
    InvalidAmount(String),
    #[error("Order {order_id} is in terminal state {status} and cannot be modified")]
    OrderModificationForbidden { order_id: OrderId, status: OrderStatus },
}

impl From<sqlx::Error> for PaymentGatewayError {
    fn from(e: sqlx::Error) -> Self {
        PaymentGatewayError::DatabaseError(e.to_string())
    }
}
