use std::fmt::Debug;

use log::*;
use serde::{Deserialize, Serialize};

use crate::{
    db_types::{NewPaymentAttempt, Order, PaymentAttempt},
    events::{EventProducers, OrderPaidEvent, PaymentFailedEvent},
    traits::{PaymentGatewayError, SettlementDatabase, SettlementPatch, SettlementUpdate},
};

/// `SettlementApi` is the reconciler. It records push-payment submissions in the transaction
/// ledger and applies provider settlement notices against it.
///
/// Every notice-processing path ends in an outcome the caller can ack; the caller decides what to
/// log, but never what to reply (the provider always gets the same acknowledgement).
pub struct SettlementApi<B> {
    db: B,
    producers: EventProducers,
}

impl<B> Debug for SettlementApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SettlementApi")
    }
}

impl<B> SettlementApi<B> {
    pub fn new(db: B, producers: EventProducers) -> Self {
        Self { db, producers }
    }
}

impl<B> SettlementApi<B>
where B: SettlementDatabase
{
    /// Record an accepted push submission as a pending ledger entry. The amount is the order
    /// total at submission time. Fails with [`PaymentGatewayError::DuplicateCorrelationId`] if
    /// the provider handed out a correlation id we have already seen.
    pub async fn record_submission(&self, attempt: NewPaymentAttempt) -> Result<PaymentAttempt, PaymentGatewayError> {
        let attempt = self.db.insert_payment_attempt(attempt).await?;
        info!(
            "🔄️💰️ Push submission {} recorded for order #{}, amount {}",
            attempt.checkout_request_id, attempt.order_id, attempt.amount
        );
        Ok(attempt)
    }

    /// Apply a settlement notice against the ledger.
    ///
    /// * No correlation id: nothing to reconcile, the notice is discarded.
    /// * Unknown correlation id: logged and discarded. This also covers the window where a
    ///   callback arrives before the submission transaction commits; the provider will retry.
    /// * Ledger entry already terminal: a duplicate delivery, no-op.
    /// * Result code `"0"`: the entry moves to `success` and the order is conditionally advanced
    ///   to `paid`/`confirmed`. Both writes are conditional updates, so of two concurrent
    ///   duplicate deliveries at most one performs each transition.
    /// * Any other result code: the entry moves to `failed`. The order is untouched and remains
    ///   payable.
    pub async fn process_settlement(&self, notice: SettlementNotice) -> Result<SettlementOutcome, PaymentGatewayError> {
        let Some(correlation_id) = notice.correlation_id.clone() else {
            warn!("🔄️💰️ Settlement notice without a correlation id. Discarding. {notice:?}");
            return Ok(SettlementOutcome::Discarded);
        };
        let patch = if notice.is_success() {
            SettlementPatch::success(
                notice.result_code.clone(),
                notice.result_desc.clone(),
                notice.receipt.clone().unwrap_or_default(),
            )
        } else {
            SettlementPatch::failure(notice.result_code.clone(), notice.result_desc.clone())
        };
        let update = self.db.settle_attempt(&correlation_id, patch).await?;
        let attempt = match update {
            SettlementUpdate::NotFound => {
                warn!("🔄️💰️ Settlement notice for unknown correlation id {correlation_id}. Discarding.");
                return Ok(SettlementOutcome::UnknownCorrelation);
            },
            SettlementUpdate::AlreadyTerminal(attempt) => {
                debug!(
                    "🔄️💰️ Duplicate settlement notice for {correlation_id}. Ledger entry is already {}.",
                    attempt.status
                );
                return Ok(SettlementOutcome::AlreadySettled);
            },
            SettlementUpdate::Applied(attempt) => attempt,
        };
        if notice.is_success() {
            match self.db.confirm_order_payment(attempt.order_id, &attempt.receipt.clone().unwrap_or_default()).await?
            {
                Some(order) => {
                    info!(
                        "🔄️💰️ Order {} paid in full via {}. Receipt: {}",
                        order.order_number,
                        correlation_id,
                        order.provider_txid.as_deref().unwrap_or("-")
                    );
                    self.call_order_paid_hook(&order).await;
                    Ok(SettlementOutcome::PaymentConfirmed(order))
                },
                None => {
                    // Ledger moved to success but the order was not pending anymore. A stray
                    // duplicate with a second correlation id can land here.
                    warn!("🔄️💰️ Success notice {correlation_id} applied to the ledger, but order #{} was not awaiting payment.", attempt.order_id);
                    Ok(SettlementOutcome::PaymentRecorded(attempt))
                },
            }
        } else {
            info!(
                "🔄️💰️ Payment attempt {correlation_id} failed with code {}: {}",
                notice.result_code, notice.result_desc
            );
            self.call_payment_failed_hook(&attempt).await;
            Ok(SettlementOutcome::PaymentFailed(attempt))
        }
    }

    async fn call_order_paid_hook(&self, order: &Order) {
        for emitter in &self.producers.order_paid_producer {
            debug!("🔄️💰️ Notifying order paid hook subscribers");
            let event = OrderPaidEvent::new(order.clone());
            emitter.publish_event(event).await;
        }
    }

    async fn call_payment_failed_hook(&self, attempt: &PaymentAttempt) {
        for emitter in &self.producers.payment_failed_producer {
            debug!("🔄️💰️ Notifying payment failed hook subscribers");
            let event = PaymentFailedEvent::new(attempt.clone());
            emitter.publish_event(event).await;
        }
    }
}

//-------------------------------------   SettlementNotice     --------------------------------------------------------
/// A provider-agnostic settlement result. The server converts the raw gateway callback into one
/// of these before it reaches the engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettlementNotice {
    /// The provider correlation id (`CheckoutRequestID` for Daraja). Absent in malformed or
    /// out-of-band notices.
    pub correlation_id: Option<String>,
    pub result_code: String,
    pub result_desc: String,
    /// The provider receipt number. Only present on success.
    pub receipt: Option<String>,
}

impl SettlementNotice {
    pub fn is_success(&self) -> bool {
        self.result_code == "0"
    }
}

//-------------------------------------   SettlementOutcome    --------------------------------------------------------
/// What a settlement notice ended up doing. All outcomes are acked to the provider; the
/// distinction only matters for logging and tests.
#[derive(Debug, Clone)]
pub enum SettlementOutcome {
    /// The notice carried no correlation id and was dropped.
    Discarded,
    /// No ledger entry matches the correlation id.
    UnknownCorrelation,
    /// The ledger entry was already terminal. Duplicate delivery.
    AlreadySettled,
    /// The entry moved to `success` and the order is now paid and confirmed.
    PaymentConfirmed(Order),
    /// The entry moved to `success` but the order had already been settled by another attempt.
    PaymentRecorded(PaymentAttempt),
    /// The entry moved to `failed`. The order is untouched.
    PaymentFailed(PaymentAttempt),
}
