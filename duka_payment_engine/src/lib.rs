//! Duka Payment Engine
//!
//! The engine holds the invariant-bearing core of the payment flow: the transaction ledger, the
//! settlement reconciler and the order state machine. It is gateway-agnostic; the Daraja client
//! lives in its own crate and the server converts gateway callbacks into [`SettlementNotice`]
//! values before they reach this code.
//!
//! The crate is split into:
//! 1. Database management ([`mod@db`]). Sqlite is the supported backend. Access goes through the
//!    [`traits::SettlementDatabase`] trait; the data types it traffics in are public in
//!    [`db_types`].
//! 2. The engine public API ([`mod@dpe_api`]): [`OrderApi`] for the order lifecycle and
//!    [`SettlementApi`] for recording push-payment submissions and reconciling provider callbacks.
//!
//! When a settlement confirms an order, an `OrderPaidEvent` is published through the hooks in
//! [`events`], so integrations can react (notifications, fulfilment) without the engine knowing
//! about them.
mod db;

pub mod db_types;
pub mod dpe_api;
pub mod events;
pub mod helpers;
pub mod traits;

#[cfg(any(feature = "test_utils", test))]
pub mod test_utils;

#[cfg(feature = "sqlite")]
pub use db::sqlite::{self, SqliteDatabase};
pub use dpe_api::{OrderApi, SettlementApi, SettlementNotice, SettlementOutcome};
pub use traits::{PaymentGatewayError, SettlementDatabase, SettlementPatch, SettlementUpdate};
