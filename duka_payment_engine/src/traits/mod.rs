//! Interface contracts for payment engine database backends.
//!
//! [`SettlementDatabase`] defines everything a storage backend must expose for the settlement core
//! to work: order persistence, the transaction ledger, and the two conditional (compare-and-swap)
//! updates that make callback handling idempotent under concurrent delivery.

mod settlement_database;

pub use settlement_database::{PaymentGatewayError, SettlementDatabase, SettlementPatch, SettlementUpdate};
