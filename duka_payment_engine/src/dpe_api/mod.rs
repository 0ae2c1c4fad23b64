mod order_api;
mod settlement_api;

pub use order_api::OrderApi;
pub use settlement_api::{SettlementApi, SettlementNotice, SettlementOutcome};
