//! # Duka payment server
//!
//! The HTTP surface of the payment settlement core. It is responsible for:
//! * Creating orders at checkout and surfacing their status.
//! * Submitting STK push requests to the Daraja gateway on a shopper's behalf.
//! * Receiving the asynchronous settlement callbacks from the gateway and feeding them to the
//!   reconciler in `duka_payment_engine`.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more
//! information.
//!
//! ## Routes
//! * `GET /health`: liveness check.
//! * `POST /orders`: create a new order.
//! * `GET /orders/{order_number}`: order and payment status.
//! * `POST /payments/stk`: submit an STK push for an order.
//! * `POST /payments/callback`: the Daraja result callback. Always acknowledged.

pub mod config;
pub mod data_objects;
pub mod errors;
pub mod integrations;
pub mod routes;
pub mod server;

#[cfg(test)]
mod endpoint_tests;
