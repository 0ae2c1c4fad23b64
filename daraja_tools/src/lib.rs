//! A thin client for the Safaricom Daraja (M-Pesa) API.
//!
//! The client covers exactly the two calls the payment server needs for the STK push flow:
//! 1. Fetching a short-lived OAuth bearer token ([`DarajaApi::authenticate`]).
//! 2. Submitting an STK push payment request ([`DarajaApi::stk_push`]).
//!
//! The asynchronous payment confirmation arrives on a webhook, so the callback payload types
//! ([`StkCallbackEnvelope`] and friends) live here too, next to the request types they mirror.

mod api;
mod config;
pub mod data_objects;
mod error;
pub mod helpers;

pub use api::DarajaApi;
pub use config::DarajaConfig;
pub use data_objects::{StkCallback, StkCallbackEnvelope, StkPushSubmission};
pub use error::DarajaApiError;
pub use helpers::{normalize_phone, PhoneFormatError};
