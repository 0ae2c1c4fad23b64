//! Small helpers with no better home.

/// Generate a fresh opaque order id: 32 hex characters of randomness.
pub fn new_order_id() -> String {
    let bytes: u128 = rand::random();
    format!("{bytes:032x}")
}
