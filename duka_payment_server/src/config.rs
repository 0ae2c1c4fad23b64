//! Server configuration
//!
//! Everything is driven by environment variables, with sane defaults for local development:
//!
//! * `DPS_HOST` / `DPS_PORT`: bind address (default `127.0.0.1:8480`).
//! * `DPS_DATABASE_URL`: sqlite URL for the settlement database.
//! * `DPS_SHIPPING_FEE`: flat shipping fee in whole shillings (default 200).
//! * `DPS_MPESA_*`: Daraja gateway credentials. See [`daraja_tools::DarajaConfig`].
use std::env;

use daraja_tools::DarajaConfig;
use dps_common::Cents;
use duka_payment_engine::sqlite::db_url;
use log::*;

const DEFAULT_DPS_HOST: &str = "127.0.0.1";
const DEFAULT_DPS_PORT: u16 = 8480;
const DEFAULT_SHIPPING_FEE_SHILLINGS: i64 = 200;

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    /// Flat shipping fee added to every order at checkout.
    pub shipping_fee: Cents,
    pub daraja: DarajaConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_DPS_HOST.to_string(),
            port: DEFAULT_DPS_PORT,
            database_url: String::default(),
            shipping_fee: Cents::from_shillings(DEFAULT_SHIPPING_FEE_SHILLINGS),
            daraja: DarajaConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let host = env::var("DPS_HOST").ok().unwrap_or_else(|| DEFAULT_DPS_HOST.into());
        let port = env::var("DPS_PORT")
            .map(|s| {
                s.parse::<u16>().unwrap_or_else(|e| {
                    error!(
                        "🪛️ {s} is not a valid port for DPS_PORT. {e} Using the default, {DEFAULT_DPS_PORT}, instead."
                    );
                    DEFAULT_DPS_PORT
                })
            })
            .ok()
            .unwrap_or(DEFAULT_DPS_PORT);
        let database_url = db_url();
        let shipping_fee = env::var("DPS_SHIPPING_FEE")
            .map(|s| {
                s.parse::<i64>().map(Cents::from_shillings).unwrap_or_else(|e| {
                    error!(
                        "🪛️ {s} is not a valid amount for DPS_SHIPPING_FEE. {e} Using the default, \
                         {DEFAULT_SHIPPING_FEE_SHILLINGS}, instead."
                    );
                    Cents::from_shillings(DEFAULT_SHIPPING_FEE_SHILLINGS)
                })
            })
            .ok()
            .unwrap_or_else(|| Cents::from_shillings(DEFAULT_SHIPPING_FEE_SHILLINGS));
        let daraja = DarajaConfig::new_from_env_or_default();
        Self { host, port, database_url, shipping_fee, daraja }
    }
}

/// The per-request slice of the configuration that route handlers need.
#[derive(Clone, Debug)]
pub struct ServerOptions {
    pub shipping_fee: Cents,
    pub country_prefix: String,
}

impl From<&ServerConfig> for ServerOptions {
    fn from(config: &ServerConfig) -> Self {
        Self { shipping_fee: config.shipping_fee, country_prefix: config.daraja.country_prefix.clone() }
    }
}
