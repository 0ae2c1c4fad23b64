use dps_common::Secret;
use log::*;

const DEFAULT_BASE_URL: &str = "https://sandbox.safaricom.co.ke";
const DEFAULT_SHORTCODE: &str = "174379";
const DEFAULT_COUNTRY_PREFIX: &str = "254";

#[derive(Debug, Clone, Default)]
pub struct DarajaConfig {
    /// Base URL of the Daraja API, without a trailing slash. e.g. "https://api.safaricom.co.ke"
    pub base_url: String,
    pub consumer_key: Secret<String>,
    pub consumer_secret: Secret<String>,
    /// The paybill / till number payments are made against.
    pub shortcode: String,
    pub passkey: Secret<String>,
    /// Publicly reachable URL that Daraja will POST the asynchronous payment result to.
    pub callback_url: String,
    /// Country dialling prefix used when normalizing payer phone numbers.
    pub country_prefix: String,
}

impl DarajaConfig {
    pub fn new_from_env_or_default() -> Self {
        let base_url = std::env::var("DPS_MPESA_BASE_URL").unwrap_or_else(|_| {
            warn!("🏦️ DPS_MPESA_BASE_URL not set, using the sandbox URL");
            DEFAULT_BASE_URL.to_string()
        });
        let consumer_key = Secret::new(std::env::var("DPS_MPESA_CONSUMER_KEY").unwrap_or_else(|_| {
            warn!("🏦️ DPS_MPESA_CONSUMER_KEY not set. Payment submissions will fail until it is configured.");
            String::default()
        }));
        let consumer_secret = Secret::new(std::env::var("DPS_MPESA_CONSUMER_SECRET").unwrap_or_else(|_| {
            warn!("🏦️ DPS_MPESA_CONSUMER_SECRET not set. Payment submissions will fail until it is configured.");
            String::default()
        }));
        let shortcode = std::env::var("DPS_MPESA_SHORTCODE").unwrap_or_else(|_| {
            warn!("🏦️ DPS_MPESA_SHORTCODE not set, using the sandbox shortcode");
            DEFAULT_SHORTCODE.to_string()
        });
        let passkey = Secret::new(std::env::var("DPS_MPESA_PASSKEY").unwrap_or_else(|_| {
            warn!("🏦️ DPS_MPESA_PASSKEY not set, using a (probably useless) empty passkey");
            String::default()
        }));
        let callback_url = std::env::var("DPS_MPESA_CALLBACK_URL").unwrap_or_else(|_| {
            warn!("🏦️ DPS_MPESA_CALLBACK_URL not set. The gateway will have nowhere to deliver payment results.");
            String::default()
        });
        let country_prefix =
            std::env::var("DPS_MPESA_COUNTRY_PREFIX").unwrap_or_else(|_| DEFAULT_COUNTRY_PREFIX.to_string());
        Self { base_url, consumer_key, consumer_secret, shortcode, passkey, callback_url, country_prefix }
    }
}
