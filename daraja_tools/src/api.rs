use std::{sync::Arc, time::Duration};

use chrono::Utc;
use dps_common::Cents;
use log::*;
use reqwest::{header::AUTHORIZATION, Client};

use crate::{
    config::DarajaConfig,
    data_objects::{AccessTokenResponse, StkPushRequest, StkPushResponse, StkPushSubmission},
    DarajaApiError,
};

/// Hard ceiling on any single gateway call. A hung token fetch or push submission must fail fast
/// rather than pin the calling request handler.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Clone)]
pub struct DarajaApi {
    config: DarajaConfig,
    client: Arc<Client>,
}

impl DarajaApi {
    pub fn new(config: DarajaConfig) -> Result<Self, DarajaApiError> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| DarajaApiError::Configuration(e.to_string()))?;
        Ok(Self { config, client: Arc::new(client) })
    }

    pub fn config(&self) -> &DarajaConfig {
        &self.config
    }

    /// Exchange the configured consumer key and secret for a short-lived bearer token.
    ///
    /// Tokens are deliberately not cached. Every push submission performs a fresh fetch, which keeps
    /// the client stateless at the cost of one extra round trip per payment.
    pub async fn authenticate(&self) -> Result<String, DarajaApiError> {
        let key = self.config.consumer_key.reveal();
        let secret = self.config.consumer_secret.reveal();
        if key.is_empty() || secret.is_empty() {
            return Err(DarajaApiError::Configuration(
                "DPS_MPESA_CONSUMER_KEY or DPS_MPESA_CONSUMER_SECRET is empty. Check your environment file.".into(),
            ));
        }
        let credential = base64::encode(format!("{key}:{secret}"));
        let url = format!("{}/oauth/v1/generate?grant_type=client_credentials", self.config.base_url);
        trace!("🏦️ Fetching OAuth token from {url}");
        let response = self
            .client
            .get(&url)
            .header(AUTHORIZATION, format!("Basic {credential}"))
            .send()
            .await
            .map_err(transport_error)?;
        let status = response.status();
        let body = response.text().await.map_err(transport_error)?;
        if body.trim().is_empty() {
            return Err(DarajaApiError::Protocol(format!(
                "Empty response from the OAuth endpoint (HTTP {status}). Wrong credentials or base URL?"
            )));
        }
        let token: AccessTokenResponse = serde_json::from_str(&body)
            .map_err(|e| DarajaApiError::Protocol(format!("Could not parse OAuth response: {e}. Raw payload: {body}")))?;
        token
            .access_token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| DarajaApiError::Protocol(format!("No access_token in OAuth response: {body}")))
    }

    /// Submit an STK push request, prompting the payer's device to authorize the charge.
    ///
    /// `phone` must already be in canonical MSISDN form (see [`crate::helpers::normalize_phone`]).
    /// The gateway deals in whole shillings, so `amount` is truncated to its integer unit.
    ///
    /// On synchronous acceptance the returned [`StkPushSubmission`] carries the correlation id that
    /// the asynchronous callback will later be matched on. A non-zero response code maps to
    /// [`DarajaApiError::Rejected`] and the caller records nothing.
    pub async fn stk_push(
        &self,
        amount: Cents,
        phone: &str,
        reference: &str,
        description: &str,
    ) -> Result<StkPushSubmission, DarajaApiError> {
        let token = self.authenticate().await?;
        let timestamp = Utc::now().format("%Y%m%d%H%M%S").to_string();
        let password =
            base64::encode(format!("{}{}{timestamp}", self.config.shortcode, self.config.passkey.reveal()));
        let request = StkPushRequest {
            business_short_code: self.config.shortcode.clone(),
            password,
            timestamp,
            transaction_type: "CustomerPayBillOnline".to_string(),
            amount: amount.whole_shillings(),
            party_a: phone.to_string(),
            party_b: self.config.shortcode.clone(),
            phone_number: phone.to_string(),
            callback_url: self.config.callback_url.clone(),
            account_reference: reference.to_string(),
            transaction_desc: description.to_string(),
        };
        let url = format!("{}/mpesa/stkpush/v1/processrequest", self.config.base_url);
        debug!("🏦️ Submitting STK push of {amount} for {reference}");
        let response =
            self.client.post(&url).bearer_auth(&token).json(&request).send().await.map_err(transport_error)?;
        let body = response.text().await.map_err(transport_error)?;
        let reply: StkPushResponse = serde_json::from_str(&body)
            .map_err(|e| DarajaApiError::Protocol(format!("Could not parse STK push response: {e}. Raw payload: {body}")))?;
        match reply.response_code.as_deref() {
            Some("0") => {
                let checkout_request_id = reply.checkout_request_id.ok_or_else(|| {
                    DarajaApiError::Protocol(format!("Accepted STK push response without CheckoutRequestID: {body}"))
                })?;
                let merchant_request_id = reply.merchant_request_id.unwrap_or_default();
                info!("🏦️ STK push for {reference} accepted. Correlation id: {checkout_request_id}");
                Ok(StkPushSubmission { checkout_request_id, merchant_request_id })
            },
            Some(code) => Err(DarajaApiError::Rejected {
                code: code.to_string(),
                details: reply.response_description.or(reply.customer_message).unwrap_or_else(|| body.clone()),
            }),
            None => Err(DarajaApiError::Rejected {
                code: reply.error_code.unwrap_or_else(|| "unknown".to_string()),
                details: reply.error_message.unwrap_or(body),
            }),
        }
    }
}

fn transport_error(e: reqwest::Error) -> DarajaApiError {
    if e.is_timeout() {
        DarajaApiError::Timeout
    } else {
        DarajaApiError::Network(e.to_string())
    }
}

#[cfg(test)]
mod test {
    use dps_common::Secret;

    use super::*;

    #[tokio::test]
    async fn empty_credentials_fail_before_any_network_call() {
        let _ = env_logger::try_init();
        // base_url points nowhere reachable; the call must fail on configuration alone.
        let config = DarajaConfig {
            base_url: "http://127.0.0.1:1".to_string(),
            consumer_key: Secret::new(String::new()),
            consumer_secret: Secret::new("secret".to_string()),
            ..Default::default()
        };
        let api = DarajaApi::new(config).unwrap();
        let err = api.authenticate().await.expect_err("expected a configuration error");
        assert!(matches!(err, DarajaApiError::Configuration(_)), "got {err:?}");
    }
}
