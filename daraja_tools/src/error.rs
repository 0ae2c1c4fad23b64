use thiserror::Error;

#[derive(Debug, Error)]
pub enum DarajaApiError {
    #[error("The Daraja client is misconfigured. {0}")]
    Configuration(String),
    #[error("Could not reach the Daraja gateway. {0}")]
    Network(String),
    #[error("The Daraja gateway did not respond within the timeout window.")]
    Timeout,
    #[error("Unexpected response from the Daraja gateway. {0}")]
    Protocol(String),
    #[error("The gateway rejected the payment request. Code {code}: {details}")]
    Rejected { code: String, details: String },
}
