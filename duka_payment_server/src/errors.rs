use actix_web::{
    error::ResponseError,
    http::{header::ContentType, StatusCode},
    HttpResponse,
};
use daraja_tools::{DarajaApiError, PhoneFormatError};
use duka_payment_engine::PaymentGatewayError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Could not initialize server. {0}")]
    InitializeError(String),
    #[error("An error occurred on the backend of the server. {0}")]
    BackendError(String),
    #[error("Payload deserialization error")]
    CouldNotDeserializePayload,
    #[error("Could not read request body: {0}")]
    InvalidRequestBody(String),
    #[error("An I/O error happened in the server. {0}")]
    IOError(#[from] std::io::Error),
    #[error("Invalid server configuration. {0}")]
    ConfigurationError(String),
    #[error("UnspecifiedError. {0}")]
    Unspecified(String),
    #[error("The data was not found. {0}")]
    NoRecordFound(String),
    #[error("Invalid phone number. {0}")]
    InvalidPhoneNumber(String),
    #[error("The payment gateway rejected the request. {0}")]
    PaymentRejected(String),
    #[error("The payment gateway could not be reached. {0}")]
    GatewayUnavailable(String),
    #[error("The payment gateway timed out.")]
    GatewayTimeout,
}

impl ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::CouldNotDeserializePayload => StatusCode::BAD_REQUEST,
            Self::InvalidRequestBody(_) => StatusCode::BAD_REQUEST,
            Self::InvalidPhoneNumber(_) => StatusCode::BAD_REQUEST,
            Self::PaymentRejected(_) => StatusCode::BAD_REQUEST,
            Self::NoRecordFound(_) => StatusCode::NOT_FOUND,
            Self::GatewayUnavailable(_) => StatusCode::BAD_GATEWAY,
            Self::GatewayTimeout => StatusCode::GATEWAY_TIMEOUT,
            Self::InitializeError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BackendError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::IOError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ConfigurationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unspecified(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code())
            .insert_header(ContentType::json())
            .body(serde_json::json!({ "error": self.to_string() }).to_string())
    }
}

impl From<PhoneFormatError> for ServerError {
    fn from(e: PhoneFormatError) -> Self {
        ServerError::InvalidPhoneNumber(e.to_string())
    }
}

impl From<DarajaApiError> for ServerError {
    fn from(e: DarajaApiError) -> Self {
        match e {
            DarajaApiError::Configuration(m) => ServerError::ConfigurationError(m),
            DarajaApiError::Timeout => ServerError::GatewayTimeout,
            DarajaApiError::Network(m) => ServerError::GatewayUnavailable(m),
            DarajaApiError::Protocol(m) => ServerError::GatewayUnavailable(m),
            DarajaApiError::Rejected { code, details } => {
                ServerError::PaymentRejected(format!("Code {code}: {details}"))
            },
        }
    }
}

impl From<PaymentGatewayError> for ServerError {
    fn from(e: PaymentGatewayError) -> Self {
        match e {
            PaymentGatewayError::OrderNotFound(_) |
            PaymentGatewayError::OrderIdNotFound(_) |
            PaymentGatewayError::AttemptNotFound(_) => ServerError::NoRecordFound(e.to_string()),
            PaymentGatewayError::InvalidAmount(_) | PaymentGatewayError::OrderModificationForbidden { .. } => {
                ServerError::InvalidRequestBody(e.to_string())
            },
            PaymentGatewayError::DuplicateCorrelationId(_) | PaymentGatewayError::DatabaseError(_) => {
                ServerError::BackendError(e.to_string())
            },
        }
    }
}
