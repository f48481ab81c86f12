use actix_web::{
    error::ResponseError,
    http::{header::ContentType, StatusCode},
    HttpResponse,
};
use rent_payment_engine::{PaymentFlowError, PaymentGatewayError, TenantApiError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Could not initialize server. {0}")]
    InitializeError(String),
    #[error("An error occurred on the backend of the server. {0}")]
    BackendError(String),
    #[error("Could not read request body: {0}")]
    InvalidRequestBody(String),
    #[error("Could not read request path: {0}")]
    InvalidRequestPath(String),
    #[error("An I/O error happened in the server. {0}")]
    IOError(#[from] std::io::Error),
    #[error("Invalid server configuration. {0}")]
    ConfigurationError(String),
    #[error("UnspecifiedError. {0}")]
    Unspecified(String),
    #[error("The data was not found. {0}")]
    NoRecordFound(String),
    #[error("Request refused. {0}")]
    ForbiddenPeer(String),
    #[error("Could not authenticate with the payment gateway. {0}")]
    UpstreamAuth(String),
    #[error("The payment gateway rejected the request. {0}")]
    GatewayError(String),
}

impl ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequestBody(_) => StatusCode::BAD_REQUEST,
            Self::InvalidRequestPath(_) => StatusCode::BAD_REQUEST,
            Self::NoRecordFound(_) => StatusCode::NOT_FOUND,
            Self::ForbiddenPeer(_) => StatusCode::FORBIDDEN,
            Self::UpstreamAuth(_) => StatusCode::BAD_GATEWAY,
            Self::GatewayError(_) => StatusCode::BAD_GATEWAY,
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

impl From<PaymentFlowError> for ServerError {
    fn from(e: PaymentFlowError) -> Self {
        match e {
            PaymentFlowError::InvalidAmount(_) | PaymentFlowError::InvalidPhone(_) => {
                Self::InvalidRequestBody(e.to_string())
            },
            PaymentFlowError::TenantNotFound(id) => Self::NoRecordFound(format!("Tenant {id} does not exist")),
            PaymentFlowError::UpstreamAuth(s) => Self::UpstreamAuth(s),
            PaymentFlowError::GatewayRequestFailed { status, payload } => match status {
                Some(code) => Self::GatewayError(format!("Status {code}. {payload}")),
                None => Self::GatewayError(payload),
            },
            PaymentFlowError::DatabaseError(s) => Self::BackendError(format!("Database error: {s}")),
        }
    }
}

impl From<TenantApiError> for ServerError {
    fn from(e: TenantApiError) -> Self {
        match e {
            TenantApiError::TenantNotFound(id) => Self::NoRecordFound(format!("Tenant {id} does not exist")),
            TenantApiError::InvalidTenant(s) => Self::InvalidRequestBody(s),
            TenantApiError::DatabaseError(s) => Self::BackendError(format!("Database error: {s}")),
        }
    }
}

impl From<PaymentGatewayError> for ServerError {
    fn from(e: PaymentGatewayError) -> Self {
        Self::BackendError(e.to_string())
    }
}
