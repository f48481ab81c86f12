use rpg_common::Money;
use thiserror::Error;

use crate::traits::{PaymentGatewayError, PushGatewayError, TenantApiError};

/// Why a payment request could not be issued.
#[derive(Debug, Clone, Error)]
pub enum PaymentFlowError {
    #[error("The amount must be positive, but was {0}")]
    InvalidAmount(Money),
    #[error("Invalid phone number: '{0}'")]
    InvalidPhone(String),
    #[error("The tenant with id {0} does not exist")]
    TenantNotFound(i64),
    #[error("Could not authenticate with the payment gateway. {0}")]
    UpstreamAuth(String),
    #[error("The payment gateway rejected the request. Status: {status:?}. {payload}")]
    GatewayRequestFailed { status: Option<u16>, payload: String },
    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<PushGatewayError> for PaymentFlowError {
    fn from(e: PushGatewayError) -> Self {
        match e {
            PushGatewayError::UpstreamAuth(s) => Self::UpstreamAuth(s),
            PushGatewayError::RequestFailed { status, payload } => Self::GatewayRequestFailed { status, payload },
        }
    }
}

impl From<PaymentGatewayError> for PaymentFlowError {
    fn from(e: PaymentGatewayError) -> Self {
        match e {
            PaymentGatewayError::TenantNotFound(id) => Self::TenantNotFound(id),
            e => Self::DatabaseError(e.to_string()),
        }
    }
}

impl From<TenantApiError> for PaymentFlowError {
    fn from(e: TenantApiError) -> Self {
        match e {
            TenantApiError::TenantNotFound(id) => Self::TenantNotFound(id),
            e => Self::DatabaseError(e.to_string()),
        }
    }
}
