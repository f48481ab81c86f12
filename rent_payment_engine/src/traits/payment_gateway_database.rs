use chrono::Duration;
use thiserror::Error;

use crate::{
    db_types::{NewPaymentRequest, PaymentRequest, Tenant},
    traits::{
        data_objects::{SettlementRequest, SettlementResult},
        TenantApiError,
        TenantManagement,
    },
};

/// The write side of the payment engine.
///
/// Implementations must guarantee that [`settle_payment`](Self::settle_payment) is atomic, and that a given receipt
/// is settled at most once even when the same notification is processed concurrently.
#[allow(async_fn_in_trait)]
pub trait PaymentGatewayDatabase: Clone + TenantManagement {
    /// The URL of the database
    fn url(&self) -> &str;

    /// Records a payment request that the gateway has accepted. The request starts in `Pending` status.
    ///
    /// Fails with [`PaymentGatewayError::PaymentRequestAlreadyExists`] if the checkout request id is already known.
    async fn insert_payment_request(&self, request: NewPaymentRequest) -> Result<PaymentRequest, PaymentGatewayError>;

    async fn fetch_payment_request_by_checkout_id(
        &self,
        checkout_request_id: &str,
    ) -> Result<Option<PaymentRequest>, PaymentGatewayError>;

    /// Moves a `Pending` request to `Failed`, recording the reason.
    ///
    /// Returns the updated request, or `None` if there is no such request or it was not `Pending`. Terminal states
    /// never change.
    async fn fail_payment_request(
        &self,
        checkout_request_id: &str,
        result_desc: &str,
    ) -> Result<Option<PaymentRequest>, PaymentGatewayError>;

    /// Records a confirmed payment, in a single atomic transaction:
    /// * The payment is inserted. If the receipt already exists, the request is completed (if it was still
    ///   `Pending`) and [`SettlementResult::Duplicate`] is returned. Nothing else changes.
    /// * The matching payment request, if any, is moved from `Pending` to `Completed`. A request that has already
    ///   `Failed` keeps its status.
    /// * If the payment is attributed to a tenant, the amount is credited to the tenant's ledger.
    async fn settle_payment(&self, settlement: SettlementRequest) -> Result<SettlementResult, PaymentGatewayError>;

    /// Returns the active tenants whose phone matches any of `phones` exactly.
    async fn fetch_active_tenants_by_phone(&self, phones: &[String]) -> Result<Vec<Tenant>, PaymentGatewayError>;

    /// Fails every `Pending` request older than `timeout`, and returns them.
    async fn expire_stale_requests(&self, timeout: Duration) -> Result<Vec<PaymentRequest>, PaymentGatewayError>;

    /// Closes the database connection.
    async fn close(&mut self) -> Result<(), PaymentGatewayError> {
        Ok(())
    }
}

#[derive(Debug, Clone, Error)]
pub enum PaymentGatewayError {
    #[error("We have an internal problem with the database. {0}")]
    DatabaseError(String),
    #[error("A payment request with checkout request id {0} already exists")]
    PaymentRequestAlreadyExists(String),
    #[error("A payment with receipt {0} already exists")]
    PaymentAlreadyExists(String),
    #[error("The tenant with id {0} does not exist")]
    TenantNotFound(i64),
    #[error("Invalid payment request: {0}")]
    InvalidRequest(String),
}

impl From<sqlx::Error> for PaymentGatewayError {
    fn from(e: sqlx::Error) -> Self {
        PaymentGatewayError::DatabaseError(e.to_string())
    }
}

impl From<TenantApiError> for PaymentGatewayError {
    fn from(e: TenantApiError) -> Self {
        match e {
            TenantApiError::TenantNotFound(id) => Self::TenantNotFound(id),
            TenantApiError::DatabaseError(s) => Self::DatabaseError(s),
            TenantApiError::InvalidTenant(s) => Self::InvalidRequest(s),
        }
    }
}
