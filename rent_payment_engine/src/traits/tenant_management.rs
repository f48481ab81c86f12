use thiserror::Error;

use crate::db_types::{NewTenant, Payment, PaymentRequest, Tenant, TenantBalance};

/// Read access to tenants, their ledgers and their payment history.
///
/// Tenant records are owned by the wider property-management system. The engine only needs to read them, and to
/// seed them in tests.
#[allow(async_fn_in_trait)]
pub trait TenantManagement {
    async fn fetch_tenant(&self, tenant_id: i64) -> Result<Option<Tenant>, TenantApiError>;

    async fn insert_tenant(&self, tenant: NewTenant) -> Result<Tenant, TenantApiError>;

    async fn fetch_tenant_balance(&self, tenant_id: i64) -> Result<Option<TenantBalance>, TenantApiError>;

    /// All payments attributed to the tenant, most recent transaction first.
    async fn fetch_payments_for_tenant(&self, tenant_id: i64) -> Result<Vec<Payment>, TenantApiError>;

    async fn fetch_payment_request(&self, id: i64) -> Result<Option<PaymentRequest>, TenantApiError>;

    /// Payments that could not be attributed to a tenant, most recent transaction first.
    async fn fetch_unassigned_payments(&self) -> Result<Vec<Payment>, TenantApiError>;
}

#[derive(Debug, Clone, Error)]
pub enum TenantApiError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("The tenant with id {0} does not exist")]
    TenantNotFound(i64),
    #[error("Invalid tenant record: {0}")]
    InvalidTenant(String),
}

impl From<sqlx::Error> for TenantApiError {
    fn from(e: sqlx::Error) -> Self {
        TenantApiError::DatabaseError(e.to_string())
    }
}
