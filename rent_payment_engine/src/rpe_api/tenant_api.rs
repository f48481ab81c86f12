//! Read access to tenant ledgers and payment history.
use std::fmt::Debug;

use log::trace;

use crate::{
    db_types::{NewTenant, Payment, PaymentRequest, Tenant, TenantBalance},
    traits::{TenantApiError, TenantManagement},
};

pub struct TenantApi<B> {
    db: B,
}

impl<B: Debug> Debug for TenantApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "TenantApi ({:?})", self.db)
    }
}

impl<B> TenantApi<B>
where B: TenantManagement
{
    pub fn new(db: B) -> Self {
        Self { db }
    }

    pub fn db(&self) -> &B {
        &self.db
    }

    pub async fn tenant(&self, tenant_id: i64) -> Result<Option<Tenant>, TenantApiError> {
        self.db.fetch_tenant(tenant_id).await
    }

    pub async fn create_tenant(&self, tenant: NewTenant) -> Result<Tenant, TenantApiError> {
        self.db.insert_tenant(tenant).await
    }

    /// The tenant's rent ledger. Fails with [`TenantApiError::TenantNotFound`] for unknown tenants.
    pub async fn balance(&self, tenant_id: i64) -> Result<TenantBalance, TenantApiError> {
        self.db.fetch_tenant_balance(tenant_id).await?.ok_or(TenantApiError::TenantNotFound(tenant_id))
    }

    /// The tenant's payments, most recent transaction first. Fails with [`TenantApiError::TenantNotFound`] for
    /// unknown tenants, so that callers can tell "no payments yet" apart from "no such tenant".
    pub async fn payments_for_tenant(&self, tenant_id: i64) -> Result<Vec<Payment>, TenantApiError> {
        if self.db.fetch_tenant(tenant_id).await?.is_none() {
            return Err(TenantApiError::TenantNotFound(tenant_id));
        }
        let payments = self.db.fetch_payments_for_tenant(tenant_id).await?;
        trace!("🧾️ Fetched {} payments for tenant #{tenant_id}", payments.len());
        Ok(payments)
    }

    pub async fn payment_request(&self, id: i64) -> Result<Option<PaymentRequest>, TenantApiError> {
        self.db.fetch_payment_request(id).await
    }

    pub async fn unassigned_payments(&self) -> Result<Vec<Payment>, TenantApiError> {
        self.db.fetch_unassigned_payments().await
    }
}
