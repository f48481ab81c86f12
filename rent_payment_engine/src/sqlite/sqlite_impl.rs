//! `SqliteDatabase` is a concrete implementation of a rent payment engine backend.
//!
//! Unsurprisingly, it uses SQLite as the backend and implements all the traits defined in the [`crate::traits`]
//! module.
use std::fmt::Debug;

use chrono::Duration;
use log::*;
use sqlx::{migrate::Migrator, SqlitePool};

use super::db::{db_url, ledger, new_pool, payment_requests, payments, tenants};
use crate::{
    db_types::{NewPaymentRequest, NewTenant, Payment, PaymentRequest, Tenant, TenantBalance},
    traits::{
        PaymentGatewayDatabase,
        PaymentGatewayError,
        SettlementRequest,
        SettlementResult,
        TenantApiError,
        TenantManagement,
    },
};

/// The embedded schema migrations.
pub static MIGRATOR: Migrator = sqlx::migrate!("./src/sqlite/migrations");

pub const EXPIRED_REQUEST_DESC: &str = "Expired without callback";

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl SqliteDatabase {
    /// Creates a new database API object using the URL in `RPG_DATABASE_URL`.
    pub async fn new(max_connections: u32) -> Result<Self, sqlx::Error> {
        let url = db_url();
        SqliteDatabase::new_with_url(url.as_str(), max_connections).await
    }

    /// Creates a new database API object
    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        let pool = new_pool(url, max_connections).await?;
        trace!("🗃️ Created a new SQLite connection pool for {url}");
        Ok(Self { url: url.to_string(), pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Brings the schema up to date.
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        MIGRATOR.run(&self.pool).await?;
        info!("🗃️ Database migrations complete");
        Ok(())
    }
}

impl TenantManagement for SqliteDatabase {
    async fn fetch_tenant(&self, tenant_id: i64) -> Result<Option<Tenant>, TenantApiError> {
        let mut conn = self.pool.acquire().await?;
        let tenant = tenants::fetch_tenant(tenant_id, &mut conn).await?;
        Ok(tenant)
    }

    async fn insert_tenant(&self, tenant: NewTenant) -> Result<Tenant, TenantApiError> {
        let mut tx = self.pool.begin().await?;
        let tenant = tenants::insert_tenant(tenant, &mut tx).await?;
        tx.commit().await?;
        debug!("🗃️ Tenant #{} ({}) created", tenant.id, tenant.name);
        Ok(tenant)
    }

    async fn fetch_tenant_balance(&self, tenant_id: i64) -> Result<Option<TenantBalance>, TenantApiError> {
        let mut conn = self.pool.acquire().await?;
        let balance = tenants::fetch_balance(tenant_id, &mut conn).await?;
        Ok(balance)
    }

    async fn fetch_payments_for_tenant(&self, tenant_id: i64) -> Result<Vec<Payment>, TenantApiError> {
        let mut conn = self.pool.acquire().await?;
        let payments = payments::fetch_for_tenant(tenant_id, &mut conn).await?;
        Ok(payments)
    }

    async fn fetch_payment_request(&self, id: i64) -> Result<Option<PaymentRequest>, TenantApiError> {
        let mut conn = self.pool.acquire().await?;
        let request = payment_requests::fetch_by_id(id, &mut conn).await?;
        Ok(request)
    }

    async fn fetch_unassigned_payments(&self) -> Result<Vec<Payment>, TenantApiError> {
        let mut conn = self.pool.acquire().await?;
        let payments = payments::fetch_unassigned(&mut conn).await?;
        Ok(payments)
    }
}

impl PaymentGatewayDatabase for SqliteDatabase {
    fn url(&self) -> &str {
        self.url.as_str()
    }

    async fn insert_payment_request(&self, request: NewPaymentRequest) -> Result<PaymentRequest, PaymentGatewayError> {
        // `RETURNING` rows are only visible to other connections once the statement is finalised, which the
        // commit guarantees.
        let mut tx = self.pool.begin().await?;
        let request = payment_requests::insert(request, &mut tx).await?;
        tx.commit().await?;
        Ok(request)
    }

    async fn fetch_payment_request_by_checkout_id(
        &self,
        checkout_request_id: &str,
    ) -> Result<Option<PaymentRequest>, PaymentGatewayError> {
        let mut conn = self.pool.acquire().await?;
        let request = payment_requests::fetch_by_checkout_id(checkout_request_id, &mut conn).await?;
        Ok(request)
    }

    async fn fail_payment_request(
        &self,
        checkout_request_id: &str,
        result_desc: &str,
    ) -> Result<Option<PaymentRequest>, PaymentGatewayError> {
        let mut tx = self.pool.begin().await?;
        let request = payment_requests::fail_if_pending(checkout_request_id, result_desc, &mut tx).await?;
        tx.commit().await?;
        if let Some(r) = &request {
            debug!("🗃️ Payment request #{} [{checkout_request_id}] marked as Failed. {result_desc}", r.id);
        }
        Ok(request)
    }

    async fn settle_payment(&self, settlement: SettlementRequest) -> Result<SettlementResult, PaymentGatewayError> {
        let SettlementRequest { payment, result_desc } = settlement;
        let receipt = payment.receipt.clone();
        let checkout_id = payment.checkout_request_id.clone();
        let amount = payment.amount;
        let tenant_id = payment.tenant_id;
        let mut tx = self.pool.begin().await?;
        // The receipt insert comes first, so that it takes the write lock. A concurrent settlement of the same
        // receipt waits here and then sees the unique violation.
        let inserted = payments::insert(payment, &mut tx).await;
        let pending_completed = match &checkout_id {
            Some(id) => payment_requests::complete_if_pending(id, &result_desc, &mut tx).await?,
            None => None,
        };
        let request = match (&pending_completed, &checkout_id) {
            (Some(r), _) => Some(r.clone()),
            (None, Some(id)) => payment_requests::fetch_by_checkout_id(id, &mut tx).await?,
            (None, None) => None,
        };
        let result = match inserted {
            Ok(payment) => {
                if let Some(r) = request.as_ref().filter(|_| pending_completed.is_none()) {
                    warn!(
                        "🗃️ Payment {receipt} settles request #{} [{}], which is already {}. The request status is \
                         kept, but the payment is recorded. Please review.",
                        r.id, r.checkout_request_id, r.status
                    );
                }
                let balance = match tenant_id {
                    Some(id) => {
                        let balance = ledger::apply_success(id, amount, &mut tx).await?;
                        if balance.is_none() {
                            warn!("🗃️ Payment {receipt} is for tenant #{id}, who does not exist. The ledger is unchanged.");
                        }
                        balance
                    },
                    None => None,
                };
                SettlementResult::Settled { payment, request, balance }
            },
            Err(PaymentGatewayError::PaymentAlreadyExists(_)) => {
                let payment = payments::fetch_by_receipt(&receipt, &mut tx)
                    .await?
                    .ok_or_else(|| PaymentGatewayError::DatabaseError(format!("Payment {receipt} vanished")))?;
                SettlementResult::Duplicate { payment, request }
            },
            Err(e) => return Err(e),
        };
        tx.commit().await?;
        Ok(result)
    }

    async fn fetch_active_tenants_by_phone(&self, phones: &[String]) -> Result<Vec<Tenant>, PaymentGatewayError> {
        let mut conn = self.pool.acquire().await?;
        let tenants = tenants::fetch_active_by_phone(phones, &mut conn).await?;
        Ok(tenants)
    }

    async fn expire_stale_requests(&self, timeout: Duration) -> Result<Vec<PaymentRequest>, PaymentGatewayError> {
        let mut tx = self.pool.begin().await?;
        let expired = payment_requests::expire_pending(timeout, EXPIRED_REQUEST_DESC, &mut tx).await?;
        tx.commit().await?;
        Ok(expired)
    }

    async fn close(&mut self) -> Result<(), PaymentGatewayError> {
        self.pool.close().await;
        Ok(())
    }
}
