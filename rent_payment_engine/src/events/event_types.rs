use serde::{Deserialize, Serialize};

use crate::db_types::{Payment, PaymentRequest, TenantBalance};

/// A new payment has been recorded. Duplicate deliveries of the same receipt do not produce this event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentSettledEvent {
    pub payment: Payment,
    /// The tenant's ledger after the credit. `None` for payments that could not be attributed to a tenant.
    pub balance: Option<TenantBalance>,
}

impl PaymentSettledEvent {
    pub fn new(payment: Payment, balance: Option<TenantBalance>) -> Self {
        Self { payment, balance }
    }

    pub fn is_unassigned(&self) -> bool {
        self.payment.tenant_id.is_none()
    }
}

/// A payment request has moved to `Failed`, either because the gateway said so or because it expired.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentRequestFailedEvent {
    pub request: PaymentRequest,
}

impl PaymentRequestFailedEvent {
    pub fn new(request: PaymentRequest) -> Self {
        Self { request }
    }
}
