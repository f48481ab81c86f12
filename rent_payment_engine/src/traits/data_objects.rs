use crate::db_types::{NewPayment, Payment, PaymentRequest, TenantBalance};

/// Everything the backend needs to settle a confirmed payment in one transaction.
#[derive(Debug, Clone)]
pub struct SettlementRequest {
    pub payment: NewPayment,
    /// Recorded on the matching payment request, if there is one.
    pub result_desc: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettlementResult {
    /// A new payment was recorded. `balance` is the tenant's ledger after the credit, if the payment was attributed
    /// to a tenant.
    Settled { payment: Payment, request: Option<PaymentRequest>, balance: Option<TenantBalance> },
    /// The receipt had already been settled. Nothing was credited.
    Duplicate { payment: Payment, request: Option<PaymentRequest> },
}

impl SettlementResult {
    pub fn payment(&self) -> &Payment {
        match self {
            Self::Settled { payment, .. } => payment,
            Self::Duplicate { payment, .. } => payment,
        }
    }

    pub fn is_duplicate(&self) -> bool {
        matches!(self, Self::Duplicate { .. })
    }
}
