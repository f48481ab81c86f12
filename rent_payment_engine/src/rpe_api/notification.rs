//! The gateway-neutral form of an asynchronous payment notification, and what became of it.
use chrono::{DateTime, Utc};
use rpg_common::Money;

use crate::db_types::{Payment, PaymentRequest, TenantBalance};

/// A payment result reported by the gateway for a previously issued request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentNotification {
    pub checkout_request_id: String,
    pub merchant_request_id: String,
    pub result_code: i64,
    pub result_desc: String,
    pub outcome: NotificationOutcome,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationOutcome {
    /// The customer declined, the push timed out, or the debit failed (`ResultCode != 0`).
    Declined,
    /// Money moved.
    Confirmed(ConfirmedTransfer),
    /// `ResultCode == 0`, but the transaction details could not be read.
    Unreadable(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmedTransfer {
    pub receipt: String,
    pub amount: Money,
    pub phone: String,
    pub transaction_date: DateTime<Utc>,
}

/// What processing a notification did. Every variant is acknowledged to the gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackOutcome {
    /// A new payment was recorded. `request` is `None` if the notification matched no known request, and `balance`
    /// is `None` if the payment could not be attributed to a tenant.
    Settled { payment: Payment, request: Option<PaymentRequest>, balance: Option<TenantBalance> },
    /// The receipt had already been recorded. Nothing was credited.
    Duplicate { payment: Payment, request: Option<PaymentRequest> },
    /// The matching `Pending` request was moved to `Failed`.
    RequestFailed(PaymentRequest),
    /// A failure was reported for a request that is unknown or no longer `Pending`. Nothing changed.
    FailureIgnored { checkout_request_id: String },
    /// The notification could not be interpreted. Nothing changed.
    Malformed(String),
}

impl CallbackOutcome {
    /// The description sent back to the gateway in the acknowledgement.
    pub fn ack_description(&self) -> &'static str {
        match self {
            CallbackOutcome::Settled { .. } | CallbackOutcome::RequestFailed(_) => "Callback processed",
            CallbackOutcome::Duplicate { .. } => "Already processed",
            CallbackOutcome::FailureIgnored { .. } | CallbackOutcome::Malformed(_) => "Callback received",
        }
    }
}
