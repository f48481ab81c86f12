use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
pub use rpg_common::Money;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[error("Invalid status: {0}")]
pub struct ConversionError(String);

//--------------------------------------        Tenant         ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tenant {
    pub id: i64,
    pub name: String,
    pub phone: String,
    /// The rent due for the current period
    pub rent: Money,
    pub rent_paid: Money,
    /// Always `max(rent - rent_paid, 0)`
    pub rent_balance: Money,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewTenant {
    pub name: String,
    pub phone: String,
    pub rent: Money,
    pub active: bool,
}

impl NewTenant {
    pub fn new<S: Into<String>>(name: S, phone: S, rent: Money) -> Self {
        Self { name: name.into(), phone: phone.into(), rent, active: true }
    }

    pub fn inactive(mut self) -> Self {
        self.active = false;
        self
    }
}

//--------------------------------------     TenantBalance     ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TenantBalance {
    #[sqlx(rename = "id")]
    pub tenant_id: i64,
    pub rent: Money,
    pub rent_paid: Money,
    pub rent_balance: Money,
}

impl From<&Tenant> for TenantBalance {
    fn from(t: &Tenant) -> Self {
        Self { tenant_id: t.id, rent: t.rent, rent_paid: t.rent_paid, rent_balance: t.rent_balance }
    }
}

//-------------------------------------- PaymentRequestStatus  ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum PaymentRequestStatus {
    /// The push was accepted by the gateway and we are waiting for the callback.
    Pending,
    /// The gateway confirmed the payment.
    Completed,
    /// The customer declined, the push timed out, or no callback arrived in time.
    Failed,
}

impl PaymentRequestStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }
}

impl Display for PaymentRequestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentRequestStatus::Pending => write!(f, "Pending"),
            PaymentRequestStatus::Completed => write!(f, "Completed"),
            PaymentRequestStatus::Failed => write!(f, "Failed"),
        }
    }
}

impl FromStr for PaymentRequestStatus {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(Self::Pending),
            "Completed" => Ok(Self::Completed),
            "Failed" => Ok(Self::Failed),
            s => Err(ConversionError(format!("Invalid payment request status: {s}"))),
        }
    }
}

//--------------------------------------    PaymentRequest     ---------------------------------------------------------
/// The local record of an STK push that the gateway accepted.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequest {
    pub id: i64,
    pub tenant_id: i64,
    pub amount: Money,
    /// International form, digits only
    pub phone: String,
    /// The gateway's `CheckoutRequestID`. Callbacks are correlated on this key.
    pub checkout_request_id: String,
    pub merchant_request_id: String,
    pub status: PaymentRequestStatus,
    pub result_desc: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewPaymentRequest {
    pub tenant_id: i64,
    pub amount: Money,
    pub phone: String,
    pub checkout_request_id: String,
    pub merchant_request_id: String,
}

//--------------------------------------     PaymentStatus     ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum PaymentStatus {
    Success,
    Failed,
    Pending,
}

impl Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentStatus::Success => write!(f, "Success"),
            PaymentStatus::Failed => write!(f, "Failed"),
            PaymentStatus::Pending => write!(f, "Pending"),
        }
    }
}

impl FromStr for PaymentStatus {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Success" => Ok(Self::Success),
            "Failed" => Ok(Self::Failed),
            "Pending" => Ok(Self::Pending),
            s => Err(ConversionError(format!("Invalid payment status: {s}"))),
        }
    }
}

//--------------------------------------        Payment        ---------------------------------------------------------
/// An immutable settlement record. There is exactly one of these per gateway receipt.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    pub id: i64,
    /// `None` if the payment could not be attributed to a tenant.
    pub tenant_id: Option<i64>,
    pub checkout_request_id: Option<String>,
    pub amount: Money,
    pub phone: String,
    /// The gateway receipt number, e.g. `NLJ7RT61SV`
    pub receipt: String,
    pub transaction_date: DateTime<Utc>,
    pub status: PaymentStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewPayment {
    pub tenant_id: Option<i64>,
    pub checkout_request_id: Option<String>,
    pub amount: Money,
    pub phone: String,
    pub receipt: String,
    pub transaction_date: DateTime<Utc>,
}
