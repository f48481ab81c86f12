//! Rent Payment Engine
//!
//! The rent payment engine lets a landlord request rent from a tenant's mobile-money wallet and reconciles the
//! tenant's rent ledger when the payment network reports the outcome. It is gateway-agnostic: the network is reached
//! through the [`PushGateway`] trait, and its notifications arrive as [`PaymentNotification`]s.
//!
//! The library is divided into two main sections:
//! 1. Backend contracts ([`mod@traits`]) and the SQLite implementation of them ([`SqliteDatabase`]). You should never
//!    need to access the database directly. The exception is the data types used in the database. These are defined
//!    in the [`db_types`] module and are public.
//! 2. The payment engine public API ([`PaymentFlowApi`] and [`TenantApi`]). Payment requests are issued and
//!    notifications settled through [`PaymentFlowApi`]; ledgers and payment history are read through [`TenantApi`].
//!
//! Settlements and failed requests are also published as events (see [`mod@events`]), so that other components can
//! react to them without touching the core.
pub mod db_types;
pub mod events;
mod rpe_api;
#[cfg(feature = "sqlite")]
pub mod sqlite;
pub mod traits;

#[cfg(any(feature = "test_utils", test))]
pub mod test_utils;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteDatabase;
pub use rpe_api::{
    errors::PaymentFlowError,
    notification::{CallbackOutcome, ConfirmedTransfer, NotificationOutcome, PaymentNotification},
    payment_flow_api::{PaymentFlowApi, DEFAULT_COUNTRY_CODE},
    tenant_api::TenantApi,
};
pub use traits::{
    PaymentGatewayDatabase,
    PaymentGatewayError,
    PushAccepted,
    PushGateway,
    PushGatewayError,
    PushRequest,
    TenantApiError,
    TenantManagement,
};
