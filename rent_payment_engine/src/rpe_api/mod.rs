//! # Rent payment engine public API
//!
//! * [`payment_flow_api`] issues payment requests and reconciles gateway notifications against them. This is where
//!   settlement happens.
//! * [`tenant_api`] is the read side: tenants' balances, payment history and payment request status.
//!
//! The other submodules are the supporting types.
//!
//! # API usage
//!
//! An API instance is created by supplying a database backend that implements the backend traits the API needs
//! (and, for the payment flow, a push gateway).
//!
//! ```rust,ignore
//! use rent_payment_engine::{SqliteDatabase, TenantApi};
//! let db = SqliteDatabase::new_with_url(...).await?;
//! // SqliteDatabase implements TenantManagement
//! let api = TenantApi::new(db);
//! let balance = api.balance(tenant_id).await?;
//! ```
pub mod errors;
pub mod notification;
pub mod payment_flow_api;
pub mod tenant_api;
