//! # Backend contracts
//!
//! The traits a storage backend (and the outbound gateway) must implement to drive the payment engine.
//!
//! * [`PaymentGatewayDatabase`] is the write side. It records payment requests and settles confirmed payments
//!   atomically.
//! * [`TenantManagement`] is the read side. It exposes tenants, balances and payment history.
//! * [`PushGateway`] sends payment prompts to a subscriber's handset.
mod data_objects;
mod payment_gateway_database;
mod push_gateway;
mod tenant_management;

pub use data_objects::{SettlementRequest, SettlementResult};
pub use payment_gateway_database::{PaymentGatewayDatabase, PaymentGatewayError};
pub use push_gateway::{PushAccepted, PushGateway, PushGatewayError, PushRequest};
pub use tenant_management::{TenantApiError, TenantManagement};
