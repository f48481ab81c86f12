//! # Rent payment gateway server
//! This module hosts the server code for the rent payment gateway. It is responsible for:
//! Accepting payment requests for tenants and relaying them to M-Pesa as STK push prompts.
//! Receiving the asynchronous payment callbacks from Daraja and handing them to the payment engine for settlement.
//! Serving tenant ledgers and payment history.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more information.
//!
//! ## Routes
//! The server exposes the following routes:
//! * `/health`: A health check route that returns a 200 OK response.
//! * `POST /api/mpesa/stk/push`: Prompts a tenant's handset for a rent payment.
//! * `POST /api/mpesa/stk-callback`: The Daraja callback route.
//! * `GET /api/tenants/{id}/payments`, `GET /api/tenants/{id}/balance`: Tenant payment history and ledger.
//! * `GET /api/payment_requests/{id}`: The status of a payment request.
//! * `GET /api/payments/unassigned`: Payments that could not be attributed to a tenant.

pub mod cli;
pub mod config;
pub mod data_objects;
pub mod errors;
pub mod expiry_worker;
pub mod helpers;
pub mod integrations;
pub mod mpesa_routes;
pub mod routes;
pub mod server;

#[cfg(test)]
mod endpoint_tests;
