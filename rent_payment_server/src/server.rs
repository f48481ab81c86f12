use std::time::Duration;

use actix_web::{dev::Server, http::KeepAlive, middleware::Logger, web, App, HttpServer};
use daraja_tools::DarajaApi;
use log::*;
use rent_payment_engine::{events::EventProducers, PaymentFlowApi, SqliteDatabase, TenantApi};

use crate::{
    config::{CallbackPeerPolicy, ServerConfig},
    errors::ServerError,
    expiry_worker::start_expiry_worker,
    integrations::daraja::{create_reconciliation_event_handlers, DarajaGateway},
    mpesa_routes::configure_stk_callback,
    routes::{
        health,
        InitiatePaymentRoute,
        PaymentRequestRoute,
        TenantBalanceRoute,
        TenantPaymentsRoute,
        UnassignedPaymentsRoute,
    },
};

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let db = SqliteDatabase::new_with_url(&config.database_url, 25)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    db.run_migrations().await.map_err(|e| ServerError::InitializeError(format!("Could not migrate database. {e}")))?;
    let api = DarajaApi::new(config.daraja.clone()).map_err(|e| ServerError::InitializeError(e.to_string()))?;
    info!("🚀️ Using the Daraja {} environment at {}", config.daraja.environment, config.daraja.base_url);
    let gateway = DarajaGateway::new(api);
    let handlers = create_reconciliation_event_handlers();
    let producers = handlers.producers();
    handlers.start_handlers().await;
    if let Some(timeout) = config.pending_request_timeout {
        let api = PaymentFlowApi::new(db.clone(), gateway.clone(), producers.clone())
            .with_country_code(config.daraja.country_code.clone());
        // The worker runs for the lifetime of the process
        let _handle = start_expiry_worker(api, timeout);
    }
    let srv = create_server_instance(config, db, gateway, producers)?;
    srv.await.map_err(|e| ServerError::Unspecified(e.to_string()))
}

pub fn create_server_instance(
    config: ServerConfig,
    db: SqliteDatabase,
    gateway: DarajaGateway,
    producers: EventProducers,
) -> Result<Server, ServerError> {
    let policy = CallbackPeerPolicy::from_config(&config);
    let country_code = config.daraja.country_code.clone();
    let srv = HttpServer::new(move || {
        let payments_api = PaymentFlowApi::new(db.clone(), gateway.clone(), producers.clone())
            .with_country_code(country_code.clone());
        let tenant_api = TenantApi::new(db.clone());
        let policy = policy.clone();
        let api_scope = web::scope("/api")
            .service(InitiatePaymentRoute::<SqliteDatabase, DarajaGateway>::new())
            .service(TenantPaymentsRoute::<SqliteDatabase>::new())
            .service(TenantBalanceRoute::<SqliteDatabase>::new())
            .service(PaymentRequestRoute::<SqliteDatabase>::new())
            .service(UnassignedPaymentsRoute::<SqliteDatabase>::new());
        App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("rpg::access_log"))
            .app_data(web::Data::new(payments_api))
            .app_data(web::Data::new(tenant_api))
            .app_data(json_config())
            .service(health)
            // The callback scope must be registered before the wider /api scope
            .configure(move |cfg| configure_stk_callback::<SqliteDatabase, DarajaGateway>(cfg, policy))
            .service(api_scope)
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((config.host.as_str(), config.port))?
    .run();
    Ok(srv)
}

/// Malformed JSON bodies get the same `{"error": ...}` treatment as every other client error.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req| {
        debug!("💻️ Could not deserialize request body. {err}");
        ServerError::InvalidRequestBody(err.to_string()).into()
    })
}
