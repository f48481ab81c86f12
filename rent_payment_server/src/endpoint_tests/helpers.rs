use actix_web::{http::StatusCode, test, test::TestRequest, web, App};
use log::*;
use rent_payment_engine::{
    db_types::{Money, NewTenant, Tenant},
    events::EventProducers,
    test_utils::prepare_env::{prepare_test_env, random_db_path},
    traits::{PaymentGatewayDatabase, TenantManagement},
    PaymentFlowApi,
    SqliteDatabase,
    TenantApi,
};
use sqlx::{migrate::MigrateDatabase, Sqlite};

use super::mocks::MockPushClient;
use crate::{
    config::CallbackPeerPolicy,
    mpesa_routes::configure_stk_callback,
    routes::{InitiatePaymentRoute, PaymentRequestRoute, TenantBalanceRoute, TenantPaymentsRoute},
    server::json_config,
};

pub async fn new_database() -> SqliteDatabase {
    let url = random_db_path();
    prepare_test_env(&url).await;
    SqliteDatabase::new_with_url(&url, 5).await.expect("Error creating database")
}

pub async fn drop_database(mut db: SqliteDatabase) {
    let url = db.url().to_string();
    let _ = db.close().await;
    if let Err(e) = Sqlite::drop_database(&url).await {
        warn!("Failed to drop test database {url}: {e}");
    }
}

pub async fn add_tenant(db: &SqliteDatabase, name: &str, phone: &str, rent: i64) -> Tenant {
    db.insert_tenant(NewTenant::new(name, phone, Money::from(rent))).await.expect("Error inserting tenant")
}

/// Sends `req` to an app wired up like the real server, but backed by `db` and the given push client.
pub async fn send_request(
    db: &SqliteDatabase,
    push_client: MockPushClient,
    policy: CallbackPeerPolicy,
    req: TestRequest,
) -> (StatusCode, String) {
    let payments_api = PaymentFlowApi::new(db.clone(), push_client, EventProducers::default());
    let tenant_api = TenantApi::new(db.clone());
    let app = App::new()
        .app_data(web::Data::new(payments_api))
        .app_data(web::Data::new(tenant_api))
        .app_data(json_config())
        .configure(move |cfg| configure_stk_callback::<SqliteDatabase, MockPushClient>(cfg, policy))
        .service(
            web::scope("/api")
                .service(InitiatePaymentRoute::<SqliteDatabase, MockPushClient>::new())
                .service(TenantPaymentsRoute::<SqliteDatabase>::new())
                .service(TenantBalanceRoute::<SqliteDatabase>::new())
                .service(PaymentRequestRoute::<SqliteDatabase>::new()),
        );
    let service = test::init_service(app).await;
    debug!("Making request");
    let res = test::call_service(&service, req.to_request()).await;
    let status = res.status();
    let body = test::read_body(res).await;
    (status, String::from_utf8_lossy(&body).into_owned())
}
