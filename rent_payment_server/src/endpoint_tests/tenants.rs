use actix_web::{http::StatusCode, test, test::TestRequest, web, web::ServiceConfig, App};
use chrono::{TimeZone, Utc};
use rent_payment_engine::{
    db_types::{Money, Payment, PaymentStatus, Tenant, TenantBalance},
    TenantApi,
};
use serde_json::{json, Value};

use super::mocks::MockTenantStore;
use crate::routes::{PaymentRequestRoute, TenantBalanceRoute, TenantPaymentsRoute, UnassignedPaymentsRoute};

async fn get_request(path: &str, configure: fn(&mut ServiceConfig)) -> (StatusCode, Value) {
    let app = test::init_service(App::new().configure(configure)).await;
    let req = TestRequest::get().uri(path).to_request();
    let res = test::call_service(&app, req).await;
    let status = res.status();
    let body = test::read_body(res).await;
    (status, serde_json::from_slice(&body).unwrap_or(Value::Null))
}

#[actix_web::test]
async fn fetch_balance() {
    let _ = env_logger::try_init();
    let (status, body) = get_request("/tenants/1/balance", configure).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"tenantId": 1, "rent": 10000, "rentPaid": 4000, "rentBalance": 6000}));
}

#[actix_web::test]
async fn fetch_balance_for_unknown_tenant() {
    let _ = env_logger::try_init();
    let (status, body) = get_request("/tenants/99/balance", configure).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "The data was not found. Tenant 99 does not exist");
}

#[actix_web::test]
async fn fetch_payments() {
    let _ = env_logger::try_init();
    let (status, body) = get_request("/tenants/1/payments", configure).await;
    assert_eq!(status, StatusCode::OK);
    let payments = body.as_array().unwrap();
    assert_eq!(payments.len(), 2);
    assert_eq!(payments[0]["receipt"], "SAB3XYZ0K2");
    assert_eq!(payments[0]["tenantId"], 1);
    assert_eq!(payments[0]["transactionDate"], "2024-03-01T09:15:00Z");
    assert_eq!(payments[1]["receipt"], "NLJ7RT61SV");
    assert_eq!(payments[1]["status"], "Success");
}

#[actix_web::test]
async fn fetch_payments_for_unknown_tenant() {
    let _ = env_logger::try_init();
    let (status, _) = get_request("/tenants/99/payments", configure).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn fetch_unassigned_payments() {
    let _ = env_logger::try_init();
    let (status, body) = get_request("/payments/unassigned", configure).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["tenantId"], Value::Null);
    assert_eq!(body[0]["receipt"], "QWE1RTY2UI");
}

#[actix_web::test]
async fn fetch_unknown_payment_request() {
    let _ = env_logger::try_init();
    let (status, body) = get_request("/payment_requests/5", configure).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].as_str().unwrap().contains("Payment request 5"));
}

#[actix_web::test]
async fn non_numeric_ids_are_rejected() {
    let _ = env_logger::try_init();
    let (status, _) = get_request("/tenants/alice/balance", configure).await;
    assert!(status.is_client_error());
}

fn configure(cfg: &mut ServiceConfig) {
    let mut store = MockTenantStore::new();
    store.expect_fetch_tenant().returning(|id| Ok((id == 1).then(tenant)));
    store.expect_fetch_tenant_balance().returning(|id| Ok((id == 1).then(|| TenantBalance::from(&tenant()))));
    store.expect_fetch_payments_for_tenant().returning(|_| Ok(payments_response()));
    store.expect_fetch_unassigned_payments().returning(|| Ok(vec![unassigned_payment()]));
    store.expect_fetch_payment_request().returning(|_| Ok(None));
    let tenant_api = TenantApi::new(store);
    cfg.service(TenantBalanceRoute::<MockTenantStore>::new())
        .service(TenantPaymentsRoute::<MockTenantStore>::new())
        .service(PaymentRequestRoute::<MockTenantStore>::new())
        .service(UnassignedPaymentsRoute::<MockTenantStore>::new())
        .app_data(web::Data::new(tenant_api));
}

fn tenant() -> Tenant {
    Tenant {
        id: 1,
        name: "Alice".to_string(),
        phone: "0712345678".to_string(),
        rent: Money::from(10_000),
        rent_paid: Money::from(4_000),
        rent_balance: Money::from(6_000),
        active: true,
        created_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        updated_at: Utc.with_ymd_and_hms(2024, 3, 1, 9, 15, 0).unwrap(),
    }
}

// Mock response to `fetch_payments_for_tenant`, newest first
fn payments_response() -> Vec<Payment> {
    vec![
        Payment {
            id: 2,
            tenant_id: Some(1),
            checkout_request_id: Some("ws_CO_010320240915001".to_string()),
            amount: Money::from(1_500),
            phone: "254712345678".to_string(),
            receipt: "SAB3XYZ0K2".to_string(),
            transaction_date: Utc.with_ymd_and_hms(2024, 3, 1, 9, 15, 0).unwrap(),
            status: PaymentStatus::Success,
            created_at: Utc.with_ymd_and_hms(2024, 3, 1, 9, 15, 2).unwrap(),
        },
        Payment {
            id: 1,
            tenant_id: Some(1),
            checkout_request_id: Some("ws_CO_010220241030001".to_string()),
            amount: Money::from(2_500),
            phone: "254712345678".to_string(),
            receipt: "NLJ7RT61SV".to_string(),
            transaction_date: Utc.with_ymd_and_hms(2024, 2, 1, 10, 30, 0).unwrap(),
            status: PaymentStatus::Success,
            created_at: Utc.with_ymd_and_hms(2024, 2, 1, 10, 30, 1).unwrap(),
        },
    ]
}

fn unassigned_payment() -> Payment {
    Payment {
        id: 3,
        tenant_id: None,
        checkout_request_id: Some("ws_CO_unknown".to_string()),
        amount: Money::from(700),
        phone: "254799000111".to_string(),
        receipt: "QWE1RTY2UI".to_string(),
        transaction_date: Utc.with_ymd_and_hms(2024, 3, 2, 8, 0, 0).unwrap(),
        status: PaymentStatus::Success,
        created_at: Utc.with_ymd_and_hms(2024, 3, 2, 8, 0, 1).unwrap(),
    }
}
