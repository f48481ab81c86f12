#![allow(dead_code)]

use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
    Mutex,
};

use chrono::{TimeZone, Utc};
use log::*;
use rent_payment_engine::{
    db_types::{Money, NewTenant, Tenant},
    events::EventProducers,
    test_utils::prepare_env::{prepare_test_env, random_db_path},
    ConfirmedTransfer,
    NotificationOutcome,
    PaymentFlowApi,
    PaymentGatewayDatabase,
    PaymentNotification,
    PushAccepted,
    PushGateway,
    PushGatewayError,
    PushRequest,
    SqliteDatabase,
    TenantManagement,
};
use sqlx::{migrate::MigrateDatabase, Sqlite};

pub type Api = PaymentFlowApi<SqliteDatabase, FakeGateway>;

/// Accepts every push (unless told to fail) and hands out sequential checkout request ids.
#[derive(Clone, Default)]
pub struct FakeGateway {
    calls: Arc<AtomicUsize>,
    requests: Arc<Mutex<Vec<PushRequest>>>,
    fail_with: Arc<Mutex<Option<PushGatewayError>>>,
}

impl FakeGateway {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_request(&self) -> Option<PushRequest> {
        self.requests.lock().unwrap().last().cloned()
    }

    pub fn fail_with(&self, err: PushGatewayError) {
        *self.fail_with.lock().unwrap() = Some(err);
    }
}

impl PushGateway for FakeGateway {
    async fn send_push(&self, request: PushRequest) -> Result<PushAccepted, PushGatewayError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some(e) = self.fail_with.lock().unwrap().clone() {
            return Err(e);
        }
        self.requests.lock().unwrap().push(request);
        Ok(PushAccepted {
            checkout_request_id: format!("ws_CO_2024010112000{n:04}"),
            merchant_request_id: format!("29115-34620561-{n}"),
            customer_message: "Success. Request accepted for processing".into(),
        })
    }
}

pub async fn setup() -> Api {
    setup_with_producers(EventProducers::default()).await
}

pub async fn setup_with_producers(producers: EventProducers) -> Api {
    let url = random_db_path();
    prepare_test_env(&url).await;
    let db = SqliteDatabase::new_with_url(&url, 5).await.expect("Error creating database");
    PaymentFlowApi::new(db, FakeGateway::default(), producers)
}

pub async fn tear_down(api: Api) {
    let url = api.db().url().to_string();
    let mut db = api.db().clone();
    drop(api);
    if let Err(e) = db.close().await {
        error!("🚀️ Failed to close database: {e}");
    }
    if let Err(e) = Sqlite::drop_database(&url).await {
        warn!("🚀️ Failed to drop test database {url}: {e}");
    }
}

pub async fn add_tenant(api: &Api, name: &str, phone: &str, rent: i64) -> Tenant {
    api.db().insert_tenant(NewTenant::new(name, phone, Money::from(rent))).await.expect("Error inserting tenant")
}

pub fn success(checkout_request_id: &str, receipt: &str, amount: i64, phone: &str) -> PaymentNotification {
    PaymentNotification {
        checkout_request_id: checkout_request_id.to_string(),
        merchant_request_id: "29115-34620561-1".to_string(),
        result_code: 0,
        result_desc: "The service request is processed successfully.".to_string(),
        outcome: NotificationOutcome::Confirmed(ConfirmedTransfer {
            receipt: receipt.to_string(),
            amount: Money::from(amount),
            phone: phone.to_string(),
            transaction_date: Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap(),
        }),
    }
}

pub fn failure(checkout_request_id: &str, code: i64, desc: &str) -> PaymentNotification {
    PaymentNotification {
        checkout_request_id: checkout_request_id.to_string(),
        merchant_request_id: "29115-34620561-1".to_string(),
        result_code: code,
        result_desc: desc.to_string(),
        outcome: NotificationOutcome::Declined,
    }
}
