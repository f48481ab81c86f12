use mockall::mock;
use rent_payment_engine::{
    db_types::{NewTenant, Payment, PaymentRequest, Tenant, TenantBalance},
    traits::{PushAccepted, PushGateway, PushGatewayError, PushRequest, TenantApiError, TenantManagement},
};

mock! {
    pub TenantStore {}
    impl TenantManagement for TenantStore {
        async fn fetch_tenant(&self, tenant_id: i64) -> Result<Option<Tenant>, TenantApiError>;
        async fn insert_tenant(&self, tenant: NewTenant) -> Result<Tenant, TenantApiError>;
        async fn fetch_tenant_balance(&self, tenant_id: i64) -> Result<Option<TenantBalance>, TenantApiError>;
        async fn fetch_payments_for_tenant(&self, tenant_id: i64) -> Result<Vec<Payment>, TenantApiError>;
        async fn fetch_payment_request(&self, id: i64) -> Result<Option<PaymentRequest>, TenantApiError>;
        async fn fetch_unassigned_payments(&self) -> Result<Vec<Payment>, TenantApiError>;
    }
}

mock! {
    pub PushClient {}
    impl PushGateway for PushClient {
        async fn send_push(&self, request: PushRequest) -> Result<PushAccepted, PushGatewayError>;
    }
}

/// A push client that accepts exactly one push and hands out `checkout_request_id`.
pub fn accepting_push_client(checkout_request_id: &'static str) -> MockPushClient {
    let mut client = MockPushClient::new();
    client.expect_send_push().times(1).returning(move |_| {
        Ok(PushAccepted {
            checkout_request_id: checkout_request_id.to_string(),
            merchant_request_id: "29115-34620561-1".to_string(),
            customer_message: "Success. Request accepted for processing".to_string(),
        })
    });
    client
}

/// A push client that must not be called.
pub fn idle_push_client() -> MockPushClient {
    let mut client = MockPushClient::new();
    client.expect_send_push().never();
    client
}
