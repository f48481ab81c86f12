use actix_web::{http::StatusCode, test::TestRequest};
use rent_payment_engine::traits::PushGatewayError;
use serde_json::{json, Value};

use super::{
    helpers::{add_tenant, drop_database, new_database, send_request},
    mocks::{accepting_push_client, idle_push_client, MockPushClient},
};
use crate::config::CallbackPeerPolicy;

fn push_request(tenant_id: i64, amount: i64) -> TestRequest {
    TestRequest::post().uri("/api/mpesa/stk/push").set_json(json!({"tenantId": tenant_id, "amount": amount}))
}

fn callback_request(body: Value) -> TestRequest {
    TestRequest::post().uri("/api/mpesa/stk-callback").set_json(body)
}

fn success_callback(checkout_request_id: &str, receipt: &str, amount: i64) -> Value {
    json!({"Body": {"stkCallback": {
        "MerchantRequestID": "29115-34620561-1",
        "CheckoutRequestID": checkout_request_id,
        "ResultCode": 0,
        "ResultDesc": "The service request is processed successfully.",
        "CallbackMetadata": {"Item": [
            {"Name": "Amount", "Value": amount},
            {"Name": "MpesaReceiptNumber", "Value": receipt},
            {"Name": "Balance"},
            {"Name": "TransactionDate", "Value": 20240101120000u64},
            {"Name": "PhoneNumber", "Value": 254712345678u64}
        ]}
    }}})
}

fn failure_callback(checkout_request_id: &str) -> Value {
    json!({"Body": {"stkCallback": {
        "MerchantRequestID": "29115-34620561-1",
        "CheckoutRequestID": checkout_request_id,
        "ResultCode": 1032,
        "ResultDesc": "Request cancelled by user"
    }}})
}

#[actix_web::test]
async fn push_then_callback_settles_the_ledger() -> anyhow::Result<()> {
    let _ = env_logger::try_init();
    let db = new_database().await;
    let alice = add_tenant(&db, "Alice", "0712345678", 10_000).await;
    let policy = CallbackPeerPolicy::default();

    let (status, body) =
        send_request(&db, accepting_push_client("ws_CO_010120241200001"), policy.clone(), push_request(alice.id, 4_000))
            .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let response: Value = serde_json::from_str(&body)?;
    assert_eq!(response["checkoutRequestId"], "ws_CO_010120241200001");
    assert_eq!(response["merchantRequestId"], "29115-34620561-1");
    let request_id = response["paymentRequestId"].as_i64().unwrap();

    let (status, body) = send_request(
        &db,
        idle_push_client(),
        policy.clone(),
        callback_request(success_callback("ws_CO_010120241200001", "NLJ7RT61SV", 4_000)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(serde_json::from_str::<Value>(&body)?, json!({"ResultCode": 0, "ResultDesc": "Callback processed"}));

    // Redelivery is acknowledged but changes nothing
    let (status, body) = send_request(
        &db,
        idle_push_client(),
        policy.clone(),
        callback_request(success_callback("ws_CO_010120241200001", "NLJ7RT61SV", 4_000)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(serde_json::from_str::<Value>(&body)?, json!({"ResultCode": 0, "ResultDesc": "Already processed"}));

    let req = TestRequest::get().uri(&format!("/api/tenants/{}/balance", alice.id));
    let (status, body) = send_request(&db, idle_push_client(), policy.clone(), req).await;
    assert_eq!(status, StatusCode::OK);
    let balance: Value = serde_json::from_str(&body)?;
    assert_eq!(balance["rentPaid"], 4_000);
    assert_eq!(balance["rentBalance"], 6_000);

    let req = TestRequest::get().uri(&format!("/api/payment_requests/{request_id}"));
    let (status, body) = send_request(&db, idle_push_client(), policy.clone(), req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(serde_json::from_str::<Value>(&body)?["status"], "Completed");

    let req = TestRequest::get().uri(&format!("/api/tenants/{}/payments", alice.id));
    let (status, body) = send_request(&db, idle_push_client(), policy, req).await;
    assert_eq!(status, StatusCode::OK);
    let payments: Value = serde_json::from_str(&body)?;
    assert_eq!(payments.as_array().map(|a| a.len()), Some(1));
    assert_eq!(payments[0]["receipt"], "NLJ7RT61SV");
    assert_eq!(payments[0]["amount"], 4_000);
    drop_database(db).await;
    Ok(())
}

#[actix_web::test]
async fn failure_callback_fails_the_request() -> anyhow::Result<()> {
    let _ = env_logger::try_init();
    let db = new_database().await;
    let alice = add_tenant(&db, "Alice", "0712345678", 10_000).await;
    let policy = CallbackPeerPolicy::default();
    let (_, body) =
        send_request(&db, accepting_push_client("ws_CO_010120241200002"), policy.clone(), push_request(alice.id, 100))
            .await;
    let request_id = serde_json::from_str::<Value>(&body)?["paymentRequestId"].as_i64().unwrap();

    let (status, body) =
        send_request(&db, idle_push_client(), policy.clone(), callback_request(failure_callback("ws_CO_010120241200002")))
            .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(serde_json::from_str::<Value>(&body)?["ResultCode"], 0);

    let req = TestRequest::get().uri(&format!("/api/payment_requests/{request_id}"));
    let (_, body) = send_request(&db, idle_push_client(), policy.clone(), req).await;
    let request: Value = serde_json::from_str(&body)?;
    assert_eq!(request["status"], "Failed");
    assert_eq!(request["resultDesc"], "Request cancelled by user");

    let req = TestRequest::get().uri(&format!("/api/tenants/{}/balance", alice.id));
    let (_, body) = send_request(&db, idle_push_client(), policy, req).await;
    assert_eq!(serde_json::from_str::<Value>(&body)?["rentPaid"], 0);
    drop_database(db).await;
    Ok(())
}

#[actix_web::test]
async fn push_errors() {
    let _ = env_logger::try_init();
    let db = new_database().await;
    let alice = add_tenant(&db, "Alice", "0712345678", 10_000).await;
    let policy = CallbackPeerPolicy::default();

    let (status, body) = send_request(&db, idle_push_client(), policy.clone(), push_request(alice.id + 1, 100)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body.contains("error"));

    let (status, _) = send_request(&db, idle_push_client(), policy.clone(), push_request(alice.id, 0)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let req = TestRequest::post().uri("/api/mpesa/stk/push").set_json(json!({"tenantId": alice.id, "amount": "lots"}));
    let (status, body) = send_request(&db, idle_push_client(), policy.clone(), req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.starts_with(r#"{"error":"#));

    let mut refusing = MockPushClient::new();
    refusing.expect_send_push().times(1).returning(|_| {
        Err(PushGatewayError::RequestFailed {
            status: Some(400),
            payload: r#"{"errorCode":"400.002.02","errorMessage":"Bad Request - Invalid Amount"}"#.into(),
        })
    });
    let (status, body) = send_request(&db, refusing, policy.clone(), push_request(alice.id, 100)).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(body.contains("Invalid Amount"));

    let mut unauthorised = MockPushClient::new();
    unauthorised
        .expect_send_push()
        .times(1)
        .returning(|_| Err(PushGatewayError::UpstreamAuth("Token endpoint returned 400 Bad Request".into())));
    let (status, _) = send_request(&db, unauthorised, policy, push_request(alice.id, 100)).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    drop_database(db).await;
}

#[actix_web::test]
async fn malformed_callbacks() {
    let _ = env_logger::try_init();
    let db = new_database().await;
    let policy = CallbackPeerPolicy::default();

    let req = TestRequest::post()
        .uri("/api/mpesa/stk-callback")
        .insert_header(("Content-Type", "application/json"))
        .set_payload("{not json");
    let (status, body) = send_request(&db, idle_push_client(), policy.clone(), req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let ack: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(ack["ResultCode"], 1);

    let (status, body) =
        send_request(&db, idle_push_client(), policy.clone(), callback_request(json!({"Body": {}}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(serde_json::from_str::<Value>(&body).unwrap(), json!({"ResultCode": 0, "ResultDesc": "Callback received"}));

    // A success without a receipt is acknowledged, but nothing is recorded
    let mut body = success_callback("ws_CO_unknown", "NLJ7RT61SV", 100);
    body["Body"]["stkCallback"]["CallbackMetadata"]["Item"][1] = json!({"Name": "MpesaReceiptNumber"});
    let (status, body) = send_request(&db, idle_push_client(), policy.clone(), callback_request(body)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(serde_json::from_str::<Value>(&body).unwrap()["ResultCode"], 0);
    drop_database(db).await;
}

#[actix_web::test]
async fn callbacks_from_unlisted_peers_are_refused() {
    let _ = env_logger::try_init();
    let db = new_database().await;
    add_tenant(&db, "Alice", "0712345678", 10_000).await;
    let policy = CallbackPeerPolicy {
        use_x_forwarded_for: true,
        use_forwarded: false,
        whitelist: Some(vec!["196.201.214.200".parse().unwrap()]),
    };
    let req = callback_request(success_callback("ws_CO_1", "RCPT000001", 100)).peer_addr("10.0.0.5:40000".parse().unwrap());
    let (status, body) = send_request(&db, idle_push_client(), policy.clone(), req).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(body.contains("10.0.0.5"));

    let req = callback_request(success_callback("ws_CO_1", "RCPT000001", 100))
        .peer_addr("10.0.0.5:40000".parse().unwrap())
        .insert_header(("X-Forwarded-For", "196.201.214.200"));
    let (status, body) = send_request(&db, idle_push_client(), policy, req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(serde_json::from_str::<Value>(&body).unwrap()["ResultDesc"], "Callback processed");
    drop_database(db).await;
}
