use std::{future::Future, pin::Pin, time::Duration};

use rent_payment_engine::{
    db_types::{Money, PaymentRequestStatus},
    events::{EventHandlers, EventHooks, PaymentRequestFailedEvent, PaymentSettledEvent},
};
use tokio::sync::mpsc;

use crate::support::{add_tenant, failure, setup_with_producers, success, tear_down};

mod support;

#[tokio::test]
async fn settlements_and_failures_reach_their_hooks() {
    let (settled_tx, mut settled_rx) = mpsc::channel::<PaymentSettledEvent>(8);
    let (failed_tx, mut failed_rx) = mpsc::channel::<PaymentRequestFailedEvent>(8);
    let mut hooks = EventHooks::default();
    hooks
        .on_payment_settled(move |ev| {
            let tx = settled_tx.clone();
            Box::pin(async move {
                let _ = tx.send(ev).await;
            }) as Pin<Box<dyn Future<Output = ()> + Send>>
        })
        .on_request_failed(move |ev| {
            let tx = failed_tx.clone();
            Box::pin(async move {
                let _ = tx.send(ev).await;
            }) as Pin<Box<dyn Future<Output = ()> + Send>>
        });
    let handlers = EventHandlers::new(8, hooks);
    let producers = handlers.producers();
    handlers.start_handlers().await;

    let api = setup_with_producers(producers).await;
    let alice = add_tenant(&api, "Alice", "0712345678", 10_000).await;
    let paid = api.initiate_for_tenant(alice.id, Money::from(6_000)).await.unwrap();
    let declined = api.initiate_for_tenant(alice.id, Money::from(4_000)).await.unwrap();

    let notification = success(&paid.checkout_request_id, "NLJ7RT61SV", 6_000, "254712345678");
    api.process_notification(notification.clone()).await.unwrap();
    // Duplicates are not announced
    api.process_notification(notification).await.unwrap();
    api.process_notification(failure(&declined.checkout_request_id, 1032, "Request cancelled by user")).await.unwrap();

    let settled = tokio::time::timeout(Duration::from_secs(5), settled_rx.recv()).await.unwrap().unwrap();
    assert_eq!(settled.payment.receipt, "NLJ7RT61SV");
    assert!(!settled.is_unassigned());
    assert_eq!(settled.balance.unwrap().rent_balance, Money::from(4_000));

    let failed = tokio::time::timeout(Duration::from_secs(5), failed_rx.recv()).await.unwrap().unwrap();
    assert_eq!(failed.request.id, declined.id);
    assert_eq!(failed.request.status, PaymentRequestStatus::Failed);

    assert!(tokio::time::timeout(Duration::from_millis(200), settled_rx.recv()).await.is_err());
    tear_down(api).await;
}

#[tokio::test]
async fn expired_requests_are_announced() {
    let (failed_tx, mut failed_rx) = mpsc::channel::<PaymentRequestFailedEvent>(8);
    let mut hooks = EventHooks::default();
    hooks.on_request_failed(move |ev| {
        let tx = failed_tx.clone();
        Box::pin(async move {
            let _ = tx.send(ev).await;
        }) as Pin<Box<dyn Future<Output = ()> + Send>>
    });
    let handlers = EventHandlers::new(8, hooks);
    let producers = handlers.producers();
    handlers.start_handlers().await;

    let api = setup_with_producers(producers).await;
    let alice = add_tenant(&api, "Alice", "0712345678", 10_000).await;
    let request = api.initiate_for_tenant(alice.id, Money::from(1_000)).await.unwrap();
    api.expire_stale_requests(chrono::Duration::zero()).await.unwrap();
    let failed = tokio::time::timeout(Duration::from_secs(5), failed_rx.recv()).await.unwrap().unwrap();
    assert_eq!(failed.request.checkout_request_id, request.checkout_request_id);
    tear_down(api).await;
}
