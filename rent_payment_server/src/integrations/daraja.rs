use daraja_tools::{DarajaApi, DarajaApiError, OAuthTokenSource, StkCallback, StkPushRequest, TokenSource};
use futures::future::BoxFuture;
use log::*;
use rent_payment_engine::{
    events::{EventHandlers, EventHooks, PaymentRequestFailedEvent, PaymentSettledEvent},
    ConfirmedTransfer,
    NotificationOutcome,
    PaymentNotification,
    PushAccepted,
    PushGateway,
    PushGatewayError,
    PushRequest,
};

pub const RECONCILIATION_EVENT_BUFFER_SIZE: usize = 25;

/// Connects the payment engine to M-Pesa, by way of the Daraja STK push API.
pub struct DarajaGateway<S = OAuthTokenSource> {
    api: DarajaApi<S>,
}

impl<S> Clone for DarajaGateway<S> {
    fn clone(&self) -> Self {
        Self { api: self.api.clone() }
    }
}

impl<S> DarajaGateway<S> {
    pub fn new(api: DarajaApi<S>) -> Self {
        Self { api }
    }

    pub fn api(&self) -> &DarajaApi<S> {
        &self.api
    }
}

impl<S: TokenSource> PushGateway for DarajaGateway<S> {
    async fn send_push(&self, request: PushRequest) -> Result<PushAccepted, PushGatewayError> {
        let request = StkPushRequest {
            amount: request.amount,
            phone: request.phone,
            account_reference: request.account_reference,
            transaction_desc: request.description,
        };
        let response = self.api.stk_push(&request).await.map_err(push_error)?;
        Ok(PushAccepted {
            checkout_request_id: response.checkout_request_id,
            merchant_request_id: response.merchant_request_id,
            customer_message: response.customer_message,
        })
    }
}

fn push_error(e: DarajaApiError) -> PushGatewayError {
    match e {
        DarajaApiError::UpstreamAuth(s) => PushGatewayError::UpstreamAuth(s),
        DarajaApiError::GatewayRequestFailed { status, payload } => PushGatewayError::RequestFailed { status, payload },
        e => PushGatewayError::RequestFailed { status: None, payload: e.to_string() },
    }
}

/// Converts the Daraja callback into the engine's gateway-neutral notification.
///
/// The transaction details of a successful callback are decoded strictly. If any of them is missing or unreadable,
/// the notification is marked as unreadable rather than being guessed at.
pub fn notification_from_callback(callback: StkCallback) -> PaymentNotification {
    let outcome = if callback.is_success() {
        match callback.confirmed_transaction() {
            Ok(tx) => NotificationOutcome::Confirmed(ConfirmedTransfer {
                receipt: tx.receipt,
                amount: tx.amount,
                phone: tx.phone,
                transaction_date: tx.transaction_date,
            }),
            Err(e) => NotificationOutcome::Unreadable(e.to_string()),
        }
    } else {
        NotificationOutcome::Declined
    };
    PaymentNotification {
        checkout_request_id: callback.checkout_request_id,
        merchant_request_id: callback.merchant_request_id,
        result_code: callback.result_code,
        result_desc: callback.result_desc,
        outcome,
    }
}

/// Flags the events that need a human's attention on the `rpg::reconciliation` log target.
///
/// 1. PaymentSettledEvent - payments that could not be attributed to a tenant must be reconciled by hand.
/// 2. PaymentRequestFailedEvent - the tenant may need to be prompted again.
pub fn create_reconciliation_event_handlers() -> EventHandlers {
    let mut hooks = EventHooks::default();
    hooks.on_payment_settled(|ev: PaymentSettledEvent| {
        if !ev.is_unassigned() {
            return no_op();
        }
        Box::pin(async move {
            let p = ev.payment;
            warn!(
                target: "rpg::reconciliation",
                "🧾️ Payment {} of {} from {} on {} has no tenant. Please assign it manually.",
                p.receipt, p.amount, p.phone, p.transaction_date
            );
        })
    });
    hooks.on_request_failed(|ev: PaymentRequestFailedEvent| {
        Box::pin(async move {
            let r = ev.request;
            info!(
                target: "rpg::reconciliation",
                "🧾️ Payment request #{} for {} from tenant #{} failed. {}",
                r.id,
                r.amount,
                r.tenant_id,
                r.result_desc.unwrap_or_default()
            );
        })
    });
    EventHandlers::new(RECONCILIATION_EVENT_BUFFER_SIZE, hooks)
}

fn no_op() -> BoxFuture<'static, ()> {
    Box::pin(async {})
}
