use rpg_common::Money;
use thiserror::Error;

/// A request to prompt a subscriber's handset for payment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushRequest {
    pub tenant_id: i64,
    pub amount: Money,
    /// International form, digits only
    pub phone: String,
    pub account_reference: String,
    pub description: String,
}

/// The gateway's acknowledgement that a push has been queued. The result arrives later as a notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushAccepted {
    pub checkout_request_id: String,
    pub merchant_request_id: String,
    pub customer_message: String,
}

#[derive(Debug, Clone, Error)]
pub enum PushGatewayError {
    #[error("Could not authenticate with the payment gateway. {0}")]
    UpstreamAuth(String),
    #[error("The payment gateway rejected the request. Status: {status:?}. {payload}")]
    RequestFailed { status: Option<u16>, payload: String },
}

/// The outbound side of the payment network.
#[allow(async_fn_in_trait)]
pub trait PushGateway {
    async fn send_push(&self, request: PushRequest) -> Result<PushAccepted, PushGatewayError>;
}
