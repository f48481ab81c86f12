use rent_payment_engine::db_types::{Money, PaymentRequest};
use serde::{Deserialize, Serialize};

/// Body of `POST /api/mpesa/stk/push`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitiatePaymentParams {
    pub tenant_id: i64,
    pub amount: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitiatePaymentResponse {
    pub checkout_request_id: String,
    pub merchant_request_id: String,
    pub payment_request_id: i64,
    pub amount: Money,
}

impl From<PaymentRequest> for InitiatePaymentResponse {
    fn from(request: PaymentRequest) -> Self {
        Self {
            checkout_request_id: request.checkout_request_id,
            merchant_request_id: request.merchant_request_id,
            payment_request_id: request.id,
            amount: request.amount,
        }
    }
}

/// The acknowledgement the gateway expects in reply to a callback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallbackAck {
    #[serde(rename = "ResultCode")]
    pub result_code: i64,
    #[serde(rename = "ResultDesc")]
    pub result_desc: String,
}

impl CallbackAck {
    pub fn accepted<S: Into<String>>(desc: S) -> Self {
        Self { result_code: 0, result_desc: desc.into() }
    }

    pub fn rejected<S: Into<String>>(desc: S) -> Self {
        Self { result_code: 1, result_desc: desc.into() }
    }
}
