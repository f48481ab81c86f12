use chrono::{DateTime, Utc};
use rpg_common::Money;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::{helpers::parse_transaction_date, DarajaApiError};

//--------------------------------------    STK push request   -------------------------------------------------------

/// What the caller wants debited. `phone` must already be in international form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StkPushRequest {
    pub amount: Money,
    pub phone: String,
    pub account_reference: String,
    pub transaction_desc: String,
}

/// The body posted to `/mpesa/stkpush/v1/processrequest`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct StkPushPayload {
    pub business_short_code: String,
    pub password: String,
    pub timestamp: String,
    pub transaction_type: String,
    pub amount: i64,
    pub party_a: String,
    pub party_b: String,
    pub phone_number: String,
    #[serde(rename = "CallBackURL")]
    pub callback_url: String,
    pub account_reference: String,
    pub transaction_desc: String,
}

/// A push that the gateway accepted for delivery to the handset. The outcome arrives later, via the callback.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StkPushResponse {
    #[serde(rename = "MerchantRequestID")]
    pub merchant_request_id: String,
    #[serde(rename = "CheckoutRequestID")]
    pub checkout_request_id: String,
    #[serde(rename = "ResponseCode")]
    pub response_code: String,
    #[serde(rename = "ResponseDescription", default)]
    pub response_description: String,
    #[serde(rename = "CustomerMessage", default)]
    pub customer_message: String,
}

impl StkPushResponse {
    pub fn is_accepted(&self) -> bool {
        self.response_code.trim() == "0" && !self.checkout_request_id.is_empty()
    }
}

//--------------------------------------      STK callback     -------------------------------------------------------

/// The outer shape of an STK callback: `{ "Body": { "stkCallback": { ... } } }`.
///
/// Both levels are optional so that a structurally incomplete body still deserializes and can be acknowledged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StkCallbackEnvelope {
    #[serde(rename = "Body", default)]
    pub body: Option<StkCallbackBody>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StkCallbackBody {
    #[serde(rename = "stkCallback", default)]
    pub stk_callback: Option<StkCallback>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StkCallback {
    #[serde(rename = "MerchantRequestID", default)]
    pub merchant_request_id: String,
    #[serde(rename = "CheckoutRequestID")]
    pub checkout_request_id: String,
    #[serde(rename = "ResultCode", deserialize_with = "de_result_code")]
    pub result_code: i64,
    #[serde(rename = "ResultDesc", default)]
    pub result_desc: String,
    #[serde(rename = "CallbackMetadata", default, skip_serializing_if = "Option::is_none")]
    pub callback_metadata: Option<CallbackMetadata>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CallbackMetadata {
    #[serde(rename = "Item", default)]
    pub items: Vec<CallbackItem>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallbackItem {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Value", default)]
    pub value: Option<Value>,
}

/// The fields of a successful callback that settlement depends on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmedTransaction {
    pub receipt: String,
    pub amount: Money,
    pub phone: String,
    pub transaction_date: DateTime<Utc>,
}

impl StkCallbackEnvelope {
    pub fn callback(&self) -> Option<&StkCallback> {
        self.body.as_ref().and_then(|b| b.stk_callback.as_ref())
    }

    pub fn into_callback(self) -> Option<StkCallback> {
        self.body.and_then(|b| b.stk_callback)
    }
}

impl StkCallback {
    pub fn is_success(&self) -> bool {
        self.result_code == 0
    }

    /// Looks up a metadata item by name.
    pub fn item(&self, name: &str) -> Option<&Value> {
        self.callback_metadata.as_ref()?.items.iter().find(|i| i.name == name)?.value.as_ref()
    }

    /// Decodes the settlement fields of a successful callback. Any missing or ill-typed field is an error; nothing
    /// is defaulted.
    pub fn confirmed_transaction(&self) -> Result<ConfirmedTransaction, DarajaApiError> {
        if !self.is_success() {
            return Err(DarajaApiError::MalformedCallback(format!(
                "Callback for {} reports failure ({}), not a confirmed transaction",
                self.checkout_request_id, self.result_code
            )));
        }
        let receipt = match self.item("MpesaReceiptNumber") {
            Some(Value::String(s)) if !s.trim().is_empty() => s.trim().to_string(),
            other => return Err(bad_item("MpesaReceiptNumber", other)),
        };
        let amount = match self.item("Amount") {
            Some(Value::Number(n)) => n
                .as_i64()
                .map(Money::from)
                .or_else(|| n.as_f64().and_then(|f| Money::try_from(f).ok()))
                .ok_or_else(|| bad_item("Amount", self.item("Amount")))?,
            Some(Value::String(s)) => {
                s.trim().parse::<i64>().map(Money::from).map_err(|_| bad_item("Amount", self.item("Amount")))?
            },
            other => return Err(bad_item("Amount", other)),
        };
        if !amount.is_positive() {
            return Err(bad_item("Amount", self.item("Amount")));
        }
        let phone = match self.item("PhoneNumber") {
            Some(Value::Number(n)) if n.is_u64() => n.to_string(),
            Some(Value::String(s)) if !s.trim().is_empty() => s.trim().to_string(),
            other => return Err(bad_item("PhoneNumber", other)),
        };
        let transaction_date = match self.item("TransactionDate") {
            Some(Value::Number(n)) if n.is_u64() => parse_transaction_date(&n.to_string())?,
            Some(Value::String(s)) => parse_transaction_date(s)?,
            other => return Err(bad_item("TransactionDate", other)),
        };
        Ok(ConfirmedTransaction { receipt, amount, phone, transaction_date })
    }
}

fn bad_item(name: &str, value: Option<&Value>) -> DarajaApiError {
    match value {
        Some(v) => DarajaApiError::MalformedCallback(format!("Callback metadata item {name} has an invalid value: {v}")),
        None => DarajaApiError::MalformedCallback(format!("Callback metadata item {name} is missing")),
    }
}

/// `ResultCode` is a number in the documented API, but some integrations relay it as a string.
fn de_result_code<'de, D>(deserializer: D) -> Result<i64, D::Error>
where D: Deserializer<'de> {
    match Value::deserialize(deserializer)? {
        Value::Number(n) => n.as_i64().ok_or_else(|| serde::de::Error::custom(format!("Invalid ResultCode: {n}"))),
        Value::String(s) => {
            s.trim().parse::<i64>().map_err(|e| serde::de::Error::custom(format!("Invalid ResultCode '{s}': {e}")))
        },
        v => Err(serde::de::Error::custom(format!("Invalid ResultCode: {v}"))),
    }
}
