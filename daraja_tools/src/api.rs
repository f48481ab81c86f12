use std::{sync::Arc, time::Duration};

use chrono::Utc;
use log::*;
use reqwest::{header::CONTENT_TYPE, Client};

use crate::{
    config::DarajaConfig,
    credentials::{CredentialCache, OAuthTokenSource, TokenSource},
    data_objects::{StkPushPayload, StkPushRequest, StkPushResponse},
    helpers::{stk_password, timestamp},
    DarajaApiError,
};

pub const STK_PUSH_PATH: &str = "/mpesa/stkpush/v1/processrequest";

/// A client for the parts of the Daraja API that the payment gateway uses.
///
/// The credential cache is injected, so that several clients (or tests) can share it.
pub struct DarajaApi<S = OAuthTokenSource> {
    config: DarajaConfig,
    client: Arc<Client>,
    credentials: Arc<CredentialCache<S>>,
}

impl<S> Clone for DarajaApi<S> {
    fn clone(&self) -> Self {
        Self { config: self.config.clone(), client: Arc::clone(&self.client), credentials: Arc::clone(&self.credentials) }
    }
}

impl DarajaApi<OAuthTokenSource> {
    /// Creates a client that obtains its tokens from the OAuth endpoint described by `config`.
    pub fn new(config: DarajaConfig) -> Result<Self, DarajaApiError> {
        let client = build_client()?;
        let source = OAuthTokenSource::with_client(client.clone(), &config);
        let credentials = Arc::new(CredentialCache::new(source, config.default_token_ttl));
        Ok(Self { config, client: Arc::new(client), credentials })
    }
}

impl<S: TokenSource> DarajaApi<S> {
    pub fn with_credentials(config: DarajaConfig, credentials: Arc<CredentialCache<S>>) -> Result<Self, DarajaApiError> {
        let client = build_client()?;
        Ok(Self { config, client: Arc::new(client), credentials })
    }

    pub fn config(&self) -> &DarajaConfig {
        &self.config
    }

    pub fn credentials(&self) -> &CredentialCache<S> {
        &self.credentials
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.config.base_url)
    }

    /// Builds the signed push payload for `request`, using `now` for the timestamp.
    pub fn build_payload(&self, request: &StkPushRequest, now: chrono::DateTime<Utc>) -> StkPushPayload {
        let timestamp = timestamp(now);
        let password = stk_password(&self.config.shortcode, self.config.passkey.reveal(), &timestamp);
        StkPushPayload {
            business_short_code: self.config.shortcode.clone(),
            password,
            timestamp,
            transaction_type: self.config.transaction_type.clone(),
            amount: request.amount.value(),
            party_a: request.phone.clone(),
            party_b: self.config.shortcode.clone(),
            phone_number: request.phone.clone(),
            callback_url: self.config.callback_url.clone(),
            account_reference: request.account_reference.clone(),
            transaction_desc: request.transaction_desc.clone(),
        }
    }

    /// Sends an STK push. Succeeds only if the gateway accepted the request (`ResponseCode == "0"`).
    ///
    /// Every other outcome (transport failure, non-2xx status, an unparseable body or a non-zero response code) is
    /// reported as [`DarajaApiError::GatewayRequestFailed`] with the gateway's payload verbatim.
    pub async fn stk_push(&self, request: &StkPushRequest) -> Result<StkPushResponse, DarajaApiError> {
        let token = self.credentials.get_token().await?;
        let payload = self.build_payload(request, Utc::now());
        let url = self.url(STK_PUSH_PATH);
        debug!("📲️ Sending STK push of {} to {} ({})", request.amount, request.phone, request.account_reference);
        let response = self
            .client
            .post(&url)
            .bearer_auth(token.reveal())
            .header(CONTENT_TYPE, "application/json")
            .json(&payload)
            .send()
            .await
            .map_err(|e| DarajaApiError::GatewayRequestFailed { status: None, payload: e.to_string() })?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| DarajaApiError::GatewayRequestFailed { status: Some(status.as_u16()), payload: e.to_string() })?;
        if status == reqwest::StatusCode::UNAUTHORIZED {
            // The gateway revoked the token early. The next request will fetch a new one.
            self.credentials.invalidate();
        }
        if !status.is_success() {
            warn!("📲️ STK push rejected with status {status}. {body}");
            return Err(DarajaApiError::GatewayRequestFailed { status: Some(status.as_u16()), payload: body });
        }
        let result = match serde_json::from_str::<StkPushResponse>(&body) {
            Ok(r) if r.is_accepted() => r,
            Ok(_) | Err(_) => {
                warn!("📲️ STK push was not accepted. {body}");
                return Err(DarajaApiError::GatewayRequestFailed { status: Some(status.as_u16()), payload: body });
            },
        };
        info!(
            "📲️ STK push accepted. CheckoutRequestID: {}, MerchantRequestID: {}",
            result.checkout_request_id, result.merchant_request_id
        );
        Ok(result)
    }
}

fn build_client() -> Result<Client, DarajaApiError> {
    Client::builder().timeout(Duration::from_secs(30)).build().map_err(|e| DarajaApiError::Initialization(e.to_string()))
}
