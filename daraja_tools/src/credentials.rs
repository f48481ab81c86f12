//! OAuth credential caching for the Daraja API.
//!
//! [`CredentialCache`] hands out a bearer token, refreshing it lazily when it is about to expire. At most one
//! token exchange is ever in flight; callers that arrive while a refresh is running wait for, and share, its
//! result.
use std::{
    sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard},
    time::Duration as StdDuration,
};

use chrono::{DateTime, Duration, Utc};
use log::*;
use reqwest::Client;
use rpg_common::Secret;
use serde::Deserialize;
use serde_json::Value;
use tokio::sync::watch;

use crate::{DarajaApiError, DarajaConfig};

/// Tokens are considered stale this long before the provider says they expire.
pub const EXPIRY_MARGIN_SECONDS: i64 = 30;
const MAX_TOKEN_TTL: i64 = 366 * 24 * 3600;

#[derive(Debug, Clone)]
pub struct TokenGrant {
    pub access_token: Secret<String>,
    /// Lifetime in seconds, if the provider reported one.
    pub expires_in: Option<u64>,
}

/// Somewhere bearer tokens come from. The production implementation is [`OAuthTokenSource`].
#[allow(async_fn_in_trait)]
pub trait TokenSource {
    async fn fetch_token(&self) -> Result<TokenGrant, DarajaApiError>;
}

#[derive(Debug, Clone)]
pub struct AccessToken {
    pub token: Secret<String>,
    pub expires_at: DateTime<Utc>,
}

impl AccessToken {
    pub fn from_grant(grant: TokenGrant, default_ttl: u64, now: DateTime<Utc>) -> Self {
        let ttl = grant.expires_in.unwrap_or(default_ttl);
        let ttl = i64::try_from(ttl).unwrap_or(MAX_TOKEN_TTL).min(MAX_TOKEN_TTL);
        let expires_at = now.checked_add_signed(Duration::seconds(ttl)).unwrap_or(DateTime::<Utc>::MAX_UTC);
        Self { token: grant.access_token, expires_at }
    }

    pub fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        now + Duration::seconds(EXPIRY_MARGIN_SECONDS) < self.expires_at
    }
}

type RefreshResult = Option<Result<AccessToken, DarajaApiError>>;

enum CredentialState {
    Empty,
    Valid(AccessToken),
    Refreshing { previous: Option<AccessToken>, result: watch::Receiver<RefreshResult> },
}

enum Role {
    Leader(watch::Sender<RefreshResult>),
    Waiter(watch::Receiver<RefreshResult>),
}

pub struct CredentialCache<S> {
    source: S,
    default_ttl: u64,
    state: RwLock<CredentialState>,
}

impl<S: TokenSource> CredentialCache<S> {
    pub fn new(source: S, default_ttl: u64) -> Self {
        Self { source, default_ttl, state: RwLock::new(CredentialState::Empty) }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Returns a token that is valid for at least [`EXPIRY_MARGIN_SECONDS`], fetching a new one if necessary.
    ///
    /// If the exchange fails, every caller waiting on it receives the error and the cache is left as it was.
    pub async fn get_token(&self) -> Result<Secret<String>, DarajaApiError> {
        loop {
            if let Some(token) = self.cached_token() {
                return Ok(token);
            }
            let role = {
                let mut state = self.write_state();
                let in_flight = match &*state {
                    CredentialState::Valid(t) if t.is_fresh(Utc::now()) => return Ok(t.token.clone()),
                    CredentialState::Refreshing { result, .. } => Some(result.clone()),
                    _ => None,
                };
                match in_flight {
                    Some(rx) => Role::Waiter(rx),
                    None => {
                        let (tx, rx) = watch::channel(None);
                        let previous = match std::mem::replace(&mut *state, CredentialState::Empty) {
                            CredentialState::Valid(t) => Some(t),
                            _ => None,
                        };
                        *state = CredentialState::Refreshing { previous, result: rx };
                        Role::Leader(tx)
                    },
                }
            };
            match role {
                Role::Leader(tx) => return self.refresh(tx).await,
                Role::Waiter(mut rx) => {
                    trace!("🔑️ Waiting on in-flight token refresh");
                    let outcome = rx.wait_for(Option::is_some).await.ok().and_then(|r| r.clone());
                    match outcome {
                        Some(Ok(token)) => return Ok(token.token),
                        Some(Err(e)) => return Err(e),
                        // The refresh was abandoned. The state has been restored, so try again.
                        None => continue,
                    }
                },
            }
        }
    }

    /// Drops any cached token so that the next call to [`get_token`](Self::get_token) fetches a new one.
    pub fn invalidate(&self) {
        let mut state = self.write_state();
        if let CredentialState::Valid(_) = &*state {
            debug!("🔑️ Cached access token invalidated");
            *state = CredentialState::Empty;
        }
    }

    fn cached_token(&self) -> Option<Secret<String>> {
        match &*self.read_state() {
            CredentialState::Valid(t) if t.is_fresh(Utc::now()) => Some(t.token.clone()),
            _ => None,
        }
    }

    async fn refresh(&self, tx: watch::Sender<RefreshResult>) -> Result<Secret<String>, DarajaApiError> {
        let mut guard = AbandonedRefreshGuard { state: &self.state, armed: true };
        debug!("🔑️ Fetching a new access token");
        let result =
            self.source.fetch_token().await.map(|grant| AccessToken::from_grant(grant, self.default_ttl, Utc::now()));
        {
            let mut state = self.write_state();
            let previous = match std::mem::replace(&mut *state, CredentialState::Empty) {
                CredentialState::Refreshing { previous, .. } => previous,
                CredentialState::Valid(t) => Some(t),
                CredentialState::Empty => None,
            };
            *state = match &result {
                Ok(token) => {
                    debug!("🔑️ New access token valid until {}", token.expires_at);
                    CredentialState::Valid(token.clone())
                },
                Err(e) => {
                    warn!("🔑️ Token refresh failed. {e}");
                    previous.map(CredentialState::Valid).unwrap_or(CredentialState::Empty)
                },
            };
        }
        guard.armed = false;
        tx.send_replace(Some(result.clone()));
        result.map(|t| t.token)
    }

    fn read_state(&self) -> RwLockReadGuard<'_, CredentialState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_state(&self) -> RwLockWriteGuard<'_, CredentialState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Puts the cache back the way it was if the refreshing future is dropped before it completes.
struct AbandonedRefreshGuard<'a> {
    state: &'a RwLock<CredentialState>,
    armed: bool,
}

impl Drop for AbandonedRefreshGuard<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        warn!("🔑️ Token refresh was abandoned. Restoring previous credential state.");
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        let previous = match std::mem::replace(&mut *state, CredentialState::Empty) {
            CredentialState::Refreshing { previous, .. } => previous,
            CredentialState::Valid(t) => Some(t),
            CredentialState::Empty => None,
        };
        *state = previous.map(CredentialState::Valid).unwrap_or(CredentialState::Empty);
    }
}

//--------------------------------------   OAuthTokenSource  ---------------------------------------------------------

/// Exchanges the consumer key and secret for a bearer token at `/oauth/v1/generate`.
#[derive(Clone)]
pub struct OAuthTokenSource {
    client: Client,
    url: String,
    consumer_key: String,
    consumer_secret: Secret<String>,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<Value>,
}

impl OAuthTokenSource {
    pub fn new(config: &DarajaConfig) -> Result<Self, DarajaApiError> {
        let client = Client::builder()
            .timeout(StdDuration::from_secs(30))
            .build()
            .map_err(|e| DarajaApiError::Initialization(e.to_string()))?;
        Ok(Self::with_client(client, config))
    }

    pub fn with_client(client: Client, config: &DarajaConfig) -> Self {
        let url = format!("{}/oauth/v1/generate?grant_type=client_credentials", config.base_url);
        Self {
            client,
            url,
            consumer_key: config.consumer_key.clone(),
            consumer_secret: config.consumer_secret.clone(),
        }
    }
}

/// `expires_in` arrives as a string (`"3599"`) from the live API and as a number from some sandboxes.
fn parse_expires_in(value: Option<Value>) -> Option<u64> {
    match value? {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse::<u64>().ok(),
        _ => None,
    }
}

impl TokenSource for OAuthTokenSource {
    async fn fetch_token(&self) -> Result<TokenGrant, DarajaApiError> {
        trace!("🔑️ Requesting access token from {}", self.url);
        let response = self
            .client
            .get(&self.url)
            .basic_auth(&self.consumer_key, Some(self.consumer_secret.reveal()))
            .send()
            .await
            .map_err(|e| DarajaApiError::UpstreamAuth(e.to_string()))?;
        let status = response.status();
        let body = response.text().await.map_err(|e| DarajaApiError::UpstreamAuth(e.to_string()))?;
        if !status.is_success() {
            return Err(DarajaApiError::UpstreamAuth(format!("Token endpoint returned {status}. {body}")));
        }
        let token = serde_json::from_str::<TokenResponse>(&body)
            .map_err(|e| DarajaApiError::UpstreamAuth(format!("Unexpected token response. {e}. {body}")))?;
        if token.access_token.is_empty() {
            return Err(DarajaApiError::UpstreamAuth("Token endpoint returned an empty access token".into()));
        }
        Ok(TokenGrant { access_token: Secret::new(token.access_token), expires_in: parse_expires_in(token.expires_in) })
    }
}
