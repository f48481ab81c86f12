use std::{fmt::Display, str::FromStr};

use log::*;
use rpg_common::Secret;

pub const SANDBOX_BASE_URL: &str = "https://sandbox.safaricom.co.ke";
pub const PRODUCTION_BASE_URL: &str = "https://api.safaricom.co.ke";
pub const DEFAULT_SHORTCODE: &str = "174379";
pub const DEFAULT_TOKEN_TTL: u64 = 3600;
pub const DEFAULT_COUNTRY_CODE: &str = "254";
pub const DEFAULT_TRANSACTION_TYPE: &str = "CustomerPayBillOnline";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DarajaEnvironment {
    #[default]
    Sandbox,
    Production,
}

impl DarajaEnvironment {
    pub fn base_url(&self) -> &'static str {
        match self {
            Self::Sandbox => SANDBOX_BASE_URL,
            Self::Production => PRODUCTION_BASE_URL,
        }
    }
}

impl FromStr for DarajaEnvironment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "sandbox" | "development" | "dev" => Ok(Self::Sandbox),
            "production" | "prod" | "live" => Ok(Self::Production),
            _ => Err(format!("Unknown Daraja environment: {s}")),
        }
    }
}

impl Display for DarajaEnvironment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sandbox => write!(f, "sandbox"),
            Self::Production => write!(f, "production"),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct DarajaConfig {
    pub environment: DarajaEnvironment,
    pub base_url: String,
    pub consumer_key: String,
    pub consumer_secret: Secret<String>,
    pub shortcode: String,
    pub passkey: Secret<String>,
    pub callback_url: String,
    /// Token lifetime, in seconds, to assume when the token endpoint does not report `expires_in`.
    pub default_token_ttl: u64,
    pub country_code: String,
    pub transaction_type: String,
}

impl DarajaConfig {
    pub fn new_from_env_or_default() -> Self {
        let environment = std::env::var("RPG_MPESA_ENV")
            .ok()
            .and_then(|s| {
                s.parse::<DarajaEnvironment>()
                    .map_err(|e| warn!("🪛️ {e}. Falling back to the sandbox environment."))
                    .ok()
            })
            .unwrap_or_default();
        let base_url = std::env::var("RPG_MPESA_BASE_URL")
            .ok()
            .map(|s| s.trim_end_matches('/').to_string())
            .unwrap_or_else(|| environment.base_url().to_string());
        let consumer_key = std::env::var("RPG_MPESA_CONSUMER_KEY").unwrap_or_else(|_| {
            warn!("🪛️ RPG_MPESA_CONSUMER_KEY not set. Token requests will be rejected by the gateway.");
            String::default()
        });
        let consumer_secret = Secret::new(std::env::var("RPG_MPESA_CONSUMER_SECRET").unwrap_or_else(|_| {
            warn!("🪛️ RPG_MPESA_CONSUMER_SECRET not set. Token requests will be rejected by the gateway.");
            String::default()
        }));
        let shortcode = std::env::var("RPG_MPESA_SHORTCODE").unwrap_or_else(|_| {
            info!("🪛️ RPG_MPESA_SHORTCODE not set, using the sandbox shortcode {DEFAULT_SHORTCODE}");
            DEFAULT_SHORTCODE.to_string()
        });
        let passkey = Secret::new(std::env::var("RPG_MPESA_PASSKEY").unwrap_or_else(|_| {
            warn!("🪛️ RPG_MPESA_PASSKEY not set. STK push requests will fail signature checks.");
            String::default()
        }));
        let callback_url = std::env::var("RPG_MPESA_CALLBACK_URL").unwrap_or_else(|_| {
            warn!("🪛️ RPG_MPESA_CALLBACK_URL not set. The gateway will have nowhere to send payment results.");
            String::default()
        });
        let default_token_ttl = std::env::var("RPG_MPESA_TOKEN_TTL")
            .ok()
            .and_then(|s| {
                s.parse::<u64>()
                    .map_err(|e| warn!("🪛️ Invalid RPG_MPESA_TOKEN_TTL value '{s}'. {e}. Using {DEFAULT_TOKEN_TTL}s."))
                    .ok()
            })
            .unwrap_or(DEFAULT_TOKEN_TTL);
        let country_code =
            std::env::var("RPG_MPESA_COUNTRY_CODE").unwrap_or_else(|_| DEFAULT_COUNTRY_CODE.to_string());
        let transaction_type =
            std::env::var("RPG_MPESA_TRANSACTION_TYPE").unwrap_or_else(|_| DEFAULT_TRANSACTION_TYPE.to_string());
        Self {
            environment,
            base_url,
            consumer_key,
            consumer_secret,
            shortcode,
            passkey,
            callback_url,
            default_token_ttl,
            country_code,
            transaction_type,
        }
    }

    /// A sandbox configuration pointing at `base_url`. Useful for tests against a local mock of the gateway.
    pub fn sandbox_at(base_url: &str) -> Self {
        Self {
            environment: DarajaEnvironment::Sandbox,
            base_url: base_url.trim_end_matches('/').to_string(),
            consumer_key: "consumer_key".to_string(),
            consumer_secret: Secret::from("consumer_secret"),
            shortcode: DEFAULT_SHORTCODE.to_string(),
            passkey: Secret::from("passkey"),
            callback_url: "https://example.com/api/mpesa/stk-callback".to_string(),
            default_token_ttl: DEFAULT_TOKEN_TTL,
            country_code: DEFAULT_COUNTRY_CODE.to_string(),
            transaction_type: DEFAULT_TRANSACTION_TYPE.to_string(),
        }
    }
}
