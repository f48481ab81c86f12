use std::{env, net::IpAddr};

use chrono::Duration;
use daraja_tools::DarajaConfig;
use log::*;
use rpg_common::helpers::{is_disabled_marker, parse_boolean_flag};

const DEFAULT_RPG_HOST: &str = "127.0.0.1";
const DEFAULT_RPG_PORT: u16 = 8370;
const DEFAULT_DATABASE_URL: &str = "sqlite://data/rent_payments.db";

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    /// If true, the X-Forwarded-For header will be used to determine the client's IP address, rather than the
    /// connection's remote address.
    pub use_x_forwarded_for: bool,
    /// If true, the Forwarded header will be used to determine the client's IP address, rather than the
    /// connection's remote address.
    pub use_forwarded: bool,
    /// If supplied, callbacks on the /api/mpesa scope will only be accepted from these addresses.
    /// To explicitly disable the whitelist, set this to "false", "none", or "0".
    pub mpesa_whitelist: Option<Vec<IpAddr>>,
    /// Pending payment requests older than this are marked as failed. `None` leaves them pending forever.
    pub pending_request_timeout: Option<Duration>,
    /// Daraja API configuration
    pub daraja: DarajaConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_RPG_HOST.to_string(),
            port: DEFAULT_RPG_PORT,
            database_url: DEFAULT_DATABASE_URL.to_string(),
            use_x_forwarded_for: false,
            use_forwarded: false,
            mpesa_whitelist: None,
            pending_request_timeout: None,
            daraja: DarajaConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let host = env::var("RPG_HOST").ok().unwrap_or_else(|| DEFAULT_RPG_HOST.into());
        let port = env::var("RPG_PORT")
            .map(|s| {
                s.parse::<u16>().unwrap_or_else(|e| {
                    error!(
                        "🪛️ {s} is not a valid port for RPG_PORT. {e} Using the default, {DEFAULT_RPG_PORT}, instead."
                    );
                    DEFAULT_RPG_PORT
                })
            })
            .ok()
            .unwrap_or(DEFAULT_RPG_PORT);
        let database_url = env::var("RPG_DATABASE_URL").ok().unwrap_or_else(|| {
            warn!("🪛️ RPG_DATABASE_URL is not set. Using {DEFAULT_DATABASE_URL}.");
            DEFAULT_DATABASE_URL.to_string()
        });
        let use_x_forwarded_for = parse_boolean_flag(env::var("RPG_USE_X_FORWARDED_FOR").ok(), false);
        let use_forwarded = parse_boolean_flag(env::var("RPG_USE_FORWARDED").ok(), false);
        let mpesa_whitelist = configure_whitelist(env::var("RPG_MPESA_IP_WHITELIST").ok());
        let pending_request_timeout = configure_pending_timeout(env::var("RPG_PENDING_REQUEST_TIMEOUT").ok());
        let daraja = DarajaConfig::new_from_env_or_default();
        Self {
            host,
            port,
            database_url,
            use_x_forwarded_for,
            use_forwarded,
            mpesa_whitelist,
            pending_request_timeout,
            daraja,
        }
    }
}

//-------------------------------------------------  CallbackPeerPolicy  -----------------------------------------------
/// The subset of the server configuration that decides which peers may deliver payment callbacks.
#[derive(Clone, Debug, Default)]
pub struct CallbackPeerPolicy {
    pub use_x_forwarded_for: bool,
    pub use_forwarded: bool,
    pub whitelist: Option<Vec<IpAddr>>,
}

impl CallbackPeerPolicy {
    pub fn from_config(config: &ServerConfig) -> Self {
        Self {
            use_x_forwarded_for: config.use_x_forwarded_for,
            use_forwarded: config.use_forwarded,
            whitelist: config.mpesa_whitelist.clone(),
        }
    }
}

fn configure_whitelist(value: Option<String>) -> Option<Vec<IpAddr>> {
    let whitelist = value.and_then(|s| {
        if is_disabled_marker(&s) {
            info!(
                "🪛️ M-Pesa IP whitelist is disabled. If this is not what you want, set RPG_MPESA_IP_WHITELIST to a \
                 comma-separated list of IP addresses to enable it."
            );
            return None;
        }
        let ip_addrs = s
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .filter_map(|s| {
                s.parse::<IpAddr>().map_err(|e| warn!("🪛️ Ignoring invalid IP address ({s}) in RPG_MPESA_IP_WHITELIST: {e}")).ok()
            })
            .collect::<Vec<IpAddr>>();
        Some(ip_addrs)
    });
    match &whitelist {
        Some(whitelist) if whitelist.is_empty() => {
            warn!(
                "🚨️ The M-Pesa IP whitelist was configured, but is empty. The server will run, but won't accept any \
                 payment callbacks."
            );
        },
        None => {
            info!("🪛️ No M-Pesa IP whitelist is set. Callbacks will be accepted from any peer.");
        },
        Some(v) => {
            let addrs = v.iter().map(|a| a.to_string()).collect::<Vec<_>>().join(", ");
            info!("🪛️ M-Pesa IP whitelist: {addrs}");
        },
    }
    whitelist
}

fn configure_pending_timeout(value: Option<String>) -> Option<Duration> {
    let Some(s) = value else {
        info!("🪛️ RPG_PENDING_REQUEST_TIMEOUT is not set. Pending payment requests will not expire.");
        return None;
    };
    if is_disabled_marker(&s) {
        info!("🪛️ Pending payment request expiry is disabled.");
        return None;
    }
    match s.trim().parse::<i64>() {
        Ok(hours) if hours > 0 => {
            info!("🪛️ Pending payment requests expire after {hours} hrs.");
            Some(Duration::hours(hours))
        },
        Ok(hours) => {
            warn!("🪛️ RPG_PENDING_REQUEST_TIMEOUT must be positive, but was {hours}. Pending requests will not expire.");
            None
        },
        Err(e) => {
            warn!("🪛️ Invalid configuration value for RPG_PENDING_REQUEST_TIMEOUT. {e}. Pending requests will not expire.");
            None
        },
    }
}
