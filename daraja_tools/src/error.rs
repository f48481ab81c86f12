use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum DarajaApiError {
    #[error("Could not initialize client: {0}")]
    Initialization(String),
    #[error("Could not obtain an access token from the gateway: {0}")]
    UpstreamAuth(String),
    #[error("Gateway request failed. Status: {status:?}. {payload}")]
    GatewayRequestFailed { status: Option<u16>, payload: String },
    #[error("Malformed callback: {0}")]
    MalformedCallback(String),
}
