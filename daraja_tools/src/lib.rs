//! Client-side plumbing for Safaricom's Daraja API: OAuth credentials, signed STK push requests and the
//! callback wire format.
mod api;
mod config;
pub mod credentials;
mod data_objects;
mod error;
pub mod helpers;

pub use api::{DarajaApi, STK_PUSH_PATH};
pub use config::{DarajaConfig, DarajaEnvironment};
pub use credentials::{AccessToken, CredentialCache, OAuthTokenSource, TokenGrant, TokenSource};
pub use data_objects::{
    CallbackItem,
    CallbackMetadata,
    ConfirmedTransaction,
    StkCallback,
    StkCallbackBody,
    StkCallbackEnvelope,
    StkPushPayload,
    StkPushRequest,
    StkPushResponse,
};
pub use error::DarajaApiError;
