//! Error types for the key service client.
//!
//! # Design
//! Only conditions the client cannot hand back as data are errors. A 4xx/5xx
//! response that is not an expiry signature is an ordinary `ApiResponse`;
//! callers interpret business-level error payloads themselves.
//! `AuthenticationFailed` and `RefreshFailed` carry the endpoint and the raw
//! response body for diagnostics and are never retried.

use thiserror::Error;

/// Failures to complete an HTTP round trip. Produced by a
/// [`Transport`](crate::transport::Transport) and propagated unchanged.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The request could not be sent or no response was received.
    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The response body could not be read.
    #[error("failed to read response body from {url}: {source}")]
    Body {
        url: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

/// Errors returned by `SessionClient`.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The login response did not contain a usable access token.
    #[error("failed to get auth token from {endpoint}: response {response}")]
    AuthenticationFailed { endpoint: String, response: String },

    /// The refresh response did not contain a usable access token.
    #[error("failed to refresh auth token at {endpoint}: response {response}")]
    RefreshFailed { endpoint: String, response: String },

    /// A request other than authentication was attempted without a session.
    #[error("client is not initialized; call initialize() first")]
    NotInitialized,

    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A non-empty response body was not valid JSON.
    #[error("malformed response body (HTTP {status}): {source}")]
    MalformedResponse {
        status: u16,
        #[source]
        source: serde_json::Error,
    },

    /// The key id would not address a single key below the lookup path.
    #[error("invalid key id {0:?}")]
    InvalidKeyId(String),

    #[error("invalid url: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Errors loading client configuration from the environment.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing environment variable {0}")]
    Missing(&'static str),
}

pub type Result<T> = std::result::Result<T, ClientError>;
