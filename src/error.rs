use std::sync::Arc;

use thiserror::Error;

/// Result type used throughout the FeatureSwitches SDK.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that may occur while talking to the FeatureSwitches API.
///
/// None of these are fatal for flag evaluation: [`Client::is_enabled`](crate::Client::is_enabled)
/// absorbs them into the caller-provided default.
#[derive(Error, Debug, Clone)]
#[non_exhaustive]
pub enum Error {
    /// The feature is unknown to the remote source, or its record is malformed.
    #[error("feature not found")]
    FeatureNotFound,

    /// The request was rejected, customer or environment key is likely invalid.
    #[error("unauthorized, customer_key or environment_key is likely invalid")]
    Unauthorized,

    /// Invalid `api` configuration.
    #[error("invalid api base url configuration")]
    InvalidBaseUrl(#[source] url::ParseError),

    /// The server answered with a status the SDK does not expect.
    #[error("unexpected response status {status}: {message}")]
    UnexpectedStatus {
        /// HTTP status code.
        status: u16,
        /// Message returned by the server, if any.
        message: String,
    },

    /// The response body could not be decoded.
    #[error("malformed response")]
    MalformedResponse(#[source] Arc<serde_json::Error>),

    /// Network error (including request timeouts).
    #[error(transparent)]
    // reqwest::Error is not clonable, so we're wrapping it in an Arc.
    Network(Arc<reqwest::Error>),
}

impl From<reqwest::Error> for Error {
    fn from(value: reqwest::Error) -> Self {
        // Urls carry the feature key and user identifier, keep them out of error messages.
        Error::Network(Arc::new(value.without_url()))
    }
}

impl From<serde_json::Error> for Error {
    fn from(value: serde_json::Error) -> Self {
        Error::MalformedResponse(Arc::new(value))
    }
}
