//! Error types for the New/Mode API client.
//!
//! # Design
//! The remote API only distinguishes "200" from "anything else", so every
//! non-200 response lands in `Http` with the raw status code and body. The
//! remaining variants separate failures that happen on our side of the wire
//! (configuration, URL building, serialization, transport) from a 200 whose
//! body does not have the documented shape.

use thiserror::Error;

/// Errors returned by `NewmodeClient` operations.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The server answered with a status other than 200.
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// The request never produced a response (connection refused, DNS, IO).
    #[error("transport failed: {0}")]
    Transport(String),

    /// A 200 response body was not valid JSON.
    #[error("deserialization failed: {0}")]
    Deserialization(String),

    /// A 200 response body did not contain the expected envelope key.
    #[error("response is missing envelope key `{key}`")]
    MissingEnvelope { key: String },

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    Serialization(String),

    /// Base URL and endpoint did not form a valid URL.
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    /// Client configuration could not be resolved.
    #[error("configuration error: {0}")]
    Config(String),
}

impl ApiError {
    /// Status code of the failed response, if the server answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<url::ParseError> for ApiError {
    fn from(err: url::ParseError) -> Self {
        ApiError::InvalidUrl(err.to_string())
    }
}
