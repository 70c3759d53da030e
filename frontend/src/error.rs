//! Error taxonomy of remote calls.

use eduflow_shared::{phone::PhoneError, JWT_EXPIRED};
use thiserror::Error;

/// Failure of any remote call or of the client-side checks guarding one.
///
/// `Clone` so a single in-flight fetch can hand the same error to every
/// waiter attached to it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// Transport failure: no response was received.
    #[error("network error: {0}")]
    Network(String),
    /// Server-reported failure; `message` is shown to the user verbatim.
    #[error("{message}")]
    Server {
        /// HTTP status code.
        status: u16,
        /// Value of the body's `error` field.
        message: String,
    },
    /// The bearer credential expired (`JWT_EXPIRED`).
    #[error("session expired, please sign in again")]
    CredentialExpired,
    /// No credential in the session.
    #[error("not signed in")]
    Unauthenticated,
    /// The signed-in role may not open the page.
    #[error("your role cannot open this page")]
    Forbidden,
    /// Client-side validation, raised before any request is issued.
    #[error("{0}")]
    Validation(String),
    /// A response body did not match the expected shape.
    #[error("parse error: {0}")]
    Decode(String),
    /// A write panicked or finished without an outcome.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    /// Maps a non-2xx response body to the taxonomy. The `JWT_EXPIRED` code
    /// wins over the status.
    pub fn from_response(status: u16, body: &str) -> Self {
        let message = serde_json::from_str::<eduflow_shared::ErrorBody>(body)
            .map(|body| body.error)
            .ok()
            .filter(|message| !message.trim().is_empty());
        match message {
            Some(code) if code == JWT_EXPIRED => ApiError::CredentialExpired,
            Some(message) => ApiError::Server {
                status,
                message,
            },
            None => ApiError::Server {
                status,
                message: format!("HTTP error: {status}"),
            },
        }
    }

    /// Whether the server rejected the credential as expired.
    pub fn is_credential_expired(&self) -> bool {
        matches!(self, ApiError::CredentialExpired)
    }

    /// Errors that force the user back through sign-in.
    pub fn requires_sign_in(&self) -> bool {
        matches!(self, ApiError::CredentialExpired | ApiError::Unauthenticated)
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ApiError::Decode(err.to_string())
        } else {
            ApiError::Network(err.to_string())
        }
    }
}

impl From<PhoneError> for ApiError {
    fn from(err: PhoneError) -> Self {
        ApiError::Validation(err.to_string())
    }
}
