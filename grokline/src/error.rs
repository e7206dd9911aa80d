//! Error types for sends and transports, plus HTTP error mapping.

use std::time::Duration;

use grokline_auth::AuthError;
use thiserror::Error;

/// Errors from moving bytes between the client and the service.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum TransportError {
    /// The connection could not be established.
    #[error("connect failed: {0}")]
    Connect(String),

    /// The request or the response body timed out.
    #[error("timed out after {0:?}")]
    Timeout(Duration),

    /// Reading the response body failed part way through.
    #[error("read failed: {0}")]
    Read(String),

    /// The service answered with a non-success status.
    #[error("HTTP {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body, as text.
        body: String,
    },

    /// Anything else.
    #[error("{0}")]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}

/// Errors returned by [`crate::Session`] operations.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum ClientError {
    /// No credentials are installed; nothing was sent.
    #[error("authentication required")]
    AuthenticationRequired,

    /// The service rejected the credentials (HTTP 401 or 403).
    #[error("authentication rejected (HTTP {status}): {body}")]
    AuthenticationRejected {
        /// HTTP status code.
        status: u16,
        /// Response body, as text.
        body: String,
    },

    /// A continuation was requested before any conversation was established.
    #[error("no conversation has been started")]
    ConversationNotStarted,

    /// The request could not be built (bad base URL, unserializable body).
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The request could not be delivered or the response could not be read.
    #[error("transport failure: {0}")]
    Transport(#[from] TransportError),

    /// Credential acquisition or storage failed.
    #[error("credentials: {0}")]
    Credentials(#[from] AuthError),
}

impl ClientError {
    /// Whether the error means the caller has to (re)authenticate.
    pub fn is_auth_failure(&self) -> bool {
        matches!(
            self,
            ClientError::AuthenticationRequired | ClientError::AuthenticationRejected { .. }
        )
    }
}

/// Map a non-success HTTP status to a [`ClientError`].
pub(crate) fn map_http_status(status: u16, body: &str) -> ClientError {
    match status {
        401 | 403 => ClientError::AuthenticationRejected {
            status,
            body: body.to_string(),
        },
        _ => ClientError::Transport(TransportError::Status {
            status,
            body: body.to_string(),
        }),
    }
}

/// Map a [`reqwest::Error`] to a [`TransportError`].
pub(crate) fn map_reqwest_error(err: reqwest::Error) -> TransportError {
    if err.is_timeout() {
        TransportError::Timeout(Duration::from_secs(30))
    } else if err.is_connect() {
        TransportError::Connect(err.to_string())
    } else if err.is_body() || err.is_decode() {
        TransportError::Read(err.to_string())
    } else {
        TransportError::Other(Box::new(err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_401_maps_to_rejected() {
        let err = map_http_status(401, "expired");
        assert!(matches!(
            err,
            ClientError::AuthenticationRejected { status: 401, ref body } if body == "expired"
        ));
        assert!(err.is_auth_failure());
    }

    #[test]
    fn status_403_maps_to_rejected() {
        let err = map_http_status(403, "forbidden");
        assert!(matches!(err, ClientError::AuthenticationRejected { status: 403, .. }));
    }

    #[test]
    fn other_statuses_map_to_transport_status() {
        for status in [400, 404, 429, 500, 502] {
            let err = map_http_status(status, "nope");
            match err {
                ClientError::Transport(TransportError::Status { status: s, body }) => {
                    assert_eq!(s, status);
                    assert_eq!(body, "nope");
                }
                other => panic!("expected Transport(Status), got: {other:?}"),
            }
        }
    }

    #[test]
    fn transport_failures_are_not_auth_failures() {
        let err = ClientError::from(TransportError::Read("reset".into()));
        assert!(!err.is_auth_failure());
        assert!(!ClientError::ConversationNotStarted.is_auth_failure());
        assert!(ClientError::AuthenticationRequired.is_auth_failure());
    }

    #[test]
    fn display_includes_status_and_body() {
        let err = map_http_status(500, "internal error");
        let msg = err.to_string();
        assert!(msg.contains("500"), "{msg}");
        assert!(msg.contains("internal error"), "{msg}");
    }

    #[test]
    fn auth_error_converts() {
        let err: ClientError = AuthError::AcquisitionUnavailable.into();
        assert!(matches!(err, ClientError::Credentials(AuthError::AcquisitionUnavailable)));
    }
}
