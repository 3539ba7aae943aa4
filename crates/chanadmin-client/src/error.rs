//! Error types surfaced by the HTTP layer and services.

use thiserror::Error;

use crate::session::SessionError;

/// Result alias for API calls.
pub type ApiResult<T> = Result<T, ApiError>;

/// Failures produced while talking to the admin API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Building the underlying HTTP client failed.
    #[error("failed to build http client")]
    ClientBuild {
        /// Source error from reqwest.
        #[source]
        source: reqwest::Error,
    },
    /// The request could not be sent or the response body could not be read.
    #[error("request failed")]
    Transport {
        /// Logical operation name.
        operation: &'static str,
        /// Source error from reqwest.
        #[source]
        source: reqwest::Error,
    },
    /// The server answered 401; the session has been cleared.
    #[error("authentication required")]
    Unauthorized {
        /// Logical operation name.
        operation: &'static str,
    },
    /// Any other non-success status.
    #[error("request rejected ({status}): {message}")]
    Status {
        /// Logical operation name.
        operation: &'static str,
        /// HTTP status code.
        status: u16,
        /// Message extracted from the response body.
        message: String,
    },
    /// The response body did not match the expected shape.
    #[error("failed to decode response")]
    Decode {
        /// Logical operation name.
        operation: &'static str,
        /// Source error from serde.
        #[source]
        source: serde_json::Error,
    },
    /// A request URL could not be built from the base URL.
    #[error("invalid request url")]
    InvalidUrl {
        /// Base URL that could not carry path segments.
        base: String,
    },
    /// Session persistence failed.
    #[error("session store failure")]
    Session {
        /// Source session error.
        #[source]
        source: SessionError,
    },
}

impl ApiError {
    /// Whether the error means the caller must sign in again.
    #[must_use]
    pub const fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized { .. })
    }

    /// HTTP status associated with the failure, if any.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Unauthorized { .. } => Some(401),
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Operation name recorded on the error, if any.
    #[must_use]
    pub const fn operation(&self) -> Option<&'static str> {
        match self {
            Self::Transport { operation, .. }
            | Self::Unauthorized { operation }
            | Self::Status { operation, .. }
            | Self::Decode { operation, .. } => Some(*operation),
            Self::ClientBuild { .. } | Self::InvalidUrl { .. } | Self::Session { .. } => None,
        }
    }
}

impl From<SessionError> for ApiError {
    fn from(source: SessionError) -> Self {
        Self::Session { source }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_and_operation_accessors() {
        let err = ApiError::Status {
            operation: "channels.list",
            status: 503,
            message: "maintenance".into(),
        };
        assert_eq!(err.status(), Some(503));
        assert_eq!(err.operation(), Some("channels.list"));
        assert!(!err.is_unauthorized());
        assert_eq!(err.to_string(), "request rejected (503): maintenance");

        let err = ApiError::Unauthorized {
            operation: "channels.status",
        };
        assert!(err.is_unauthorized());
        assert_eq!(err.status(), Some(401));
    }

    #[test]
    fn session_errors_convert() {
        let err: ApiError = SessionError::EmptyToken.into();
        assert!(matches!(err, ApiError::Session { .. }));
        assert_eq!(err.operation(), None);
    }
}
