//! Error types for the lectern client.
//!
//! One unified error type with explicit variants for transport failures,
//! server rejections, session/refresh failures, malformed responses, input
//! validation, and credential storage.

use std::fmt;
use thiserror::Error;

/// The unified error type for lectern operations.
#[derive(Debug, Error)]
pub enum Error {
    /// No response was received (DNS, TLS, connection, timeout).
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// The server answered with a non-success status.
    #[error("api error: {0}")]
    Api(#[from] ApiError),

    /// Session lifecycle errors (refresh failure, no session).
    #[error("authentication error: {0}")]
    Auth(#[from] AuthError),

    /// The response body did not match the expected envelope.
    #[error("invalid response: {message}")]
    InvalidResponse { message: String },

    /// Input validation errors (base URL, request path).
    #[error("invalid input: {0}")]
    InvalidInput(#[from] InvalidInputError),

    /// Credential storage errors.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

impl Error {
    /// Returns the server rejection, if this error is one.
    pub fn as_api(&self) -> Option<&ApiError> {
        match self {
            Error::Api(err) => Some(err),
            _ => None,
        }
    }

    /// Returns the HTTP status for server rejections.
    pub fn status(&self) -> Option<u16> {
        self.as_api().map(|err| err.status)
    }

    /// True if this error is the outcome of a failed credential refresh.
    pub fn is_refresh_failure(&self) -> bool {
        matches!(
            self,
            Error::Auth(AuthError::RefreshFailed(_)) | Error::Auth(AuthError::RefreshTimedOut)
        )
    }
}

/// Transport-level errors. No response was received from the server.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Network connection failed.
    #[error("connection failed: {message}")]
    Connection { message: String },

    /// Request timed out.
    #[error("request timed out")]
    Timeout,

    /// Generic HTTP error.
    #[error("HTTP error: {message}")]
    Http { message: String },
}

/// A non-success response from the API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    /// HTTP status code.
    pub status: u16,
    /// The envelope `message`, if the server sent one.
    pub message: Option<String>,
    /// Status that marks an expired or missing credential.
    auth_expired_status: u16,
}

impl ApiError {
    /// Status code used by the API to signal an expired credential.
    pub const DEFAULT_AUTH_EXPIRED_STATUS: u16 = 401;

    /// Create a new API error using the default auth-expired status.
    pub fn new(status: u16, message: Option<String>) -> Self {
        Self {
            status,
            message,
            auth_expired_status: Self::DEFAULT_AUTH_EXPIRED_STATUS,
        }
    }

    /// Override the status that marks authentication expiry.
    pub fn with_auth_expired_status(mut self, status: u16) -> Self {
        self.auth_expired_status = status;
        self
    }

    /// Check if this response signals that the credential has expired.
    pub fn is_auth_expired(&self) -> bool {
        self.status == self.auth_expired_status
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HTTP {}", self.status)?;
        if let Some(ref message) = self.message {
            write!(f, ": {}", message)?;
        }
        Ok(())
    }
}

impl std::error::Error for ApiError {}

/// Why a credential refresh failed.
///
/// Cloneable so a single outcome can be handed to every caller that joined
/// the refresh.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshFailure {
    /// HTTP status of the refresh response, if one was received.
    pub status: Option<u16>,
    /// Human-readable reason.
    pub reason: String,
}

impl RefreshFailure {
    /// Create a failure from a reason string.
    pub fn new(status: Option<u16>, reason: impl Into<String>) -> Self {
        Self {
            status,
            reason: reason.into(),
        }
    }

    /// Build a failure from the error the refresh call returned.
    pub fn from_error(err: &Error) -> Self {
        Self::new(err.status(), err.to_string())
    }
}

impl fmt::Display for RefreshFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status {
            Some(status) => write!(f, "{} (HTTP {})", self.reason, status),
            None => write!(f, "{}", self.reason),
        }
    }
}

/// Session lifecycle errors.
#[derive(Debug, Clone, Error)]
pub enum AuthError {
    /// The credential refresh was rejected or could not complete.
    #[error("session refresh failed: {0}")]
    RefreshFailed(RefreshFailure),

    /// The refresh call did not complete within the configured timeout.
    #[error("session refresh timed out")]
    RefreshTimedOut,

    /// The operation requires an authenticated session.
    #[error("not authenticated")]
    NotAuthenticated,

    /// The auth endpoint answered without a token.
    #[error("response did not contain a token")]
    MissingToken,
}

/// Input validation errors.
#[derive(Debug, Error)]
pub enum InvalidInputError {
    /// Invalid API base URL.
    #[error("invalid base URL '{value}': {reason}")]
    BaseUrl { value: String, reason: String },

    /// Invalid request path.
    #[error("invalid path '{value}': {reason}")]
    Path { value: String, reason: String },
}

/// Credential storage errors.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Reading or writing the durable medium failed.
    #[error("I/O error on {path}: {message}")]
    Io { path: String, message: String },

    /// The stored value could not be decoded.
    #[error("corrupt credential record: {message}")]
    Corrupt { message: String },
}
