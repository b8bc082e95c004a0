//! Core error types for the Sonar scan service.
//!
//! Every operation in the core reports failures through [`ScanError`]. Each
//! variant maps onto a stable [`ErrorKind`] so the transport layer can render
//! a status code without matching on messages.

use std::error::Error as StdError;
use std::fmt;
use thiserror::Error;

/// Boxed underlying cause carried by [`ScanError::Internal`].
pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// Central error type for all scan operations.
#[derive(Error, Debug)]
pub enum ScanError {
    /// Unexpected failure, optionally wrapping the underlying cause
    #[error("internal error: {message}")]
    Internal {
        /// What was being attempted
        message: String,
        /// Underlying cause
        #[source]
        source: Option<BoxError>,
    },

    /// Referenced job or result does not exist
    #[error("not found: {0}")]
    NotFound(String),

    /// Malformed or missing required parameters
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Operation not valid for the current job status
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// Deadline exceeded
    #[error("timeout: {0}")]
    Timeout(String),

    /// Work was cancelled before it finished
    #[error("canceled: {0}")]
    Canceled(String),

    /// External tool unreachable
    #[error("unavailable: {0}")]
    Unavailable(String),

    /// Concurrency budget exhausted
    #[error("resource exhausted: {0}")]
    ResourceExhausted(String),

    /// Reserved: record already exists
    #[error("already exists: {0}")]
    AlreadyExists(String),

    /// Reserved for a future access-control layer
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Reserved for a future access-control layer
    #[error("forbidden: {0}")]
    Forbidden(String),
}

impl ScanError {
    /// Create an internal error without an underlying cause.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
            source: None,
        }
    }

    /// Create an internal error wrapping an underlying cause.
    pub fn internal_with(message: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self::Internal {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Classify this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Internal { .. } => ErrorKind::Internal,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::InvalidInput(_) => ErrorKind::InvalidInput,
            Self::InvalidState(_) => ErrorKind::InvalidState,
            Self::Timeout(_) => ErrorKind::Timeout,
            Self::Canceled(_) => ErrorKind::Canceled,
            // Admission rejection is reported as unavailability.
            Self::Unavailable(_) | Self::ResourceExhausted(_) => ErrorKind::Unavailable,
            Self::AlreadyExists(_) => ErrorKind::AlreadyExists,
            Self::Unauthorized(_) => ErrorKind::Unauthorized,
            Self::Forbidden(_) => ErrorKind::Forbidden,
        }
    }
}

/// Stable classification of a [`ScanError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Unexpected failure
    Internal,
    /// Missing job or result
    NotFound,
    /// Bad parameters
    InvalidInput,
    /// Illegal state transition
    InvalidState,
    /// Deadline exceeded
    Timeout,
    /// Cancelled work
    Canceled,
    /// Tool or capacity unavailable
    Unavailable,
    /// Duplicate record
    AlreadyExists,
    /// Not authenticated
    Unauthorized,
    /// Not permitted
    Forbidden,
}

impl ErrorKind {
    /// Machine-readable code for API responses.
    #[must_use]
    pub fn code(self) -> &'static str {
        match self {
            Self::Internal => "INTERNAL",
            Self::NotFound => "NOT_FOUND",
            Self::InvalidInput => "INVALID_INPUT",
            Self::InvalidState => "INVALID_STATE",
            Self::Timeout => "TIMEOUT",
            Self::Canceled => "CANCELED",
            Self::Unavailable => "UNAVAILABLE",
            Self::AlreadyExists => "ALREADY_EXISTS",
            Self::Unauthorized => "UNAUTHORIZED",
            Self::Forbidden => "FORBIDDEN",
        }
    }

    /// HTTP status code a transport should use for this kind.
    #[must_use]
    pub fn http_status(self) -> u16 {
        match self {
            Self::NotFound => 404,
            Self::InvalidInput => 400,
            Self::InvalidState | Self::AlreadyExists => 409,
            Self::Timeout => 504,
            Self::Unavailable => 503,
            Self::Unauthorized => 401,
            Self::Forbidden => 403,
            Self::Canceled => 499,
            Self::Internal => 500,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to determine config directory path
    #[error("could not determine config directory (XDG base directories not available)")]
    NoConfigDir,

    /// Failed to parse TOML
    #[error("failed to parse config TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    /// I/O error reading config
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid configuration value
    #[error("invalid config value for {field}: {reason}")]
    InvalidValue {
        /// Field name
        field: String,
        /// Reason for invalidity
        reason: String,
    },
}

/// Result type alias using `ScanError`.
pub type Result<T> = std::result::Result<T, ScanError>;

/// Result type alias for configuration operations.
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;
