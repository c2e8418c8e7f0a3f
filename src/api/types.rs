use crate::graph::AccountId;
use serde::Deserialize;
use std::fmt;
use thiserror::Error;

/// Errors surfaced by a single remote call
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ApiError {
    #[error("HTTP {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Transient network fault: {0}")]
    Transient(String),

    #[error("{0}")]
    Other(String),
}

impl ApiError {
    pub fn status(status: u16) -> Self {
        ApiError::Status {
            status,
            message: String::new(),
        }
    }
}

/// Result type alias for remote calls
pub type ApiResult<T> = std::result::Result<T, ApiError>;

/// Retry classification of an `ApiError`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// HTTP 401
    Unauthorized,
    /// HTTP 404
    NotFound,
    /// HTTP 429
    RateLimited,
    /// HTTP 500, 502, 503, 504
    Server(u16),
    /// Connection reset, malformed response
    Transient,
    /// Anything else
    Fatal,
}

impl fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unauthorized => write!(f, "unauthorized"),
            Self::NotFound => write!(f, "not_found"),
            Self::RateLimited => write!(f, "rate_limited"),
            Self::Server(code) => write!(f, "server_error_{}", code),
            Self::Transient => write!(f, "transient"),
            Self::Fatal => write!(f, "fatal"),
        }
    }
}

/// Maps an error onto the retry policy table
pub fn classify(error: &ApiError) -> ErrorClass {
    match error {
        ApiError::Status { status, .. } => match *status {
            401 => ErrorClass::Unauthorized,
            404 => ErrorClass::NotFound,
            429 => ErrorClass::RateLimited,
            500 | 502 | 503 | 504 => ErrorClass::Server(*status),
            _ => ErrorClass::Fatal,
        },
        ApiError::Transient(_) => ErrorClass::Transient,
        ApiError::Other(_) => ErrorClass::Fatal,
    }
}

/// Side of a relationship listing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Accounts this account follows ("friends")
    Outgoing,
    /// Accounts following this account ("followers")
    Incoming,
}

impl Direction {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Outgoing => "friends",
            Self::Incoming => "followers",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// One page of a cursor-paginated id listing
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct IdPage {
    pub ids: Vec<AccountId>,
    pub next_cursor: i64,
}
