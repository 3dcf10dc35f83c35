//! Error taxonomy
//!
//! Every failure that crosses the process boundary is expressed as an
//! [`RpcError`]: one of sixteen canonical [`ErrorCode`]s, a human-readable
//! message and a flat string metadata map. Failures internal to this crate
//! (codec and transport plumbing) use [`RivetError`] and are converted into
//! an `internal` [`RpcError`] before they reach the wire.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Boxed error type returned by service implementations.
///
/// Anything that is not an [`RpcError`] is coerced to `internal` by
/// [`RpcError::coerce`].
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Canonical error codes and their HTTP status mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    Canceled,
    Unknown,
    InvalidArgument,
    DeadlineExceeded,
    NotFound,
    BadRoute,
    Unauthenticated,
    PermissionDenied,
    ResourceExhausted,
    FailedPrecondition,
    Aborted,
    OutOfRange,
    Unimplemented,
    Internal,
    Unavailable,
    DataLoss,
}

impl ErrorCode {
    /// All codes, in declaration order.
    pub const ALL: [ErrorCode; 16] = [
        ErrorCode::Canceled,
        ErrorCode::Unknown,
        ErrorCode::InvalidArgument,
        ErrorCode::DeadlineExceeded,
        ErrorCode::NotFound,
        ErrorCode::BadRoute,
        ErrorCode::Unauthenticated,
        ErrorCode::PermissionDenied,
        ErrorCode::ResourceExhausted,
        ErrorCode::FailedPrecondition,
        ErrorCode::Aborted,
        ErrorCode::OutOfRange,
        ErrorCode::Unimplemented,
        ErrorCode::Internal,
        ErrorCode::Unavailable,
        ErrorCode::DataLoss,
    ];

    /// Wire name of the code (`"invalid_argument"`, `"bad_route"`, ...).
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::Canceled => "canceled",
            ErrorCode::Unknown => "unknown",
            ErrorCode::InvalidArgument => "invalid_argument",
            ErrorCode::DeadlineExceeded => "deadline_exceeded",
            ErrorCode::NotFound => "not_found",
            ErrorCode::BadRoute => "bad_route",
            ErrorCode::Unauthenticated => "unauthenticated",
            ErrorCode::PermissionDenied => "permission_denied",
            ErrorCode::ResourceExhausted => "resource_exhausted",
            ErrorCode::FailedPrecondition => "failed_precondition",
            ErrorCode::Aborted => "aborted",
            ErrorCode::OutOfRange => "out_of_range",
            ErrorCode::Unimplemented => "unimplemented",
            ErrorCode::Internal => "internal",
            ErrorCode::Unavailable => "unavailable",
            ErrorCode::DataLoss => "data_loss",
        }
    }

    /// HTTP status used when an error with this code is written to the wire.
    pub fn http_status(self) -> u16 {
        match self {
            ErrorCode::Canceled => 408,
            ErrorCode::Unknown => 500,
            ErrorCode::InvalidArgument => 400,
            ErrorCode::DeadlineExceeded => 408,
            ErrorCode::NotFound => 404,
            ErrorCode::BadRoute => 404,
            ErrorCode::Unauthenticated => 401,
            ErrorCode::PermissionDenied => 403,
            ErrorCode::ResourceExhausted => 429,
            ErrorCode::FailedPrecondition => 412,
            ErrorCode::Aborted => 409,
            ErrorCode::OutOfRange => 400,
            ErrorCode::Unimplemented => 501,
            ErrorCode::Internal => 500,
            ErrorCode::Unavailable => 503,
            ErrorCode::DataLoss => 500,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ErrorCode {
    type Err = RivetError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        ErrorCode::ALL
            .iter()
            .copied()
            .find(|code| code.as_str() == s)
            .ok_or_else(|| RivetError::UnknownErrorCode(s.to_string()))
    }
}

/// A canonical RPC error: code, message and metadata.
///
/// # Example
///
/// ```
/// use rivet_common::protocol::{ErrorCode, RpcError};
///
/// let err = RpcError::invalid_argument("name", "must not be empty");
/// assert_eq!(err.code(), ErrorCode::InvalidArgument);
/// assert_eq!(err.meta("argument"), Some("name"));
/// assert_eq!(err.http_status(), 400);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RpcError {
    code: ErrorCode,
    msg: String,
    meta: BTreeMap<String, String>,
}

impl RpcError {
    pub fn new(code: ErrorCode, msg: impl Into<String>) -> Self {
        Self {
            code,
            msg: msg.into(),
            meta: BTreeMap::new(),
        }
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::Internal, msg)
    }

    /// An `invalid_argument` error scoped to one field.
    ///
    /// The field name is recorded under the `argument` metadata key.
    pub fn invalid_argument(argument: &str, reason: impl fmt::Display) -> Self {
        Self::new(ErrorCode::InvalidArgument, format!("{} {}", argument, reason))
            .with_meta("argument", argument)
    }

    pub fn bad_route(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::BadRoute, msg)
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::NotFound, msg)
    }

    /// Normalizes an arbitrary handler error.
    ///
    /// An [`RpcError`] passes through unchanged; anything else becomes an
    /// `internal` error carrying the original display text.
    pub fn coerce(err: BoxError) -> Self {
        match err.downcast::<RpcError>() {
            Ok(rpc) => *rpc,
            Err(other) => RpcError::internal(other.to_string()),
        }
    }

    pub fn with_meta(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.meta.insert(key.into(), value.into());
        self
    }

    pub fn code(&self) -> ErrorCode {
        self.code
    }

    pub fn msg(&self) -> &str {
        &self.msg
    }

    pub fn meta(&self, key: &str) -> Option<&str> {
        self.meta.get(key).map(String::as_str)
    }

    pub fn meta_map(&self) -> &BTreeMap<String, String> {
        &self.meta
    }

    pub fn http_status(&self) -> u16 {
        self.code.http_status()
    }
}

impl fmt::Display for RpcError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rpc error {}: {}", self.code, self.msg)
    }
}

impl std::error::Error for RpcError {}

/// Errors raised by the runtime plumbing itself.
#[derive(Error, Debug)]
pub enum RivetError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Binary serialization error: {0}")]
    Serialization(#[from] postcard::Error),

    #[error("JSON serialization error: {0}")]
    JsonSerialization(#[from] serde_json::Error),

    #[error("Unknown error code: {0}")]
    UnknownErrorCode(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl RivetError {
    /// Short label for the underlying failure, safe to expose as metadata.
    pub fn cause(&self) -> &'static str {
        match self {
            RivetError::Transport(_) => "transport",
            RivetError::Serialization(_) => "postcard::Error",
            RivetError::JsonSerialization(_) => "serde_json::Error",
            RivetError::UnknownErrorCode(_) => "unknown_error_code",
            RivetError::InvalidResponse(_) => "invalid_response",
            RivetError::Io(_) => "std::io::Error",
        }
    }
}

/// The library error stays local: only its [`cause`](RivetError::cause)
/// label travels with the `internal` error.
impl From<RivetError> for RpcError {
    fn from(err: RivetError) -> Self {
        let cause = err.cause();
        tracing::warn!("Internal failure ({}): {}", cause, err);
        RpcError::internal("internal error").with_meta("cause", cause)
    }
}

pub type Result<T> = std::result::Result<T, RivetError>;
