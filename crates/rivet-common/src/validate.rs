//! Runtime support for generated record validators.
//!
//! The code generator emits one [`Validate`] impl per record. The checks
//! themselves are inlined into the generated code; this module only holds
//! the error type and the helpers that would be awkward to inline (lazily
//! compiled patterns and the semantic type tags).

use regex::Regex;
use std::net::IpAddr;
use std::sync::OnceLock;
use thiserror::Error;

use crate::protocol::error::{ErrorCode, RpcError};

/// Implemented by every generated record.
pub trait Validate {
    fn validate(&self) -> Result<(), ValidationError>;
}

/// First rule violation found in a record.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid {record}.{field}: {reason}")]
pub struct ValidationError {
    record: &'static str,
    field: &'static str,
    reason: String,
}

impl ValidationError {
    pub fn new(record: &'static str, field: &'static str, reason: impl Into<String>) -> Self {
        Self {
            record,
            field,
            reason: reason.into(),
        }
    }

    /// Wraps the failure of an embedded record's validator.
    pub fn embedded(record: &'static str, field: &'static str, inner: ValidationError) -> Self {
        Self::new(
            record,
            field,
            format!("embedded message failed validation: {}", inner),
        )
    }

    pub fn record(&self) -> &'static str {
        self.record
    }

    pub fn field(&self) -> &'static str {
        self.field
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }
}

impl From<ValidationError> for RpcError {
    fn from(err: ValidationError) -> Self {
        RpcError::new(ErrorCode::InvalidArgument, err.to_string()).with_meta("argument", err.field)
    }
}

/// A regular expression compiled on first use.
///
/// Generated validators declare these as `static` items so each pattern is
/// compiled at most once per process.
pub struct Pattern {
    source: &'static str,
    compiled: OnceLock<Option<Regex>>,
}

impl Pattern {
    pub const fn new(source: &'static str) -> Self {
        Self {
            source,
            compiled: OnceLock::new(),
        }
    }

    pub fn source(&self) -> &'static str {
        self.source
    }

    /// Matches `value` against the pattern. A pattern that fails to compile
    /// matches nothing.
    pub fn is_match(&self, value: &str) -> bool {
        let compiled = self.compiled.get_or_init(|| match Regex::new(self.source) {
            Ok(re) => Some(re),
            Err(err) => {
                tracing::error!("Invalid validation pattern {:?}: {}", self.source, err);
                None
            }
        });
        compiled.as_ref().map_or(false, |re| re.is_match(value))
    }
}

static PHONE_PATTERN: Pattern = Pattern::new(r"^1[3-9]\d{9}$");
static EMAIL_PATTERN: Pattern = Pattern::new(r"^[a-zA-Z0-9_-]+@[a-zA-Z0-9_-]+(\.[a-zA-Z0-9_-]+)+$");

/// Absolute URL check for the `url` type tag.
pub fn is_url(value: &str) -> bool {
    url::Url::parse(value).is_ok()
}

/// IPv4 or IPv6 literal check for the `ip` type tag.
pub fn is_ip(value: &str) -> bool {
    value.parse::<IpAddr>().is_ok()
}

/// Mainland mobile number check for the `phone` type tag.
pub fn is_phone(value: &str) -> bool {
    PHONE_PATTERN.is_match(value)
}

pub fn is_email(value: &str) -> bool {
    EMAIL_PATTERN.is_match(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ValidationError::new("SignupRequest", "name", "value length must be at most 3 runes");
        assert_eq!(
            err.to_string(),
            "invalid SignupRequest.name: value length must be at most 3 runes"
        );
    }

    #[test]
    fn test_embedded_error_wraps_inner() {
        let inner = ValidationError::new("Address", "zip", "value length must be 5 runes");
        let outer = ValidationError::embedded("User", "address", inner);
        assert_eq!(outer.field(), "address");
        assert_eq!(
            outer.reason(),
            "embedded message failed validation: invalid Address.zip: value length must be 5 runes"
        );
    }

    #[test]
    fn test_into_rpc_error() {
        let err: RpcError = ValidationError::new("Req", "msg", "too long").into();
        assert_eq!(err.code(), ErrorCode::InvalidArgument);
        assert_eq!(err.meta("argument"), Some("msg"));
        assert_eq!(err.http_status(), 400);
    }

    #[test]
    fn test_pattern_compiles_lazily() {
        static DIGITS: Pattern = Pattern::new(r"^\d+$");
        assert!(DIGITS.is_match("123"));
        assert!(!DIGITS.is_match("12a"));
        assert_eq!(DIGITS.source(), r"^\d+$");
    }

    #[test]
    fn test_broken_pattern_matches_nothing() {
        static BROKEN: Pattern = Pattern::new("(unclosed");
        assert!(!BROKEN.is_match("(unclosed"));
    }

    #[test]
    fn test_type_tags() {
        assert!(is_url("https://example.com/a?b=c"));
        assert!(!is_url("not a url"));
        assert!(is_ip("10.0.0.1"));
        assert!(is_ip("::1"));
        assert!(!is_ip("10.0.0"));
        assert!(is_phone("13812345678"));
        assert!(!is_phone("12812345678"));
        assert!(!is_phone("1381234567"));
        assert!(is_email("dev_ops@example.co.uk"));
        assert!(!is_email("dev@localhost"));
    }
}
