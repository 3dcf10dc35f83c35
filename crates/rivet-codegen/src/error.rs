use thiserror::Error;

/// Errors raised while loading a schema or generating code.
///
/// All of them are fatal: nothing is written when generation fails.
#[derive(Error, Debug)]
pub enum GenError {
    #[error("Malformed schema: {0}")]
    MalformedSchema(String),

    #[error("Unknown record {reference:?} referenced by {referrer}")]
    UnknownRecord { referrer: String, reference: String },

    #[error("Unknown service: {0}")]
    UnknownService(String),

    #[error("Duplicate service {0}")]
    DuplicateService(String),

    #[error("Duplicate method {method} in service {service}")]
    DuplicateMethod { service: String, method: String },

    #[error("Duplicate record {0}")]
    DuplicateRecord(String),

    #[error("Duplicate field {field} in record {record}")]
    DuplicateField { record: String, field: String },

    #[error("Malformed @{rule} argument {argument:?} on {record}.{field}: {reason}")]
    MalformedRule {
        record: String,
        field: String,
        rule: String,
        argument: String,
        reason: String,
    },

    #[error("Rule @{rule} cannot be applied to {record}.{field} ({kind})")]
    IncompatibleRule {
        record: String,
        field: String,
        rule: String,
        kind: String,
    },

    #[error("Unknown validation rule @{keyword} on {record}.{field}")]
    UnknownRule {
        record: String,
        field: String,
        keyword: String,
    },

    #[error("Invalid pattern {pattern:?} on {record}.{field}: {reason}")]
    InvalidPattern {
        record: String,
        field: String,
        pattern: String,
        reason: String,
    },

    #[error("Schema JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, GenError>;
