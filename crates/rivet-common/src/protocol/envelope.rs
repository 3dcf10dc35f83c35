//! JSON wire envelope for errors.
//!
//! Errors are always written as JSON regardless of the encoding negotiated
//! for the call:
//!
//! ```text
//! {"code": "invalid_argument", "msg": "...", "meta": {"argument": "name"}}
//! ```
//!
//! `meta` is omitted when empty and `msg` is capped at [`MAX_MSG_BYTES`].

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::protocol::error::{ErrorCode, RpcError};

/// Upper bound on the serialized `msg` field.
pub const MAX_MSG_BYTES: usize = 1_000_000;

const FALLBACK_BODY: &str =
    r#"{"code":"internal","msg":"there was an error but it could not be serialized into JSON"}"#;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    pub code: String,
    pub msg: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub meta: BTreeMap<String, String>,
}

impl ErrorEnvelope {
    /// Serializes the envelope, falling back to a fixed internal error body.
    pub fn to_json(&self) -> Vec<u8> {
        serde_json::to_vec(self).unwrap_or_else(|err| {
            tracing::error!("Failed to serialize error envelope: {}", err);
            FALLBACK_BODY.as_bytes().to_vec()
        })
    }

    /// Converts a decoded envelope back into an [`RpcError`].
    ///
    /// Unknown code strings become `internal`, keeping the original body for
    /// diagnosis.
    pub fn into_error(self) -> RpcError {
        match self.code.parse::<ErrorCode>() {
            Ok(code) => self
                .meta
                .into_iter()
                .fold(RpcError::new(code, self.msg), |err, (k, v)| err.with_meta(k, v)),
            Err(_) => RpcError::internal(format!(
                "invalid type returned from server error response: {}",
                self.code
            ))
            .with_meta("body", self.msg),
        }
    }
}

impl From<&RpcError> for ErrorEnvelope {
    fn from(err: &RpcError) -> Self {
        Self {
            code: err.code().as_str().to_string(),
            msg: truncate_msg(err.msg(), MAX_MSG_BYTES).to_string(),
            meta: err.meta_map().clone(),
        }
    }
}

/// Cuts `msg` to at most `max` bytes without splitting a character.
pub fn truncate_msg(msg: &str, max: usize) -> &str {
    if msg.len() <= max {
        return msg;
    }
    let mut end = max;
    while !msg.is_char_boundary(end) {
        end -= 1;
    }
    &msg[..end]
}

impl RpcError {
    /// Reconstructs the error a server reported in a non-2xx response.
    ///
    /// Bodies that are not a valid envelope (proxies, load balancers) become
    /// `internal` errors carrying the status and raw body as metadata.
    pub fn from_response(status: u16, body: &[u8]) -> RpcError {
        if (300..400).contains(&status) {
            return RpcError::internal(format!("unexpected redirect (status {})", status))
                .with_meta("http_status", status.to_string());
        }

        match serde_json::from_slice::<ErrorEnvelope>(body) {
            Ok(envelope) => envelope.into_error(),
            Err(_) => RpcError::internal(format!(
                "error from intermediary with HTTP status code {}",
                status
            ))
            .with_meta("http_status", status.to_string())
            .with_meta("body", String::from_utf8_lossy(body).into_owned()),
        }
    }
}
