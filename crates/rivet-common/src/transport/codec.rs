use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::protocol::error::Result;

/// Media type of the compact binary encoding.
pub const BINARY_CONTENT_TYPE: &str = "application/postcard";
/// Media type of the JSON encoding.
pub const JSON_CONTENT_TYPE: &str = "application/json";
/// Media type of URL-encoded form bodies.
pub const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Wire encoding negotiated for a single call.
///
/// Selected from the request's `Content-Type`: the binary media type picks
/// [`Encoding::Binary`], `application/json` picks [`Encoding::Json`], and
/// anything else (including a missing header) falls back to
/// [`Encoding::Form`].
///
/// # Example
///
/// ```
/// use rivet_common::transport::Encoding;
///
/// assert_eq!(Encoding::from_content_type(Some("application/json; charset=utf-8")), Encoding::Json);
/// assert_eq!(Encoding::from_content_type(Some("APPLICATION/POSTCARD")), Encoding::Binary);
/// assert_eq!(Encoding::from_content_type(Some("text/plain")), Encoding::Form);
/// assert_eq!(Encoding::from_content_type(None), Encoding::Form);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Encoding {
    Binary,
    Json,
    Form,
}

impl Encoding {
    pub fn from_content_type(header: Option<&str>) -> Self {
        let media_type = match header {
            Some(value) => value.split(';').next().unwrap_or("").trim().to_ascii_lowercase(),
            None => return Encoding::Form,
        };
        match media_type.as_str() {
            BINARY_CONTENT_TYPE => Encoding::Binary,
            JSON_CONTENT_TYPE => Encoding::Json,
            _ => Encoding::Form,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Encoding::Binary => "binary",
            Encoding::Json => "json",
            Encoding::Form => "form",
        }
    }

    /// Content type of successful responses. Form calls are answered in JSON.
    pub fn response_content_type(self) -> &'static str {
        match self {
            Encoding::Binary => BINARY_CONTENT_TYPE,
            Encoding::Json | Encoding::Form => JSON_CONTENT_TYPE,
        }
    }

    /// Encodes a response message for this encoding family.
    pub fn encode<T: Serialize + ?Sized>(self, value: &T) -> Result<Vec<u8>> {
        match self {
            Encoding::Binary => BinaryCodec::encode(value),
            Encoding::Json | Encoding::Form => JsonCodec::encode(value),
        }
    }
}

/// JSON codec for request and response records.
///
/// Decoding tolerates unknown fields, and records generated with
/// `#[serde(default)]` tolerate missing ones. Encoding emits every field,
/// zero values included. An empty body decodes as `{}`.
pub struct JsonCodec;

impl JsonCodec {
    pub fn encode<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(value)?)
    }

    pub fn decode<T: DeserializeOwned>(data: &[u8]) -> Result<T> {
        if data.iter().all(u8::is_ascii_whitespace) {
            return Ok(serde_json::from_slice(b"{}")?);
        }
        Ok(serde_json::from_slice(data)?)
    }
}

/// Compact binary codec backed by postcard.
pub struct BinaryCodec;

impl BinaryCodec {
    pub fn encode<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>> {
        Ok(postcard::to_allocvec(value)?)
    }

    pub fn decode<T: DeserializeOwned>(data: &[u8]) -> Result<T> {
        Ok(postcard::from_bytes(data)?)
    }
}
