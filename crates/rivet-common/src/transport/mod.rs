//! Rivet Transport Layer
//!
//! Wire encodings and HTTP plumbing shared by generated servers and clients.
//!
//! # Architecture
//!
//! Each call negotiates one of three encodings from its `Content-Type`:
//! - **Binary**: postcard, the default for service-to-service clients
//! - **JSON**: serde_json, tolerant of unknown fields
//! - **Form**: URL-encoded key/value pairs bound field by field
//!
//! Successful responses use the same family (form calls are answered in
//! JSON); error responses are always JSON.
//!
//! # Components
//!
//! - **[`Encoding`]**: Content negotiation and response encoding
//! - **[`JsonCodec`]** / **[`BinaryCodec`]**: Record codecs
//! - **[`FormValues`]** / **[`FromForm`]**: Form binding
//! - **[`HttpTransport`]**: Response builders

pub mod codec;
pub mod form;
pub mod http;

pub use codec::{
    BinaryCodec, Encoding, JsonCodec, BINARY_CONTENT_TYPE, FORM_CONTENT_TYPE, JSON_CONTENT_TYPE,
};
pub use form::{parse_bool, FormScalar, FormValues, FromForm};
pub use http::{HttpTransport, HyperRequest, HyperResponse, RpcRequest};
