//! Rivet Common Types and Transport
//!
//! This crate provides the protocol contracts shared by every service the
//! Rivet compiler generates: the error taxonomy and its wire envelope, the
//! per-call context and lifecycle hooks, the three wire encodings and the
//! validation runtime.
//!
//! # Overview
//!
//! Generated code depends on this crate directly. It is deliberately free of
//! any server or client machinery so that record types can be shared by
//! both sides:
//!
//! - **Protocol Layer**: [`RpcError`], [`ErrorCode`], [`CallContext`],
//!   [`ServerHooks`], [`Reply`]
//! - **Transport Layer**: [`transport::Encoding`], codecs, form binding,
//!   HTTP response builders
//! - **Validation**: [`validate::Validate`] and its helpers
//!
//! # Architecture
//!
//! The runtime wire protocol is:
//! - **Transport**: HTTP POST to `/{package}.{Service}/{Method}`
//! - **Encoding**: selected by `Content-Type` (binary, JSON, else form)
//! - **Errors**: always JSON, `{"code", "msg", "meta"}`
//! - **Max Error Message**: 1,000,000 bytes
//!
//! # Example
//!
//! ```
//! use rivet_common::{ErrorCode, RpcError};
//! use rivet_common::protocol::ErrorEnvelope;
//!
//! let err = RpcError::new(ErrorCode::NotFound, "no such user").with_meta("id", "42");
//! let body = ErrorEnvelope::from(&err).to_json();
//! assert_eq!(
//!     String::from_utf8(body).unwrap(),
//!     r#"{"code":"not_found","msg":"no such user","meta":{"id":"42"}}"#
//! );
//! ```

pub mod protocol;
pub mod transport;
pub mod validate;

pub use protocol::*;

// Re-exported for generated code, which derives through
// `#[serde(crate = "rivet_common::serde")]`.
pub use serde;
