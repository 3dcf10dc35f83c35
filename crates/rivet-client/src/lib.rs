//! Rivet Client
//!
//! Runtime support for generated clients: a pluggable [`HttpClient`]
//! transport, its reqwest-backed default [`ReqwestClient`], the per-call
//! [`ClientContext`] and the shared [`do_json_request`] /
//! [`do_binary_request`] routines.

pub mod client;
pub mod config;
pub mod context;
pub mod transport;

pub use client::{do_binary_request, do_json_request};
pub use config::ClientConfig;
pub use context::ClientContext;
pub use transport::{HttpClient, ReqwestClient, TransportResponse};
