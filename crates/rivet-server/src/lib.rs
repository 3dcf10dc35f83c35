//! Rivet Server
//!
//! This crate provides the server half of the Rivet runtime: the request
//! lifecycle pipeline that generated handlers call into, the [`RpcServer`]
//! trait they implement, and an [`HttpServer`] that hosts them.
//!
//! # Components
//!
//! - **[`pipeline`]**: Hook stages, panic capture and response writing
//! - **[`RpcServer`]**: Implemented by every generated `{Service}Server`
//! - **[`HttpServer`]**: hyper-based host that multiplexes services by path
//! - **[`hooks`]**: Built-in trace-id and logging hook sets

pub mod config;
pub mod hooks;
pub mod http_server;
pub mod pipeline;
pub mod service;

pub use config::ServerConfig;
pub use hooks::{logging_hooks, trace_id_hooks, LogHooks};
pub use http_server::HttpServer;
pub use pipeline::{Handled, Outcome};
pub use service::RpcServer;

// Generated service traits are declared with this macro.
pub use async_trait::async_trait;
