//! Built-in hook sets.
//!
//! - [`trace_id_hooks`]: propagates or mints an `x-trace-id` per call
//! - [`logging_hooks`] / [`LogHooks`]: one log line per call
//!
//! Combine them, and any of your own, with
//! [`ServerHooks::chain`](rivet_common::ServerHooks::chain). Put the trace-id
//! set first so later sets can read the [`TraceId`](rivet_common::TraceId)
//! from the call's extensions.

mod logging;
mod trace;

pub use logging::{logging_hooks, LogHooks, DEFAULT_REDACTED_PARAMS};
pub use trace::trace_id_hooks;
