//! Rivet Metrics Collection
//!
//! Per-route call metrics for Rivet servers. A [`MetricsRegistry`] holds
//! counters and a latency histogram for every route it has seen, and
//! [`metrics_hooks`] turns it into a [`rivet_common::ServerHooks`] set that can
//! be chained with any other hooks a generated server is given.
//!
//! # Architecture
//!
//! - [`MetricsRegistry`]: process-wide storage, atomic counters per route
//! - [`MetricsHooks`]: records one sample per call on the ResponseSent stage
//! - [`MetricsSnapshot`]: serializable point-in-time copy of the registry
//!
//! # Usage Example
//!
//! ```rust
//! use rivet_common::ServerHooks;
//! use rivet_metrics::{metrics_hooks, MetricsRegistry};
//! use std::sync::Arc;
//!
//! let registry = Arc::new(MetricsRegistry::new());
//! let hooks = ServerHooks::chain([ServerHooks::new(), metrics_hooks(registry.clone())]);
//! # let _ = hooks;
//!
//! // Later, e.g. from an admin endpoint:
//! let snapshot = registry.snapshot();
//! println!("Total requests: {}", snapshot.total_requests);
//! ```
//!
//! # Thread Safety
//!
//! Counter updates are lock-free. The route table is behind a `RwLock` that
//! is only written when a route is first seen and during periodic cleanup.

mod collector;
mod registry;
mod snapshot;

pub use collector::{metrics_hooks, MetricsHooks};
pub use registry::{MetricsConfig, MetricsRegistry};
pub use snapshot::{MetricsSnapshot, RouteMetrics, StatusClass};
