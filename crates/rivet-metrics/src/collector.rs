// Copyright 2025 Rivet Authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use crate::registry::MetricsRegistry;
use hyper::StatusCode;
use rivet_common::{CallContext, ServerHooks};
use std::sync::Arc;

/// Builder for the metrics hook set.
///
/// The hook set records one sample per call on the ResponseSent stage, keyed
/// by the call's canonical route (`/package.Service/Method`). The status
/// recorded is [`CallContext::observed_status`], so calls that overran their
/// deadline count as 503 even if the handler answered.
///
/// Calls answered with 404 are skipped by default: a bad route has no
/// canonical route and its raw path is client-controlled.
///
/// # Example
///
/// ```rust
/// use rivet_metrics::{MetricsHooks, MetricsRegistry};
/// use std::sync::Arc;
///
/// let registry = Arc::new(MetricsRegistry::new());
/// let hooks = MetricsHooks::new(registry.clone()).into_hooks();
/// assert!(!hooks.is_empty());
/// ```
#[derive(Debug, Clone)]
pub struct MetricsHooks {
    registry: Arc<MetricsRegistry>,
    record_not_found: bool,
}

impl MetricsHooks {
    pub fn new(registry: Arc<MetricsRegistry>) -> Self {
        Self {
            registry,
            record_not_found: false,
        }
    }

    /// Also records calls answered with 404, keyed by their raw path.
    pub fn with_not_found(mut self, record: bool) -> Self {
        self.record_not_found = record;
        self
    }

    pub fn into_hooks(self) -> ServerHooks {
        let Self {
            registry,
            record_not_found,
        } = self;

        ServerHooks::new().on_response_sent(move |ctx| record(&registry, ctx, record_not_found))
    }
}

/// Metrics hook set recording into `registry`.
pub fn metrics_hooks(registry: Arc<MetricsRegistry>) -> ServerHooks {
    MetricsHooks::new(registry).into_hooks()
}

fn record(registry: &MetricsRegistry, ctx: &CallContext, record_not_found: bool) {
    let status = ctx.observed_status();
    if status == StatusCode::NOT_FOUND && !record_not_found {
        return;
    }

    let latency_us = ctx.elapsed().as_micros() as u64;
    match ctx.route() {
        Some(route) => registry.record_call(&route, status.as_u16(), latency_us),
        None => registry.record_call(ctx.path(), status.as_u16(), latency_us),
    }
}
