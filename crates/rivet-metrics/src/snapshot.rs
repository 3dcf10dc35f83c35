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

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Coarse outcome of a call, derived from its observed HTTP status.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StatusClass {
    Success,
    ClientError,
    ServerError,
}

impl StatusClass {
    pub fn of(status: u16) -> Self {
        match status {
            500..=u16::MAX => StatusClass::ServerError,
            400..=499 => StatusClass::ClientError,
            _ => StatusClass::Success,
        }
    }
}

/// Metrics for one route
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct RouteMetrics {
    pub call_count: u64,
    pub success_count: u64,
    pub client_error_count: u64,
    pub server_error_count: u64,
    pub avg_latency_us: u64,
    pub p50_latency_us: u64,
    pub p95_latency_us: u64,
    pub p99_latency_us: u64,
    pub max_latency_us: u64,
}

impl RouteMetrics {
    /// Share of calls answered with a 4xx or 5xx status, 0.0 with no calls.
    pub fn error_rate(&self) -> f64 {
        if self.call_count == 0 {
            return 0.0;
        }
        (self.client_error_count + self.server_error_count) as f64 / self.call_count as f64
    }
}

/// Complete metrics snapshot
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct MetricsSnapshot {
    pub total_requests: u64,
    pub successful_requests: u64,
    pub failed_requests: u64,
    pub uptime_ms: u64,
    pub routes: BTreeMap<String, RouteMetrics>,
}

impl MetricsSnapshot {
    /// Serializes the snapshot as pretty-printed JSON.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn route(&self, route: &str) -> Option<&RouteMetrics> {
        self.routes.get(route)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_class() {
        assert_eq!(StatusClass::of(200), StatusClass::Success);
        assert_eq!(StatusClass::of(304), StatusClass::Success);
        assert_eq!(StatusClass::of(404), StatusClass::ClientError);
        assert_eq!(StatusClass::of(499), StatusClass::ClientError);
        assert_eq!(StatusClass::of(503), StatusClass::ServerError);
    }

    #[test]
    fn test_error_rate() {
        let metrics = RouteMetrics {
            call_count: 4,
            success_count: 3,
            server_error_count: 1,
            ..Default::default()
        };
        assert_eq!(metrics.error_rate(), 0.25);
        assert_eq!(RouteMetrics::default().error_rate(), 0.0);
    }

    #[test]
    fn test_snapshot_json_shape() {
        let mut snapshot = MetricsSnapshot::default();
        snapshot.total_requests = 1;
        snapshot.routes.insert(
            "/demo.v1.Echo/Echo".to_string(),
            RouteMetrics {
                call_count: 1,
                success_count: 1,
                ..Default::default()
            },
        );

        let json = snapshot.to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["total_requests"], 1);
        assert_eq!(value["routes"]["/demo.v1.Echo/Echo"]["call_count"], 1);

        let back: MetricsSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(back, snapshot);
    }
}
