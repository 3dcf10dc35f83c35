use crate::snapshot::{MetricsSnapshot, RouteMetrics, StatusClass};
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use std::time::{Instant, SystemTime};

const NUM_HISTOGRAM_BINS: usize = 100;
const CLEANUP_INTERVAL: u64 = 1000;

/// Last issued access timestamp, so that timestamps are strictly increasing
/// even when two calls land in the same millisecond.
static LAST_TIMESTAMP: AtomicU64 = AtomicU64::new(0);

/// Milliseconds since the epoch, strictly greater than any earlier result.
///
/// Falls back to `last + 1` when the system clock reads before the epoch, so
/// LRU ordering survives clock skew.
fn monotonic_timestamp() -> u64 {
    let wall = SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0);

    let mut last = LAST_TIMESTAMP.load(Ordering::Acquire);
    loop {
        let next = wall.max(last + 1);
        match LAST_TIMESTAMP.compare_exchange_weak(last, next, Ordering::SeqCst, Ordering::Acquire) {
            Ok(_) => return next,
            Err(current) => last = current,
        }
    }
}

/// Limits for the per-route table.
///
/// Routes come from generated route tables, so the key space is normally
/// small; the limits guard against servers that mount many services.
///
/// # Example
///
/// ```rust
/// use rivet_metrics::MetricsConfig;
///
/// let config = MetricsConfig::new().with_max_routes(64).with_route_ttl_secs(600);
/// assert_eq!(config.max_routes, 64);
/// ```
#[derive(Debug, Clone)]
pub struct MetricsConfig {
    /// Maximum number of routes tracked. Least recently used routes are
    /// evicted beyond this.
    pub max_routes: usize,
    /// Routes idle for longer than this are dropped on cleanup.
    pub route_ttl_secs: u64,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            max_routes: 1000,
            route_ttl_secs: 3600,
        }
    }
}

impl MetricsConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_routes(mut self, max_routes: usize) -> Self {
        self.max_routes = max_routes;
        self
    }

    pub fn with_route_ttl_secs(mut self, secs: u64) -> Self {
        self.route_ttl_secs = secs;
        self
    }
}

/// Logarithmic latency histogram.
///
/// Each decade from 1µs upward is split into ten bins, giving 100 bins in
/// total; everything past the last decade lands in the final bin. Recording
/// is a handful of relaxed atomic adds.
#[derive(Debug)]
pub(crate) struct LatencyHistogram {
    bins: [AtomicU64; NUM_HISTOGRAM_BINS],
    total_us: AtomicU64,
    samples: AtomicU64,
    max_us: AtomicU64,
}

impl LatencyHistogram {
    pub(crate) fn new() -> Self {
        Self {
            bins: std::array::from_fn(|_| AtomicU64::new(0)),
            total_us: AtomicU64::new(0),
            samples: AtomicU64::new(0),
            max_us: AtomicU64::new(0),
        }
    }

    pub(crate) fn record(&self, latency_us: u64) {
        self.bins[Self::bin_of(latency_us)].fetch_add(1, Ordering::Relaxed);
        self.total_us.fetch_add(latency_us, Ordering::Relaxed);
        self.samples.fetch_add(1, Ordering::Relaxed);
        self.max_us.fetch_max(latency_us, Ordering::Relaxed);
    }

    /// Bin index: `decade * 10 + leading digit`.
    fn bin_of(latency_us: u64) -> usize {
        if latency_us == 0 {
            return 0;
        }
        let decade = latency_us.ilog10() as usize;
        let leading = (latency_us / 10u64.pow(decade as u32)) as usize;
        (decade * 10 + leading).min(NUM_HISTOGRAM_BINS - 1)
    }

    /// Lower bound of a bin, in microseconds.
    fn lower_bound(bin: usize) -> u64 {
        let decade = (bin / 10) as u32;
        let leading = (bin % 10).max(1) as u64;
        10u64.pow(decade) * leading
    }

    /// Upper bound of a bin. The bin holding leading digit 9 ends at the next
    /// decade.
    fn upper_bound(bin: usize) -> u64 {
        let decade = (bin / 10) as u32;
        let leading = (bin % 10).max(1) as u64;
        10u64.pow(decade) * (leading + 1)
    }

    /// Estimated latency at `percentile` (0-100), interpolated within the
    /// bin that contains it. Returns 0 with no samples.
    pub(crate) fn percentile(&self, percentile: u64) -> u64 {
        let total = self.samples.load(Ordering::Relaxed);
        if total == 0 {
            return 0;
        }

        let target = ((total * percentile) / 100).max(1);
        let mut seen = 0;
        for (bin, count) in self.bins.iter().enumerate() {
            let count = count.load(Ordering::Relaxed);
            if count == 0 {
                continue;
            }
            if seen + count >= target {
                let lo = Self::lower_bound(bin);
                let hi = Self::upper_bound(bin);
                let fraction = (target - seen) as f64 / count as f64;
                let estimate = lo as f64 + fraction * (hi - lo) as f64;
                // The estimate never exceeds the largest sample actually seen.
                return (estimate as u64).min(self.max_us.load(Ordering::Relaxed));
            }
            seen += count;
        }
        self.max_us.load(Ordering::Relaxed)
    }

    pub(crate) fn count(&self) -> u64 {
        self.samples.load(Ordering::Relaxed)
    }

    pub(crate) fn average(&self) -> u64 {
        match self.count() {
            0 => 0,
            n => self.total_us.load(Ordering::Relaxed) / n,
        }
    }

    pub(crate) fn max(&self) -> u64 {
        self.max_us.load(Ordering::Relaxed)
    }
}

/// Counters for one route.
#[derive(Debug)]
struct RouteStats {
    calls: AtomicU64,
    successes: AtomicU64,
    client_errors: AtomicU64,
    server_errors: AtomicU64,
    latencies: LatencyHistogram,
    last_access_ms: AtomicU64,
}

impl RouteStats {
    fn new() -> Self {
        Self {
            calls: AtomicU64::new(0),
            successes: AtomicU64::new(0),
            client_errors: AtomicU64::new(0),
            server_errors: AtomicU64::new(0),
            latencies: LatencyHistogram::new(),
            last_access_ms: AtomicU64::new(monotonic_timestamp()),
        }
    }

    fn record(&self, status: u16, latency_us: u64) {
        self.calls.fetch_add(1, Ordering::Relaxed);
        match StatusClass::of(status) {
            StatusClass::Success => self.successes.fetch_add(1, Ordering::Relaxed),
            StatusClass::ClientError => self.client_errors.fetch_add(1, Ordering::Relaxed),
            StatusClass::ServerError => self.server_errors.fetch_add(1, Ordering::Relaxed),
        };
        self.latencies.record(latency_us);
        self.last_access_ms.store(monotonic_timestamp(), Ordering::Relaxed);
    }

    fn snapshot(&self) -> RouteMetrics {
        RouteMetrics {
            call_count: self.calls.load(Ordering::Relaxed),
            success_count: self.successes.load(Ordering::Relaxed),
            client_error_count: self.client_errors.load(Ordering::Relaxed),
            server_error_count: self.server_errors.load(Ordering::Relaxed),
            avg_latency_us: self.latencies.average(),
            p50_latency_us: self.latencies.percentile(50),
            p95_latency_us: self.latencies.percentile(95),
            p99_latency_us: self.latencies.percentile(99),
            max_latency_us: self.latencies.max(),
        }
    }
}

/// Process-wide call metrics, keyed by route.
///
/// Counters are atomics; the route map is behind a `RwLock` that is only
/// taken for writing the first time a route is seen and during periodic
/// cleanup. Share it between servers with `Arc`.
///
/// # Example
///
/// ```rust
/// use rivet_metrics::MetricsRegistry;
///
/// let registry = MetricsRegistry::new();
/// registry.record_call("/demo.v1.Echo/Echo", 200, 150);
/// registry.record_call("/demo.v1.Echo/Echo", 500, 900);
///
/// let snapshot = registry.snapshot();
/// assert_eq!(snapshot.total_requests, 2);
/// assert_eq!(snapshot.routes["/demo.v1.Echo/Echo"].server_error_count, 1);
/// ```
#[derive(Debug)]
pub struct MetricsRegistry {
    total_requests: AtomicU64,
    successful_requests: AtomicU64,
    failed_requests: AtomicU64,
    routes: RwLock<HashMap<String, Arc<RouteStats>>>,
    started_at: Instant,
    config: MetricsConfig,
    operations: AtomicU64,
}

impl Default for MetricsRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsRegistry {
    pub fn new() -> Self {
        Self::with_config(MetricsConfig::default())
    }

    pub fn with_config(config: MetricsConfig) -> Self {
        Self {
            total_requests: AtomicU64::new(0),
            successful_requests: AtomicU64::new(0),
            failed_requests: AtomicU64::new(0),
            routes: RwLock::new(HashMap::new()),
            started_at: Instant::now(),
            config,
            operations: AtomicU64::new(0),
        }
    }

    pub fn config(&self) -> &MetricsConfig {
        &self.config
    }

    /// Records one finished call. Status codes of 400 and above count as
    /// failures.
    pub fn record_call(&self, route: &str, status: u16, latency_us: u64) {
        self.total_requests.fetch_add(1, Ordering::Relaxed);
        if StatusClass::of(status) == StatusClass::Success {
            self.successful_requests.fetch_add(1, Ordering::Relaxed);
        } else {
            self.failed_requests.fetch_add(1, Ordering::Relaxed);
        }

        self.maybe_cleanup();
        self.route_stats(route).record(status, latency_us);
    }

    /// Looks up a route's counters, registering the route on first sight.
    fn route_stats(&self, route: &str) -> Arc<RouteStats> {
        if let Ok(routes) = self.routes.read() {
            if let Some(stats) = routes.get(route) {
                return stats.clone();
            }
        }

        let mut routes = self.routes.write().unwrap_or_else(|e| e.into_inner());
        routes
            .entry(route.to_string())
            .or_insert_with(|| {
                tracing::debug!("Tracking metrics for route {}", route);
                Arc::new(RouteStats::new())
            })
            .clone()
    }

    fn maybe_cleanup(&self) {
        let count = self.operations.fetch_add(1, Ordering::Relaxed);
        if count > 0 && count % CLEANUP_INTERVAL == 0 {
            self.cleanup_stale_routes();
        }
    }

    /// Drops routes idle past the TTL, then evicts least recently used routes
    /// until the table fits `max_routes`.
    pub fn cleanup_stale_routes(&self) {
        let now = monotonic_timestamp();
        let ttl_ms = self.config.route_ttl_secs.saturating_mul(1000);
        let mut routes = self.routes.write().unwrap_or_else(|e| e.into_inner());

        let before = routes.len();
        routes.retain(|_, stats| now.saturating_sub(stats.last_access_ms.load(Ordering::Relaxed)) < ttl_ms);

        if routes.len() > self.config.max_routes {
            let mut by_age: Vec<(String, u64)> = routes
                .iter()
                .map(|(route, stats)| (route.clone(), stats.last_access_ms.load(Ordering::Relaxed)))
                .collect();
            by_age.sort_by_key(|&(_, last_access)| last_access);

            let excess = by_age.len() - self.config.max_routes;
            for (route, _) in by_age.into_iter().take(excess) {
                routes.remove(&route);
            }
        }

        if routes.len() < before {
            tracing::debug!("Evicted {} route(s) from metrics", before - routes.len());
        }
    }

    pub fn uptime_ms(&self) -> u64 {
        self.started_at.elapsed().as_millis() as u64
    }

    /// Number of routes currently tracked.
    pub fn route_count(&self) -> usize {
        self.routes.read().map(|routes| routes.len()).unwrap_or(0)
    }

    /// Point-in-time copy of every counter. Routes are ordered by path.
    pub fn snapshot(&self) -> MetricsSnapshot {
        let routes: BTreeMap<String, RouteMetrics> = {
            let guard = self.routes.read().unwrap_or_else(|e| e.into_inner());
            guard
                .iter()
                .map(|(route, stats)| (route.clone(), stats.snapshot()))
                .collect()
        };

        MetricsSnapshot {
            total_requests: self.total_requests.load(Ordering::Relaxed),
            successful_requests: self.successful_requests.load(Ordering::Relaxed),
            failed_requests: self.failed_requests.load(Ordering::Relaxed),
            uptime_ms: self.uptime_ms(),
            routes,
        }
    }
}
