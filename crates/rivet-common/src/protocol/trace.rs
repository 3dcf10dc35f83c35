use std::sync::atomic::{AtomicU64, Ordering};
use std::time::SystemTime;

/// Request header (and response header) carrying the trace identifier.
pub const TRACE_ID_HEADER: &str = "x-trace-id";

static TRACE_ID_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Trace identifier attached to a call by the trace-id hook set.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TraceId(pub String);

impl TraceId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Generates a process-unique trace identifier as 16 hex digits.
pub fn generate_trace_id() -> TraceId {
    let timestamp = SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0);

    let counter = TRACE_ID_COUNTER.fetch_add(1, Ordering::SeqCst);

    // Upper 32 bits from the clock, lower 32 from the counter
    let id = (timestamp & 0xFFFF_FFFF_0000_0000) | (counter & 0xFFFF_FFFF);
    TraceId(format!("{:016x}", id))
}
