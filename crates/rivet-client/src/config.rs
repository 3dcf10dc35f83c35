use std::time::Duration;

/// Configuration for the default reqwest transport.
///
/// # Fields
///
/// - `max_idle_per_host`: Idle keep-alive connections kept per host
/// - `request_timeout_ms`: Whole-request timeout in milliseconds
/// - `connect_timeout_ms`: TCP connect timeout in milliseconds
///
/// # Default Configuration
///
/// The default configuration is:
/// - `max_idle_per_host`: 10
/// - `request_timeout_ms`: 30000 (30 seconds)
/// - `connect_timeout_ms`: 5000 (5 seconds)
///
/// # Example
///
/// ```rust
/// use rivet_client::ClientConfig;
///
/// // Up to 20 idle connections, 60-second timeout
/// let config = ClientConfig {
///     max_idle_per_host: 20,
///     request_timeout_ms: 60000,
///     ..ClientConfig::default()
/// };
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Maximum number of idle connections per host
    pub max_idle_per_host: usize,
    /// Maximum time for a whole request in milliseconds
    pub request_timeout_ms: u64,
    /// Maximum time to establish a connection in milliseconds
    pub connect_timeout_ms: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            max_idle_per_host: 10,
            request_timeout_ms: 30000,
            connect_timeout_ms: 5000,
        }
    }
}

impl ClientConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }
}
