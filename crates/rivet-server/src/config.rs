//! Server configuration.
//!
//! Limits applied by [`HttpServer`](crate::HttpServer) before a request ever
//! reaches a generated service.

use std::time::Duration;

/// Default cap on a collected request body (4 MiB).
pub const DEFAULT_MAX_BODY_SIZE: usize = 4 * 1024 * 1024;

/// Configuration for the HTTP host.
///
/// # Fields
///
/// - `max_body_size` - Largest request body accepted, in bytes (default: 4 MiB).
///   Larger bodies are answered with `resource_exhausted`.
/// - `request_timeout` - Deadline attached to every call (default: none).
///   Handlers are not preempted; the deadline is visible on the call context
///   and an expired one is reported to instrumentation as status 503.
///
/// # Example
///
/// ```
/// use rivet_server::ServerConfig;
/// use std::time::Duration;
///
/// let config = ServerConfig::new()
///     .with_max_body_size(64 * 1024)
///     .with_request_timeout(Duration::from_secs(5));
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    pub max_body_size: usize,
    pub request_timeout: Option<Duration>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            max_body_size: DEFAULT_MAX_BODY_SIZE,
            request_timeout: None,
        }
    }
}

impl ServerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_body_size(mut self, bytes: usize) -> Self {
        self.max_body_size = bytes;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The body size limit is zero
    /// - The request timeout is zero
    pub fn validate(&self) -> Result<(), String> {
        if self.max_body_size == 0 {
            return Err("max body size must be greater than zero".to_string());
        }

        if self.request_timeout.map_or(false, |t| t.is_zero()) {
            return Err("request timeout must be greater than zero".to_string());
        }

        Ok(())
    }
}
