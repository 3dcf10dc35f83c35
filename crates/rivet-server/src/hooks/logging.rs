use std::sync::Arc;

use rivet_common::transport::FormValues;
use rivet_common::{CallContext, RpcError, ServerHooks, TraceId};

/// Query parameters never written to the log.
pub const DEFAULT_REDACTED_PARAMS: [&str; 3] = ["access_key", "appkey", "sign"];

/// Request logging hook set builder.
///
/// Logs one `info` line per call on the Sent stage (path, observed status,
/// query parameters, cost) and, on the Error stage, the error itself at
/// `error` level for 5xx and `warn` level for 4xx.
///
/// # Example
///
/// ```
/// use rivet_server::LogHooks;
///
/// let hooks = LogHooks::new().with_redacted("token").into_hooks();
/// assert!(!hooks.is_empty());
/// ```
#[derive(Debug, Clone)]
pub struct LogHooks {
    redacted: Vec<String>,
}

impl Default for LogHooks {
    fn default() -> Self {
        Self {
            redacted: DEFAULT_REDACTED_PARAMS.iter().map(|p| p.to_string()).collect(),
        }
    }
}

impl LogHooks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a query parameter to the redaction list.
    pub fn with_redacted(mut self, param: impl Into<String>) -> Self {
        self.redacted.push(param.into());
        self
    }

    pub fn into_hooks(self) -> ServerHooks {
        let redacted: Arc<[String]> = self.redacted.into();

        ServerHooks::new()
            .on_error(|ctx, err| log_error(ctx, err))
            .on_response_sent(move |ctx| {
                tracing::info!(
                    path = ctx.path(),
                    status = ctx.observed_status().as_u16(),
                    params = %loggable_params(ctx.query(), &redacted),
                    cost_ms = ctx.elapsed().as_millis() as u64,
                    trace_id = trace_id(ctx),
                    "rpc call"
                );
            })
    }
}

/// Logging hook set with the default redaction list.
pub fn logging_hooks() -> ServerHooks {
    LogHooks::default().into_hooks()
}

fn log_error(ctx: &CallContext, err: &RpcError) {
    let status = ctx.observed_status().as_u16();
    if status >= 500 {
        tracing::error!(path = ctx.path(), status, trace_id = trace_id(ctx), "{}", err);
    } else if status >= 400 {
        tracing::warn!(path = ctx.path(), status, trace_id = trace_id(ctx), "{}", err);
    }
}

fn trace_id(ctx: &CallContext) -> &str {
    ctx.extensions()
        .get::<TraceId>()
        .map(TraceId::as_str)
        .unwrap_or("")
}

fn loggable_params(query: Option<&str>, redacted: &[String]) -> String {
    match query {
        Some(query) => FormValues::parse(query).encode_without(redacted),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hyper::{Method, StatusCode};

    #[test]
    fn test_params_are_redacted() {
        let redacted = LogHooks::default().redacted;
        let params = loggable_params(Some("user=ada&sign=deadbeef&appkey=k1&page=2"), &redacted);
        assert_eq!(params, "page=2&user=ada");
    }

    #[test]
    fn test_custom_redaction() {
        let hooks = LogHooks::new().with_redacted("token");
        assert!(hooks.redacted.iter().any(|p| p == "token"));
        assert!(hooks.redacted.iter().any(|p| p == "sign"));
    }

    #[test]
    fn test_hooks_run_on_every_stage() {
        let hooks = logging_hooks();
        let mut ctx = CallContext::new(Method::POST, "/demo.v1.Echo/Echo");
        ctx.set_status_code(StatusCode::INTERNAL_SERVER_ERROR);
        hooks.call_error(&mut ctx, &RpcError::internal("boom"));
        ctx.mark_sent();
        hooks.call_response_sent(&ctx);
    }
}
