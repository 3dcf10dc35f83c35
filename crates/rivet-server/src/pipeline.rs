//! Request lifecycle pipeline.
//!
//! Generated servers are thin: they stamp routing information into the
//! [`CallContext`], decode the input for the negotiated encoding and then
//! hand off to the functions in this module for every stage that is the same
//! across services.
//!
//! # Architecture
//!
//! ```text
//! receive ──► route ──► decode ──► validate ──► invoke ──► finish
//!    │          │         │           │           │          │
//!    └──────────┴─────────┴───────────┴───────────┴──► write_error
//! ```
//!
//! Every path ends in exactly one call to the Sent stage, so instrumentation
//! sees each call once.

use futures_util::FutureExt;
use hyper::body::Bytes;
use hyper::{Method, StatusCode};
use serde::Serialize;
use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use tokio::task::JoinHandle;

use rivet_common::transport::{Encoding, HttpTransport, HyperResponse};
use rivet_common::{BoxError, CallContext, ErrorCode, Reply, RivetError, RpcError, ServerHooks};

/// Panic payload captured from a handler.
pub type PanicPayload = Box<dyn Any + Send + 'static>;

/// A fully written response, plus the handler panic to re-raise once the
/// response is on its way.
pub struct Handled {
    pub response: HyperResponse,
    pub panic: Option<PanicPayload>,
}

impl Handled {
    pub fn new(response: HyperResponse) -> Self {
        Self {
            response,
            panic: None,
        }
    }

    pub fn status(&self) -> StatusCode {
        self.response.status()
    }

    pub fn panicked(&self) -> bool {
        self.panic.is_some()
    }

    pub fn into_parts(self) -> (HyperResponse, Option<PanicPayload>) {
        (self.response, self.panic)
    }
}

/// What came back from a service method.
pub enum Outcome<O> {
    Replied(Reply<O>),
    Failed(BoxError),
    Panicked(PanicPayload),
}

/// Runs a service method future, capturing a panic instead of unwinding
/// through the connection task.
pub async fn invoke<F, O>(call: F) -> Outcome<O>
where
    F: Future<Output = Result<Reply<O>, BoxError>>,
{
    match AssertUnwindSafe(call).catch_unwind().await {
        Ok(Ok(reply)) => Outcome::Replied(reply),
        Ok(Err(err)) => Outcome::Failed(err),
        Err(payload) => Outcome::Panicked(payload),
    }
}

/// Received stage plus HTTP method gating.
///
/// The Received hooks run first so that one of them can enable GET on the
/// call before the method is checked.
pub fn receive(hooks: &ServerHooks, ctx: &mut CallContext) -> Result<(), RpcError> {
    hooks.call_request_received(ctx)?;

    let method = ctx.http_method();
    let allowed = method == Method::POST || (ctx.allow_get() && method == Method::GET);
    if !allowed {
        let msg = format!("unsupported method {:?} (only POST is allowed)", method.as_str());
        return Err(RpcError::bad_route(msg).with_meta("invalid_route", invalid_route(ctx)));
    }
    Ok(())
}

/// Routed stage. The method name must already be stamped into `ctx`.
pub fn route(hooks: &ServerHooks, ctx: &mut CallContext) -> Result<(), RpcError> {
    hooks.call_request_routed(ctx)
}

/// Error for a path that matches no method of the service.
pub fn bad_route(ctx: &CallContext) -> RpcError {
    RpcError::bad_route(format!("no handler for path {:?}", ctx.path()))
        .with_meta("invalid_route", invalid_route(ctx))
}

/// Error for a request body that could not be decoded.
///
/// The decoder's message is logged, never written to the caller.
pub fn decode_error(encoding: Encoding, err: RivetError) -> RpcError {
    tracing::debug!("Failed to decode {} request: {}", encoding.name(), err);
    RpcError::new(
        ErrorCode::InvalidArgument,
        format!("the {} request could not be decoded", encoding.name()),
    )
    .with_meta("cause", err.cause())
}

fn invalid_route(ctx: &CallContext) -> String {
    format!("{} {}", ctx.http_method(), ctx.path())
}

/// Writes `err` as the JSON error envelope, running the Error and Sent
/// stages.
pub fn write_error(hooks: &ServerHooks, ctx: &mut CallContext, err: RpcError) -> Handled {
    let status = StatusCode::from_u16(err.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    ctx.set_status_code(status);
    hooks.call_error(ctx, &err);

    let response = HttpTransport::error_response(&err, ctx.response_headers());
    ctx.mark_sent();
    hooks.call_response_sent(ctx);
    Handled::new(response)
}

/// Turns a service outcome into the response.
///
/// A [`ResponseHint`](rivet_common::ResponseHint) body replaces the encoded
/// message; its status and content type replace the defaults.
pub fn finish<O: Serialize>(
    hooks: &ServerHooks,
    ctx: &mut CallContext,
    encoding: Encoding,
    outcome: Outcome<O>,
) -> Handled {
    let reply = match outcome {
        Outcome::Replied(reply) => reply,
        Outcome::Failed(err) => return write_error(hooks, ctx, RpcError::coerce(err)),
        Outcome::Panicked(payload) => {
            tracing::error!(
                "Handler panicked while calling {}",
                ctx.route().as_deref().unwrap_or(ctx.path())
            );
            let mut handled = write_error(hooks, ctx, RpcError::internal("internal service panic"));
            handled.panic = Some(payload);
            return handled;
        }
    };

    let (message, hint) = reply.into_parts();
    let hint = hint.unwrap_or_default();

    let body = match (hint.body, message) {
        (Some(body), _) => body,
        (None, Some(message)) => match encoding.encode(&message) {
            Ok(encoded) => Bytes::from(encoded),
            Err(err) => {
                tracing::warn!(
                    "Failed to encode {} response for {}: {}",
                    encoding.name(),
                    ctx.route().as_deref().unwrap_or(ctx.path()),
                    err
                );
                let err = RpcError::internal(format!("failed to encode {} response", encoding.name()))
                    .with_meta("cause", err.cause());
                return write_error(hooks, ctx, err);
            }
        },
        (None, None) => {
            let err = RpcError::internal(format!(
                "received an empty {} reply and no error while calling {}. empty replies are not supported",
                short_type_name::<O>(),
                ctx.method().unwrap_or("<unknown>")
            ));
            return write_error(hooks, ctx, err);
        }
    };

    let status = hint.status.unwrap_or(StatusCode::OK);
    let content_type = hint
        .content_type
        .unwrap_or_else(|| encoding.response_content_type().to_string());

    ctx.set_status_code(status);
    hooks.call_response_prepared(ctx);

    let response = HttpTransport::build_response(status, &content_type, body, ctx.response_headers());
    ctx.mark_sent();
    hooks.call_response_sent(ctx);
    Handled::new(response)
}

/// Re-raises a captured handler panic on its own task.
///
/// The panic hook runs again for the re-raise; the returned handle resolves
/// to the task's panicking `JoinError`.
pub fn reraise(payload: PanicPayload) -> JoinHandle<()> {
    tokio::task::spawn(async move {
        if let Some(msg) = payload.downcast_ref::<&'static str>() {
            std::panic::panic_any(msg.to_string());
        }
        match payload.downcast::<String>() {
            Ok(msg) => std::panic::panic_any(*msg),
            Err(payload) => std::panic::panic_any(payload),
        }
    })
}

fn short_type_name<T>() -> &'static str {
    let full = std::any::type_name::<T>();
    full.rsplit("::").next().unwrap_or(full)
}
