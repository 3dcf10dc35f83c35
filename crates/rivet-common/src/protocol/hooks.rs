//! Lifecycle hooks.
//!
//! A call moves through the stages
//!
//! ```text
//! Received -> Routed -> (encoding dispatch) -> handler -> Prepared -> Sent
//! ```
//!
//! An error at Received, Routed or in the handler skips straight to the
//! Error stage and then Sent. [`ServerHooks`] bundles up to one callback per
//! stage; any of them may be absent.
//!
//! # Composition
//!
//! - [`ServerHooks::chain`] runs each stage across several sets in order.
//!   Received and Routed stop at the first error; Prepared, Sent and Error
//!   always run for every set.
//! - [`HookTable`] selects a set per method. A method entry fully replaces
//!   the service default for that method; Received always uses the default
//!   because the method is not known yet.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::protocol::context::CallContext;
use crate::protocol::error::RpcError;

pub type RequestHook = Arc<dyn Fn(&mut CallContext) -> Result<(), RpcError> + Send + Sync>;
pub type PreparedHook = Arc<dyn Fn(&mut CallContext) + Send + Sync>;
pub type SentHook = Arc<dyn Fn(&CallContext) + Send + Sync>;
pub type ErrorHook = Arc<dyn Fn(&mut CallContext, &RpcError) + Send + Sync>;

/// Up to five callbacks instrumenting one call.
///
/// # Example
///
/// ```
/// use rivet_common::protocol::{ErrorCode, RpcError, ServerHooks};
///
/// let auth = ServerHooks::new().on_request_routed(|ctx| {
///     match ctx.request_header("authorization") {
///         Some(_) => Ok(()),
///         None => Err(RpcError::new(ErrorCode::Unauthenticated, "missing credentials")),
///     }
/// });
/// let logging = ServerHooks::new().on_response_sent(|ctx| {
///     println!("{} -> {}", ctx.path(), ctx.observed_status());
/// });
///
/// let hooks = ServerHooks::chain([auth, logging]);
/// ```
#[derive(Clone, Default)]
pub struct ServerHooks {
    request_received: Option<RequestHook>,
    request_routed: Option<RequestHook>,
    response_prepared: Option<PreparedHook>,
    response_sent: Option<SentHook>,
    error: Option<ErrorHook>,
}

impl ServerHooks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Called as soon as a request reaches the server, before routing.
    pub fn on_request_received<F>(mut self, hook: F) -> Self
    where
        F: Fn(&mut CallContext) -> Result<(), RpcError> + Send + Sync + 'static,
    {
        self.request_received = Some(Arc::new(hook));
        self
    }

    /// Called once the method is known, before the body is decoded.
    pub fn on_request_routed<F>(mut self, hook: F) -> Self
    where
        F: Fn(&mut CallContext) -> Result<(), RpcError> + Send + Sync + 'static,
    {
        self.request_routed = Some(Arc::new(hook));
        self
    }

    /// Called after the handler replied and before the body is written.
    pub fn on_response_prepared<F>(mut self, hook: F) -> Self
    where
        F: Fn(&mut CallContext) + Send + Sync + 'static,
    {
        self.response_prepared = Some(Arc::new(hook));
        self
    }

    /// Terminal stage; runs for successful and failed calls alike.
    pub fn on_response_sent<F>(mut self, hook: F) -> Self
    where
        F: Fn(&CallContext) + Send + Sync + 'static,
    {
        self.response_sent = Some(Arc::new(hook));
        self
    }

    pub fn on_error<F>(mut self, hook: F) -> Self
    where
        F: Fn(&mut CallContext, &RpcError) + Send + Sync + 'static,
    {
        self.error = Some(Arc::new(hook));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.request_received.is_none()
            && self.request_routed.is_none()
            && self.response_prepared.is_none()
            && self.response_sent.is_none()
            && self.error.is_none()
    }

    pub fn call_request_received(&self, ctx: &mut CallContext) -> Result<(), RpcError> {
        match &self.request_received {
            Some(hook) => hook(ctx),
            None => Ok(()),
        }
    }

    pub fn call_request_routed(&self, ctx: &mut CallContext) -> Result<(), RpcError> {
        match &self.request_routed {
            Some(hook) => hook(ctx),
            None => Ok(()),
        }
    }

    pub fn call_response_prepared(&self, ctx: &mut CallContext) {
        if let Some(hook) = &self.response_prepared {
            hook(ctx);
        }
    }

    pub fn call_response_sent(&self, ctx: &CallContext) {
        if let Some(hook) = &self.response_sent {
            hook(ctx);
        }
    }

    pub fn call_error(&self, ctx: &mut CallContext, err: &RpcError) {
        if let Some(hook) = &self.error {
            hook(ctx, err);
        }
    }

    /// Composes several hook sets into one, preserving registration order.
    pub fn chain<I>(sets: I) -> ServerHooks
    where
        I: IntoIterator<Item = ServerHooks>,
    {
        let sets: Vec<ServerHooks> = sets.into_iter().filter(|s| !s.is_empty()).collect();
        match sets.len() {
            0 => return ServerHooks::default(),
            1 => return sets.into_iter().next().unwrap_or_default(),
            _ => {}
        }

        let sets: Arc<[ServerHooks]> = sets.into();
        let received = Arc::clone(&sets);
        let routed = Arc::clone(&sets);
        let prepared = Arc::clone(&sets);
        let sent = Arc::clone(&sets);
        let errored = sets;

        ServerHooks::new()
            .on_request_received(move |ctx| {
                for set in received.iter() {
                    set.call_request_received(ctx)?;
                }
                Ok(())
            })
            .on_request_routed(move |ctx| {
                for set in routed.iter() {
                    set.call_request_routed(ctx)?;
                }
                Ok(())
            })
            .on_response_prepared(move |ctx| {
                for set in prepared.iter() {
                    set.call_response_prepared(ctx);
                }
            })
            .on_response_sent(move |ctx| {
                for set in sent.iter() {
                    set.call_response_sent(ctx);
                }
            })
            .on_error(move |ctx, err| {
                for set in errored.iter() {
                    set.call_error(ctx, err);
                }
            })
    }
}

impl fmt::Debug for ServerHooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerHooks")
            .field("request_received", &self.request_received.is_some())
            .field("request_routed", &self.request_routed.is_some())
            .field("response_prepared", &self.response_prepared.is_some())
            .field("response_sent", &self.response_sent.is_some())
            .field("error", &self.error.is_some())
            .finish()
    }
}

/// Hook sets keyed by method name, with a service-level default.
#[derive(Clone, Default, Debug)]
pub struct HookTable {
    default: ServerHooks,
    methods: HashMap<String, ServerHooks>,
}

impl HookTable {
    pub fn new(default: ServerHooks) -> Self {
        Self {
            default,
            methods: HashMap::new(),
        }
    }

    /// Registers the hook set used instead of the default for `method`.
    pub fn with_method(mut self, method: impl Into<String>, hooks: ServerHooks) -> Self {
        self.methods.insert(method.into(), hooks);
        self
    }

    pub fn resolve(&self, method: Option<&str>) -> &ServerHooks {
        method
            .and_then(|m| self.methods.get(m))
            .unwrap_or(&self.default)
    }

    /// Flattens the table into a single set that dispatches on the routed
    /// method name at each stage.
    pub fn into_hooks(self) -> ServerHooks {
        let table = Arc::new(self);
        let received = Arc::clone(&table);
        let routed = Arc::clone(&table);
        let prepared = Arc::clone(&table);
        let sent = Arc::clone(&table);
        let errored = table;

        ServerHooks::new()
            .on_request_received(move |ctx| received.default.call_request_received(ctx))
            .on_request_routed(move |ctx| routed.resolve(ctx.method()).call_request_routed(ctx))
            .on_response_prepared(move |ctx| {
                prepared.resolve(ctx.method()).call_response_prepared(ctx)
            })
            .on_response_sent(move |ctx| sent.resolve(ctx.method()).call_response_sent(ctx))
            .on_error(move |ctx, err| errored.resolve(ctx.method()).call_error(ctx, err))
    }
}
