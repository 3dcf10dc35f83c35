//! HTTP Server for Rivet services
//!
//! This module hosts one or more generated services behind a single hyper
//! HTTP/1.1 listener.
//!
//! # Architecture
//!
//! The HTTP server:
//! - Listens on a TCP socket for incoming HTTP connections
//! - Spawns a tokio task for each connection
//! - Collects the request body up to the configured limit
//! - Picks the service whose path prefix matches the request path
//! - Hands the request to that service's generated [`RpcServer::handle`]
//! - Re-raises a handler panic on a separate task once the error response
//!   has been returned, and logs the re-raised panic
//!
//! Calls rejected before any service sees them (an oversized body, a path
//! no mounted service owns) run the Error and Sent stages of the host hook
//! set registered with [`HttpServer::with_hooks`].
//!
//! # Example
//!
//! ```ignore
//! use rivet_server::HttpServer;
//!
//! #[tokio::main]
//! async fn main() {
//!     let server = HttpServer::new()
//!         .with_service(EchoServer::new(MyEcho).with_hooks(rivet_server::logging_hooks()));
//!     server.run("127.0.0.1:8080".parse().unwrap()).await.unwrap();
//! }
//! ```

use http_body_util::{BodyExt, Limited};
use hyper::body::Bytes;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::Request;
use hyper_util::rt::TokioIo;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tokio::net::TcpListener;

use crate::config::ServerConfig;
use crate::pipeline;
use crate::service::RpcServer;
use rivet_common::transport::{HyperRequest, HyperResponse};
use rivet_common::{CallContext, Deadline, ErrorCode, RivetError, RpcError, ServerHooks};

/// Shared, read-only state behind every connection.
struct ServerState {
    services: Vec<Arc<dyn RpcServer>>,
    hooks: ServerHooks,
    config: ServerConfig,
}

/// HTTP server for generated Rivet services.
pub struct HttpServer {
    services: Vec<Arc<dyn RpcServer>>,
    hooks: ServerHooks,
    config: ServerConfig,
}

impl Default for HttpServer {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpServer {
    /// Creates a server with no services and the default configuration.
    pub fn new() -> Self {
        Self {
            services: Vec::new(),
            hooks: ServerHooks::default(),
            config: ServerConfig::default(),
        }
    }

    /// Mounts a generated service.
    ///
    /// # Arguments
    ///
    /// * `service` - A generated `{Service}Server`
    ///
    /// # Returns
    ///
    /// `Self` for builder pattern chaining.
    pub fn with_service(mut self, service: impl RpcServer) -> Self {
        self.services.push(Arc::new(service));
        self
    }

    /// Hooks for calls the host rejects before routing them to a service.
    pub fn with_hooks(mut self, hooks: ServerHooks) -> Self {
        self.hooks = hooks;
        self
    }

    pub fn with_config(mut self, config: ServerConfig) -> Self {
        self.config = config;
        self
    }

    /// All mounted routes, in mount order.
    pub fn routes(&self) -> Vec<&'static str> {
        self.services
            .iter()
            .flat_map(|s| s.routes().iter().copied())
            .collect()
    }

    /// Runs the HTTP server on the specified address.
    ///
    /// # Arguments
    ///
    /// * `addr` - The socket address to bind to
    ///
    /// # Returns
    ///
    /// Only returns on a bind or accept failure.
    pub async fn run(self, addr: SocketAddr) -> Result<(), RivetError> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| RivetError::Transport(format!("Failed to bind to {}: {}", addr, e)))?;
        self.serve(listener).await
    }

    /// Serves connections from an already bound listener.
    pub async fn serve(self, listener: TcpListener) -> Result<(), RivetError> {
        self.config.validate().map_err(RivetError::Transport)?;

        tracing::info!(
            "HTTP server listening on {}",
            listener
                .local_addr()
                .map_err(|e| RivetError::Transport(format!("Failed to get local address: {}", e)))?
        );
        for route in self.routes() {
            tracing::debug!("Serving route {}", route);
        }

        let state = Arc::new(ServerState {
            services: self.services,
            hooks: self.hooks,
            config: self.config,
        });

        loop {
            let (stream, _) = listener
                .accept()
                .await
                .map_err(|e| RivetError::Transport(format!("Failed to accept connection: {}", e)))?;

            let io = TokioIo::new(stream);
            let state = state.clone();

            tokio::task::spawn(async move {
                let service = service_fn(move |req| {
                    let state = state.clone();
                    async move { Ok::<_, Infallible>(Self::handle_request(state, req).await) }
                });

                if let Err(err) = http1::Builder::new().serve_connection(io, service).await {
                    tracing::error!("Error serving connection: {}", err);
                }
            });
        }
    }

    /// Handles an HTTP request.
    ///
    /// # Arguments
    ///
    /// * `state` - Mounted services and limits
    /// * `req` - The incoming HTTP request
    ///
    /// # Returns
    ///
    /// The HTTP response; failures are already encoded as error envelopes.
    async fn handle_request(state: Arc<ServerState>, req: HyperRequest) -> HyperResponse {
        let (mut parts, body) = req.into_parts();

        if let Some(timeout) = state.config.request_timeout {
            parts.extensions.insert(Deadline(Instant::now() + timeout));
        }

        let max_body_size = state.config.max_body_size;
        let body: Bytes = match Limited::new(body, max_body_size).collect().await {
            Ok(collected) => collected.to_bytes(),
            Err(err) => {
                let rpc_err = if err.downcast_ref::<http_body_util::LengthLimitError>().is_some() {
                    RpcError::new(
                        ErrorCode::ResourceExhausted,
                        format!("request body exceeds {} bytes", max_body_size),
                    )
                } else {
                    tracing::warn!("Failed to read request body for {}: {}", parts.uri.path(), err);
                    RpcError::internal("failed to read request body")
                };
                tracing::warn!("Rejected request to {}: {}", parts.uri.path(), rpc_err);
                let mut ctx = CallContext::from_request(&Request::from_parts(parts, ()));
                return pipeline::write_error(&state.hooks, &mut ctx, rpc_err).response;
            }
        };

        let req = Request::from_parts(parts, body);
        let path = req.uri().path().to_string();

        let handled = match state.services.iter().find(|s| path.starts_with(s.path_prefix())) {
            Some(service) => service.handle(req).await,
            None => {
                let mut ctx = CallContext::from_request(&req);
                let err = pipeline::bad_route(&ctx);
                pipeline::write_error(&state.hooks, &mut ctx, err)
            }
        };

        let (response, panic) = handled.into_parts();
        if let Some(payload) = panic {
            // The caller already has its 500; the panic surfaces on its own task.
            let task = pipeline::reraise(payload);
            tokio::task::spawn(async move {
                if let Err(err) = task.await {
                    if err.is_panic() {
                        tracing::error!("Re-raised handler panic from {}", path);
                    }
                }
            });
        }
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::Handled;
    use async_trait::async_trait;
    use rivet_common::transport::RpcRequest;

    struct Unrouted;

    #[async_trait]
    impl RpcServer for Unrouted {
        fn path_prefix(&self) -> &'static str {
            "/demo.v1.Unrouted/"
        }

        fn routes(&self) -> &'static [&'static str] {
            &["/demo.v1.Unrouted/Nothing"]
        }

        async fn handle(&self, req: RpcRequest) -> Handled {
            let mut ctx = CallContext::from_request(&req).with_service("demo.v1", "Unrouted");
            let err = pipeline::bad_route(&ctx);
            pipeline::write_error(&ServerHooks::default(), &mut ctx, err)
        }
    }

    struct Panicky;

    #[async_trait]
    impl RpcServer for Panicky {
        fn path_prefix(&self) -> &'static str {
            "/demo.v1.Panicky/"
        }

        fn routes(&self) -> &'static [&'static str] {
            &["/demo.v1.Panicky/Boom"]
        }

        async fn handle(&self, req: RpcRequest) -> Handled {
            let mut ctx = CallContext::from_request(&req).with_service("demo.v1", "Panicky");
            ctx.set_method("Boom", None);
            let mut handled = pipeline::write_error(
                &ServerHooks::default(),
                &mut ctx,
                RpcError::internal("internal service panic"),
            );
            handled.panic = Some(Box::new("host-reraised-panic"));
            handled
        }
    }

    #[test]
    fn test_server_creation() {
        let server = HttpServer::new().with_service(Unrouted);
        assert_eq!(server.routes(), vec!["/demo.v1.Unrouted/Nothing"]);
        assert_eq!(server.config, ServerConfig::default());
    }

    #[tokio::test]
    async fn test_handler_panic_is_reraised_after_response() {
        pipeline::panic_log::install();

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(HttpServer::new().with_service(Panicky).serve(listener));

        let response = reqwest::Client::new()
            .post(format!("http://{}/demo.v1.Panicky/Boom", addr))
            .header("content-type", "application/json")
            .body("{}")
            .send()
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), 500);

        for _ in 0..100 {
            if pipeline::panic_log::count("host-reraised-panic") > 0 {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        assert_eq!(pipeline::panic_log::count("host-reraised-panic"), 1);
    }

    #[tokio::test]
    async fn test_serve_rejects_invalid_config() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let server = HttpServer::new().with_config(ServerConfig::new().with_max_body_size(0));
        assert!(server.serve(listener).await.is_err());
    }
}
