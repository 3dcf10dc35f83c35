//! Shared fixtures for the server integration tests.
//!
//! `fixtures/echo.rs` is the generator's output for `fixtures/echo.json`;
//! `EchoImpl` is the hand-written service behind it.

#![allow(dead_code)]

#[path = "../fixtures/echo.rs"]
pub mod echo;

use http_body_util::BodyExt;
use hyper::body::Bytes;
use hyper::header::CONTENT_TYPE;
use hyper::{Request, StatusCode};
use rivet_common::transport::RpcRequest;
use rivet_common::{BoxError, CallContext, Reply, ResponseHint, RpcError};
use rivet_server::{Handled, RpcServer};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use echo::{EchoRequest, EchoResponse, FailRequest, SignupRequest};

/// Echo implementation that counts how often a handler body ran.
pub struct EchoImpl {
    calls: Arc<AtomicUsize>,
}

impl EchoImpl {
    pub fn new(calls: Arc<AtomicUsize>) -> Self {
        Self { calls }
    }
}

#[rivet_server::async_trait]
impl echo::Echo for EchoImpl {
    async fn echo(&self, _ctx: &mut CallContext, req: EchoRequest) -> Result<Reply<EchoResponse>, BoxError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(Reply::new(EchoResponse { msg: req.msg }))
    }

    async fn signup(&self, _ctx: &mut CallContext, req: SignupRequest) -> Result<Reply<EchoResponse>, BoxError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(Reply::new(EchoResponse {
            msg: format!("welcome {}", req.name),
        }))
    }

    async fn fail(&self, ctx: &mut CallContext, req: FailRequest) -> Result<Reply<EchoResponse>, BoxError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match req.mode.as_str() {
            "error" => Err("database unavailable".into()),
            "rpc_error" => Err(Box::new(RpcError::not_found("no such user").with_meta("id", "7"))),
            "panic" => panic!("handler exploded"),
            "empty" => Ok(Reply::empty()),
            "hint" => Ok(Reply::from_hint(
                ResponseHint::new()
                    .with_status(StatusCode::ACCEPTED)
                    .with_content_type("text/plain")
                    .with_body("queued"),
            )),
            "header" => {
                ctx.set_response_header("x-handled-by", "fail")?;
                Ok(Reply::new(EchoResponse { msg: "ok".into() }))
            }
            "slow" => {
                tokio::time::sleep(Duration::from_millis(100)).await;
                Ok(Reply::new(EchoResponse { msg: "late".into() }))
            }
            other => Ok(Reply::new(EchoResponse { msg: other.to_string() })),
        }
    }
}

pub fn request(method: &str, uri: &str, content_type: Option<&str>, body: impl Into<Bytes>) -> RpcRequest {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(content_type) = content_type {
        builder = builder.header(CONTENT_TYPE, content_type);
    }
    builder.body(body.into()).unwrap()
}

pub fn json_request(uri: &str, body: &'static str) -> RpcRequest {
    request("POST", uri, Some("application/json"), body)
}

pub fn form_request(uri: &str, body: &'static str) -> RpcRequest {
    request("POST", uri, Some("application/x-www-form-urlencoded"), body)
}

/// A written response, split for assertions.
pub struct Written {
    pub status: StatusCode,
    pub content_type: String,
    pub headers: hyper::HeaderMap,
    pub body: Bytes,
    pub panicked: bool,
}

impl Written {
    pub fn error(&self) -> RpcError {
        RpcError::from_response(self.status.as_u16(), &self.body)
    }

    pub fn json(&self) -> serde_json::Value {
        serde_json::from_slice(&self.body).unwrap()
    }
}

pub async fn call(server: &impl RpcServer, req: RpcRequest) -> Written {
    let handled: Handled = server.handle(req).await;
    let panicked = handled.panicked();
    let (response, _panic) = handled.into_parts();
    let status = response.status();
    let headers = response.headers().clone();
    let content_type = headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    Written {
        status,
        content_type,
        headers,
        body,
        panicked,
    }
}
