//! HTTP Client Integration Tests
//!
//! These tests drive the reqwest transport against a small hyper server and
//! verify:
//! - JSON and binary calls round-trip their messages
//! - Error envelopes are parsed back into `RpcError`
//! - Non-envelope error bodies keep their status and body as metadata
//! - Context headers reach the server
//! - Unreachable servers surface as `internal`
//!
//! All test URLs use `http://127.0.0.1:PORT`.

use http_body_util::{BodyExt, Full};
use hyper::body::{Bytes, Incoming};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use rivet_client::{do_binary_request, do_json_request, ClientContext, HttpClient, ReqwestClient};
use rivet_common::ErrorCode;
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
struct Greeting {
    msg: String,
    count: u32,
}

/// Test server that runs on a separate task
struct TestServer {
    addr: String,
    shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
}

impl TestServer {
    /// Starts a new test server on a random port
    async fn new() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();

        let (shutdown_tx, mut shutdown_rx) = tokio::sync::oneshot::channel();

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    result = listener.accept() => {
                        let Ok((stream, _)) = result else { continue };
                        let io = TokioIo::new(stream);

                        tokio::spawn(async move {
                            let service = service_fn(Self::handler);
                            if let Err(err) = http1::Builder::new()
                                .serve_connection(io, service)
                                .await
                            {
                                eprintln!("Server error: {}", err);
                            }
                        });
                    }
                    _ = &mut shutdown_rx => {
                        break;
                    }
                }
            }
        });

        Self {
            addr,
            shutdown_tx: Some(shutdown_tx),
        }
    }

    /// Routes by path:
    /// - `/demo.v1.Echo/Echo` echoes the body back with the same content type
    /// - `/demo.v1.Echo/Header` returns the `x-trace-id` header as a JSON greeting
    /// - `/demo.v1.Echo/Denied` returns a `permission_denied` envelope
    /// - anything else returns a plain-text 502
    async fn handler(req: Request<Incoming>) -> Result<Response<Full<Bytes>>, hyper::Error> {
        let path = req.uri().path().to_string();
        let content_type = req
            .headers()
            .get("content-type")
            .map(|v| v.to_str().unwrap().to_string())
            .unwrap_or_default();
        let trace_id = req
            .headers()
            .get("x-trace-id")
            .map(|v| v.to_str().unwrap().to_string())
            .unwrap_or_default();
        let body = req.into_body().collect().await?.to_bytes();

        let (status, content_type, body) = match path.as_str() {
            "/demo.v1.Echo/Echo" => (StatusCode::OK, content_type, body),
            "/demo.v1.Echo/Header" => {
                let greeting = Greeting { msg: trace_id, count: 1 };
                (
                    StatusCode::OK,
                    "application/json".to_string(),
                    Bytes::from(serde_json::to_vec(&greeting).unwrap()),
                )
            }
            "/demo.v1.Echo/Denied" => (
                StatusCode::FORBIDDEN,
                "application/json".to_string(),
                Bytes::from_static(br#"{"code":"permission_denied","msg":"nope","meta":{"role":"guest"}}"#),
            ),
            _ => (
                StatusCode::BAD_GATEWAY,
                "text/plain".to_string(),
                Bytes::from_static(b"upstream unavailable"),
            ),
        };

        Ok(Response::builder()
            .status(status)
            .header("Content-Type", content_type)
            .body(Full::new(body))
            .unwrap())
    }

    fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

fn ctx(method: &str) -> ClientContext {
    ClientContext::new().with_route("demo.v1", "Echo", method)
}

// ============================================================================
// Basic Functionality Tests
// ============================================================================

#[tokio::test]
async fn test_json_call() {
    let server = TestServer::new().await;
    let client = ReqwestClient::new().unwrap();
    let input = Greeting { msg: "hi".into(), count: 2 };

    let out: Greeting = do_json_request(&client, &ctx("Echo"), &server.url("/demo.v1.Echo/Echo"), &input)
        .await
        .unwrap();

    assert_eq!(out, input);
}

#[tokio::test]
async fn test_binary_call() {
    let server = TestServer::new().await;
    let client = ReqwestClient::new().unwrap();
    let input = Greeting { msg: "compact".into(), count: 7 };

    let out: Greeting = do_binary_request(&client, &ctx("Echo"), &server.url("/demo.v1.Echo/Echo"), &input)
        .await
        .unwrap();

    assert_eq!(out, input);
}

#[tokio::test]
async fn test_context_headers_are_sent() {
    let server = TestServer::new().await;
    let client = ReqwestClient::new().unwrap();
    let ctx = ctx("Header").with_header("x-trace-id", "trace-42");

    let out: Greeting = do_json_request(&client, &ctx, &server.url("/demo.v1.Echo/Header"), &Greeting::default())
        .await
        .unwrap();

    assert_eq!(out.msg, "trace-42");
}

#[tokio::test]
async fn test_concurrent_calls_share_client() {
    let server = TestServer::new().await;
    let client = ReqwestClient::new().unwrap();
    let url = server.url("/demo.v1.Echo/Echo");
    let first = Greeting { msg: "one".into(), count: 1 };
    let second = Greeting { msg: "two".into(), count: 2 };

    let ctx = ctx("Echo");
    let (a, b) = tokio::join!(
        do_json_request::<_, _, Greeting>(&client, &ctx, &url, &first),
        do_json_request::<_, _, Greeting>(&client, &ctx, &url, &second)
    );

    assert_eq!(a.unwrap(), first);
    assert_eq!(b.unwrap(), second);
}

// ============================================================================
// Error Handling Tests
// ============================================================================

#[tokio::test]
async fn test_error_envelope() {
    let server = TestServer::new().await;
    let client = ReqwestClient::new().unwrap();

    let err = do_json_request::<_, _, Greeting>(&client, &ctx("Denied"), &server.url("/demo.v1.Echo/Denied"), &Greeting::default())
        .await
        .unwrap_err();

    assert_eq!(err.code(), ErrorCode::PermissionDenied);
    assert_eq!(err.msg(), "nope");
    assert_eq!(err.meta("role"), Some("guest"));
}

#[tokio::test]
async fn test_intermediary_error() {
    let server = TestServer::new().await;
    let client = ReqwestClient::new().unwrap();

    let err = do_json_request::<_, _, Greeting>(&client, &ctx("Gone"), &server.url("/elsewhere"), &Greeting::default())
        .await
        .unwrap_err();

    assert_eq!(err.code(), ErrorCode::Internal);
    assert_eq!(err.meta("http_status"), Some("502"));
    assert_eq!(err.meta("body"), Some("upstream unavailable"));
}

#[tokio::test]
async fn test_unreachable_server() {
    // Bind and drop to get a port with nothing listening
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = ReqwestClient::new().unwrap();
    let err = do_json_request::<_, _, Greeting>(&client, &ctx("Echo"), &format!("http://{}/demo.v1.Echo/Echo", addr), &Greeting::default())
        .await
        .unwrap_err();

    assert_eq!(err.code(), ErrorCode::Internal);
    assert!(err.msg().starts_with("failed to do request"));
}

#[tokio::test]
async fn test_transport_is_object_safe() {
    let server = TestServer::new().await;
    let client: std::sync::Arc<dyn HttpClient> = std::sync::Arc::new(ReqwestClient::new().unwrap());

    let out: Greeting = do_json_request(&client, &ctx("Echo"), &server.url("/demo.v1.Echo/Echo"), &Greeting { msg: "dyn".into(), count: 0 })
        .await
        .unwrap();

    assert_eq!(out.msg, "dyn");
}
