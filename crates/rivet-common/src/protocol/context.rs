//! Per-call context threaded through the request lifecycle.
//!
//! A [`CallContext`] is created when a request reaches a generated server and
//! is handed, by mutable reference, to every hook stage and to the service
//! implementation. Hooks use it to read routing information, attach response
//! headers and stash their own data in [`CallContext::extensions_mut`].

use hyper::header::{HeaderName, HeaderValue, CONTENT_TYPE};
use hyper::http::Extensions;
use hyper::{HeaderMap, Method, Request, StatusCode};
use std::time::{Duration, Instant};

use crate::protocol::error::RpcError;

/// Absolute deadline for a call, carried in request extensions.
///
/// The HTTP host inserts this when a request timeout is configured;
/// [`CallContext::from_request`] picks it up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deadline(pub Instant);

#[derive(Debug)]
pub struct CallContext {
    package: Option<String>,
    service: Option<String>,
    method: Option<String>,
    method_option: Option<String>,
    http_method: Method,
    path: String,
    query: Option<String>,
    request_headers: HeaderMap,
    response_headers: HeaderMap,
    status_code: Option<StatusCode>,
    allow_get: bool,
    started_at: Instant,
    deadline: Option<Instant>,
    sent_at: Option<Instant>,
    extensions: Extensions,
}

impl CallContext {
    pub fn new(http_method: Method, path: impl Into<String>) -> Self {
        Self {
            package: None,
            service: None,
            method: None,
            method_option: None,
            http_method,
            path: path.into(),
            query: None,
            request_headers: HeaderMap::new(),
            response_headers: HeaderMap::new(),
            status_code: None,
            allow_get: false,
            started_at: Instant::now(),
            deadline: None,
            sent_at: None,
            extensions: Extensions::new(),
        }
    }

    /// Builds a context from the request line, headers and any [`Deadline`]
    /// extension of an inbound request.
    pub fn from_request<B>(req: &Request<B>) -> Self {
        let mut ctx = Self::new(req.method().clone(), req.uri().path());
        ctx.query = req.uri().query().map(str::to_string);
        ctx.request_headers = req.headers().clone();
        ctx.deadline = req.extensions().get::<Deadline>().map(|d| d.0);
        ctx
    }

    /// Stamps the package and service names of the server handling the call.
    pub fn with_service(mut self, package: &str, service: &str) -> Self {
        self.package = Some(package.to_string());
        self.service = Some(service.to_string());
        self
    }

    /// Stamps the routed method name and its option tag, if any.
    pub fn set_method(&mut self, method: &str, option: Option<&str>) {
        self.method = Some(method.to_string());
        self.method_option = option.map(str::to_string);
    }

    pub fn package(&self) -> Option<&str> {
        self.package.as_deref()
    }

    pub fn service(&self) -> Option<&str> {
        self.service.as_deref()
    }

    pub fn method(&self) -> Option<&str> {
        self.method.as_deref()
    }

    /// Option tag declared in the method's trailing comment.
    pub fn method_option(&self) -> Option<&str> {
        self.method_option.as_deref()
    }

    /// Canonical route of the call (`/package.Service/Method`), once routed.
    pub fn route(&self) -> Option<String> {
        match (&self.package, &self.service, &self.method) {
            (Some(pkg), Some(svc), Some(method)) => Some(format!("/{}.{}/{}", pkg, svc, method)),
            _ => None,
        }
    }

    pub fn http_method(&self) -> &Method {
        &self.http_method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn query(&self) -> Option<&str> {
        self.query.as_deref()
    }

    pub fn request_headers(&self) -> &HeaderMap {
        &self.request_headers
    }

    pub fn request_header(&self, name: &str) -> Option<&str> {
        self.request_headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn content_type(&self) -> Option<&str> {
        self.request_headers
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
    }

    pub fn response_headers(&self) -> &HeaderMap {
        &self.response_headers
    }

    /// Adds a header to the eventual response.
    ///
    /// `Content-Type` is owned by the codec layer and cannot be overridden
    /// here.
    pub fn set_response_header(&mut self, name: &str, value: &str) -> Result<(), RpcError> {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| RpcError::internal(format!("invalid header name {:?}: {}", name, e)))?;
        if name == CONTENT_TYPE {
            return Err(RpcError::internal(
                "the Content-Type header is set by the server and cannot be overridden",
            ));
        }
        let value = HeaderValue::from_str(value)
            .map_err(|e| RpcError::internal(format!("invalid header value for {}: {}", name, e)))?;
        self.response_headers.insert(name, value);
        Ok(())
    }

    pub fn status_code(&self) -> Option<StatusCode> {
        self.status_code
    }

    pub fn set_status_code(&mut self, status: StatusCode) {
        self.status_code = Some(status);
    }

    /// Status reported to instrumentation.
    ///
    /// Returns 503 when the deadline had passed by the time the response was
    /// written, even if the handler itself completed.
    pub fn observed_status(&self) -> StatusCode {
        let expired = match (self.deadline, self.sent_at) {
            (Some(deadline), Some(sent_at)) => sent_at >= deadline,
            (Some(deadline), None) => Instant::now() >= deadline,
            _ => false,
        };
        if expired {
            StatusCode::SERVICE_UNAVAILABLE
        } else {
            self.status_code.unwrap_or(StatusCode::OK)
        }
    }

    /// Whether GET requests are accepted for this call.
    pub fn allow_get(&self) -> bool {
        self.allow_get
    }

    /// Lets a received hook accept GET in addition to POST.
    pub fn set_allow_get(&mut self, allow: bool) {
        self.allow_get = allow;
    }

    pub fn started_at(&self) -> Instant {
        self.started_at
    }

    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn set_deadline(&mut self, deadline: Instant) {
        self.deadline = Some(deadline);
    }

    pub fn deadline_exceeded(&self) -> bool {
        self.deadline.map_or(false, |d| Instant::now() >= d)
    }

    /// Records the moment the response was handed to the transport.
    pub fn mark_sent(&mut self) {
        self.sent_at = Some(Instant::now());
    }

    pub fn extensions(&self) -> &Extensions {
        &self.extensions
    }

    pub fn extensions_mut(&mut self) -> &mut Extensions {
        &mut self.extensions
    }
}
