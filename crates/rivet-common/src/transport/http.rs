//! HTTP Transport Utilities
//!
//! Type aliases for the hyper request/response types used across the
//! runtime, plus response builders shared by the server pipeline.
//!
//! # Components
//!
//! - **[`HttpTransport`]**: Response construction for replies and errors
//! - **[`HyperRequest`]**: Incoming request with a streaming body
//! - **[`RpcRequest`]**: Request with its body fully collected
//! - **[`HyperResponse`]**: Response with a full body

use http_body_util::Full;
use hyper::body::{Bytes, Incoming};
use hyper::header::{HeaderValue, CONTENT_TYPE};
use hyper::{HeaderMap, Request, Response, StatusCode};

use crate::protocol::envelope::ErrorEnvelope;
use crate::protocol::error::RpcError;
use crate::transport::codec::JSON_CONTENT_TYPE;

/// Type alias for Hyper incoming requests
pub type HyperRequest = Request<Incoming>;

/// Type alias for requests whose body has been collected
pub type RpcRequest = Request<Bytes>;

/// Type alias for Hyper responses with full body
pub type HyperResponse = Response<Full<Bytes>>;

const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";

/// HTTP response construction helpers.
pub struct HttpTransport;

impl HttpTransport {
    /// Builds a response with the given status, content type and body.
    ///
    /// `headers` (typically the call's response headers) are copied first;
    /// the content type always wins. An unrepresentable content type falls
    /// back to `application/octet-stream`.
    ///
    /// # Example
    ///
    /// ```
    /// use rivet_common::transport::HttpTransport;
    /// use hyper::{HeaderMap, StatusCode};
    ///
    /// let response = HttpTransport::build_response(
    ///     StatusCode::OK,
    ///     "application/json",
    ///     r#"{"msg":"hi"}"#,
    ///     &HeaderMap::new(),
    /// );
    /// assert_eq!(response.status(), StatusCode::OK);
    /// ```
    pub fn build_response(
        status: StatusCode,
        content_type: &str,
        body: impl Into<Bytes>,
        headers: &HeaderMap,
    ) -> HyperResponse {
        let mut response = Response::new(Full::new(body.into()));
        *response.status_mut() = status;

        let response_headers = response.headers_mut();
        for (name, value) in headers {
            response_headers.append(name.clone(), value.clone());
        }
        let content_type = HeaderValue::from_str(content_type)
            .unwrap_or_else(|_| HeaderValue::from_static(FALLBACK_CONTENT_TYPE));
        response_headers.insert(CONTENT_TYPE, content_type);

        response
    }

    /// Builds the JSON error response for `err`.
    pub fn error_response(err: &RpcError, headers: &HeaderMap) -> HyperResponse {
        let status = StatusCode::from_u16(err.http_status())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let body = ErrorEnvelope::from(err).to_json();
        Self::build_response(status, JSON_CONTENT_TYPE, body, headers)
    }
}
