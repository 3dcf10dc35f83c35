//! The trait every generated server implements.

use async_trait::async_trait;

use crate::pipeline::Handled;
use rivet_common::transport::RpcRequest;

/// A generated service server, ready to be mounted on an [`HttpServer`].
///
/// `handle` owns the whole lifecycle of one call: it runs the hook stages,
/// negotiates the encoding and always produces a response, errors included.
///
/// [`HttpServer`]: crate::HttpServer
#[async_trait]
pub trait RpcServer: Send + Sync + 'static {
    /// `/{package}.{Service}/`, the prefix shared by all routes.
    fn path_prefix(&self) -> &'static str;

    /// Full route paths, in method declaration order.
    fn routes(&self) -> &'static [&'static str];

    async fn handle(&self, req: RpcRequest) -> Handled;
}
