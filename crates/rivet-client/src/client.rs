//! Shared encode, send, decode routines for generated clients.
//!
//! Every generated client method reduces to one call of
//! [`do_json_request`] or [`do_binary_request`]. A non-2xx response is parsed
//! back into the server's [`RpcError`]; a failure to reach the server, or to
//! encode or decode a message, is reported as `internal`.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::context::ClientContext;
use crate::transport::{HttpClient, TransportResponse};
use rivet_common::transport::{BinaryCodec, JsonCodec, BINARY_CONTENT_TYPE, JSON_CONTENT_TYPE};
use rivet_common::{RivetError, RpcError};

/// Sends `input` as JSON to `url` and decodes the JSON reply.
pub async fn do_json_request<C, I, O>(
    client: &C,
    ctx: &ClientContext,
    url: &str,
    input: &I,
) -> Result<O, RpcError>
where
    C: HttpClient + ?Sized,
    I: Serialize + ?Sized,
    O: DeserializeOwned,
{
    let body = JsonCodec::encode(input).map_err(|e| wrap(e, "failed to encode json request"))?;
    let response = send(client, ctx, url, JSON_CONTENT_TYPE, body).await?;
    JsonCodec::decode(&response.body).map_err(|e| wrap(e, "failed to decode json response"))
}

/// Sends `input` in the binary encoding to `url` and decodes the reply.
pub async fn do_binary_request<C, I, O>(
    client: &C,
    ctx: &ClientContext,
    url: &str,
    input: &I,
) -> Result<O, RpcError>
where
    C: HttpClient + ?Sized,
    I: Serialize + ?Sized,
    O: DeserializeOwned,
{
    let body = BinaryCodec::encode(input).map_err(|e| wrap(e, "failed to encode binary request"))?;
    let response = send(client, ctx, url, BINARY_CONTENT_TYPE, body).await?;
    BinaryCodec::decode(&response.body).map_err(|e| wrap(e, "failed to decode binary response"))
}

async fn send<C>(
    client: &C,
    ctx: &ClientContext,
    url: &str,
    content_type: &str,
    body: Vec<u8>,
) -> Result<TransportResponse, RpcError>
where
    C: HttpClient + ?Sized,
{
    tracing::debug!("Calling {} at {}", ctx.route(), url);

    let response = client
        .post(url, content_type, body, ctx)
        .await
        .map_err(|e| wrap(e, "failed to do request"))?;

    if !response.is_success() {
        let err = RpcError::from_response(response.status, &response.body);
        tracing::debug!("{} failed: {}", ctx.route(), err);
        return Err(err);
    }
    Ok(response)
}

fn wrap(err: RivetError, context: &str) -> RpcError {
    let cause = err.cause();
    RpcError::internal(format!("{}: {}", context, err)).with_meta("cause", cause)
}
