use rivet_common::{generate_trace_id, ServerHooks, TraceId, TRACE_ID_HEADER};

/// Hook set that tags every call with a trace id.
///
/// An incoming `x-trace-id` header is reused; otherwise a fresh id is
/// generated. The id is echoed in the response headers and stored in the
/// call's extensions as a [`TraceId`].
pub fn trace_id_hooks() -> ServerHooks {
    ServerHooks::new().on_request_received(|ctx| {
        let trace_id = ctx
            .request_header(TRACE_ID_HEADER)
            .filter(|id| !id.is_empty())
            .map(|id| TraceId(id.to_string()))
            .unwrap_or_else(generate_trace_id);

        ctx.set_response_header(TRACE_ID_HEADER, trace_id.as_str())?;
        ctx.extensions_mut().insert(trace_id);
        Ok(())
    })
}
