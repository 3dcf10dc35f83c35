pub mod context;
pub mod envelope;
pub mod error;
pub mod hooks;
pub mod reply;
pub mod trace;


pub use context::{CallContext, Deadline};
pub use envelope::{ErrorEnvelope, MAX_MSG_BYTES};
pub use error::{BoxError, ErrorCode, Result, RivetError, RpcError};
pub use hooks::{HookTable, ServerHooks};
pub use reply::{Reply, ResponseHint};
pub use trace::{generate_trace_id, TraceId, TRACE_ID_HEADER};
