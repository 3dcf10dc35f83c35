use hyper::body::Bytes;
use hyper::StatusCode;

/// Explicit override a handler may attach to its reply.
///
/// Without a hint the reply message is encoded with the negotiated
/// encoding and sent with status 200. A hint can replace the status, the
/// content type, or the whole body (for example to serve a file or an HTML
/// page from an RPC method).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResponseHint {
    pub status: Option<StatusCode>,
    pub content_type: Option<String>,
    pub body: Option<Bytes>,
}

impl ResponseHint {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }
}

/// What a service method returns on success.
///
/// A reply with neither a message nor a body hint is an empty reply, which
/// the server pipeline rejects as an `internal` error.
///
/// # Example
///
/// ```
/// use rivet_common::protocol::{Reply, ResponseHint};
/// use hyper::StatusCode;
///
/// let plain: Reply<u32> = 42.into();
/// assert_eq!(plain.message(), Some(&42));
///
/// let created = Reply::new(42).with_hint(ResponseHint::new().with_status(StatusCode::CREATED));
/// assert!(created.hint().is_some());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Reply<T> {
    message: Option<T>,
    hint: Option<ResponseHint>,
}

impl<T> Reply<T> {
    pub fn new(message: T) -> Self {
        Self {
            message: Some(message),
            hint: None,
        }
    }

    /// A reply carrying no message.
    pub fn empty() -> Self {
        Self {
            message: None,
            hint: None,
        }
    }

    /// A reply whose response is entirely described by `hint`.
    pub fn from_hint(hint: ResponseHint) -> Self {
        Self {
            message: None,
            hint: Some(hint),
        }
    }

    pub fn with_hint(mut self, hint: ResponseHint) -> Self {
        self.hint = Some(hint);
        self
    }

    pub fn message(&self) -> Option<&T> {
        self.message.as_ref()
    }

    pub fn hint(&self) -> Option<&ResponseHint> {
        self.hint.as_ref()
    }

    pub fn is_empty(&self) -> bool {
        self.message.is_none() && self.hint.as_ref().map_or(true, |h| h.body.is_none())
    }

    pub fn into_parts(self) -> (Option<T>, Option<ResponseHint>) {
        (self.message, self.hint)
    }
}

impl<T> From<T> for Reply<T> {
    fn from(message: T) -> Self {
        Reply::new(message)
    }
}
