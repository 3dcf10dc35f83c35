/// Per-call client context.
///
/// Generated clients stamp the package, service and method into it before
/// each call; callers may add request headers up front.
///
/// # Example
///
/// ```
/// use rivet_client::ClientContext;
///
/// let ctx = ClientContext::new()
///     .with_header("x-trace-id", "abc123")
///     .with_route("demo.v1", "Echo", "Echo");
/// assert_eq!(ctx.route(), "/demo.v1.Echo/Echo");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientContext {
    package: String,
    service: String,
    method: String,
    headers: Vec<(String, String)>,
}

impl ClientContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_route(mut self, package: &str, service: &str, method: &str) -> Self {
        self.package = package.to_string();
        self.service = service.to_string();
        self.method = method.to_string();
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn package(&self) -> &str {
        &self.package
    }

    pub fn service(&self) -> &str {
        &self.service
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    pub fn route(&self) -> String {
        format!("/{}.{}/{}", self.package, self.service, self.method)
    }
}
