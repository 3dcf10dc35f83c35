// Code generated by rivet-codegen. DO NOT EDIT.
// @generated
// source: echo.json
// package: demo.v1

use rivet_common::transport::{BinaryCodec, Encoding, FormValues, FromForm, JsonCodec, RpcRequest};
use rivet_common::validate::{Validate, ValidationError};
use rivet_common::{BoxError, CallContext, Reply, RpcError, ServerHooks};
use rivet_server::pipeline::{self, Handled};

// ============================================================================
// Echo Interface
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, rivet_common::serde::Serialize, rivet_common::serde::Deserialize)]
#[serde(crate = "rivet_common::serde", default)]
pub struct EchoRequest {
    pub msg: String,
}

#[derive(Debug, Clone, Default, PartialEq, rivet_common::serde::Serialize, rivet_common::serde::Deserialize)]
#[serde(crate = "rivet_common::serde", default)]
pub struct EchoResponse {
    pub msg: String,
}

#[derive(Debug, Clone, Default, PartialEq, rivet_common::serde::Serialize, rivet_common::serde::Deserialize)]
#[serde(crate = "rivet_common::serde", default)]
pub struct FailRequest {
    /// One of `error`, `rpc_error`, `panic`, `empty`, `hint`.
    pub mode: String,
}

#[derive(Debug, Clone, Default, PartialEq, rivet_common::serde::Serialize, rivet_common::serde::Deserialize)]
#[serde(crate = "rivet_common::serde", default)]
pub struct Profile {
    pub score: i32,
    pub level: i32,
    pub handle: String,
    pub email: String,
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, rivet_common::serde::Serialize, rivet_common::serde::Deserialize)]
#[serde(crate = "rivet_common::serde", default)]
pub struct SignupRequest {
    pub name: String,
    pub age: i32,
    pub tags: Vec<String>,
    pub profile: Option<Box<Profile>>,
}

/// Path prefix of the Echo service.
pub const ECHO_PATH_PREFIX: &str = "/demo.v1.Echo/";

/// Route paths, one per method in declaration order.
pub const ECHO_ROUTES: [&str; 3] = [
    "/demo.v1.Echo/Echo",
    "/demo.v1.Echo/Signup",
    "/demo.v1.Echo/Fail",
];

/// Echo service used by the server tests.
#[rivet_server::async_trait]
pub trait Echo: Send + Sync + 'static {
    /// Returns the message unchanged.
    async fn echo(&self, ctx: &mut CallContext, req: EchoRequest) -> Result<Reply<EchoResponse>, BoxError>;

    async fn signup(&self, ctx: &mut CallContext, req: SignupRequest) -> Result<Reply<EchoResponse>, BoxError>;

    /// Fails in the way named by `mode`.
    async fn fail(&self, ctx: &mut CallContext, req: FailRequest) -> Result<Reply<EchoResponse>, BoxError>;
}

// ============================================================================
// Echo Binary Client
// ============================================================================

/// Binary client for the Echo service.
pub struct EchoBinaryClient<C = rivet_client::ReqwestClient> {
    transport: C,
    urls: [String; 3],
}

impl<C: rivet_client::HttpClient> EchoBinaryClient<C> {
    /// `base_url` is the server root, for example `http://127.0.0.1:8080`.
    pub fn new(base_url: &str, transport: C) -> Self {
        let base = base_url.trim_end_matches('/');
        Self {
            transport,
            urls: [
                format!("{}{}", base, ECHO_ROUTES[0]),
                format!("{}{}", base, ECHO_ROUTES[1]),
                format!("{}{}", base, ECHO_ROUTES[2]),
            ],
        }
    }

    /// Returns the message unchanged.
    pub async fn echo(&self, ctx: rivet_client::ClientContext, req: &EchoRequest) -> Result<EchoResponse, RpcError> {
        let ctx = ctx.with_route("demo.v1", "Echo", "Echo");
        rivet_client::do_binary_request(&self.transport, &ctx, &self.urls[0], req).await
    }

    pub async fn signup(&self, ctx: rivet_client::ClientContext, req: &SignupRequest) -> Result<EchoResponse, RpcError> {
        let ctx = ctx.with_route("demo.v1", "Echo", "Signup");
        rivet_client::do_binary_request(&self.transport, &ctx, &self.urls[1], req).await
    }

    /// Fails in the way named by `mode`.
    pub async fn fail(&self, ctx: rivet_client::ClientContext, req: &FailRequest) -> Result<EchoResponse, RpcError> {
        let ctx = ctx.with_route("demo.v1", "Echo", "Fail");
        rivet_client::do_binary_request(&self.transport, &ctx, &self.urls[2], req).await
    }
}

// ============================================================================
// Echo JSON Client
// ============================================================================

/// JSON client for the Echo service.
pub struct EchoJsonClient<C = rivet_client::ReqwestClient> {
    transport: C,
    urls: [String; 3],
}

impl<C: rivet_client::HttpClient> EchoJsonClient<C> {
    /// `base_url` is the server root, for example `http://127.0.0.1:8080`.
    pub fn new(base_url: &str, transport: C) -> Self {
        let base = base_url.trim_end_matches('/');
        Self {
            transport,
            urls: [
                format!("{}{}", base, ECHO_ROUTES[0]),
                format!("{}{}", base, ECHO_ROUTES[1]),
                format!("{}{}", base, ECHO_ROUTES[2]),
            ],
        }
    }

    /// Returns the message unchanged.
    pub async fn echo(&self, ctx: rivet_client::ClientContext, req: &EchoRequest) -> Result<EchoResponse, RpcError> {
        let ctx = ctx.with_route("demo.v1", "Echo", "Echo");
        rivet_client::do_json_request(&self.transport, &ctx, &self.urls[0], req).await
    }

    pub async fn signup(&self, ctx: rivet_client::ClientContext, req: &SignupRequest) -> Result<EchoResponse, RpcError> {
        let ctx = ctx.with_route("demo.v1", "Echo", "Signup");
        rivet_client::do_json_request(&self.transport, &ctx, &self.urls[1], req).await
    }

    /// Fails in the way named by `mode`.
    pub async fn fail(&self, ctx: rivet_client::ClientContext, req: &FailRequest) -> Result<EchoResponse, RpcError> {
        let ctx = ctx.with_route("demo.v1", "Echo", "Fail");
        rivet_client::do_json_request(&self.transport, &ctx, &self.urls[2], req).await
    }
}

// ============================================================================
// Echo Server Handler
// ============================================================================

/// Serves a [`Echo`] implementation over HTTP.
pub struct EchoServer<S> {
    service: S,
    hooks: ServerHooks,
}

impl<S: Echo> EchoServer<S> {
    pub fn new(service: S) -> Self {
        Self {
            service,
            hooks: ServerHooks::default(),
        }
    }

    pub fn with_hooks(mut self, hooks: ServerHooks) -> Self {
        self.hooks = hooks;
        self
    }

    pub fn routes(&self) -> &'static [&'static str] {
        &ECHO_ROUTES
    }

    async fn serve_echo(&self, mut ctx: CallContext, req: RpcRequest) -> Handled {
        ctx.set_method("Echo", Some("public"));
        if let Err(err) = pipeline::route(&self.hooks, &mut ctx) {
            return pipeline::write_error(&self.hooks, &mut ctx, err);
        }

        let encoding = Encoding::from_content_type(ctx.content_type());
        let decoded = match encoding {
            Encoding::Json => JsonCodec::decode::<EchoRequest>(req.body()).map_err(|err| pipeline::decode_error(encoding, err)),
            Encoding::Binary => BinaryCodec::decode::<EchoRequest>(req.body()).map_err(|err| pipeline::decode_error(encoding, err)),
            Encoding::Form => EchoRequest::from_form(&FormValues::from_request(&req)),
        };
        let input = match decoded {
            Ok(input) => input,
            Err(err) => return pipeline::write_error(&self.hooks, &mut ctx, err),
        };
        if let Err(err) = input.validate() {
            return pipeline::write_error(&self.hooks, &mut ctx, err.into());
        }

        let outcome = pipeline::invoke(self.service.echo(&mut ctx, input)).await;
        pipeline::finish(&self.hooks, &mut ctx, encoding, outcome)
    }

    async fn serve_signup(&self, mut ctx: CallContext, req: RpcRequest) -> Handled {
        ctx.set_method("Signup", None);
        if let Err(err) = pipeline::route(&self.hooks, &mut ctx) {
            return pipeline::write_error(&self.hooks, &mut ctx, err);
        }

        let encoding = Encoding::from_content_type(ctx.content_type());
        let decoded = match encoding {
            Encoding::Json => JsonCodec::decode::<SignupRequest>(req.body()).map_err(|err| pipeline::decode_error(encoding, err)),
            Encoding::Binary => BinaryCodec::decode::<SignupRequest>(req.body()).map_err(|err| pipeline::decode_error(encoding, err)),
            Encoding::Form => SignupRequest::from_form(&FormValues::from_request(&req)),
        };
        let input = match decoded {
            Ok(input) => input,
            Err(err) => return pipeline::write_error(&self.hooks, &mut ctx, err),
        };
        if let Err(err) = input.validate() {
            return pipeline::write_error(&self.hooks, &mut ctx, err.into());
        }

        let outcome = pipeline::invoke(self.service.signup(&mut ctx, input)).await;
        pipeline::finish(&self.hooks, &mut ctx, encoding, outcome)
    }

    async fn serve_fail(&self, mut ctx: CallContext, req: RpcRequest) -> Handled {
        ctx.set_method("Fail", None);
        if let Err(err) = pipeline::route(&self.hooks, &mut ctx) {
            return pipeline::write_error(&self.hooks, &mut ctx, err);
        }

        let encoding = Encoding::from_content_type(ctx.content_type());
        let decoded = match encoding {
            Encoding::Json => JsonCodec::decode::<FailRequest>(req.body()).map_err(|err| pipeline::decode_error(encoding, err)),
            Encoding::Binary => BinaryCodec::decode::<FailRequest>(req.body()).map_err(|err| pipeline::decode_error(encoding, err)),
            Encoding::Form => FailRequest::from_form(&FormValues::from_request(&req)),
        };
        let input = match decoded {
            Ok(input) => input,
            Err(err) => return pipeline::write_error(&self.hooks, &mut ctx, err),
        };
        if let Err(err) = input.validate() {
            return pipeline::write_error(&self.hooks, &mut ctx, err.into());
        }

        let outcome = pipeline::invoke(self.service.fail(&mut ctx, input)).await;
        pipeline::finish(&self.hooks, &mut ctx, encoding, outcome)
    }
}

#[rivet_server::async_trait]
impl<S: Echo> rivet_server::RpcServer for EchoServer<S> {
    fn path_prefix(&self) -> &'static str {
        ECHO_PATH_PREFIX
    }

    fn routes(&self) -> &'static [&'static str] {
        &ECHO_ROUTES
    }

    async fn handle(&self, req: RpcRequest) -> Handled {
        let mut ctx = CallContext::from_request(&req).with_service("demo.v1", "Echo");
        if let Err(err) = pipeline::receive(&self.hooks, &mut ctx) {
            return pipeline::write_error(&self.hooks, &mut ctx, err);
        }

        let path = ctx.path().to_string();
        match path.as_str() {
            "/demo.v1.Echo/Echo" => self.serve_echo(ctx, req).await,
            "/demo.v1.Echo/Signup" => self.serve_signup(ctx, req).await,
            "/demo.v1.Echo/Fail" => self.serve_fail(ctx, req).await,
            _ => {
                let err = pipeline::bad_route(&ctx);
                pipeline::write_error(&self.hooks, &mut ctx, err)
            }
        }
    }
}

impl FromForm for EchoRequest {
    fn from_form(form: &FormValues) -> Result<Self, RpcError> {
        let mut record = Self::default();
        form.bind("msg", &mut record.msg)?;
        Ok(record)
    }
}

impl FromForm for FailRequest {
    fn from_form(form: &FormValues) -> Result<Self, RpcError> {
        let mut record = Self::default();
        form.bind("mode", &mut record.mode)?;
        Ok(record)
    }
}

impl FromForm for SignupRequest {
    fn from_form(form: &FormValues) -> Result<Self, RpcError> {
        let mut record = Self::default();
        form.bind("name", &mut record.name)?;
        form.bind("age", &mut record.age)?;
        form.bind_repeated("tags", &mut record.tags)?;
        Ok(record)
    }
}

// ============================================================================
// Echo Validation
// ============================================================================

impl Validate for EchoRequest {
    fn validate(&self) -> Result<(), ValidationError> {
        Ok(())
    }
}

impl Validate for EchoResponse {
    fn validate(&self) -> Result<(), ValidationError> {
        Ok(())
    }
}

impl Validate for FailRequest {
    fn validate(&self) -> Result<(), ValidationError> {
        Ok(())
    }
}

impl Validate for Profile {
    fn validate(&self) -> Result<(), ValidationError> {
        {
            let v = &self.score;
            if !(*v >= 18i32 && *v < 130i32) {
                return Err(ValidationError::new("Profile", "score", "value must be in range [18, 130)"));
            }
        }
        {
            let v = &self.level;
            if !(*v > 0i32 && *v <= 10i32) {
                return Err(ValidationError::new("Profile", "level", "value must be in range (0, 10]"));
            }
        }
        {
            let v = &self.handle;
            static PATTERN_0: rivet_common::validate::Pattern = rivet_common::validate::Pattern::new("^[a-z]+$");
            if !PATTERN_0.is_match(v) {
                return Err(ValidationError::new("Profile", "handle", "value does not match regex pattern ^[a-z]+$"));
            }
        }
        {
            let v = &self.email;
            if !rivet_common::validate::is_email(v) {
                return Err(ValidationError::new("Profile", "email", "value must be a valid email address"));
            }
        }
        {
            let mut seen = std::collections::HashSet::new();
            if !self.tags.iter().all(|v| seen.insert(v)) {
                return Err(ValidationError::new("Profile", "tags", "repeated value must contain unique items"));
            }
        }
        Ok(())
    }
}

impl Validate for SignupRequest {
    fn validate(&self) -> Result<(), ValidationError> {
        {
            let v = &self.name;
            if v.chars().count() > 3 {
                return Err(ValidationError::new("SignupRequest", "name", "value length must be at most 3 runes"));
            }
        }
        {
            let v = &self.age;
            if !(*v >= 18i32) {
                return Err(ValidationError::new("SignupRequest", "age", "value must be greater than or equal to 18"));
            }
        }
        if let Some(m) = &self.profile {
            m.validate().map_err(|e| ValidationError::embedded("SignupRequest", "profile", e))?;
        }
        Ok(())
    }
}
