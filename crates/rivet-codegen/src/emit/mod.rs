//! Source emitters.
//!
//! Each submodule writes one section of the generated file through a shared
//! [`CodeWriter`]. Sections are emitted in a fixed order: interface, binary
//! client, JSON client, server handler, validation.

pub mod client;
pub mod interface;
pub mod server;
pub mod validation;
pub mod writer;

pub use writer::CodeWriter;

use crate::config::GeneratorConfig;
use crate::error::Result;
use crate::naming::{rust_ident, to_snake_case, to_upper_snake_case};
use crate::registry::NameRegistry;
use crate::schema::{FieldKind, FieldSchema, MethodSchema, ServiceSchema};

/// Everything an emitter needs to know about the service being generated.
pub struct EmitContext<'a> {
    pub schema: &'a ServiceSchema,
    pub config: &'a GeneratorConfig,
    pub names: &'a NameRegistry,
}

impl<'a> EmitContext<'a> {
    pub fn new(schema: &'a ServiceSchema, config: &'a GeneratorConfig, names: &'a NameRegistry) -> Self {
        Self {
            schema,
            config,
            names,
        }
    }

    pub fn common(&self) -> &str {
        &self.config.common_crate
    }

    pub fn server(&self) -> &str {
        &self.config.server_crate
    }

    pub fn client(&self) -> &str {
        &self.config.client_crate
    }

    pub fn service(&self) -> &str {
        &self.schema.name
    }

    /// `ECHO_PATH_PREFIX`
    pub fn prefix_const(&self) -> String {
        format!("{}_PATH_PREFIX", to_upper_snake_case(&self.schema.name))
    }

    /// `ECHO_ROUTES`
    pub fn routes_const(&self) -> String {
        format!("{}_ROUTES", to_upper_snake_case(&self.schema.name))
    }

    pub fn record_name(&self, fqn: &str) -> Result<&str> {
        self.names.resolve(fqn)
    }

    /// Rust type of a record field.
    pub fn field_type(&self, field: &FieldSchema) -> Result<String> {
        let element = match (field.kind.rust_scalar(), &field.message) {
            (Some(scalar), _) => scalar.to_string(),
            (None, Some(fqn)) => self.record_name(fqn)?.to_string(),
            (None, None) => self.record_name("")?.to_string(),
        };
        Ok(match (field.repeated, field.kind) {
            (true, _) => format!("Vec<{}>", element),
            (false, FieldKind::Message) => format!("Option<Box<{}>>", element),
            (false, _) => element,
        })
    }
}

/// Snake-case field name, escaped if it is a keyword.
pub fn field_ident(field: &FieldSchema) -> String {
    rust_ident(&to_snake_case(&field.name))
}

/// Snake-case method name, escaped if it is a keyword.
pub fn method_ident(method: &MethodSchema) -> String {
    rust_ident(&to_snake_case(&method.name))
}

/// Lines of a comment that are not rule annotations.
pub fn doc_text(comment: &str) -> String {
    comment
        .lines()
        .filter(|line| !line.trim_start().starts_with('@'))
        .collect::<Vec<_>>()
        .join("\n")
}
