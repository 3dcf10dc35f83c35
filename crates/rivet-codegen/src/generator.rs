//! File assembly and output.

use std::path::{Path, PathBuf};

use crate::config::GeneratorConfig;
use crate::emit::client::ClientFlavor;
use crate::emit::{client, interface, server, validation, CodeWriter, EmitContext};
use crate::error::Result;
use crate::naming::to_snake_case;
use crate::registry::NameRegistry;
use crate::schema::{ServiceDescriptor, ServiceSchema};

/// One generated source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedFile {
    /// File name, `{service_snake}.rs`.
    pub name: String,
    pub content: String,
}

/// Generates Rust sources from service schemas.
///
/// Output depends only on the schema and the configuration: generating the
/// same schema twice yields byte-identical files.
///
/// # Example
///
/// ```
/// use rivet_codegen::{Generator, GeneratorConfig, ServiceDescriptor};
///
/// let descriptor = ServiceDescriptor::from_json(r#"{
///     "package": "demo.v1",
///     "services": [{"name": "Echo", "methods": [
///         {"name": "Echo", "input": "Msg", "output": "Msg"}
///     ]}],
///     "records": [{"name": "Msg", "fields": [{"name": "msg", "kind": "string"}]}]
/// }"#).unwrap();
///
/// let files = Generator::new(GeneratorConfig::default())
///     .generate_all(&descriptor, "echo.json")
///     .unwrap();
/// assert_eq!(files[0].name, "echo.rs");
/// assert!(files[0].content.contains("pub trait Echo: Send + Sync + 'static"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct Generator {
    config: GeneratorConfig,
}

impl Generator {
    pub fn new(config: GeneratorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Generates the file for one service. `source` names the schema in the
    /// file header.
    pub fn generate(&self, schema: &ServiceSchema, source: &str) -> Result<GeneratedFile> {
        let names = NameRegistry::for_service(schema);
        let cx = EmitContext::new(schema, &self.config, &names);
        let mut w = CodeWriter::new();

        self.emit_header(&cx, source, &mut w);
        interface::emit(&cx, &mut w)?;
        client::emit(&cx, ClientFlavor::Binary, &mut w)?;
        client::emit(&cx, ClientFlavor::Json, &mut w)?;
        server::emit(&cx, &mut w)?;
        if self.config.emit_validation {
            validation::emit(&cx, &mut w)?;
        }

        tracing::debug!(
            "Generated {}.{}: {} route(s), {} record(s)",
            schema.package,
            schema.name,
            schema.methods.len(),
            names.len()
        );

        Ok(GeneratedFile {
            name: format!("{}.rs", to_snake_case(&schema.name)),
            content: w.finish(),
        })
    }

    /// Generates one file per service in the descriptor.
    pub fn generate_all(&self, descriptor: &ServiceDescriptor, source: &str) -> Result<Vec<GeneratedFile>> {
        descriptor
            .service_schemas(&self.config)?
            .iter()
            .map(|schema| self.generate(schema, source))
            .collect()
    }

    fn emit_header(&self, cx: &EmitContext<'_>, source: &str, w: &mut CodeWriter) {
        let common = cx.common();
        w.line("// Code generated by rivet-codegen. DO NOT EDIT.");
        w.line("// @generated");
        w.line(format!("// source: {}", source));
        w.line(format!("// package: {}", cx.schema.package));
        w.blank();
        w.line(format!(
            "use {}::transport::{{BinaryCodec, Encoding, FormValues, FromForm, JsonCodec, RpcRequest}};",
            common
        ));
        if self.config.emit_validation {
            w.line(format!("use {}::validate::{{Validate, ValidationError}};", common));
        }
        w.line(format!(
            "use {}::{{BoxError, CallContext, Reply, RpcError, ServerHooks}};",
            common
        ));
        w.line(format!("use {}::pipeline::{{self, Handled}};", cx.server()));
    }
}

/// Writes generated files into `out_dir`, creating it if needed. Returns the
/// written paths.
pub fn write_all(files: &[GeneratedFile], out_dir: impl AsRef<Path>) -> Result<Vec<PathBuf>> {
    let out_dir = out_dir.as_ref();
    std::fs::create_dir_all(out_dir)?;

    let mut written = Vec::with_capacity(files.len());
    for file in files {
        let path = out_dir.join(&file.name);
        std::fs::write(&path, &file.content)?;
        tracing::info!("Wrote {}", path.display());
        written.push(path);
    }
    Ok(written)
}
