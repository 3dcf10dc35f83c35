//! Subcommand implementations.

use anyhow::{anyhow, Context, Result};
use rivet_client::{do_json_request, ClientConfig, ClientContext, ReqwestClient};
use rivet_codegen::{write_all, Generator, GeneratorConfig, ServiceDescriptor};
use rivet_common::protocol::ErrorEnvelope;
use std::path::{Path, PathBuf};

/// Environment fallback for `--option-prefix`.
pub const OPTION_PREFIX_ENV: &str = "RIVET_OPTION_PREFIX";
/// Environment fallback for `--out`.
pub const OUT_DIR_ENV: &str = "RIVET_OUT_DIR";

/// Picks a flag value over its environment fallback.
pub fn flag_or_env(flag: Option<String>, env_value: Option<String>) -> Option<String> {
    flag.or(env_value).filter(|v| !v.is_empty())
}

/// Output directory from `--out` or `RIVET_OUT_DIR`.
pub fn resolve_out_dir(flag: Option<String>) -> Result<PathBuf> {
    flag_or_env(flag, std::env::var(OUT_DIR_ENV).ok())
        .map(PathBuf::from)
        .ok_or_else(|| anyhow!("No output directory: pass --out or set {}", OUT_DIR_ENV))
}

/// Option prefix from `--option-prefix` or `RIVET_OPTION_PREFIX`.
pub fn resolve_option_prefix(flag: Option<String>) -> Option<String> {
    flag_or_env(flag, std::env::var(OPTION_PREFIX_ENV).ok())
}

/// Validates that a URL string starts with http:// or https://
pub fn validate_http_url(url: &str, description: &str) -> Result<()> {
    if url.starts_with("http://") || url.starts_with("https://") {
        Ok(())
    } else {
        Err(anyhow!(
            "Invalid {}: '{}' must start with http:// or https://",
            description,
            url
        ))
    }
}

fn load(schema: &Path) -> Result<ServiceDescriptor> {
    ServiceDescriptor::from_path(schema)
        .with_context(|| format!("Failed to load schema {}", schema.display()))
}

/// Generates every service in `schema` into `out_dir`.
///
/// Nothing is written unless every service generates successfully.
pub fn generate(schema: &Path, out_dir: &Path, config: GeneratorConfig) -> Result<Vec<PathBuf>> {
    let descriptor = load(schema)?;
    let source = schema
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| schema.display().to_string());

    let files = Generator::new(config).generate_all(&descriptor, &source)?;
    let written = write_all(&files, out_dir)?;
    tracing::info!("Generated {} file(s) from {}", written.len(), schema.display());
    Ok(written)
}

/// One line per route: the path, then the method option when present.
pub fn routes(schema: &Path, config: &GeneratorConfig) -> Result<Vec<String>> {
    let descriptor = load(schema)?;
    let mut lines = Vec::new();
    for service in descriptor.service_schemas(config)? {
        let prefix = service.path_prefix();
        for method in &service.methods {
            match &method.option {
                Some(option) => lines.push(format!("POST {}{}\t{}", prefix, method.name, option)),
                None => lines.push(format!("POST {}{}", prefix, method.name)),
            }
        }
    }
    Ok(lines)
}

/// Splits `/package.Service/Method` into its parts.
pub fn parse_route(path: &str) -> Option<(&str, &str, &str)> {
    let rest = path.strip_prefix('/')?;
    let (qualified, method) = rest.split_once('/')?;
    let (package, service) = qualified.rsplit_once('.')?;
    if package.is_empty() || service.is_empty() || method.is_empty() || method.contains('/') {
        return None;
    }
    Some((package, service, method))
}

/// Parses a `name:value` header argument.
pub fn parse_header(raw: &str) -> Result<(String, String)> {
    let (name, value) = raw
        .split_once(':')
        .ok_or_else(|| anyhow!("Invalid header '{}': expected name:value", raw))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(anyhow!("Invalid header '{}': empty name", raw));
    }
    Ok((name.to_string(), value.trim().to_string()))
}

/// Calls `path` on `base_url` with a JSON body and returns the JSON reply.
///
/// An error reply is returned as an error carrying the server's envelope.
pub async fn call(
    base_url: &str,
    path: &str,
    args: &str,
    headers: &[String],
    timeout_ms: u64,
) -> Result<serde_json::Value> {
    validate_http_url(base_url, "server address")?;
    let (package, service, method) =
        parse_route(path).ok_or_else(|| anyhow!("Invalid route '{}': expected /package.Service/Method", path))?;

    let input: serde_json::Value =
        serde_json::from_str(args).map_err(|e| anyhow!("Invalid JSON in args: {}", e))?;

    let mut ctx = ClientContext::new().with_route(package, service, method);
    for raw in headers {
        let (name, value) = parse_header(raw)?;
        ctx = ctx.with_header(name, value);
    }

    let config = ClientConfig {
        request_timeout_ms: timeout_ms,
        ..ClientConfig::default()
    };
    let client = ReqwestClient::with_config(&config)?;
    let url = format!("{}{}", base_url.trim_end_matches('/'), path);

    do_json_request(&client, &ctx, &url, &input).await.map_err(|err| {
        let envelope = ErrorEnvelope::from(&err).to_json();
        anyhow!("{}", String::from_utf8_lossy(&envelope))
    })
}
