/// Default prefix of the method option tag (`rivet:value`).
pub const DEFAULT_OPTION_PREFIX: &str = "rivet";

/// Generator configuration.
///
/// # Fields
///
/// - `option_prefix` - Prefix of the option tag read from a method's trailing
///   comment (default: `rivet`)
/// - `strict_rules` - Whether an unknown `@keyword` fails generation
///   (default: true). When false the rule is skipped with a warning.
/// - `emit_validation` - Whether validators are generated and called by the
///   server (default: true)
/// - `common_crate` / `server_crate` / `client_crate` - Paths of the runtime
///   crates as seen from the generated code
///
/// # Example
///
/// ```
/// use rivet_codegen::GeneratorConfig;
///
/// let config = GeneratorConfig::new()
///     .with_option_prefix("acme")
///     .with_strict_rules(false);
/// assert_eq!(config.option_prefix, "acme");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratorConfig {
    pub option_prefix: String,
    pub strict_rules: bool,
    pub emit_validation: bool,
    pub common_crate: String,
    pub server_crate: String,
    pub client_crate: String,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            option_prefix: DEFAULT_OPTION_PREFIX.to_string(),
            strict_rules: true,
            emit_validation: true,
            common_crate: "rivet_common".to_string(),
            server_crate: "rivet_server".to_string(),
            client_crate: "rivet_client".to_string(),
        }
    }
}

impl GeneratorConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_option_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.option_prefix = prefix.into();
        self
    }

    pub fn with_strict_rules(mut self, strict: bool) -> Self {
        self.strict_rules = strict;
        self
    }

    pub fn with_validation(mut self, enabled: bool) -> Self {
        self.emit_validation = enabled;
        self
    }

    /// Overrides the runtime crate paths, for example when the runtime is
    /// re-exported from a facade crate.
    pub fn with_runtime_crates(
        mut self,
        common: impl Into<String>,
        server: impl Into<String>,
        client: impl Into<String>,
    ) -> Self {
        self.common_crate = common.into();
        self.server_crate = server.into();
        self.client_crate = client.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = GeneratorConfig::default();
        assert_eq!(config.option_prefix, "rivet");
        assert!(config.strict_rules);
        assert!(config.emit_validation);
        assert_eq!(config.common_crate, "rivet_common");
    }

    #[test]
    fn test_builder_pattern_chaining() {
        let config = GeneratorConfig::new()
            .with_validation(false)
            .with_runtime_crates("rt::common", "rt::server", "rt::client");
        assert!(!config.emit_validation);
        assert_eq!(config.server_crate, "rt::server");
    }
}
