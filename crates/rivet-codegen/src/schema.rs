//! Service schema model and loader.
//!
//! The compiler's input is a JSON [`ServiceDescriptor`] produced by an
//! external front end. Loading resolves every record reference, rejects
//! duplicates, extracts method option tags and compiles field annotations
//! into a [`RuleTable`], producing one immutable [`ServiceSchema`] per
//! service.
//!
//! # Input Format
//!
//! ```json
//! {
//!   "package": "demo.v1",
//!   "services": [{
//!     "name": "Echo",
//!     "methods": [{ "name": "Echo", "input": "EchoRequest", "output": "EchoResponse" }]
//!   }],
//!   "records": [
//!     { "name": "EchoRequest", "fields": [{ "name": "msg", "kind": "string" }] },
//!     { "name": "EchoResponse", "fields": [{ "name": "msg", "kind": "string" }] }
//!   ]
//! }
//! ```
//!
//! Record names may be short (`EchoRequest`, resolved in the package) or
//! fully qualified (`demo.v1.EchoRequest`, optionally with a leading dot).

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashSet, VecDeque};
use std::path::Path;

use crate::config::GeneratorConfig;
use crate::error::{GenError, Result};
use crate::naming::{is_identifier, to_snake_case};
use crate::rules::{compile_field_rules, RuleTable};

/// Field kinds understood by the compiler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    String,
    Int32,
    Int64,
    Uint32,
    Uint64,
    Float,
    Double,
    Bool,
    Bytes,
    Message,
}

impl FieldKind {
    pub fn name(self) -> &'static str {
        match self {
            FieldKind::String => "string",
            FieldKind::Int32 => "int32",
            FieldKind::Int64 => "int64",
            FieldKind::Uint32 => "uint32",
            FieldKind::Uint64 => "uint64",
            FieldKind::Float => "float",
            FieldKind::Double => "double",
            FieldKind::Bool => "bool",
            FieldKind::Bytes => "bytes",
            FieldKind::Message => "message",
        }
    }

    /// Rust type of a singular scalar. `None` for messages.
    pub fn rust_scalar(self) -> Option<&'static str> {
        match self {
            FieldKind::String => Some("String"),
            FieldKind::Int32 => Some("i32"),
            FieldKind::Int64 => Some("i64"),
            FieldKind::Uint32 => Some("u32"),
            FieldKind::Uint64 => Some("u64"),
            FieldKind::Float => Some("f32"),
            FieldKind::Double => Some("f64"),
            FieldKind::Bool => Some("bool"),
            FieldKind::Bytes => Some("Vec<u8>"),
            FieldKind::Message => None,
        }
    }

    pub fn is_numeric(self) -> bool {
        matches!(
            self,
            FieldKind::Int32
                | FieldKind::Int64
                | FieldKind::Uint32
                | FieldKind::Uint64
                | FieldKind::Float
                | FieldKind::Double
        )
    }

    pub fn is_float(self) -> bool {
        matches!(self, FieldKind::Float | FieldKind::Double)
    }

    /// Scalars other than bytes can be bound from form values.
    pub fn is_form_bindable(self) -> bool {
        !matches!(self, FieldKind::Bytes | FieldKind::Message)
    }
}

// ============================================================================
// Input descriptor
// ============================================================================

/// The JSON document emitted by the front end.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceDescriptor {
    pub package: String,
    pub services: Vec<ServiceDecl>,
    pub records: Vec<RecordDecl>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceDecl {
    pub name: String,
    pub comment: String,
    pub methods: Vec<MethodDecl>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MethodDecl {
    pub name: String,
    pub input: String,
    pub output: String,
    pub leading_comment: String,
    pub trailing_comment: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecordDecl {
    pub name: String,
    pub fields: Vec<FieldDecl>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDecl {
    pub name: String,
    pub kind: FieldKind,
    #[serde(default)]
    pub repeated: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub comment: String,
}

// ============================================================================
// Normalized schema
// ============================================================================

/// One service, ready for code generation.
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceSchema {
    pub package: String,
    pub name: String,
    pub comment: String,
    pub methods: Vec<MethodSchema>,
    /// Records reachable from the methods, keyed by fully-qualified name.
    pub records: BTreeMap<String, RecordSchema>,
    pub rules: RuleTable,
}

impl ServiceSchema {
    /// `/{package}.{Service}/`
    pub fn path_prefix(&self) -> String {
        format!("/{}.{}/", self.package, self.name)
    }

    /// Route paths in method order.
    pub fn routes(&self) -> Vec<String> {
        let prefix = self.path_prefix();
        self.methods
            .iter()
            .map(|m| format!("{}{}", prefix, m.name))
            .collect()
    }

    pub fn record(&self, fqn: &str) -> Option<&RecordSchema> {
        self.records.get(fqn)
    }

    /// Fully-qualified names of method inputs, sorted and deduplicated.
    pub fn input_records(&self) -> Vec<&str> {
        let inputs: BTreeSet<&str> = self.methods.iter().map(|m| m.input.as_str()).collect();
        inputs.into_iter().collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MethodSchema {
    pub name: String,
    pub input: String,
    pub output: String,
    /// Option tag from the trailing comment (`rivet:auth` → `auth`).
    pub option: Option<String>,
    pub comment: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecordSchema {
    pub name: String,
    pub fields: Vec<FieldSchema>,
}

impl RecordSchema {
    /// Last segment of the fully-qualified name.
    pub fn short_name(&self) -> &str {
        self.name.rsplit('.').next().unwrap_or(&self.name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldSchema {
    pub name: String,
    pub kind: FieldKind,
    pub repeated: bool,
    /// Fully-qualified name of the referenced record for message fields.
    pub message: Option<String>,
    pub comment: String,
}

// ============================================================================
// Loading
// ============================================================================

impl ServiceDescriptor {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn service_names(&self) -> Vec<&str> {
        self.services.iter().map(|s| s.name.as_str()).collect()
    }

    /// Loads every service in the document.
    pub fn service_schemas(&self, config: &GeneratorConfig) -> Result<Vec<ServiceSchema>> {
        let records = self.resolve_records()?;
        let mut seen = HashSet::new();
        let mut file_names = HashSet::new();
        let mut schemas = Vec::with_capacity(self.services.len());

        // Each service lands in `{snake}.rs`, so snake-case names must be unique too.
        for service in &self.services {
            if !seen.insert(service.name.as_str()) || !file_names.insert(to_snake_case(&service.name)) {
                return Err(GenError::DuplicateService(service.name.clone()));
            }
            schemas.push(self.build_service(service, &records, config)?);
        }
        Ok(schemas)
    }

    /// Loads a single service by name.
    pub fn service_schema(&self, name: &str, config: &GeneratorConfig) -> Result<ServiceSchema> {
        let service = self
            .services
            .iter()
            .find(|s| s.name == name)
            .ok_or_else(|| GenError::UnknownService(name.to_string()))?;
        let records = self.resolve_records()?;
        self.build_service(service, &records, config)
    }

    fn check_package(&self) -> Result<()> {
        if self.package.is_empty() || !self.package.split('.').all(is_identifier) {
            return Err(GenError::MalformedSchema(format!(
                "invalid package name {:?}",
                self.package
            )));
        }
        Ok(())
    }

    fn qualify(&self, name: &str) -> String {
        let name = name.trim_start_matches('.');
        if name.starts_with(&format!("{}.", self.package)) {
            name.to_string()
        } else {
            format!("{}.{}", self.package, name)
        }
    }

    /// Qualifies every record, checks duplicates and resolves field references.
    fn resolve_records(&self) -> Result<BTreeMap<String, RecordSchema>> {
        self.check_package()?;

        let mut records = BTreeMap::new();
        for decl in &self.records {
            let short = decl.name.trim_start_matches('.').rsplit('.').next().unwrap_or("");
            if !is_identifier(short) {
                return Err(GenError::MalformedSchema(format!(
                    "invalid record name {:?}",
                    decl.name
                )));
            }
            let fqn = self.qualify(&decl.name);
            if records.contains_key(&fqn) {
                return Err(GenError::DuplicateRecord(fqn));
            }
            records.insert(fqn, decl);
        }

        let mut resolved = BTreeMap::new();
        for (fqn, decl) in &records {
            let mut names = HashSet::new();
            let mut rust_names = HashSet::new();
            let mut fields = Vec::with_capacity(decl.fields.len());

            for field in &decl.fields {
                if !is_identifier(&field.name) {
                    return Err(GenError::MalformedSchema(format!(
                        "invalid field name {:?} in record {}",
                        field.name, fqn
                    )));
                }
                if !names.insert(field.name.as_str()) || !rust_names.insert(to_snake_case(&field.name)) {
                    return Err(GenError::DuplicateField {
                        record: fqn.clone(),
                        field: field.name.clone(),
                    });
                }

                let message = match (field.kind, &field.message) {
                    (FieldKind::Message, Some(reference)) => {
                        let target = self.qualify(reference);
                        if !records.contains_key(&target) {
                            return Err(GenError::UnknownRecord {
                                referrer: format!("{}.{}", fqn, field.name),
                                reference: reference.clone(),
                            });
                        }
                        Some(target)
                    }
                    (FieldKind::Message, None) => {
                        return Err(GenError::MalformedSchema(format!(
                            "message field {}.{} has no record reference",
                            fqn, field.name
                        )))
                    }
                    (_, Some(_)) => {
                        return Err(GenError::MalformedSchema(format!(
                            "scalar field {}.{} must not reference a record",
                            fqn, field.name
                        )))
                    }
                    (_, None) => None,
                };

                fields.push(FieldSchema {
                    name: field.name.clone(),
                    kind: field.kind,
                    repeated: field.repeated,
                    message,
                    comment: field.comment.clone(),
                });
            }

            resolved.insert(
                fqn.clone(),
                RecordSchema {
                    name: fqn.clone(),
                    fields,
                },
            );
        }
        Ok(resolved)
    }

    fn build_service(
        &self,
        service: &ServiceDecl,
        records: &BTreeMap<String, RecordSchema>,
        config: &GeneratorConfig,
    ) -> Result<ServiceSchema> {
        if !is_identifier(&service.name) {
            return Err(GenError::MalformedSchema(format!(
                "invalid service name {:?}",
                service.name
            )));
        }
        if service.methods.is_empty() {
            return Err(GenError::MalformedSchema(format!(
                "service {} declares no methods",
                service.name
            )));
        }

        let option_re = option_regex(&config.option_prefix)?;
        let mut names = HashSet::new();
        let mut fn_names = HashSet::new();
        let mut methods = Vec::with_capacity(service.methods.len());

        for method in &service.methods {
            if !is_identifier(&method.name) {
                return Err(GenError::MalformedSchema(format!(
                    "invalid method name {:?} in service {}",
                    method.name, service.name
                )));
            }
            if !names.insert(method.name.as_str()) || !fn_names.insert(to_snake_case(&method.name)) {
                return Err(GenError::DuplicateMethod {
                    service: service.name.clone(),
                    method: method.name.clone(),
                });
            }

            let referrer = format!("{}.{}", service.name, method.name);
            let input = self.lookup(&method.input, records, &referrer)?;
            let output = self.lookup(&method.output, records, &referrer)?;
            let option = option_re
                .captures(&method.trailing_comment)
                .map(|caps| caps[1].to_string());

            methods.push(MethodSchema {
                name: method.name.clone(),
                input,
                output,
                option,
                comment: method.leading_comment.clone(),
            });
        }

        let reachable = reachable_records(&methods, records);
        let mut rules = RuleTable::new();
        for record in reachable.values() {
            for field in &record.fields {
                let compiled = compile_field_rules(&record.name, field, config.strict_rules)?;
                rules.insert(&record.name, &field.name, compiled);
            }
        }

        tracing::debug!(
            "Loaded service {}.{}: {} method(s), {} record(s), {} rule(s)",
            self.package,
            service.name,
            methods.len(),
            reachable.len(),
            rules.len()
        );

        Ok(ServiceSchema {
            package: self.package.clone(),
            name: service.name.clone(),
            comment: service.comment.clone(),
            methods,
            records: reachable,
            rules,
        })
    }

    fn lookup(
        &self,
        reference: &str,
        records: &BTreeMap<String, RecordSchema>,
        referrer: &str,
    ) -> Result<String> {
        let fqn = self.qualify(reference);
        if records.contains_key(&fqn) {
            Ok(fqn)
        } else {
            Err(GenError::UnknownRecord {
                referrer: referrer.to_string(),
                reference: reference.to_string(),
            })
        }
    }
}

fn option_regex(prefix: &str) -> Result<Regex> {
    Regex::new(&format!(r"{}:([^:\s]+)", regex::escape(prefix))).map_err(|e| {
        GenError::MalformedSchema(format!("invalid option prefix {:?}: {}", prefix, e))
    })
}

/// Records reachable from the method signatures. Recursive references are
/// visited once.
fn reachable_records(
    methods: &[MethodSchema],
    records: &BTreeMap<String, RecordSchema>,
) -> BTreeMap<String, RecordSchema> {
    let mut reachable = BTreeMap::new();
    let mut queue: VecDeque<&str> = methods
        .iter()
        .flat_map(|m| [m.input.as_str(), m.output.as_str()])
        .collect();

    while let Some(fqn) = queue.pop_front() {
        if reachable.contains_key(fqn) {
            continue;
        }
        if let Some(record) = records.get(fqn) {
            queue.extend(record.fields.iter().filter_map(|f| f.message.as_deref()));
            reachable.insert(fqn.to_string(), record.clone());
        }
    }
    reachable
}
