//! Rivet Code Generator
//!
//! Compiles a JSON service descriptor into one Rust source file per service.
//! Each file holds the service's records, its service trait, binary and JSON
//! clients, a server handler and record validators, all built on the
//! `rivet-common`, `rivet-server` and `rivet-client` runtime crates.
//!
//! # Pipeline
//!
//! ```text
//! descriptor JSON ──► ServiceDescriptor ──► ServiceSchema ──► Generator ──► {service}.rs
//!                      (serde)               (resolve, rules)   (emit/*)
//! ```
//!
//! Loading and generation either succeed completely or return a
//! [`GenError`]; [`write_all`] is only called once every file has been
//! generated.

pub mod config;
pub mod emit;
pub mod error;
pub mod generator;
pub mod naming;
pub mod registry;
pub mod rules;
pub mod schema;

pub use config::{GeneratorConfig, DEFAULT_OPTION_PREFIX};
pub use error::{GenError, Result};
pub use generator::{write_all, GeneratedFile, Generator};
pub use registry::NameRegistry;
pub use rules::{Rule, RuleArg, RuleKind, RuleTable};
pub use schema::{FieldKind, ServiceDescriptor, ServiceSchema};
