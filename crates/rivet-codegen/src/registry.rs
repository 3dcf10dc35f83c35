//! Record type naming.
//!
//! Records are emitted under their short name. When two records share a
//! short name, or a short name collides with a type the generated file
//! defines or imports, later records get a numeric suffix (`User`, `User1`,
//! `User2`). Records are registered in sorted fully-qualified order, so the
//! assignment does not depend on declaration order.

use std::collections::{BTreeMap, HashSet};

use crate::error::{GenError, Result};
use crate::schema::ServiceSchema;

/// Names that are in scope in every generated file.
const PRELUDE: &[&str] = &[
    "Result", "Option", "Some", "None", "Ok", "Err", "Vec", "String", "Box", "Default", "Clone",
    "Debug", "PartialEq", "Send", "Sync", "Self", "BinaryCodec", "Encoding", "FormValues",
    "FromForm", "JsonCodec", "RpcRequest", "Validate", "ValidationError", "BoxError",
    "CallContext", "Reply", "RpcError", "ServerHooks", "Handled",
];

#[derive(Debug, Clone)]
pub struct NameRegistry {
    taken: HashSet<String>,
    assigned: BTreeMap<String, String>,
}

impl NameRegistry {
    /// A registry with the prelude and the service's own type names reserved.
    pub fn new(service: &str) -> Self {
        let mut taken: HashSet<String> = PRELUDE.iter().map(|s| s.to_string()).collect();
        taken.insert(service.to_string());
        for suffix in ["Server", "BinaryClient", "JsonClient"] {
            taken.insert(format!("{}{}", service, suffix));
        }
        Self {
            taken,
            assigned: BTreeMap::new(),
        }
    }

    /// Registers every record of `schema`.
    pub fn for_service(schema: &ServiceSchema) -> Self {
        let mut registry = Self::new(&schema.name);
        for fqn in schema.records.keys() {
            registry.register(fqn);
        }
        registry
    }

    /// Assigns a name to `fqn`. Registering the same record twice returns the
    /// first name.
    pub fn register(&mut self, fqn: &str) -> &str {
        if !self.assigned.contains_key(fqn) {
            let short = fqn.rsplit('.').next().unwrap_or(fqn);
            let mut candidate = short.to_string();
            let mut n = 1;
            while self.taken.contains(&candidate) {
                candidate = format!("{}{}", short, n);
                n += 1;
            }
            if candidate != short {
                tracing::debug!("Record {} renamed to {} to avoid a collision", fqn, candidate);
            }
            self.taken.insert(candidate.clone());
            self.assigned.insert(fqn.to_string(), candidate);
        }
        &self.assigned[fqn]
    }

    pub fn get(&self, fqn: &str) -> Option<&str> {
        self.assigned.get(fqn).map(String::as_str)
    }

    /// Name of a registered record, or `UnknownRecord`.
    pub fn resolve(&self, fqn: &str) -> Result<&str> {
        self.get(fqn).ok_or_else(|| GenError::UnknownRecord {
            referrer: "generated file".to_string(),
            reference: fqn.to_string(),
        })
    }

    /// `(fqn, name)` pairs in fully-qualified order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.assigned.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.assigned.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assigned.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_names() {
        let mut registry = NameRegistry::new("Echo");
        assert_eq!(registry.register("demo.v1.EchoRequest"), "EchoRequest");
        assert_eq!(registry.resolve("demo.v1.EchoRequest").unwrap(), "EchoRequest");
    }

    #[test]
    fn test_collisions_get_suffixes() {
        let mut registry = NameRegistry::new("Echo");
        assert_eq!(registry.register("demo.v1.User"), "User");
        assert_eq!(registry.register("demo.v1.admin.User"), "User1");
        assert_eq!(registry.register("demo.v1.billing.User"), "User2");
    }

    #[test]
    fn test_reserved_names() {
        let mut registry = NameRegistry::new("Echo");
        assert_eq!(registry.register("demo.v1.Echo"), "Echo1");
        assert_eq!(registry.register("demo.v1.EchoServer"), "EchoServer1");
        assert_eq!(registry.register("demo.v1.Result"), "Result1");
    }

    #[test]
    fn test_register_is_idempotent() {
        let mut registry = NameRegistry::new("Echo");
        registry.register("demo.v1.User");
        registry.register("demo.v1.admin.User");
        assert_eq!(registry.register("demo.v1.User"), "User");
        assert_eq!(registry.register("demo.v1.admin.User"), "User1");
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_unregistered_record() {
        let registry = NameRegistry::new("Echo");
        assert!(matches!(
            registry.resolve("demo.v1.Missing"),
            Err(GenError::UnknownRecord { .. })
        ));
    }
}
