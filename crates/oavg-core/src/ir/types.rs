use std::collections::BTreeMap;
use std::fmt;

use indexmap::IndexMap;

use super::schemas::IrSchema;
use crate::analysis::OperationMetadata;

/// A fully resolved, generator-ready intermediate representation of an OpenAPI spec.
#[derive(Debug, Clone)]
pub struct IrSpec {
    pub info: IrInfo,
    /// Named schemas in declaration order, keyed by their final identifier.
    pub schemas: Vec<IrSchema>,
    pub operations: Vec<OperationMetadata>,
    /// Schemas that take part in a reference cycle, keyed by identifier.
    /// Schemas sharing a value belong to the same cycle.
    pub recursive: BTreeMap<String, usize>,
    /// Schema renames applied by collision repair (old name → new name).
    pub renames: IndexMap<String, String>,
}

impl IrSpec {
    pub fn schema(&self, identifier: &str) -> Option<&IrSchema> {
        self.schemas
            .iter()
            .find(|s| s.name().pascal_case == identifier)
    }

    pub fn is_recursive(&self, identifier: &str) -> bool {
        self.recursive.contains_key(identifier)
    }

    /// True when `from` referencing `to` closes a cycle, so the reference must be deferred.
    pub fn same_cycle(&self, from: &str, to: &str) -> bool {
        match (self.recursive.get(from), self.recursive.get(to)) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        }
    }
}

/// API metadata.
#[derive(Debug, Clone)]
pub struct IrInfo {
    pub title: String,
    pub description: Option<String>,
    pub version: String,
}

/// A source name with its TypeScript casings.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NormalizedName {
    pub original: String,
    pub pascal_case: String,
    pub camel_case: String,
}

impl fmt::Display for NormalizedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.original)
    }
}
