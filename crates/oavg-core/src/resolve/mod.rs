//! Document-wide pre-pass: reference inlining, operation ids, collision
//! repair and reference rewriting.
//!
//! [`resolve_document`] is single-threaded and runs to completion before any
//! per-operation work. Its output, [`ResolvedDocument`], is immutable; every
//! later stage takes `&ResolvedDocument`, so identifiers are final by the time
//! anything reads them.

mod collision;
pub mod graph;
mod operation_ids;
pub mod registry;
pub mod reserved;
pub mod type_name;

use std::collections::HashSet;

use indexmap::IndexMap;
use log::debug;

use crate::config::NamingStrategy;
use crate::error::{ResolveError, TransformError};
use crate::ir::HttpMethod;
use crate::parse::operation::Operation;
use crate::parse::parameter::{Parameter, ParameterLocation};
use crate::parse::ref_resolve::RefResolver;
use crate::parse::schema::SchemaOrRef;
use crate::parse::spec::OpenApiSpec;

pub use graph::SchemaGraph;
pub use registry::NameRegistry;
pub use reserved::{RESERVED_NAMES, is_reserved};
pub use type_name::{OperationContext, OperationNames, SchemaReference, resolve_type_name};

/// Prefix of every reference to a component schema.
pub const SCHEMA_REF_PREFIX: &str = "#/components/schemas/";

/// Suffix that distinguishes the strict variant of an emitted type.
pub const STRICT_SUFFIX: &str = "Strict";

pub fn strict_name(identifier: &str) -> String {
    format!("{identifier}{STRICT_SUFFIX}")
}

/// How operation ids are assigned during the pre-pass.
#[derive(Debug, Clone, Default)]
pub struct ResolveOptions {
    pub naming: NamingStrategy,
    /// Resolved operation id → alias.
    pub aliases: IndexMap<String, String>,
}

/// One operation with its final id and merged parameters.
#[derive(Debug, Clone)]
pub struct ResolvedOperation {
    pub id: String,
    pub method: HttpMethod,
    pub path: String,
    /// Path-level parameters overlaid with operation-level ones.
    pub parameters: Vec<Parameter>,
    pub operation: Operation,
}

/// A document whose identifiers are final.
#[derive(Debug, Clone)]
pub struct ResolvedDocument {
    spec: OpenApiSpec,
    registry: NameRegistry,
    graph: SchemaGraph,
    operations: Vec<ResolvedOperation>,
}

impl ResolvedDocument {
    pub fn spec(&self) -> &OpenApiSpec {
        &self.spec
    }

    pub fn registry(&self) -> &NameRegistry {
        &self.registry
    }

    pub fn graph(&self) -> &SchemaGraph {
        &self.graph
    }

    pub fn operations(&self) -> &[ResolvedOperation] {
        &self.operations
    }

    /// Component schemas keyed by their final keys, in declaration order.
    pub fn schemas(&self) -> impl Iterator<Item = (&str, &SchemaOrRef)> {
        self.spec
            .components
            .iter()
            .flat_map(|c| c.schemas.iter())
            .map(|(k, v)| (k.as_str(), v))
    }
}

/// Run the pre-pass over `spec`.
pub fn resolve_document(
    spec: &OpenApiSpec,
    options: &ResolveOptions,
) -> Result<ResolvedDocument, TransformError> {
    let mut resolved = RefResolver::new(spec).resolve_spec(spec)?;

    let keys: Vec<String> = resolved
        .components
        .as_ref()
        .map(|c| c.schemas.keys().cloned().collect())
        .unwrap_or_default();
    // Operation files export names of their own; schemas must steer clear.
    let assigned = operation_ids::assign_ids(&resolved, options)?;
    let allocation = collision::allocate_identifiers(&keys, &assigned.exports);
    collision::apply_renames(&mut resolved, &allocation.renames)?;

    let identifiers = allocation
        .identifiers
        .into_iter()
        .map(|(key, id)| match allocation.renames.get(&key) {
            Some(new_key) => (new_key.clone(), id),
            None => (key, id),
        })
        .collect();
    let registry = NameRegistry::new(identifiers, allocation.renames);

    let graph = match resolved.components.as_ref() {
        Some(c) => {
            if let Some(cycle) = graph::alias_cycle(&c.schemas) {
                return Err(ResolveError::CircularRef(cycle.join(" -> ")).into());
            }
            SchemaGraph::build(&c.schemas, &registry)
        }
        None => SchemaGraph::default(),
    };

    let operations = operation_ids::bind(&resolved, assigned.ids);
    debug!(
        "resolved {} schemas and {} operations",
        registry.len(),
        operations.len()
    );

    Ok(ResolvedDocument {
        spec: resolved,
        registry,
        graph,
        operations,
    })
}

/// Overlay operation parameters on path parameters; `(name, in)` identifies a parameter.
pub(crate) fn merge_parameters(path_level: &[Parameter], op_level: &[Parameter]) -> Vec<Parameter> {
    let overridden: HashSet<(&str, ParameterLocation)> = op_level
        .iter()
        .map(|p| (p.name.as_str(), p.location))
        .collect();
    path_level
        .iter()
        .filter(|p| !overridden.contains(&(p.name.as_str(), p.location)))
        .chain(op_level)
        .cloned()
        .collect()
}
