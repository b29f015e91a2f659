use indexmap::IndexMap;
use log::debug;

use crate::analysis::analyze_operation;
use crate::config::{NamingStrategy, OavgConfig};
use crate::error::TransformError;
use crate::ir::{IrInfo, IrSchema, IrSpec};
use crate::parse::spec::OpenApiSpec;
use crate::pool::{DEFAULT_CONCURRENCY, run_bounded};
use crate::resolve::{ResolveOptions, ResolvedDocument, resolve_document};

use super::schema_resolver::SchemaResolver;

/// Options controlling operation naming and parallelism.
#[derive(Debug, Clone)]
pub struct TransformOptions {
    pub naming_strategy: NamingStrategy,
    pub aliases: IndexMap<String, String>,
    /// Worker threads for per-operation analysis.
    pub concurrency: usize,
}

impl Default for TransformOptions {
    fn default() -> Self {
        Self {
            naming_strategy: NamingStrategy::default(),
            aliases: IndexMap::new(),
            concurrency: DEFAULT_CONCURRENCY,
        }
    }
}

impl From<&OavgConfig> for TransformOptions {
    fn from(config: &OavgConfig) -> Self {
        Self {
            naming_strategy: config.naming.strategy,
            aliases: config.naming.aliases.clone(),
            concurrency: config.concurrency,
        }
    }
}

/// Transform a parsed OpenAPI spec into the fully resolved IR.
pub fn transform(spec: &OpenApiSpec) -> Result<IrSpec, TransformError> {
    transform_with_options(spec, &TransformOptions::default())
}

/// Transform with explicit naming options.
pub fn transform_with_options(
    spec: &OpenApiSpec,
    options: &TransformOptions,
) -> Result<IrSpec, TransformError> {
    // Phase 1: single-threaded pre-pass; identifiers are final afterwards
    let doc = resolve_document(
        spec,
        &ResolveOptions {
            naming: options.naming_strategy,
            aliases: options.aliases.clone(),
        },
    )?;

    // Phase 2: named schemas and per-operation analysis
    transform_resolved(&doc, options.concurrency)
}

/// Build the IR from an already resolved document.
pub fn transform_resolved(
    doc: &ResolvedDocument,
    concurrency: usize,
) -> Result<IrSpec, TransformError> {
    let schemas = resolve_schemas(doc)?;
    let operations = run_bounded(doc.operations(), concurrency, |op| {
        analyze_operation(doc, op)
    })?;

    let info = &doc.spec().info;
    debug!(
        "built IR for `{}`: {} schemas, {} operations",
        info.title,
        schemas.len(),
        operations.len()
    );

    Ok(IrSpec {
        info: IrInfo {
            title: info.title.clone(),
            description: info.description.clone(),
            version: info.version.clone(),
        },
        schemas,
        operations,
        recursive: doc.graph().recursive(),
        renames: doc.registry().renames().clone(),
    })
}

fn resolve_schemas(doc: &ResolvedDocument) -> Result<Vec<IrSchema>, TransformError> {
    let resolver = SchemaResolver::new(doc.registry());
    doc.schemas()
        .map(|(key, schema)| {
            resolver
                .schema_or_ref_to_ir_schema(key, schema)
                .map_err(TransformError::from)
        })
        .collect()
}
