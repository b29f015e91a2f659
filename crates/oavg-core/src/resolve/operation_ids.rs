use std::collections::{HashMap, HashSet};

use log::debug;

use crate::config::NamingStrategy;
use crate::error::TransformError;
use crate::ir::HttpMethod;
use crate::parse::parameter::{Parameter, ParameterOrRef};
use crate::parse::spec::OpenApiSpec;
use crate::transform::name_normalizer::route_to_name;

use super::reserved::is_reserved;
use super::type_name::OperationNames;
use super::{ResolveOptions, ResolvedOperation, merge_parameters};

/// Final operation ids in path then method order, with every identifier
/// their files export.
#[derive(Debug, Default)]
pub(super) struct OperationIds {
    pub ids: Vec<String>,
    pub exports: HashSet<String>,
}

/// Give every operation its final id, in path then method order.
///
/// Ids must stay distinct after normalization: `getPet` and `get_pet` would
/// share a file and every export, so the second one is rejected.
pub(super) fn assign_ids(
    spec: &OpenApiSpec,
    options: &ResolveOptions,
) -> Result<OperationIds, TransformError> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut files: HashMap<String, String> = HashMap::new();
    let mut owners: HashMap<String, String> = HashMap::new();
    let mut assigned = OperationIds::default();

    for (path, item) in &spec.paths {
        for (method_name, op) in item.operations() {
            let declared = op.operation_id.as_deref().filter(|id| !id.trim().is_empty());
            let raw = match (options.naming, declared) {
                (NamingStrategy::UseOperationId, Some(id))
                | (NamingStrategy::UseOperationIdOrRoute, Some(id)) => id.to_string(),
                (NamingStrategy::UseOperationId, None) => {
                    return Err(TransformError::MissingOperationId {
                        method: method_name.to_string(),
                        path: path.clone(),
                    });
                }
                (NamingStrategy::UseOperationIdOrRoute, None) | (NamingStrategy::UseRouteBased, _) => {
                    route_to_name(method_name, path)
                }
            };

            let id = match options.aliases.get(&raw) {
                Some(alias) => {
                    debug!("aliasing operation `{raw}` as `{alias}`");
                    alias.clone()
                }
                None => raw,
            };
            if !seen.insert(id.clone()) {
                return Err(TransformError::DuplicateOperationId(id));
            }

            let names = OperationNames::new(&id);
            // File names compare case-insensitively on some file systems.
            if let Some(other) = files.insert(names.camel.to_lowercase(), id.clone()) {
                return Err(TransformError::OperationNameClash {
                    operation: id,
                    other,
                    identifier: format!("operations/{}.ts", names.camel),
                });
            }
            for export in names.exports() {
                if is_reserved(&export) {
                    return Err(TransformError::OperationNameClash {
                        operation: id,
                        other: "support".to_string(),
                        identifier: export,
                    });
                }
                if let Some(other) = owners.insert(export.clone(), id.clone()) {
                    return Err(TransformError::OperationNameClash {
                        operation: id,
                        other,
                        identifier: export,
                    });
                }
            }
            assigned.ids.push(id);
        }
    }

    assigned.exports = owners.into_keys().collect();
    Ok(assigned)
}

/// Pair each operation of the rewritten document with its id from
/// [`assign_ids`]. Both walk the paths in the same order.
pub(super) fn bind(spec: &OpenApiSpec, ids: Vec<String>) -> Vec<ResolvedOperation> {
    let mut ids = ids.into_iter();
    let mut operations = Vec::new();

    for (path, item) in &spec.paths {
        let path_params = inline_parameters(&item.parameters);
        for ((method_name, op), id) in item.operations().into_iter().zip(ids.by_ref()) {
            let method = HttpMethod::parse(method_name).unwrap_or(HttpMethod::Get);
            operations.push(ResolvedOperation {
                id,
                method,
                path: path.clone(),
                parameters: merge_parameters(&path_params, &inline_parameters(&op.parameters)),
                operation: op.clone(),
            });
        }
    }

    operations
}

/// Parameters are inline after reference resolution; anything else is skipped.
fn inline_parameters(params: &[ParameterOrRef]) -> Vec<Parameter> {
    params
        .iter()
        .filter_map(|p| match p {
            ParameterOrRef::Parameter(param) => Some(param.clone()),
            ParameterOrRef::Ref { .. } => None,
        })
        .collect()
}
