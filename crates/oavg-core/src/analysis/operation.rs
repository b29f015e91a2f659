use std::collections::BTreeSet;

use log::debug;

use crate::error::TransformError;
use crate::ir::{HttpMethod, IrParameter, IrParameterLocation, IrType};
use crate::parse::parameter::{Parameter, ParameterLocation};
use crate::resolve::{
    OperationContext, OperationNames, ResolvedDocument, ResolvedOperation, SchemaReference,
};
use crate::transform::name_normalizer::normalize_name;
use crate::transform::schema_resolver::SchemaResolver;

use super::content_type::{
    ContentTypeMapping, RequestContentTypes, extract_request_content_types,
    extract_response_content_types,
};
use super::response::{ResponseAnalysis, analyze_responses};

/// Parameters split by where they travel.
#[derive(Debug, Clone, Default)]
pub struct ParameterGroups {
    pub path: Vec<IrParameter>,
    pub query: Vec<IrParameter>,
    pub header: Vec<IrParameter>,
}

impl ParameterGroups {
    pub fn is_empty(&self) -> bool {
        self.path.is_empty() && self.query.is_empty() && self.header.is_empty()
    }
}

/// Request body content types plus the names chosen for its map type.
#[derive(Debug, Clone, Default)]
pub struct BodyInfo {
    pub request: RequestContentTypes,
    pub default_content_type: Option<String>,
    /// Name of the content type → schema map; `None` without a request body.
    pub map_type_name: Option<String>,
}

impl BodyInfo {
    pub fn content_types(&self) -> &[ContentTypeMapping] {
        &self.request.content_types
    }

    pub fn is_required(&self) -> bool {
        self.request.is_required
    }
}

/// An inline schema the operation file declares for itself.
#[derive(Debug, Clone, PartialEq)]
pub struct InlineSchema {
    pub identifier: String,
    pub schema: IrType,
}

/// Everything known about one operation after analysis.
#[derive(Debug, Clone)]
pub struct OperationMetadata {
    pub operation_id: String,
    pub names: OperationNames,
    pub method: HttpMethod,
    pub path: String,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub tags: Vec<String>,
    pub deprecated: bool,
    pub parameters: ParameterGroups,
    pub body: BodyInfo,
    pub responses: ResponseAnalysis,
    /// Named schemas the operation file imports, sorted.
    pub imports: BTreeSet<String>,
    /// Inline schemas in order of first use.
    pub inline_schemas: Vec<InlineSchema>,
}

/// Analyze one operation of a resolved document.
///
/// Reads only `doc` and `op`, so operations can be analyzed in any order or
/// in parallel.
pub fn analyze_operation(
    doc: &ResolvedDocument,
    op: &ResolvedOperation,
) -> Result<OperationMetadata, TransformError> {
    let mut ctx = OperationContext::new(doc.registry(), &op.id);
    let parameters = group_parameters(&op.parameters, &mut ctx)?;

    let request = extract_request_content_types(op.operation.request_body.as_ref(), &mut ctx)?;
    let extracted = extract_response_content_types(&op.operation, &mut ctx)?;
    let responses = analyze_responses(&extracted);

    let mut inline_schemas = Vec::new();
    let mappings = request
        .content_types
        .iter()
        .chain(responses.responses.iter().flat_map(|r| r.content_types.iter()));
    for mapping in mappings {
        if let Some(SchemaReference::Inline { identifier, schema }) = &mapping.schema {
            inline_schemas.push(InlineSchema {
                identifier: identifier.clone(),
                schema: schema.clone(),
            });
        }
    }

    let names = ctx.names().clone();
    let body = BodyInfo {
        default_content_type: request.default_content_type().map(str::to_string),
        map_type_name: (!request.content_types.is_empty()).then(|| names.request_body_map()),
        request,
    };

    debug!(
        "analyzed {} {} as `{}`: {} statuses, {} inline schemas",
        op.method.as_str(),
        op.path,
        op.id,
        responses.responses.len(),
        inline_schemas.len()
    );

    Ok(OperationMetadata {
        operation_id: op.id.clone(),
        names,
        method: op.method,
        path: op.path.clone(),
        summary: op.operation.summary.clone(),
        description: op.operation.description.clone(),
        tags: op.operation.tags.clone(),
        deprecated: op.operation.deprecated.unwrap_or(false),
        parameters,
        body,
        responses,
        imports: ctx.into_imports(),
        inline_schemas,
    })
}

fn group_parameters(
    params: &[Parameter],
    ctx: &mut OperationContext<'_>,
) -> Result<ParameterGroups, TransformError> {
    let resolver = SchemaResolver::new(ctx.registry());
    let mut groups = ParameterGroups::default();

    for param in params {
        let param_type = match &param.schema {
            Some(schema) => resolver.schema_or_ref_to_ir_type(schema)?,
            None => IrType::String,
        };
        for name in param_type.refs() {
            ctx.import(name);
        }
        let (location, group) = match param.location {
            ParameterLocation::Path => (IrParameterLocation::Path, &mut groups.path),
            ParameterLocation::Query => (IrParameterLocation::Query, &mut groups.query),
            ParameterLocation::Header => (IrParameterLocation::Header, &mut groups.header),
            ParameterLocation::Cookie => {
                debug!(
                    "operation `{}`: dropping cookie parameter `{}`",
                    ctx.operation_id(),
                    param.name
                );
                continue;
            }
        };
        group.push(IrParameter {
            name: normalize_name(&param.name),
            original_name: param.name.clone(),
            location,
            param_type,
            required: param.is_required(),
            description: param.description.clone(),
        });
    }

    Ok(groups)
}
