use std::collections::BTreeSet;

use log::debug;
use minijinja::{Environment, context};
use oavg_core::GeneratedFile;
use oavg_core::analysis::{ContentTypeMapping, OperationMetadata, StatusKey};
use oavg_core::ir::{IrParameter, IrSpec, IrType};
use oavg_core::resolve::{SchemaReference, strict_name};
use oavg_core::union::{Flavor, ResponseMap, UnionMember, build_response_map};

use super::{block_literal, doc_lines, import_entries, object_literal};
use crate::error::EmitError;
use crate::type_mapper::{TypeMapper, quote};

/// Emit `operations/<operationId>.ts`: parameter schemas, inline schemas,
/// request body and response constants, the response union in both flavors
/// and the operation itself.
pub fn emit_operation(
    env: &Environment<'_>,
    ir: &IrSpec,
    op: &OperationMetadata,
    jsdoc: bool,
) -> Result<GeneratedFile, EmitError> {
    let names = &op.names;
    let mut mapper = TypeMapper::new(ir, None);

    let mut params = Vec::new();
    let mut params_type = Vec::new();
    for (group, name, key) in [
        (&op.parameters.path, names.path_params(), "path"),
        (&op.parameters.query, names.query_params(), "query"),
        (&op.parameters.header, names.header_params(), "headers"),
    ] {
        if group.is_empty() {
            continue;
        }
        let optional = if group.iter().any(|p| p.required) { "" } else { "?" };
        params_type.push(format!("{key}{optional}: {name}"));
        params.push(context! {
            name => name,
            schema => mapper.zod(&parameter_object(group), Flavor::Loose),
        });
    }

    let inline_schemas: Vec<minijinja::Value> = op
        .inline_schemas
        .iter()
        .map(|s| {
            context! {
                name => s.identifier.clone(),
                strict_name => strict_name(&s.identifier),
                loose => mapper.zod(&s.schema, Flavor::Loose),
                strict => mapper.zod(&s.schema, Flavor::Strict),
            }
        })
        .collect();

    let body = match &op.body.map_type_name {
        Some(map_type) if !op.body.content_types().is_empty() => {
            let mut schemas = Vec::new();
            let mut types = Vec::new();
            for mapping in op.body.content_types() {
                let key = quote(&mapping.content_type);
                schemas.push((key.clone(), schema_value(&mut mapper, mapping, Flavor::Loose)));
                types.push((key, schema_type(&mut mapper, mapping, Flavor::Loose)));
            }
            let optional = if op.body.is_required() { "" } else { "?" };
            params_type.push(format!("body{optional}: {map_type}[keyof {map_type}]"));
            params_type.push(format!("contentType?: keyof {map_type}"));
            Some(context! {
                constant => names.request_bodies(),
                map_type => map_type,
                schemas => block_literal(&schemas),
                types => block_literal(&types),
            })
        }
        _ => None,
    };

    let mut loose = Vec::new();
    let mut strict = Vec::new();
    let mut parsing = Vec::new();
    for info in &op.responses.responses {
        let status = quote(&info.status.to_string());
        let mut loose_entries = Vec::new();
        let mut strict_entries = Vec::new();
        for mapping in &info.content_types {
            let key = quote(&mapping.content_type);
            loose_entries.push((key.clone(), schema_value(&mut mapper, mapping, Flavor::Loose)));
            strict_entries.push((key, schema_value(&mut mapper, mapping, Flavor::Strict)));
        }
        loose.push((status.clone(), object_literal(&loose_entries)));
        strict.push((status.clone(), object_literal(&strict_entries)));
        parsing.push((
            status,
            quote(info.parsing_strategy.body_strategy().as_str()),
        ));
    }
    let statuses: Vec<String> = op
        .responses
        .statuses()
        .map(|s| quote(&s.to_string()))
        .collect();

    let loose_model = build_response_map(op, Flavor::Loose);
    let strict_model = build_response_map(op, Flavor::Strict);
    debug!("{}: {}", op.operation_id, loose_model.union);

    let mut support_imports = BTreeSet::from(["ApiError", "defineOperation"]);
    let mut union_members = |members: &[UnionMember]| -> Vec<String> {
        members
            .iter()
            .map(|member| {
                match member {
                    UnionMember::Success { .. } => support_imports.insert("SuccessMember"),
                    UnionMember::Void { .. } => support_imports.insert("VoidSuccess"),
                    UnionMember::Error => false,
                };
                union_member(member)
            })
            .collect()
    };
    let union = union_members(&loose_model.union.members);
    let union_strict = union_members(&strict_model.union.members);

    let params_type = if params_type.is_empty() {
        "Record<never, never>".to_string()
    } else {
        format!("{{ {} }}", params_type.join("; "))
    };

    let doc = if jsdoc {
        doc_lines(op.summary.as_deref(), op.description.as_deref(), op.deprecated)
    } else {
        Vec::new()
    };

    let tmpl = env.get_template("operation.ts.j2")?;
    let content = tmpl.render(context! {
        support_imports => support_imports.into_iter().collect::<Vec<_>>(),
        imports => import_entries(mapper.uses(), "../schemas/"),
        params => params,
        inline_schemas => inline_schemas,
        body => body,
        names => context! {
            camel => names.camel.clone(),
            responses => names.responses(),
            responses_strict => names.responses_strict(),
            statuses => names.statuses(),
            parsing => names.parsing(),
            response_map => names.response_map(),
            response_map_strict => names.response_map_strict(),
            response_type => names.response_type(),
            response_type_strict => names.response_type_strict(),
        },
        responses => context! {
            loose => block_literal(&loose),
            strict => block_literal(&strict),
            statuses => format!("[{}]", statuses.join(", ")),
            parsing => object_literal(&parsing),
            map_loose => map_type(&loose_model.response_map),
            map_strict => map_type(&strict_model.response_map),
        },
        union => union,
        union_strict => union_strict,
        doc => doc,
        params_type => params_type,
        method => op.method.as_str(),
        path => quote(&op.path),
        default_content_type => op.body.default_content_type.as_deref().map(quote),
    })?;

    Ok(GeneratedFile {
        path: format!("operations/{}.ts", names.camel),
        content,
    })
}

fn parameter_object(group: &[IrParameter]) -> IrType {
    IrType::Object(
        group
            .iter()
            .map(|p| (p.original_name.clone(), p.param_type.clone(), p.required))
            .collect(),
    )
}

/// Schema constant for a content type, or `null` when it declares none.
fn schema_value(mapper: &mut TypeMapper<'_>, mapping: &ContentTypeMapping, flavor: Flavor) -> String {
    match &mapping.schema {
        Some(SchemaReference::Named { identifier, .. }) => mapper.reference(identifier, flavor),
        Some(inline @ SchemaReference::Inline { .. }) => inline.identifier(flavor),
        None => "null".to_string(),
    }
}

fn schema_type(mapper: &mut TypeMapper<'_>, mapping: &ContentTypeMapping, flavor: Flavor) -> String {
    match &mapping.schema {
        Some(_) => schema_value(mapper, mapping, flavor),
        None => "unknown".to_string(),
    }
}

fn map_type(map: &ResponseMap) -> String {
    if map.is_empty() {
        return "Record<string, never>".to_string();
    }
    let entries: Vec<(String, String)> = map
        .entries
        .iter()
        .map(|entry| {
            let content_types: Vec<(String, String)> = entry
                .content_types
                .iter()
                .map(|(ct, id)| (quote(ct), id.clone()))
                .collect();
            (quote(&entry.status.to_string()), object_literal(&content_types))
        })
        .collect();
    block_literal(&entries)
}

fn union_member(member: &UnionMember) -> String {
    match member {
        UnionMember::Success {
            status,
            content_type,
            type_name,
        } => format!(
            "SuccessMember<F, {}, {}, {type_name}>",
            status_literal(*status),
            quote(content_type)
        ),
        UnionMember::Void { status } => format!("VoidSuccess<F, {}>", status_literal(*status)),
        UnionMember::Error => "ApiError".to_string(),
    }
}

fn status_literal(status: StatusKey) -> String {
    quote(&status.to_string())
}
