use log::warn;

use crate::error::TransformError;
use crate::parse::operation::Operation;
use crate::parse::request_body::{RequestBody, RequestBodyOrRef};
use crate::parse::response::ResponseOrRef;
use crate::resolve::{OperationContext, SchemaReference, resolve_type_name};
use crate::transform::name_normalizer::normalize_name;

use super::status::StatusKey;

/// One declared content type and the schema attached to it, if any.
#[derive(Debug, Clone, PartialEq)]
pub struct ContentTypeMapping {
    pub content_type: String,
    pub schema: Option<SchemaReference>,
}

impl ContentTypeMapping {
    pub fn has_schema(&self) -> bool {
        self.schema.is_some()
    }

    pub fn is_json_like(&self) -> bool {
        is_json_like(&self.content_type)
    }
}

/// Content types a request body accepts, in declaration order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestContentTypes {
    pub is_required: bool,
    pub content_types: Vec<ContentTypeMapping>,
}

impl RequestContentTypes {
    /// The first declared content type.
    pub fn default_content_type(&self) -> Option<&str> {
        self.content_types.first().map(|m| m.content_type.as_str())
    }
}

/// Content types one response status offers, in declaration order.
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseContentTypes {
    pub status: StatusKey,
    pub description: Option<String>,
    pub content_types: Vec<ContentTypeMapping>,
}

/// Media type without parameters, lower-cased: `Application/JSON; charset=utf-8` → `application/json`.
pub fn media_type_essence(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

/// `*/json` and `*/*+json` media types.
pub fn is_json_like(content_type: &str) -> bool {
    let essence = media_type_essence(content_type);
    match essence.split_once('/') {
        Some((_, subtype)) => subtype == "json" || subtype.ends_with("+json"),
        None => false,
    }
}

/// Suffix for the n-th content type of a body: the first one gets none.
fn content_type_suffix(index: usize, content_type: &str) -> String {
    if index == 0 {
        String::new()
    } else {
        normalize_name(content_type).pascal_case
    }
}

pub fn extract_request_content_types(
    body: Option<&RequestBodyOrRef>,
    ctx: &mut OperationContext<'_>,
) -> Result<RequestContentTypes, TransformError> {
    let Some(body) = body else {
        return Ok(RequestContentTypes::default());
    };
    let RequestBodyOrRef::RequestBody(RequestBody {
        content, required, ..
    }) = body
    else {
        warn!(
            "operation `{}` still has an unresolved request body reference; ignoring it",
            ctx.operation_id()
        );
        return Ok(RequestContentTypes::default());
    };

    let mut content_types = Vec::with_capacity(content.len());
    for (index, (content_type, media)) in content.iter().enumerate() {
        let schema = match &media.schema {
            Some(schema) => {
                let suffix = format!("Body{}", content_type_suffix(index, content_type));
                Some(resolve_type_name(schema, ctx, &suffix)?)
            }
            None => None,
        };
        content_types.push(ContentTypeMapping {
            content_type: content_type.clone(),
            schema,
        });
    }

    Ok(RequestContentTypes {
        is_required: *required,
        content_types,
    })
}

/// Response content types per status, in declaration order. `default` is
/// included; unknown status keys are fatal.
pub fn extract_response_content_types(
    operation: &Operation,
    ctx: &mut OperationContext<'_>,
) -> Result<Vec<ResponseContentTypes>, TransformError> {
    let mut out = Vec::with_capacity(operation.responses.len());
    for (raw_status, response) in &operation.responses {
        let status: StatusKey =
            raw_status
                .parse()
                .map_err(|status| TransformError::InvalidStatusCode {
                    operation: ctx.operation_id().to_string(),
                    status,
                })?;
        let ResponseOrRef::Response(response) = response else {
            warn!(
                "operation `{}` status {status} is an unresolved reference; ignoring it",
                ctx.operation_id()
            );
            continue;
        };

        let mut content_types = Vec::with_capacity(response.content.len());
        for (index, (content_type, media)) in response.content.iter().enumerate() {
            let schema = match &media.schema {
                Some(schema) => {
                    let suffix = format!(
                        "Response{}{}",
                        status.label(),
                        content_type_suffix(index, content_type)
                    );
                    Some(resolve_type_name(schema, ctx, &suffix)?)
                }
                None => None,
            };
            content_types.push(ContentTypeMapping {
                content_type: content_type.clone(),
                schema,
            });
        }

        out.push(ResponseContentTypes {
            status,
            description: Some(response.description.clone()).filter(|d| !d.is_empty()),
            content_types,
        });
    }
    Ok(out)
}
