use super::content_type::{ContentTypeMapping, ResponseContentTypes};
use super::status::StatusKey;

/// How a response body has to be decoded and checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ParsingStrategy {
    /// The primary content type is `*/json` or `*+json`.
    pub is_json_like: bool,
    /// A schema exists for the primary content type.
    pub use_validation: bool,
    /// The status mixes JSON-like and other content types, so decoding must
    /// branch on the `Content-Type` header at runtime.
    pub requires_runtime_content_type_check: bool,
}

/// Body decoding chosen from a [`ParsingStrategy`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyStrategy {
    Json,
    Text,
    Runtime,
}

impl BodyStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            BodyStrategy::Json => "json",
            BodyStrategy::Text => "text",
            BodyStrategy::Runtime => "runtime",
        }
    }
}

impl ParsingStrategy {
    pub fn body_strategy(&self) -> BodyStrategy {
        if self.requires_runtime_content_type_check {
            BodyStrategy::Runtime
        } else if self.is_json_like {
            BodyStrategy::Json
        } else {
            BodyStrategy::Text
        }
    }
}

/// Per-status view of a response.
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseInfo {
    pub status: StatusKey,
    /// Primary (first declared) content type; `None` when the status has no content.
    pub content_type: Option<String>,
    pub has_schema: bool,
    /// Loose identifier of the primary content type's schema.
    pub type_name: Option<String>,
    pub parsing_strategy: ParsingStrategy,
    pub description: Option<String>,
    /// Every declared content type of this status, in declaration order.
    pub content_types: Vec<ContentTypeMapping>,
}

impl ResponseInfo {
    /// Content types that carry a schema, in declaration order.
    pub fn schema_content_types(&self) -> impl Iterator<Item = &ContentTypeMapping> {
        self.content_types.iter().filter(|m| m.has_schema())
    }

    /// No declared content type carries a schema.
    pub fn is_schema_less(&self) -> bool {
        self.schema_content_types().next().is_none()
    }
}

/// Derive the response info for one status.
///
/// `generates_map` is whether the operation emits a response map at all;
/// runtime content-type dispatch only matters when it does.
pub fn build_response_info(responses: &ResponseContentTypes, generates_map: bool) -> ResponseInfo {
    let primary = responses.content_types.first();
    let has_schema = primary.is_some_and(ContentTypeMapping::has_schema);
    let is_json_like = primary.is_some_and(ContentTypeMapping::is_json_like);

    let any_json = responses.content_types.iter().any(ContentTypeMapping::is_json_like);
    let any_other = responses.content_types.iter().any(|m| !m.is_json_like());

    ResponseInfo {
        status: responses.status,
        content_type: primary.map(|m| m.content_type.clone()),
        has_schema,
        type_name: primary
            .and_then(|m| m.schema.as_ref())
            .map(|s| s.base_identifier().to_string()),
        parsing_strategy: ParsingStrategy {
            is_json_like,
            use_validation: has_schema,
            requires_runtime_content_type_check: generates_map && any_json && any_other,
        },
        description: responses.description.clone(),
        content_types: responses.content_types.clone(),
    }
}

/// All responses of an operation, sorted ascending with `default` last.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResponseAnalysis {
    pub responses: Vec<ResponseInfo>,
}

impl ResponseAnalysis {
    pub fn statuses(&self) -> impl Iterator<Item = StatusKey> + '_ {
        self.responses.iter().map(|r| r.status)
    }

    pub fn get(&self, status: StatusKey) -> Option<&ResponseInfo> {
        self.responses.iter().find(|r| r.status == status)
    }

    /// Whether any status has a schema on any content type.
    pub fn has_schemas(&self) -> bool {
        self.responses.iter().any(|r| !r.is_schema_less())
    }
}

pub fn analyze_responses(extracted: &[ResponseContentTypes]) -> ResponseAnalysis {
    let generates_map = extracted
        .iter()
        .any(|r| r.content_types.iter().any(ContentTypeMapping::has_schema));
    let mut responses: Vec<ResponseInfo> = extracted
        .iter()
        .map(|r| build_response_info(r, generates_map))
        .collect();
    responses.sort_by_key(|r| r.status);
    ResponseAnalysis { responses }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolve::SchemaReference;

    fn named(id: &str) -> Option<SchemaReference> {
        Some(SchemaReference::Named {
            logical: id.to_string(),
            identifier: id.to_string(),
        })
    }

    fn mapping(ct: &str, schema: Option<SchemaReference>) -> ContentTypeMapping {
        ContentTypeMapping {
            content_type: ct.to_string(),
            schema,
        }
    }

    fn status(key: StatusKey, content_types: Vec<ContentTypeMapping>) -> ResponseContentTypes {
        ResponseContentTypes {
            status: key,
            description: None,
            content_types,
        }
    }

    #[test]
    fn json_response_with_schema() {
        let info = build_response_info(
            &status(StatusKey::Code(200), vec![mapping("application/json", named("Pet"))]),
            true,
        );
        assert!(info.has_schema);
        assert_eq!(info.type_name.as_deref(), Some("Pet"));
        assert_eq!(info.parsing_strategy.body_strategy(), BodyStrategy::Json);
        assert!(!info.parsing_strategy.requires_runtime_content_type_check);
    }

    #[test]
    fn mixed_content_types_need_runtime_dispatch() {
        let mixed = status(
            StatusKey::Code(200),
            vec![
                mapping("application/json", named("Pet")),
                mapping("text/plain", None),
            ],
        );
        let info = build_response_info(&mixed, true);
        assert!(info.parsing_strategy.requires_runtime_content_type_check);
        assert_eq!(info.parsing_strategy.body_strategy(), BodyStrategy::Runtime);

        let without_map = build_response_info(&mixed, false);
        assert!(!without_map.parsing_strategy.requires_runtime_content_type_check);
    }

    #[test]
    fn schema_less_primary_content_type() {
        let info = build_response_info(
            &status(
                StatusKey::Code(200),
                vec![mapping("text/csv", None), mapping("text/plain", named("Note"))],
            ),
            true,
        );
        assert!(!info.has_schema);
        assert!(!info.is_schema_less());
        assert_eq!(info.parsing_strategy.body_strategy(), BodyStrategy::Text);
    }

    #[test]
    fn analysis_orders_statuses() {
        let extracted = vec![
            status(StatusKey::Default, vec![]),
            status(StatusKey::Code(500), vec![]),
            status(StatusKey::Code(404), vec![]),
            status(StatusKey::Code(200), vec![mapping("application/json", named("Pet"))]),
        ];
        let analysis = analyze_responses(&extracted);
        let order: Vec<String> = analysis.statuses().map(|s| s.to_string()).collect();
        assert_eq!(order, vec!["200", "404", "500", "default"]);
        assert!(analysis.has_schemas());
    }
}
