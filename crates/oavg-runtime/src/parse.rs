//! The single parse routine shared by both validation modes.
//!
//! Classification order is fixed: a missing schema wins over a decoding or
//! deserializer failure, which wins over a schema rejection.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use log::debug;
use serde_json::Value;

use oavg_core::analysis::{OperationMetadata, StatusKey, is_json_like, media_type_essence};
use oavg_core::ir::IrType;
use oavg_core::resolve::SchemaReference;
use oavg_core::union::Flavor;

use crate::response::ErrorKind;
use crate::validate::SchemaSet;

/// Response body exactly as the transport delivered it.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum RawBody {
    #[default]
    Empty,
    Text(String),
    Bytes(Vec<u8>),
}

impl RawBody {
    fn text(&self) -> String {
        match self {
            RawBody::Empty => String::new(),
            RawBody::Text(text) => text.clone(),
            RawBody::Bytes(bytes) => String::from_utf8_lossy(bytes).into_owned(),
        }
    }

    fn decode_json(&self) -> Result<Value, serde_json::Error> {
        match self {
            RawBody::Empty => serde_json::from_str(""),
            RawBody::Text(text) => serde_json::from_str(text),
            RawBody::Bytes(bytes) => serde_json::from_slice(bytes),
        }
    }
}

impl From<String> for RawBody {
    fn from(text: String) -> Self {
        RawBody::Text(text)
    }
}

impl From<&str> for RawBody {
    fn from(text: &str) -> Self {
        RawBody::Text(text.to_string())
    }
}

impl From<Vec<u8>> for RawBody {
    fn from(bytes: Vec<u8>) -> Self {
        RawBody::Bytes(bytes)
    }
}

/// A transport response: status, headers (names lower-cased) and body.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RawResponse {
    pub status: u16,
    pub headers: IndexMap<String, String>,
    pub body: RawBody,
}

impl RawResponse {
    pub fn new(status: u16) -> Self {
        Self {
            status,
            ..Self::default()
        }
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.to_string());
        self
    }

    pub fn with_body(mut self, body: impl Into<RawBody>) -> Self {
        self.body = body.into();
        self
    }

    /// JSON body with a matching `content-type` header.
    pub fn json(status: u16, body: &Value) -> Self {
        Self::new(status)
            .with_header("content-type", "application/json")
            .with_body(body.to_string())
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn content_type(&self) -> Option<&str> {
        self.header("content-type")
    }

    /// Body before any deserializer ran: decoded JSON when the header says
    /// JSON and the body decodes, text otherwise, `null` when empty.
    pub fn data(&self) -> Value {
        if self.body == RawBody::Empty {
            return Value::Null;
        }
        if self.content_type().is_some_and(is_json_like) {
            if let Ok(value) = self.body.decode_json() {
                return value;
            }
        }
        Value::String(self.body.text())
    }
}

pub type DeserializerFn = dyn Fn(Value, Option<&str>) -> Result<Value, String> + Send + Sync;

/// Content type → transform applied before validation. Absent entries mean
/// the decoded body is validated as is.
#[derive(Clone, Default)]
pub struct Deserializers {
    entries: IndexMap<String, Arc<DeserializerFn>>,
}

impl Deserializers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with<F>(mut self, content_type: &str, f: F) -> Self
    where
        F: Fn(Value, Option<&str>) -> Result<Value, String> + Send + Sync + 'static,
    {
        self.entries.insert(media_type_essence(content_type), Arc::new(f));
        self
    }

    pub fn get(&self, content_type: &str) -> Option<&DeserializerFn> {
        self.entries
            .get(&media_type_essence(content_type))
            .map(|f| f.as_ref())
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Debug for Deserializers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.entries.keys()).finish()
    }
}

/// One declared content type of a status.
#[derive(Debug, Clone, PartialEq)]
pub struct ContentRoute {
    pub content_type: String,
    pub schema: Option<IrType>,
}

/// The declared content types of one status, in declaration order.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusRoute {
    pub status: StatusKey,
    pub content_types: Vec<ContentRoute>,
}

impl StatusRoute {
    /// No declared content type carries a schema.
    pub fn is_void(&self) -> bool {
        self.content_types.iter().all(|c| c.schema.is_none())
    }

    /// Declared content type for a response header: exact essence, then
    /// wildcard declarations. Without a header the first declared type wins.
    pub fn select(&self, header: Option<&str>) -> Option<&ContentRoute> {
        let Some(header) = header else {
            return self.content_types.first();
        };
        let essence = media_type_essence(header);
        self.content_types
            .iter()
            .find(|c| media_type_essence(&c.content_type) == essence)
            .or_else(|| {
                self.content_types
                    .iter()
                    .find(|c| wildcard_matches(&media_type_essence(&c.content_type), &essence))
            })
    }
}

fn wildcard_matches(declared: &str, actual: &str) -> bool {
    if declared == "*/*" {
        return true;
    }
    match declared.strip_suffix("/*") {
        Some(kind) => actual.split('/').next() == Some(kind),
        None => false,
    }
}

/// Every declared status of an operation, sorted with `default` last.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResponseTable {
    pub statuses: Vec<StatusRoute>,
}

impl ResponseTable {
    pub fn from_operation(op: &OperationMetadata) -> Self {
        let statuses = op
            .responses
            .responses
            .iter()
            .map(|info| StatusRoute {
                status: info.status,
                content_types: info
                    .content_types
                    .iter()
                    .map(|m| ContentRoute {
                        content_type: m.content_type.clone(),
                        schema: m.schema.as_ref().map(|s| match s {
                            SchemaReference::Named { identifier, .. } => {
                                IrType::Ref(identifier.clone())
                            }
                            SchemaReference::Inline { schema, .. } => schema.clone(),
                        }),
                    })
                    .collect(),
            })
            .collect();
        Self { statuses }
    }

    /// Route for a received status: exact code, then status class, then `default`.
    pub fn route(&self, status: u16) -> Option<&StatusRoute> {
        let precedence = |key: StatusKey| match key {
            StatusKey::Code(_) => 0,
            StatusKey::Range(_) => 1,
            StatusKey::Default => 2,
        };
        self.statuses
            .iter()
            .filter(|r| r.status.matches(status))
            .min_by_key(|r| precedence(r.status))
    }
}

/// What a parse routine needs besides the response itself.
#[derive(Debug, Clone)]
pub struct ParseContext {
    pub schemas: Arc<SchemaSet>,
    pub deserializers: Deserializers,
    pub flavor: Flavor,
}

/// A validated payload tagged with the content type it was validated against.
#[derive(Debug, Clone, PartialEq)]
pub struct Parsed {
    pub content_type: String,
    pub data: Value,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseFailure {
    pub kind: ErrorKind,
    pub error: String,
}

impl ParseFailure {
    fn new(kind: ErrorKind, error: impl Into<String>) -> Self {
        Self {
            kind,
            error: error.into(),
        }
    }
}

/// A matched response waiting to be parsed. [`ResponseParser::parse`] is
/// pure over its inputs, so calling it again gives the same outcome.
#[derive(Debug, Clone)]
pub struct ResponseParser {
    context: ParseContext,
    route: StatusRoute,
    response: RawResponse,
}

impl ResponseParser {
    pub fn new(context: ParseContext, route: StatusRoute, response: RawResponse) -> Self {
        Self {
            context,
            route,
            response,
        }
    }

    pub fn status(&self) -> StatusKey {
        self.route.status
    }

    pub fn parse(&self) -> Result<Parsed, ParseFailure> {
        let header = self.response.content_type();

        if self.route.is_void() {
            let content_type = header
                .map(str::to_string)
                .or_else(|| self.route.content_types.first().map(|c| c.content_type.clone()))
                .unwrap_or_default();
            return Ok(Parsed {
                content_type,
                data: self.response.data(),
            });
        }

        let selected = self
            .route
            .select(header)
            .and_then(|c| c.schema.as_ref().map(|schema| (c, schema)));
        let Some((content, schema)) = selected else {
            return Err(ParseFailure::new(
                ErrorKind::MissingSchema,
                format!(
                    "no schema registered for content type `{}` on status {}",
                    header.unwrap_or("<none>"),
                    self.route.status
                ),
            ));
        };

        let decoded = if is_json_like(&content.content_type) {
            self.response
                .body
                .decode_json()
                .map_err(|e| ParseFailure::new(ErrorKind::DeserializationError, e.to_string()))?
        } else {
            Value::String(self.response.body.text())
        };

        let deserializer = self
            .context
            .deserializers
            .get(&content.content_type)
            .or_else(|| header.and_then(|h| self.context.deserializers.get(h)));
        let transformed = match deserializer {
            Some(f) => f(decoded, header)
                .map_err(|e| ParseFailure::new(ErrorKind::DeserializationError, e))?,
            None => decoded,
        };

        self.context
            .schemas
            .validate(schema, &transformed, self.context.flavor)
            .map_err(|e| ParseFailure::new(ErrorKind::ParseError, e.to_string()))?;

        debug!(
            "parsed {} response as `{}`",
            self.route.status, content.content_type
        );
        Ok(Parsed {
            content_type: content.content_type.clone(),
            data: transformed,
        })
    }
}
