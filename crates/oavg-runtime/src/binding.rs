//! Binding operations to a shared client configuration.

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use indexmap::IndexMap;
use log::debug;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use serde_json::Value;
use url::Url;

use oavg_core::analysis::OperationMetadata;
use oavg_core::ir::{HttpMethod, IrSpec};
use oavg_core::union::Flavor;

use crate::error::TransportError;
use crate::parse::{Deserializers, ParseContext, RawResponse, ResponseTable};
use crate::response::{ApiResponse, ErrorResponse, Forced, Manual, ValidationMode, build_response};
use crate::validate::SchemaSet;

/// A fully rendered request.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    pub method: HttpMethod,
    pub url: String,
    pub headers: IndexMap<String, String>,
    pub body: Option<RequestBody>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RequestBody {
    pub content_type: String,
    pub payload: Value,
}

/// Sends requests. Implementations own all network I/O.
pub trait Transport: Send + Sync {
    fn send(&self, request: Request) -> Result<RawResponse, TransportError>;
}

/// Arguments of a single call.
#[derive(Debug, Clone, Default)]
pub struct CallInput {
    pub path: IndexMap<String, String>,
    pub query: IndexMap<String, String>,
    pub headers: IndexMap<String, String>,
    pub body: Option<RequestBody>,
}

impl CallInput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn path_param(mut self, name: &str, value: impl ToString) -> Self {
        self.path.insert(name.to_string(), value.to_string());
        self
    }

    pub fn query_param(mut self, name: &str, value: impl ToString) -> Self {
        self.query.insert(name.to_string(), value.to_string());
        self
    }

    pub fn header(mut self, name: &str, value: impl ToString) -> Self {
        self.headers.insert(name.to_string(), value.to_string());
        self
    }

    pub fn body(mut self, content_type: &str, payload: Value) -> Self {
        self.body = Some(RequestBody {
            content_type: content_type.to_string(),
            payload,
        });
        self
    }
}

/// Client settings shared by every bound operation.
pub struct ClientConfig<M: ValidationMode = Manual> {
    pub base_url: String,
    pub transport: Arc<dyn Transport>,
    pub schemas: Arc<SchemaSet>,
    pub headers: IndexMap<String, String>,
    pub deserializers: Deserializers,
    mode: PhantomData<M>,
}

impl ClientConfig<Manual> {
    pub fn new(base_url: &str, transport: Arc<dyn Transport>, schemas: Arc<SchemaSet>) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            transport,
            schemas,
            headers: IndexMap::new(),
            deserializers: Deserializers::new(),
            mode: PhantomData,
        }
    }
}

impl<M: ValidationMode> ClientConfig<M> {
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.insert(name.to_string(), value.to_string());
        self
    }

    pub fn with_deserializers(mut self, deserializers: Deserializers) -> Self {
        self.deserializers = deserializers;
        self
    }

    /// Same settings under another validation mode.
    pub fn with_mode<N: ValidationMode>(self) -> ClientConfig<N> {
        ClientConfig {
            base_url: self.base_url,
            transport: self.transport,
            schemas: self.schemas,
            headers: self.headers,
            deserializers: self.deserializers,
            mode: PhantomData,
        }
    }

    pub fn forced(self) -> ClientConfig<Forced> {
        self.with_mode()
    }

    pub fn manual(self) -> ClientConfig<Manual> {
        self.with_mode()
    }

    fn parse_context(&self, flavor: Flavor) -> ParseContext {
        ParseContext {
            schemas: Arc::clone(&self.schemas),
            deserializers: self.deserializers.clone(),
            flavor,
        }
    }
}

impl<M: ValidationMode> Clone for ClientConfig<M> {
    fn clone(&self) -> Self {
        Self {
            base_url: self.base_url.clone(),
            transport: Arc::clone(&self.transport),
            schemas: Arc::clone(&self.schemas),
            headers: self.headers.clone(),
            deserializers: self.deserializers.clone(),
            mode: PhantomData,
        }
    }
}

impl<M: ValidationMode> fmt::Debug for ClientConfig<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("base_url", &self.base_url)
            .field("headers", &self.headers)
            .field("deserializers", &self.deserializers)
            .field("forced", &M::FORCED)
            .finish_non_exhaustive()
    }
}

/// A callable operation: route plus declared responses.
#[derive(Debug, Clone, PartialEq)]
pub struct Operation {
    pub id: String,
    pub method: HttpMethod,
    pub path: String,
    pub responses: ResponseTable,
    pub flavor: Flavor,
}

impl Operation {
    pub fn from_metadata(op: &OperationMetadata) -> Self {
        Self {
            id: op.operation_id.clone(),
            method: op.method,
            path: op.path.clone(),
            responses: ResponseTable::from_operation(op),
            flavor: Flavor::Loose,
        }
    }

    pub fn call<M: ValidationMode>(&self, input: &CallInput, config: &ClientConfig<M>) -> ApiResponse<M> {
        let url = self
            .url(&config.base_url, input)
            .map_err(ErrorResponse::unexpected_error)?;

        let mut headers = config.headers.clone();
        headers.extend(input.headers.iter().map(|(k, v)| (k.clone(), v.clone())));
        if let Some(body) = &input.body {
            headers.insert("content-type".to_string(), body.content_type.clone());
        }

        debug!("{} {} ({})", self.method.as_str(), url, self.id);
        let request = Request {
            method: self.method,
            url,
            headers,
            body: input.body.clone(),
        };
        let response = config
            .transport
            .send(request)
            .map_err(ErrorResponse::unexpected_error)?;
        build_response::<M>(&self.responses, &config.parse_context(self.flavor), response)
    }

    fn url(&self, base_url: &str, input: &CallInput) -> Result<String, TransportError> {
        let path = render_path(&self.path, &input.path)?;
        let raw = format!("{base_url}{path}");
        let mut url = Url::parse(&raw).map_err(|e| TransportError::InvalidUrl {
            url: raw.clone(),
            message: e.to_string(),
        })?;
        if !input.query.is_empty() {
            url.query_pairs_mut()
                .extend_pairs(input.query.iter().map(|(k, v)| (k.as_str(), v.as_str())));
        }
        Ok(url.into())
    }
}

/// RFC 3986 unreserved characters stay as they are; everything else in a
/// path parameter is escaped, `/` included.
const PATH_PARAM: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Substitute `{name}` placeholders. An unclosed `{` is kept literally.
fn render_path(template: &str, params: &IndexMap<String, String>) -> Result<String, TransportError> {
    let mut path = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        let Some(close) = rest[open..].find('}').map(|i| open + i) else {
            break;
        };
        path.push_str(&rest[..open]);
        let name = &rest[open + 1..close];
        let value = params
            .get(name)
            .ok_or_else(|| TransportError::MissingPathParam(name.to_string()))?;
        path.extend(utf8_percent_encode(value, PATH_PARAM));
        rest = &rest[close + 1..];
    }
    path.push_str(rest);
    Ok(path)
}

/// A module export: operations are callable, everything else (status lists,
/// schema constants) is data.
#[derive(Debug, Clone, PartialEq)]
pub enum Export {
    Operation(Operation),
    Value(Value),
}

/// The exports an operations module provides for `ir`, keyed by export name.
pub fn exports_from_ir(ir: &IrSpec) -> IndexMap<String, Export> {
    let mut exports = IndexMap::new();
    for op in &ir.operations {
        exports.insert(op.names.camel.clone(), Export::Operation(Operation::from_metadata(op)));
        let statuses = op.responses.statuses().map(|s| Value::String(s.to_string())).collect();
        exports.insert(op.names.statuses(), Export::Value(Value::Array(statuses)));
    }
    exports
}

/// Operations with a bound configuration.
#[derive(Debug, Clone)]
pub struct BoundOperations<M: ValidationMode = Manual> {
    config: ClientConfig<M>,
    operations: IndexMap<String, Operation>,
}

/// One bound operation.
#[derive(Debug, Clone, Copy)]
pub struct BoundOperation<'a, M: ValidationMode> {
    operation: &'a Operation,
    config: &'a ClientConfig<M>,
}

impl<M: ValidationMode> BoundOperation<'_, M> {
    pub fn call(&self, input: &CallInput) -> ApiResponse<M> {
        self.operation.call(input, self.config)
    }

    /// Call with `config` in place of the bound configuration. Nothing is merged.
    pub fn call_with(&self, input: &CallInput, config: &ClientConfig<M>) -> ApiResponse<M> {
        self.operation.call(input, config)
    }

    pub fn operation(&self) -> &Operation {
        self.operation
    }
}

impl<M: ValidationMode> BoundOperations<M> {
    pub fn get(&self, name: &str) -> Option<BoundOperation<'_, M>> {
        self.operations.get(name).map(|operation| BoundOperation {
            operation,
            config: &self.config,
        })
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.operations.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    pub fn config(&self) -> &ClientConfig<M> {
        &self.config
    }
}

/// Bind every operation in `exports` to `config`; data exports are dropped.
pub fn bind<M: ValidationMode>(
    exports: impl IntoIterator<Item = (String, Export)>,
    config: ClientConfig<M>,
) -> BoundOperations<M> {
    let operations = exports
        .into_iter()
        .filter_map(|(name, export)| match export {
            Export::Operation(op) => Some((name, op)),
            Export::Value(_) => None,
        })
        .collect();
    BoundOperations { config, operations }
}

/// The flag that decides the validation mode at bind time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RuntimeConfig {
    pub force_validation: bool,
}

/// Bound operations in whichever mode [`RuntimeConfig`] selected.
#[derive(Debug, Clone)]
pub enum BoundApi {
    Manual(BoundOperations<Manual>),
    Forced(BoundOperations<Forced>),
}

impl BoundApi {
    pub fn bind(
        exports: impl IntoIterator<Item = (String, Export)>,
        config: ClientConfig,
        runtime: RuntimeConfig,
    ) -> Self {
        if runtime.force_validation {
            BoundApi::Forced(bind(exports, config.forced()))
        } else {
            BoundApi::Manual(bind(exports, config))
        }
    }

    pub fn is_forced(&self) -> bool {
        matches!(self, BoundApi::Forced(_))
    }

    pub fn names(&self) -> Vec<&str> {
        match self {
            BoundApi::Manual(ops) => ops.names().collect(),
            BoundApi::Forced(ops) => ops.names().collect(),
        }
    }
}
