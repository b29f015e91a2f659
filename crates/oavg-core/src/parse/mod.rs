//! Serde model of the input document.
//!
//! Only the parts that shape generated code are modeled; unknown keys are
//! dropped on deserialization.

pub mod components;
pub mod media_type;
pub mod operation;
pub mod parameter;
pub mod ref_resolve;
pub mod request_body;
pub mod response;
pub mod schema;
pub mod spec;

use crate::error::ParseError;
use spec::OpenApiSpec;

pub fn from_yaml(input: &str) -> Result<OpenApiSpec, ParseError> {
    supported(serde_yaml_ng::from_str(input)?)
}

pub fn from_json(input: &str) -> Result<OpenApiSpec, ParseError> {
    supported(serde_json::from_str(input)?)
}

/// Swagger 2.0 and anything newer than 3.x are rejected.
fn supported(spec: OpenApiSpec) -> Result<OpenApiSpec, ParseError> {
    match spec.openapi.split_once('.') {
        Some(("3", _)) => Ok(spec),
        _ => Err(ParseError::UnsupportedVersion(spec.openapi)),
    }
}
