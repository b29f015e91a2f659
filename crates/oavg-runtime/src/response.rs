use std::fmt;

use log::debug;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use oavg_core::analysis::StatusKey;

use crate::parse::{ParseContext, ParseFailure, Parsed, RawResponse, ResponseParser, ResponseTable};

mod sealed {
    pub trait Sealed {}
    impl Sealed for super::Manual {}
    impl Sealed for super::Forced {}
}

/// When validation runs. The mode is a type parameter, so a success value
/// exposes either [`SuccessResponse::parse`] or [`SuccessResponse::parsed`].
pub trait ValidationMode: sealed::Sealed + Copy + Default + Send + Sync + 'static {
    /// What a success response carries for its payload.
    type Payload: fmt::Debug + Clone + Send + Sync;

    const FORCED: bool;

    fn construct(parser: ResponseParser) -> Result<Self::Payload, ParseFailure>;
}

/// Validation deferred until the caller asks for it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Manual;

/// Validation performed while the response is built.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Forced;

impl ValidationMode for Manual {
    type Payload = ResponseParser;
    const FORCED: bool = false;

    fn construct(parser: ResponseParser) -> Result<Self::Payload, ParseFailure> {
        Ok(parser)
    }
}

impl ValidationMode for Forced {
    type Payload = Parsed;
    const FORCED: bool = true;

    fn construct(parser: ResponseParser) -> Result<Self::Payload, ParseFailure> {
        parser.parse()
    }
}

/// Every way a call can fail after dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorKind {
    /// The transport failed and there is no response.
    UnexpectedError,
    /// The status was never declared.
    UnexpectedResponse,
    /// The schema rejected the value.
    ParseError,
    /// Decoding or a configured deserializer failed before validation.
    DeserializationError,
    /// No schema is registered for the content type that arrived.
    MissingSchema,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::UnexpectedError => "unexpected-error",
            ErrorKind::UnexpectedResponse => "unexpected-response",
            ErrorKind::ParseError => "parse-error",
            ErrorKind::DeserializationError => "deserialization-error",
            ErrorKind::MissingSchema => "missing-schema",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A declared status that arrived.
#[derive(Debug, Clone)]
pub struct SuccessResponse<M: ValidationMode> {
    pub status: StatusKey,
    /// Body before validation or deserializers.
    pub data: Value,
    pub response: RawResponse,
    payload: M::Payload,
}

impl<M: ValidationMode> SuccessResponse<M> {
    pub fn is_valid(&self) -> bool {
        true
    }
}

impl SuccessResponse<Manual> {
    /// Run the parse routine. Never panics; repeat calls give the same result.
    pub fn parse(&self) -> Result<Parsed, ParseFailure> {
        self.payload.parse()
    }
}

impl SuccessResponse<Forced> {
    pub fn parsed(&self) -> &Parsed {
        &self.payload
    }

    pub fn into_parsed(self) -> Parsed {
        self.payload
    }
}

/// The shared failure shape. `status`, `data` and `response` are present
/// whenever a response arrived.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{kind}: {error}")]
pub struct ErrorResponse {
    pub kind: ErrorKind,
    pub error: String,
    pub status: Option<u16>,
    pub data: Option<Value>,
    pub response: Option<RawResponse>,
}

impl ErrorResponse {
    pub fn unexpected_error(error: impl fmt::Display) -> Self {
        Self {
            kind: ErrorKind::UnexpectedError,
            error: error.to_string(),
            status: None,
            data: None,
            response: None,
        }
    }

    pub fn unexpected_response(response: RawResponse) -> Self {
        Self {
            kind: ErrorKind::UnexpectedResponse,
            error: format!("undeclared status {}", response.status),
            status: Some(response.status),
            data: Some(response.data()),
            response: Some(response),
        }
    }

    pub fn from_failure(failure: ParseFailure, response: RawResponse) -> Self {
        Self {
            kind: failure.kind,
            error: failure.error,
            status: Some(response.status),
            data: Some(response.data()),
            response: Some(response),
        }
    }

    pub fn is_valid(&self) -> bool {
        false
    }
}

pub type ApiResponse<M> = Result<SuccessResponse<M>, ErrorResponse>;

/// Classify a transport response against an operation's declared statuses.
pub fn build_response<M: ValidationMode>(
    table: &ResponseTable,
    context: &ParseContext,
    response: RawResponse,
) -> ApiResponse<M> {
    let Some(route) = table.route(response.status) else {
        debug!("status {} is not declared", response.status);
        return Err(ErrorResponse::unexpected_response(response));
    };

    let status = route.status;
    let parser = ResponseParser::new(context.clone(), route.clone(), response.clone());
    match M::construct(parser) {
        Ok(payload) => Ok(SuccessResponse {
            status,
            data: response.data(),
            response,
            payload,
        }),
        Err(failure) => Err(ErrorResponse::from_failure(failure, response)),
    }
}
