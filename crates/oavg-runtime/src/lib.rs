//! Rust model of the contract that generated operation files fulfil.
//!
//! A response is classified exactly once by [`parse::ResponseParser`]; the
//! [`response::ValidationMode`] picks whether that happens when the response is
//! built ([`Forced`]) or when the caller asks for it ([`Manual`]).

pub mod binding;
pub mod error;
pub mod parse;
pub mod response;
pub mod validate;

pub use binding::{
    BoundApi, BoundOperation, BoundOperations, CallInput, ClientConfig, Export, Operation, Request,
    RequestBody, RuntimeConfig, Transport, bind, exports_from_ir,
};
pub use error::{TransportError, ValidationError};
pub use parse::{
    ContentRoute, Deserializers, ParseContext, ParseFailure, Parsed, RawBody, RawResponse,
    ResponseParser, ResponseTable, StatusRoute,
};
pub use response::{
    ApiResponse, ErrorKind, ErrorResponse, Forced, Manual, SuccessResponse, ValidationMode,
    build_response,
};
pub use validate::SchemaSet;
