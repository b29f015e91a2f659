//! Per-operation analysis over a resolved document: content types, response
//! structure and parameter groups.

pub mod content_type;
pub mod operation;
pub mod response;
pub mod status;

pub use content_type::{
    ContentTypeMapping, RequestContentTypes, ResponseContentTypes, extract_request_content_types,
    extract_response_content_types, is_json_like, media_type_essence,
};
pub use operation::{BodyInfo, InlineSchema, OperationMetadata, ParameterGroups, analyze_operation};
pub use response::{
    BodyStrategy, ParsingStrategy, ResponseAnalysis, ResponseInfo, analyze_responses,
    build_response_info,
};
pub use status::StatusKey;
