/// Names no schema identifier may take.
///
/// Covers everything the support module exports, the validation library
/// namespace, and TypeScript/JavaScript globals that generated files would
/// otherwise shadow.
pub const RESERVED_NAMES: &[&str] = &[
    // support module
    "ApiConfig",
    "ApiError",
    "ApiResponse",
    "ApiSuccess",
    "BoundOperations",
    "Deserializer",
    "Deserializers",
    "ErrorKind",
    "ForcedResponse",
    "ForcedSuccess",
    "ManualResponse",
    "ManualSuccess",
    "OperationDescriptor",
    "OperationFn",
    "OperationInput",
    "ParseFailure",
    "ParseResult",
    "ParseSuccess",
    "SuccessMember",
    "VoidSuccess",
    "bindOperations",
    "buildResponse",
    "defineOperation",
    "hasParsed",
    "parseBody",
    // validation library
    "z",
    // language and runtime globals
    "Array",
    "ArrayBuffer",
    "BigInt",
    "Blob",
    "Boolean",
    "Date",
    "Error",
    "File",
    "FormData",
    "Function",
    "Headers",
    "JSON",
    "Map",
    "Math",
    "Number",
    "Object",
    "Partial",
    "Pick",
    "Promise",
    "Readonly",
    "Record",
    "RegExp",
    "Request",
    "Response",
    "Set",
    "String",
    "Symbol",
    "URL",
    "any",
    "boolean",
    "never",
    "null",
    "number",
    "object",
    "string",
    "undefined",
    "unknown",
    "void",
];

pub fn is_reserved(name: &str) -> bool {
    RESERVED_NAMES.contains(&name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn support_exports_are_reserved() {
        for name in ["ApiError", "bindOperations", "hasParsed", "z", "Error"] {
            assert!(is_reserved(name), "{name} should be reserved");
        }
        assert!(!is_reserved("Pet"));
    }
}
