use thiserror::Error;

/// A value rejected by a schema; `path` is a JSONPath-like pointer (`$.items[0].name`).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{path}: {message}")]
pub struct ValidationError {
    pub path: String,
    pub message: String,
}

impl ValidationError {
    pub(crate) fn new(path: &str, message: impl Into<String>) -> Self {
        Self {
            path: path.to_string(),
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("request to {url} failed: {message}")]
    Request { url: String, message: String },

    #[error("missing path parameter `{0}`")]
    MissingPathParam(String),

    #[error("invalid request url `{url}`: {message}")]
    InvalidUrl { url: String, message: String },
}
