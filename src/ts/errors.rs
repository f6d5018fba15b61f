use crate::position::Span;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TreeSitterError {
    #[error("failed to set language for parser")]
    LanguageSet,

    #[error("grammar rejected source outright")]
    ParseFailed,

    #[error("invalid tree-sitter query: {message}")]
    InvalidQuery { message: String },

    #[error("query matched {count} locations, expected exactly 1")]
    AmbiguousMatch { count: usize },

    #[error("query matched 0 locations")]
    NoMatch,

    #[error("node text at {span} is not addressable in a buffer of {len} bytes")]
    TextOutOfBounds { span: Span, len: usize },

    #[error("capture '{name}' not found in query match")]
    CaptureNotFound { name: String },
}
