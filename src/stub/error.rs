use thiserror::Error;

use crate::parser::error::ParseError;

/// Stub formatting and emission errors
#[derive(Error, Debug)]
pub enum StubError {
    #[error("Stub template does not parse: {0}")]
    Template(#[from] ParseError),

    #[error("Cannot format `{kind}` at line {line}")]
    Unsupported { kind: String, line: usize },

    #[error("Document {0} is not backed by a local file")]
    NotAFile(String),

    #[error("Failed to read {path}: {source}")]
    ReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, StubError>;
