use thiserror::Error;

/// LSP-specific errors
#[derive(Error, Debug)]
pub enum LspError {
    #[error("Connection to client closed")]
    ConnectionClosed,

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Client returned error {code}: {message}")]
    ClientError { code: i32, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, LspError>;
