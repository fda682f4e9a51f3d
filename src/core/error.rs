use thiserror::Error;

/// Main error type that aggregates the layer-specific errors
#[derive(Error, Debug)]
pub enum RefactorError {
    /// Parser layer errors
    #[error(transparent)]
    Parse(#[from] crate::parser::error::ParseError),

    /// LSP layer errors
    #[error(transparent)]
    Lsp(#[from] crate::lsp::error::LspError),
}

/// Result type alias for crate operations
pub type Result<T> = std::result::Result<T, RefactorError>;
