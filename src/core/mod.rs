pub mod error;
pub mod types;

pub use error::{RefactorError, Result};
pub use types::Span;
