pub mod config;
pub mod core;
pub mod document;
pub mod locator;
pub mod lsp;
pub mod parser;
pub mod quickfix;
pub mod stub;
