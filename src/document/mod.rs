pub mod snapshot;
pub mod store;

pub use snapshot::DocumentSnapshot;
pub use store::{Document, DocumentStore};

use lsp_types::Uri;
use std::path::PathBuf;

/// Resolve a `file:` URI to a local path
pub fn uri_to_file_path(uri: &Uri) -> Option<PathBuf> {
    url::Url::parse(uri.as_str()).ok()?.to_file_path().ok()
}
