use lsp_types::{TextDocumentContentChangeEvent, TextDocumentItem, Uri};
use rustc_hash::FxHashMap;
use tracing::{debug, trace, warn};

use super::DocumentSnapshot;
use crate::config::constants::{is_supported_language, DOCUMENT_SCHEME};

/// An open document tracked by the server
#[derive(Debug, Clone)]
pub struct Document {
    pub uri: Uri,
    pub snapshot: DocumentSnapshot,
}

/// Open documents plus the one the user last worked in
///
/// The active document stands in for the editor's focused editor: it is the
/// target of the declare command.
#[derive(Debug, Default)]
pub struct DocumentStore {
    documents: FxHashMap<Uri, Document>,
    active: Option<Uri>,
}

impl DocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a document with this URI and language takes part at all
    pub fn accepts(uri: &Uri, language_id: &str) -> bool {
        is_supported_language(language_id)
            && uri
                .as_str()
                .strip_prefix(DOCUMENT_SCHEME)
                .is_some_and(|rest| rest.starts_with(':'))
    }

    /// Start tracking a document; returns false if it is ignored
    pub fn open(&mut self, item: TextDocumentItem) -> bool {
        if !Self::accepts(&item.uri, &item.language_id) {
            trace!(
                "Ignoring {} ({})",
                item.uri.as_str(),
                item.language_id
            );
            return false;
        }

        debug!("Opened {} v{}", item.uri.as_str(), item.version);
        let document = Document {
            uri: item.uri.clone(),
            snapshot: DocumentSnapshot::new(&item.text, item.version),
        };
        self.documents.insert(item.uri.clone(), document);
        self.active = Some(item.uri);
        true
    }

    /// Apply content changes in order
    ///
    /// A change without a range replaces the whole text.
    pub fn change(
        &mut self,
        uri: &Uri,
        version: i32,
        changes: Vec<TextDocumentContentChangeEvent>,
    ) -> bool {
        let Some(document) = self.documents.get_mut(uri) else {
            trace!("Change for untracked document {}", uri.as_str());
            return false;
        };

        let mut rope = document.snapshot.rope().clone();
        for change in changes {
            match change.range {
                None => rope = crop::Rope::from(change.text.as_str()),
                Some(range) => {
                    let current = DocumentSnapshot::from_rope(rope.clone(), version);
                    let start = current.offset_at(range.start);
                    let end = current.offset_at(range.end).max(start);
                    rope.replace(start..end, &change.text);
                }
            }
        }

        if version < document.snapshot.version() {
            warn!(
                "Out of order change for {}: v{} after v{}",
                uri.as_str(),
                version,
                document.snapshot.version()
            );
        }

        document.snapshot = DocumentSnapshot::from_rope(rope, version);
        self.active = Some(uri.clone());
        true
    }

    pub fn close(&mut self, uri: &Uri) {
        if self.documents.remove(uri).is_some() {
            debug!("Closed {}", uri.as_str());
        }
        if self.active.as_ref() == Some(uri) {
            self.active = None;
        }
    }

    pub fn get(&self, uri: &Uri) -> Option<&Document> {
        self.documents.get(uri)
    }

    /// Mark a tracked document as the one the user is working in
    pub fn focus(&mut self, uri: &Uri) {
        if self.documents.contains_key(uri) {
            self.active = Some(uri.clone());
        }
    }

    pub fn active(&self) -> Option<&Document> {
        self.active.as_ref().and_then(|uri| self.documents.get(uri))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lsp_types::{Position, Range};

    fn item(uri: &str, language_id: &str, text: &str) -> TextDocumentItem {
        TextDocumentItem {
            uri: uri.parse().unwrap(),
            language_id: language_id.to_string(),
            version: 1,
            text: text.to_string(),
        }
    }

    #[test]
    fn test_open_filters_language_and_scheme() {
        let mut store = DocumentStore::new();

        assert!(store.open(item("file:///app/App.tsx", "typescriptreact", "")));
        assert!(!store.open(item("file:///app/main.go", "go", "")));
        assert!(!store.open(item("untitled:Untitled-1", "typescriptreact", "")));

        assert!(store.get(&"file:///app/App.tsx".parse().unwrap()).is_some());
        assert!(store.get(&"file:///app/main.go".parse().unwrap()).is_none());
    }

    #[test]
    fn test_full_and_incremental_changes() {
        let mut store = DocumentStore::new();
        let uri: Uri = "file:///app/App.tsx".parse().unwrap();
        store.open(item(uri.as_str(), "typescriptreact", "const x = 1;"));

        store.change(
            &uri,
            2,
            vec![TextDocumentContentChangeEvent {
                range: None,
                range_length: None,
                text: "const x = <Widget />;".to_string(),
            }],
        );
        store.change(
            &uri,
            3,
            vec![TextDocumentContentChangeEvent {
                range: Some(Range::new(Position::new(0, 11), Position::new(0, 17))),
                range_length: None,
                text: "Panel".to_string(),
            }],
        );

        let document = store.get(&uri).unwrap();
        assert_eq!(document.snapshot.text(), "const x = <Panel />;");
        assert_eq!(document.snapshot.version(), 3);
    }

    #[test]
    fn test_active_document_tracking() {
        let mut store = DocumentStore::new();
        let first: Uri = "file:///app/A.tsx".parse().unwrap();
        let second: Uri = "file:///app/B.jsx".parse().unwrap();

        store.open(item(first.as_str(), "typescriptreact", "a"));
        store.open(item(second.as_str(), "javascriptreact", "b"));
        assert_eq!(store.active().map(|d| &d.uri), Some(&second));

        store.focus(&first);
        assert_eq!(store.active().map(|d| &d.uri), Some(&first));

        store.close(&first);
        assert!(store.active().is_none());
        assert!(store.get(&first).is_none());
        assert!(store.get(&second).is_some());
    }
}
