//! Open-document bookkeeping.

use groovy_compilation::fingerprint;
use std::collections::HashMap;
use url::Url;

/// One open document: current text, monotonically increasing version, and
/// the fingerprint of the current text.
#[derive(Debug, Clone)]
pub struct Document {
    pub text: String,
    pub version: i32,
    pub fingerprint: u64,
}

impl Document {
    pub fn new(text: String, version: i32) -> Self {
        let fingerprint = fingerprint(&text);
        Self { text, version, fingerprint }
    }
}

/// URI-keyed store of open documents.
#[derive(Debug, Default)]
pub struct DocumentStore {
    documents: HashMap<Url, Document>,
}

impl DocumentStore {
    pub fn open(&mut self, uri: Url, text: String, version: i32) {
        self.documents.insert(uri, Document::new(text, version));
    }

    /// Updates text; stale versions (≤ the stored one) are ignored so late
    /// edits cannot roll a document backwards.
    pub fn edit(&mut self, uri: &Url, text: String, version: i32) -> bool {
        match self.documents.get_mut(uri) {
            Some(doc) if version > doc.version => {
                *doc = Document::new(text, version);
                true
            }
            Some(_) => false,
            None => {
                self.documents.insert(uri.clone(), Document::new(text, version));
                true
            }
        }
    }

    pub fn close(&mut self, uri: &Url) -> Option<Document> {
        self.documents.remove(uri)
    }

    pub fn get(&self, uri: &Url) -> Option<&Document> {
        self.documents.get(uri)
    }

    pub fn contains(&self, uri: &Url) -> bool {
        self.documents.contains_key(uri)
    }

    pub fn uris(&self) -> Vec<Url> {
        self.documents.keys().cloned().collect()
    }

    /// (uri, text) pairs of every open document except `excluding`.
    pub fn sources_excluding(&self, excluding: &Url) -> Vec<(Url, String)> {
        self.documents
            .iter()
            .filter(|(uri, _)| *uri != excluding)
            .map(|(uri, doc)| (uri.clone(), doc.text.clone()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use groovy_test_support::{must, must_some};
    use pretty_assertions::assert_eq;

    fn uri() -> Url {
        must(Url::parse("file:///doc.groovy"))
    }

    #[test]
    fn stale_versions_are_ignored() {
        let mut store = DocumentStore::default();
        store.open(uri(), "one".to_string(), 1);
        assert!(store.edit(&uri(), "three".to_string(), 3));
        assert!(!store.edit(&uri(), "two".to_string(), 2));
        assert_eq!(must_some(store.get(&uri())).text, "three");
    }

    #[test]
    fn fingerprint_tracks_text() {
        let mut store = DocumentStore::default();
        store.open(uri(), "a".to_string(), 1);
        let before = must_some(store.get(&uri())).fingerprint;
        store.edit(&uri(), "b".to_string(), 2);
        let after = must_some(store.get(&uri())).fingerprint;
        assert_ne!(before, after);
    }
}
