//! Full-sync document mirror.
//!
//! The server advertises `textDocumentSync: 1` (full), so every change carries the whole text.
//! Handlers take a snapshot per request and classify from scratch; nothing derived is cached.

use std::collections::HashMap;
use std::sync::RwLock;

/// Open-document text keyed by URI.
#[derive(Debug, Default)]
pub struct DocumentStore {
    texts: RwLock<HashMap<String, String>>,
}

impl DocumentStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a newly opened document.
    pub fn open(&self, uri: &str, text: String) {
        self.texts
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(uri.to_string(), text);
    }

    /// Replace a document's text (full sync).
    pub fn replace(&self, uri: &str, text: String) {
        self.open(uri, text);
    }

    /// Drop a closed document.
    pub fn close(&self, uri: &str) {
        self.texts
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .remove(uri);
    }

    /// Snapshot of a document's current text.
    pub fn text(&self, uri: &str) -> Option<String> {
        self.texts
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(uri)
            .cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_replace_close() {
        let store = DocumentStore::new();
        store.open("file:///a.ws", "one".into());
        assert_eq!(store.text("file:///a.ws").as_deref(), Some("one"));

        store.replace("file:///a.ws", "two".into());
        assert_eq!(store.text("file:///a.ws").as_deref(), Some("two"));

        store.close("file:///a.ws");
        assert_eq!(store.text("file:///a.ws"), None);
    }
}
