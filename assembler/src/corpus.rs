use std::collections::BTreeMap;
use std::sync::Arc;

use quizdoc::{DocPath, Document};

/// The immutable set of accepted documents, keyed by path.
///
/// Built once per run after all parser workers have finished. Documents are
/// shared through `Arc` so the navigation tree can hold weak handles to them.
#[derive(Debug, Clone, Default)]
pub struct Corpus {
    documents: BTreeMap<DocPath, Arc<Document>>,
}

impl Corpus {
    pub fn new() -> Self {
        Corpus::default()
    }

    /// Returns the previous document at the same path, if any.
    pub fn insert(&mut self, document: Document) -> Option<Arc<Document>> {
        self.documents
            .insert(document.path.clone(), Arc::new(document))
    }

    pub fn get(&self, path: &DocPath) -> Option<&Arc<Document>> {
        self.documents.get(path)
    }

    pub fn contains(&self, path: &DocPath) -> bool {
        self.documents.contains_key(path)
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Documents in path order.
    pub fn iter(&self) -> impl Iterator<Item = (&DocPath, &Arc<Document>)> {
        self.documents.iter()
    }

    pub fn documents(&self) -> impl Iterator<Item = &Arc<Document>> {
        self.documents.values()
    }
}

impl FromIterator<Document> for Corpus {
    fn from_iter<I: IntoIterator<Item = Document>>(iter: I) -> Self {
        let mut corpus = Corpus::new();
        for document in iter {
            corpus.insert(document);
        }
        corpus
    }
}
