use serde::Serialize;
use tracing::debug;

use quizdoc::document::reference::{RawReference, ReferenceKind};
use quizdoc::{DocPath, Document, IssueKind};

use crate::config::BuildConfig;
use crate::corpus::Corpus;
use crate::graph::NavTree;
use crate::report::Issue;

/// A reference from one document to another, after resolution.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CrossReference {
    pub source: DocPath,
    /// The matched document, or the best candidate path when unresolved.
    pub target: DocPath,
    pub raw: String,
    pub kind: ReferenceKind,
    pub line: usize,
    pub resolved: bool,
}

/// Resolves raw references against a corpus.
pub struct Linker<'a> {
    corpus: &'a Corpus,
    config: &'a BuildConfig,
    canonical_paths: Vec<Vec<String>>,
}

impl<'a> Linker<'a> {
    pub fn new(corpus: &'a Corpus, config: &'a BuildConfig) -> Self {
        let canonical_paths = corpus
            .documents()
            .map(|document| url_path_segments(document.canonical()))
            .filter(|segments| !segments.is_empty())
            .collect();
        Linker {
            corpus,
            config,
            canonical_paths,
        }
    }

    /// Resolve every reference of every document, visiting documents in
    /// navigation order. Unresolved references are reported as `BrokenLink`.
    pub fn link(&self, tree: &NavTree) -> (Vec<CrossReference>, Vec<Issue>) {
        let mut references = Vec::new();
        let mut issues = Vec::new();

        for document in tree.documents() {
            for raw in &document.references {
                let Some(reference) = self.resolve(&document, raw) else {
                    continue;
                };
                if !reference.resolved {
                    issues.push(broken_link(&document, raw, &reference));
                }
                references.push(reference);
            }
        }

        debug!(
            references = references.len(),
            broken = issues.len(),
            "cross references checked"
        );
        (references, issues)
    }

    /// `None` when the reference kind is disabled by configuration.
    pub fn resolve(&self, document: &Document, raw: &RawReference) -> Option<CrossReference> {
        let line = document.line_at(raw.span.start);
        let (candidate, resolved) = match raw.kind {
            ReferenceKind::Section => {
                let root = self.config.section_root()?;
                let directory = DocPath::parse(root).join(&raw.target.replace('.', "/"));
                match self.lookup_directory(&directory) {
                    Some(found) => (found, true),
                    None => (self.first_index(&directory), false),
                }
            }
            ReferenceKind::Link | ReferenceKind::PathMention => {
                let target = strip_query(&raw.target);
                let candidate = if raw.kind == ReferenceKind::Link && !target.starts_with('/') {
                    let base = document.path.parent().unwrap_or_default();
                    base.join(target)
                } else {
                    DocPath::parse(target)
                };
                match self.lookup(&candidate) {
                    Some(found) => (found, true),
                    None => (candidate, self.matches_canonical(target)),
                }
            }
        };

        Some(CrossReference {
            source: document.path.clone(),
            target: candidate,
            raw: raw.target.clone(),
            kind: raw.kind,
            line,
            resolved,
        })
    }

    /// Exact key, then `.md` and index-file forms for extension-less paths.
    fn lookup(&self, candidate: &DocPath) -> Option<DocPath> {
        if !candidate.is_root() && self.corpus.contains(candidate) {
            return Some(candidate.clone());
        }
        if candidate.extension().is_some() {
            return None;
        }
        if let (Some(parent), Some(name)) = (candidate.parent(), candidate.file_name()) {
            let with_extension = parent.child(&format!("{name}.md"));
            if self.corpus.contains(&with_extension) {
                return Some(with_extension);
            }
        }
        self.lookup_directory(candidate)
    }

    fn lookup_directory(&self, directory: &DocPath) -> Option<DocPath> {
        self.config
            .content
            .index_files
            .iter()
            .map(|name| directory.child(name))
            .find(|path| self.corpus.contains(path))
    }

    fn first_index(&self, directory: &DocPath) -> DocPath {
        match self.config.content.index_files.first() {
            Some(name) => directory.child(name),
            None => directory.clone(),
        }
    }

    /// Whether the target's segments are a suffix of some canonical URL path.
    fn matches_canonical(&self, target: &str) -> bool {
        let wanted = DocPath::parse(target);
        let wanted = wanted.segments();
        !wanted.is_empty()
            && self
                .canonical_paths
                .iter()
                .any(|segments| segments.ends_with(wanted))
    }
}

/// Resolve all references in `corpus`, in the order of `tree`.
pub fn link(
    tree: &NavTree,
    corpus: &Corpus,
    config: &BuildConfig,
) -> (Vec<CrossReference>, Vec<Issue>) {
    Linker::new(corpus, config).link(tree)
}

fn broken_link(document: &Document, raw: &RawReference, reference: &CrossReference) -> Issue {
    Issue::new(
        IssueKind::BrokenLink,
        Some(document.path.clone()),
        format!("reference `{}` does not resolve to a document", raw.target),
    )
    .with_location(raw.span.clone(), reference.line)
    .with_note(format!("looked for {}", reference.target))
}

/// Drop `#fragment` and `?query`.
fn strip_query(target: &str) -> &str {
    let end = target.find(['#', '?']).unwrap_or(target.len());
    &target[..end]
}

/// Path segments of an absolute URL (`https://host/a/b/` -> `["a", "b"]`).
pub fn url_path_segments(url: &str) -> Vec<String> {
    let url = strip_query(url.trim());
    let Some((_, rest)) = url.split_once("://") else {
        return Vec::new();
    };
    let Some((_, path)) = rest.split_once('/') else {
        return Vec::new();
    };
    path.split('/')
        .filter(|segment| !segment.is_empty())
        .map(String::from)
        .collect()
}
