use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Weak};

use serde::Serialize;
use tracing::debug;

use quizdoc::{DocPath, Document, IssueKind};

use crate::config::BuildConfig;
use crate::corpus::Corpus;
use crate::error::{BuildError, Collision};
use crate::report::Issue;

/// One entry of the navigation tree.
///
/// A node either stands for a document (a leaf page, or the index document of
/// a directory) or for a structural directory that has no index document.
#[derive(Debug, Clone, Serialize)]
pub struct NavNode {
    #[serde(skip)]
    pub document: Option<Weak<Document>>,
    pub path: DocPath,
    pub title: String,
    pub nav_weight: Option<u64>,
    pub children: Vec<NavNode>,
}

impl NavNode {
    fn for_document(document: &Arc<Document>) -> Self {
        NavNode {
            document: Some(Arc::downgrade(document)),
            path: document.path.clone(),
            title: document.title().to_string(),
            nav_weight: Some(document.nav_weight()),
            children: Vec::new(),
        }
    }

    fn structural(directory: &DocPath) -> Self {
        NavNode {
            document: None,
            path: directory.clone(),
            title: directory.file_name().unwrap_or_default().to_string(),
            nav_weight: None,
            children: Vec::new(),
        }
    }

    pub fn is_structural(&self) -> bool {
        self.document.is_none()
    }

    pub fn upgrade(&self) -> Option<Arc<Document>> {
        self.document.as_ref().and_then(Weak::upgrade)
    }

    fn walk<'a>(&'a self, out: &mut Vec<&'a NavNode>) {
        out.push(self);
        for child in &self.children {
            child.walk(out);
        }
    }
}

/// The navigation tree of a corpus, rooted at the corpus root directory.
#[derive(Debug, Clone, Serialize)]
#[serde(transparent)]
pub struct NavTree {
    pub root: NavNode,
}

impl NavTree {
    /// Every node in navigation order (pre-order, siblings sorted).
    pub fn nodes(&self) -> Vec<&NavNode> {
        let mut out = Vec::new();
        self.root.walk(&mut out);
        out
    }

    /// Documents in navigation order.
    pub fn documents(&self) -> Vec<Arc<Document>> {
        self.nodes().into_iter().filter_map(NavNode::upgrade).collect()
    }

    pub fn find(&self, path: &DocPath) -> Option<&NavNode> {
        self.nodes().into_iter().find(|node| &node.path == path)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

#[derive(Default)]
struct Directory {
    index: Option<Arc<Document>>,
    leaves: Vec<Arc<Document>>,
    subdirs: BTreeSet<DocPath>,
}

/// Find canonical URLs declared by more than one document.
pub fn find_collisions(corpus: &Corpus) -> Vec<Collision> {
    let mut by_canonical: BTreeMap<String, Vec<DocPath>> = BTreeMap::new();
    for (path, document) in corpus.iter() {
        by_canonical
            .entry(document.canonical().trim().to_string())
            .or_default()
            .push(path.clone());
    }
    by_canonical
        .into_iter()
        .filter(|(_, paths)| paths.len() > 1)
        .map(|(canonical, paths)| Collision { canonical, paths })
        .collect()
}

/// Build the navigation tree.
///
/// Fails with [`BuildError::CanonicalCollision`] before any tree is built if
/// canonical URLs collide. Otherwise returns the tree together with the
/// `DuplicateNavWeight` and `OrphanDocument` warnings.
pub fn build_tree(
    corpus: &Corpus,
    config: &BuildConfig,
) -> Result<(NavTree, Vec<Issue>), BuildError> {
    let collisions = find_collisions(corpus);
    if !collisions.is_empty() {
        return Err(BuildError::CanonicalCollision(collisions));
    }

    let directories = group_by_directory(corpus, config);
    let mut issues = Vec::new();
    let root = assemble(&DocPath::root(), &directories, &mut issues);
    issues.extend(find_orphans(&directories));

    debug!(nodes = root_size(&root), "navigation tree assembled");
    Ok((NavTree { root }, issues))
}

fn root_size(node: &NavNode) -> usize {
    1 + node.children.iter().map(root_size).sum::<usize>()
}

/// The index document a directory would use, honouring the configured order
/// of index names.
fn index_path(directory: &DocPath, corpus: &Corpus, config: &BuildConfig) -> Option<DocPath> {
    config
        .content
        .index_files
        .iter()
        .map(|name| directory.child(name))
        .find(|candidate| corpus.contains(candidate))
}

fn group_by_directory(corpus: &Corpus, config: &BuildConfig) -> BTreeMap<DocPath, Directory> {
    let mut directories: BTreeMap<DocPath, Directory> = BTreeMap::new();
    directories.insert(DocPath::root(), Directory::default());

    for (path, document) in corpus.iter() {
        let Some(directory) = path.parent() else {
            continue;
        };

        // Register the chain of ancestors so structural levels exist.
        let mut current = directory.clone();
        while let Some(parent) = current.parent() {
            let inserted = directories
                .entry(parent.clone())
                .or_default()
                .subdirs
                .insert(current.clone());
            directories.entry(current.clone()).or_default();
            if !inserted {
                break;
            }
            current = parent;
        }

        let is_index = index_path(&directory, corpus, config).as_ref() == Some(path);
        let entry = directories.entry(directory).or_default();
        if is_index {
            entry.index = Some(Arc::clone(document));
        } else {
            entry.leaves.push(Arc::clone(document));
        }
    }
    directories
}

fn assemble(
    path: &DocPath,
    directories: &BTreeMap<DocPath, Directory>,
    issues: &mut Vec<Issue>,
) -> NavNode {
    let Some(directory) = directories.get(path) else {
        return NavNode::structural(path);
    };

    let mut node = match &directory.index {
        Some(index) => NavNode::for_document(index),
        None => NavNode::structural(path),
    };

    node.children = directory
        .leaves
        .iter()
        .map(NavNode::for_document)
        .chain(directory.subdirs.iter().map(|sub| assemble(sub, directories, issues)))
        .collect();
    node.children.sort_by(|a, b| sort_key(a).cmp(&sort_key(b)));

    issues.extend(duplicate_weights(&node.children));
    node
}

/// Weighted nodes first by weight, then structural ones; ties by path.
fn sort_key(node: &NavNode) -> (bool, Option<u64>, &DocPath) {
    (node.nav_weight.is_none(), node.nav_weight, &node.path)
}

/// One warning per group of siblings sharing a weight. Siblings arrive sorted,
/// so each group is a contiguous run.
fn duplicate_weights(children: &[NavNode]) -> Vec<Issue> {
    children
        .chunk_by(|a, b| a.nav_weight.is_some() && a.nav_weight == b.nav_weight)
        .filter(|group| group.len() > 1)
        .filter_map(|group| {
            let weight = group[0].nav_weight?;
            let paths: Vec<DocPath> = group.iter().map(|node| node.path.clone()).collect();
            let listed = paths.iter().map(DocPath::to_string).collect::<Vec<_>>().join(", ");
            Some(
                Issue::new(
                    IssueKind::DuplicateNavWeight,
                    paths.first().cloned(),
                    format!("nav_weight {weight} is shared by {listed}"),
                )
                .with_related(paths[1..].to_vec())
                .with_note("siblings are ordered by path"),
            )
        })
        .collect()
}

fn find_orphans(directories: &BTreeMap<DocPath, Directory>) -> Vec<Issue> {
    let missing_index = |directory: &DocPath| {
        !directory.is_root() && directories.get(directory).is_none_or(|dir| dir.index.is_none())
    };

    let mut issues = Vec::new();
    for (path, directory) in directories {
        // An index document belongs to the level above the directory it represents.
        if let (Some(index), Some(parent)) = (&directory.index, path.parent()) {
            if missing_index(&parent) {
                issues.push(orphan(index, &parent));
            }
        }
        if missing_index(path) {
            issues.extend(directory.leaves.iter().map(|leaf| orphan(leaf, path)));
        }
    }
    issues
}

fn orphan(document: &Document, containing: &DocPath) -> Issue {
    Issue::new(
        IssueKind::OrphanDocument,
        Some(document.path.clone()),
        format!("{} has no parent index document in {containing}", document.path),
    )
}
