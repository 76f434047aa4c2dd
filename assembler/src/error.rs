use thiserror::Error;

use quizdoc::{DocPath, IssueKind};

use crate::report::Issue;

/// Documents sharing one canonical URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Collision {
    pub canonical: String,
    pub paths: Vec<DocPath>,
}

/// Corpus-level failures that stop a build.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("{} canonical URL collision(s)", .0.len())]
    CanonicalCollision(Vec<Collision>),

    #[error("root index document {path} could not be parsed")]
    MalformedRoot { path: DocPath },
}

impl BuildError {
    /// One fatal issue per collision.
    pub fn to_issues(&self) -> Vec<Issue> {
        match self {
            BuildError::CanonicalCollision(collisions) => collisions
                .iter()
                .map(|collision| {
                    let listed = collision
                        .paths
                        .iter()
                        .map(DocPath::to_string)
                        .collect::<Vec<_>>()
                        .join(", ");
                    Issue::new(
                        IssueKind::CanonicalCollision,
                        collision.paths.first().cloned(),
                        format!(
                            "canonical URL `{}` is declared by {}",
                            collision.canonical, listed
                        ),
                    )
                    .with_related(collision.paths.iter().skip(1).cloned().collect())
                })
                .collect(),
            // The parser diagnostic for the root is escalated in place.
            BuildError::MalformedRoot { .. } => Vec::new(),
        }
    }
}
