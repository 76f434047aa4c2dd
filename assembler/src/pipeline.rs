use std::thread;

use tracing::{info, warn};

use quizdoc::{DocPath, IssueKind, ParseOutcome, Parser, Severity};

use crate::config::BuildConfig;
use crate::corpus::Corpus;
use crate::error::BuildError;
use crate::graph::{NavTree, build_tree};
use crate::linker::{CrossReference, link};
use crate::report::{Issue, Report};

/// A content file handed to the pipeline. `path` is relative to the corpus root.
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub path: DocPath,
    pub text: String,
    /// Offset of the first byte that was not valid UTF-8; `text` is then a
    /// lossy decoding and the document is rejected.
    pub invalid_utf8: Option<usize>,
}

impl SourceFile {
    pub fn new(path: impl Into<DocPath>, text: impl Into<String>) -> Self {
        SourceFile {
            path: path.into(),
            text: text.into(),
            invalid_utf8: None,
        }
    }

    /// Raw file contents as read from disk.
    pub fn from_bytes(path: impl Into<DocPath>, bytes: Vec<u8>) -> Self {
        let (text, invalid_utf8) = quizdoc::parser::decode(bytes);
        SourceFile {
            path: path.into(),
            text,
            invalid_utf8,
        }
    }

    pub fn parser(&self, file_id: usize) -> Parser {
        Parser::new(self.path.clone(), self.text.clone(), file_id)
            .with_invalid_utf8(self.invalid_utf8)
    }
}

/// Result of one build.
///
/// `tree` is `None` when the build was aborted; `report` still carries every
/// issue collected up to that point.
#[derive(Debug)]
pub struct BuildOutcome {
    pub tree: Option<NavTree>,
    pub corpus: Corpus,
    pub references: Vec<CrossReference>,
    pub report: Report,
    pub abort: Option<BuildError>,
}

impl BuildOutcome {
    pub fn is_aborted(&self) -> bool {
        self.abort.is_some()
    }

    pub fn exit_code(&self, strict: bool) -> i32 {
        self.report.exit_code(strict)
    }
}

/// Parse every source on scoped worker threads.
///
/// Sources are split into contiguous chunks, one per worker. Each outcome's
/// `file_id` is the index of its source in `sources`, and outcomes are
/// returned in that order.
pub fn parse_all(sources: &[SourceFile], config: &BuildConfig) -> Vec<ParseOutcome> {
    if sources.is_empty() {
        return Vec::new();
    }
    let workers = config.worker_count(sources.len());
    let chunk_size = sources.len().div_ceil(workers);
    let language = config.quiz.language.as_str();

    thread::scope(|scope| {
        let handles: Vec<_> = sources
            .chunks(chunk_size)
            .enumerate()
            .map(|(chunk_index, chunk)| {
                scope.spawn(move || {
                    chunk
                        .iter()
                        .enumerate()
                        .map(|(offset, source)| {
                            let file_id = chunk_index * chunk_size + offset;
                            source.parser(file_id).with_quiz_language(language).parse()
                        })
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        handles
            .into_iter()
            .flat_map(|handle| match handle.join() {
                Ok(outcomes) => outcomes,
                Err(panic) => std::panic::resume_unwind(panic),
            })
            .collect()
    })
}

/// Run the whole pipeline: parse, assemble the corpus, build the navigation
/// tree, then check cross references.
pub fn run(sources: &[SourceFile], config: &BuildConfig) -> BuildOutcome {
    info!(documents = sources.len(), "parsing documents");
    let outcomes = parse_all(sources, config);

    let mut report = Report::default();
    let mut corpus = Corpus::new();
    let mut abort = None;

    for outcome in outcomes {
        let source = sources
            .get(outcome.file_id)
            .map(|source| source.text.as_str())
            .unwrap_or_default();
        // Losing the root index ends the build.
        let lost_root = is_root_index(&outcome.path, config) && outcome.document.is_none();

        for diagnostic in &outcome.diagnostics {
            let mut issue = Issue::from_parse_error(&outcome.path, diagnostic, source);
            if lost_root {
                issue = issue
                    .escalate(Severity::Fatal)
                    .with_note("the corpus root index document must parse");
            }
            report.push(issue);
        }

        match outcome.document {
            Some(document) => {
                if outcome.diagnostics.iter().any(|d| d.kind.rejects_quiz()) {
                    warn!(path = %outcome.path, "quiz rejected");
                }
                if corpus.contains(&document.path) {
                    warn!(path = %outcome.path, "duplicate document path");
                    report.push(duplicate_path(&document.path));
                    continue;
                }
                corpus.insert(document);
            }
            None => {
                warn!(path = %outcome.path, "document excluded");
                if lost_root {
                    abort = Some(BuildError::MalformedRoot {
                        path: outcome.path.clone(),
                    });
                }
            }
        }
    }
    info!(accepted = corpus.len(), rejected = sources.len() - corpus.len(), "corpus assembled");

    if let Some(error) = abort {
        warn!(error = %error, "build aborted");
        return BuildOutcome {
            tree: None,
            corpus,
            references: Vec::new(),
            report,
            abort: Some(error),
        };
    }

    let (tree, graph_issues) = match build_tree(&corpus, config) {
        Ok(built) => built,
        Err(error) => {
            warn!(error = %error, "build aborted");
            report.extend(error.to_issues());
            return BuildOutcome {
                tree: None,
                corpus,
                references: Vec::new(),
                report,
                abort: Some(error),
            };
        }
    };
    report.extend(graph_issues);
    info!("navigation tree built");

    let (references, link_issues) = link(&tree, &corpus, config);
    report.extend(link_issues);
    let counts = report.counts();
    info!(
        references = references.len(),
        fatal = counts.fatal,
        errors = counts.errors,
        warnings = counts.warnings,
        "build finished"
    );

    BuildOutcome {
        tree: Some(tree),
        corpus,
        references,
        report,
        abort: None,
    }
}

fn duplicate_path(path: &DocPath) -> Issue {
    Issue::new(
        IssueKind::DuplicatePath,
        Some(path.clone()),
        format!("more than one source was given for `{path}`"),
    )
    .with_note("only the first source is kept")
}

/// An index document directly under the corpus root.
fn is_root_index(path: &DocPath, config: &BuildConfig) -> bool {
    path.depth() == 1 && path.file_name().is_some_and(|name| config.is_index_file(name))
}
