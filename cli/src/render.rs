use std::collections::HashMap;

use codespan_reporting::diagnostic::{Diagnostic, Label};
use codespan_reporting::files::SimpleFiles;
use codespan_reporting::term;
use codespan_reporting::term::termcolor::{ColorChoice, StandardStream};
use serde::Serialize;

use assembler::{Counts, Issue, Report, SourceFile};
use quizdoc::{DocPath, ParseError, Severity};

/// Terminal output for reports. Files are registered in the same order as
/// the pipeline's sources so that parser file ids line up.
pub struct Renderer {
    files: SimpleFiles<String, String>,
    ids: HashMap<DocPath, usize>,
    writer: StandardStream,
    config: term::Config,
    no_color: bool,
}

impl Renderer {
    pub fn new(sources: &[SourceFile], no_color: bool) -> Self {
        let mut files = SimpleFiles::new();
        let mut ids = HashMap::new();
        for source in sources {
            let id = files.add(source.path.to_string(), source.text.clone());
            ids.insert(source.path.clone(), id);
        }
        let color_choice = if no_color {
            ColorChoice::Never
        } else {
            ColorChoice::Auto
        };
        Renderer {
            files,
            ids,
            writer: StandardStream::stderr(color_choice),
            config: term::Config::default(),
            no_color,
        }
    }

    /// Every issue, most severe first, grouped by document.
    pub fn report(&self, report: &Report) {
        for by_path in report.grouped().values() {
            for issues in by_path.values() {
                for issue in issues {
                    self.issue(issue);
                }
            }
        }
    }

    fn issue(&self, issue: &Issue) {
        let mut diagnostic = Diagnostic::new(issue.severity.to_codespan())
            .with_code(issue.kind.name())
            .with_message(issue.message.clone())
            .with_notes(issue.notes.clone());

        let file_id = issue.path.as_ref().and_then(|path| self.ids.get(path));
        match (file_id, &issue.span) {
            (Some(&id), Some(span)) => {
                diagnostic = diagnostic.with_labels(vec![Label::primary(id, span.clone())]);
            }
            _ => {
                if let Some(path) = &issue.path {
                    diagnostic.notes.insert(0, format!("in {path}"));
                }
            }
        }
        for related in &issue.related {
            diagnostic.notes.push(format!("also {related}"));
        }
        if issue.severity == Severity::Fatal {
            diagnostic.notes.push("the build was aborted".to_string());
        }
        self.emit(&diagnostic);
    }

    /// Parser diagnostics for a single file.
    pub fn diagnostics(&self, errors: &[ParseError]) {
        for error in errors {
            self.emit(&error.to_diagnostic());
        }
    }

    fn emit(&self, diagnostic: &Diagnostic<usize>) {
        let _ = term::emit_to_write_style(
            &mut self.writer.lock(),
            &self.config,
            &self.files,
            diagnostic,
        );
    }

    pub fn summary(&self, report: &Report, documents: usize) {
        let counts = report.counts();
        let label = if report.has_failures() {
            self.paint("FAILED", "31")
        } else {
            self.paint("ok", "32")
        };
        eprintln!();
        eprintln!(
            "build result: {label}. {documents} documents, {} fatal, {} errors, {} warnings",
            counts.fatal, counts.errors, counts.warnings
        );
    }

    fn paint(&self, text: &str, color: &str) -> String {
        if self.no_color {
            text.to_string()
        } else {
            format!("\x1b[{color}m{text}\x1b[0m")
        }
    }
}

#[derive(Serialize)]
struct JsonReport<'a> {
    aborted: bool,
    counts: Counts,
    issues: &'a [Issue],
}

/// Machine-readable report for CI.
pub fn report_json(report: &Report, aborted: bool) -> serde_json::Result<String> {
    serde_json::to_string_pretty(&JsonReport {
        aborted,
        counts: report.counts(),
        issues: &report.issues,
    })
}
