use std::collections::BTreeMap;
use std::ops::Range;

use serde::Serialize;

use quizdoc::{DocPath, IssueKind, ParseError, Severity};

/// One problem found during a build.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Issue {
    pub kind: IssueKind,
    pub severity: Severity,
    /// Document the problem belongs to; `None` for corpus-wide problems.
    pub path: Option<DocPath>,
    /// Other documents involved (the colliding or duplicate siblings).
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub related: Vec<DocPath>,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub span: Option<Range<usize>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub notes: Vec<String>,
}

impl Issue {
    pub fn new(kind: IssueKind, path: Option<DocPath>, message: impl Into<String>) -> Self {
        Issue {
            kind,
            severity: kind.severity(),
            path,
            related: Vec::new(),
            message: message.into(),
            span: None,
            line: None,
            notes: Vec::new(),
        }
    }

    /// Lift a parser diagnostic; `source` is the file text the span points into.
    pub fn from_parse_error(path: &DocPath, error: &ParseError, source: &str) -> Self {
        Issue {
            kind: error.kind,
            severity: error.severity,
            path: Some(path.clone()),
            related: Vec::new(),
            message: error.message.clone(),
            span: Some(error.span.clone()),
            line: Some(quizdoc::line_number(source, error.span.start)),
            notes: error.notes.clone(),
        }
    }

    pub fn with_related(mut self, related: Vec<DocPath>) -> Self {
        self.related = related;
        self
    }

    pub fn with_location(mut self, span: Range<usize>, line: usize) -> Self {
        self.span = Some(span);
        self.line = Some(line);
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    pub fn escalate(mut self, severity: Severity) -> Self {
        self.severity = self.severity.min(severity);
        self
    }

    /// Key used to group issues by document in the report.
    pub fn group_key(&self) -> String {
        self.path
            .as_ref()
            .map(DocPath::to_string)
            .unwrap_or_else(|| "(corpus)".to_string())
    }
}

/// Per-severity totals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Counts {
    pub fatal: usize,
    pub errors: usize,
    pub warnings: usize,
}

/// Everything a build reported, in discovery order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Report {
    pub issues: Vec<Issue>,
}

impl Report {
    pub fn push(&mut self, issue: Issue) {
        self.issues.push(issue);
    }

    pub fn extend(&mut self, issues: impl IntoIterator<Item = Issue>) {
        self.issues.extend(issues);
    }

    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn counts(&self) -> Counts {
        let mut counts = Counts::default();
        for issue in &self.issues {
            match issue.severity {
                Severity::Fatal => counts.fatal += 1,
                Severity::Error => counts.errors += 1,
                Severity::Warning => counts.warnings += 1,
            }
        }
        counts
    }

    pub fn has_fatal(&self) -> bool {
        self.issues.iter().any(|i| i.severity == Severity::Fatal)
    }

    /// Fatal or error issues present.
    pub fn has_failures(&self) -> bool {
        self.issues.iter().any(|i| i.severity != Severity::Warning)
    }

    pub fn of_kind(&self, kind: IssueKind) -> impl Iterator<Item = &Issue> {
        self.issues.iter().filter(move |i| i.kind == kind)
    }

    pub fn count_of(&self, kind: IssueKind) -> usize {
        self.of_kind(kind).count()
    }

    /// Issues grouped by severity (most severe first), then by document path.
    pub fn grouped(&self) -> BTreeMap<Severity, BTreeMap<String, Vec<&Issue>>> {
        let mut groups: BTreeMap<Severity, BTreeMap<String, Vec<&Issue>>> = BTreeMap::new();
        for issue in &self.issues {
            groups
                .entry(issue.severity)
                .or_default()
                .entry(issue.group_key())
                .or_default()
                .push(issue);
        }
        groups
    }

    /// 0 on success, 1 on any fatal/error issue, 2 when `strict` and only
    /// warnings were reported.
    pub fn exit_code(&self, strict: bool) -> i32 {
        if self.has_failures() {
            1
        } else if strict && !self.issues.is_empty() {
            2
        } else {
            0
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
