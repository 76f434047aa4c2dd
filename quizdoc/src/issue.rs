use std::fmt;

use serde::Serialize;

/// How bad a reported problem is.
///
/// Ordered from most to least severe so that sorted reports list fatal
/// problems first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Aborts the build.
    Fatal,
    /// Rejects a document (or its quiz); the build continues but fails.
    Error,
    /// Reported only.
    Warning,
}

impl Severity {
    pub fn label(self) -> &'static str {
        match self {
            Severity::Fatal => "fatal",
            Severity::Error => "error",
            Severity::Warning => "warning",
        }
    }

    pub fn to_codespan(self) -> codespan_reporting::diagnostic::Severity {
        match self {
            Severity::Fatal | Severity::Error => codespan_reporting::diagnostic::Severity::Error,
            Severity::Warning => codespan_reporting::diagnostic::Severity::Warning,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Every kind of problem the pipeline can report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum IssueKind {
    MalformedFrontMatter,
    DuplicateKey,
    DuplicatePath,
    CanonicalCollision,
    DuplicateNavWeight,
    OrphanDocument,
    InvalidAnswerCount,
    MultipleCorrectAnswers,
    EmptyOption,
    MissingExplanation,
    EmptyQuiz,
    MultipleQuizBlocks,
    UnterminatedQuiz,
    StrayOption,
    BrokenLink,
}

impl IssueKind {
    /// Default severity for this kind. The assembler escalates any problem
    /// that excludes the corpus root index to `Fatal`.
    pub fn severity(self) -> Severity {
        match self {
            IssueKind::CanonicalCollision => Severity::Fatal,
            IssueKind::MalformedFrontMatter
            | IssueKind::DuplicatePath
            | IssueKind::InvalidAnswerCount
            | IssueKind::MultipleCorrectAnswers
            | IssueKind::EmptyOption
            | IssueKind::EmptyQuiz
            | IssueKind::MultipleQuizBlocks
            | IssueKind::UnterminatedQuiz
            | IssueKind::StrayOption => Severity::Error,
            IssueKind::DuplicateKey
            | IssueKind::DuplicateNavWeight
            | IssueKind::OrphanDocument
            | IssueKind::MissingExplanation
            | IssueKind::BrokenLink => Severity::Warning,
        }
    }

    /// Whether this kind causes the document's quiz to be dropped.
    pub fn rejects_quiz(self) -> bool {
        matches!(
            self,
            IssueKind::InvalidAnswerCount
                | IssueKind::MultipleCorrectAnswers
                | IssueKind::EmptyOption
                | IssueKind::EmptyQuiz
                | IssueKind::MultipleQuizBlocks
                | IssueKind::UnterminatedQuiz
                | IssueKind::StrayOption
        )
    }

    pub fn name(self) -> &'static str {
        match self {
            IssueKind::MalformedFrontMatter => "MalformedFrontMatter",
            IssueKind::DuplicateKey => "DuplicateKey",
            IssueKind::DuplicatePath => "DuplicatePath",
            IssueKind::CanonicalCollision => "CanonicalCollision",
            IssueKind::DuplicateNavWeight => "DuplicateNavWeight",
            IssueKind::OrphanDocument => "OrphanDocument",
            IssueKind::InvalidAnswerCount => "InvalidAnswerCount",
            IssueKind::MultipleCorrectAnswers => "MultipleCorrectAnswers",
            IssueKind::EmptyOption => "EmptyOption",
            IssueKind::MissingExplanation => "MissingExplanation",
            IssueKind::EmptyQuiz => "EmptyQuiz",
            IssueKind::MultipleQuizBlocks => "MultipleQuizBlocks",
            IssueKind::UnterminatedQuiz => "UnterminatedQuiz",
            IssueKind::StrayOption => "StrayOption",
            IssueKind::BrokenLink => "BrokenLink",
        }
    }
}

impl fmt::Display for IssueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
