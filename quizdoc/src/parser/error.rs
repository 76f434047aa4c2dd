use std::ops::Range;

use codespan_reporting::diagnostic::{Diagnostic, Label};
use thiserror::Error;

use crate::issue::{IssueKind, Severity};

/// Failure to split or decode a document's front matter.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FrontMatterError {
    #[error("document is not valid UTF-8")]
    InvalidEncoding { span: Range<usize> },

    #[error("missing opening `---` front matter delimiter")]
    MissingOpening { span: Range<usize> },

    #[error("missing closing `---` front matter delimiter")]
    MissingClosing { span: Range<usize> },

    #[error("front matter is not valid YAML: {message}")]
    Syntax { message: String, span: Range<usize> },

    #[error("front matter must be a mapping of keys to values")]
    NotAMapping { span: Range<usize> },

    #[error("missing required key `{key}`")]
    MissingKey { key: &'static str, span: Range<usize> },

    #[error("`{key}` {reason}")]
    InvalidValue {
        key: String,
        reason: String,
        span: Range<usize>,
    },

    #[error("key `{key}` is declared more than once")]
    DuplicateKey {
        key: String,
        first: Range<usize>,
        span: Range<usize>,
    },
}

impl FrontMatterError {
    pub fn span(&self) -> Range<usize> {
        match self {
            FrontMatterError::InvalidEncoding { span }
            | FrontMatterError::MissingOpening { span }
            | FrontMatterError::MissingClosing { span }
            | FrontMatterError::Syntax { span, .. }
            | FrontMatterError::NotAMapping { span }
            | FrontMatterError::MissingKey { span, .. }
            | FrontMatterError::InvalidValue { span, .. }
            | FrontMatterError::DuplicateKey { span, .. } => span.clone(),
        }
    }

    pub fn kind(&self) -> IssueKind {
        match self {
            FrontMatterError::DuplicateKey { .. } => IssueKind::DuplicateKey,
            _ => IssueKind::MalformedFrontMatter,
        }
    }
}

/// A structural problem found in a quiz block.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum QuizError {
    #[error("question `{question}` has no option marked correct")]
    InvalidAnswerCount { question: String, span: Range<usize> },

    #[error("question `{question}` has {count} options marked correct, expected exactly one")]
    MultipleCorrectAnswers {
        question: String,
        count: usize,
        span: Range<usize>,
    },

    #[error("question `{question}` has an option with an empty label")]
    EmptyOption { question: String, span: Range<usize> },

    #[error("question `{question}` has no explanation")]
    MissingExplanation { question: String, span: Range<usize> },

    #[error("quiz block contains no questions")]
    EmptyQuiz { span: Range<usize> },

    #[error("found {count} quiz blocks, a document may carry at most one")]
    MultipleQuizBlocks { count: usize, span: Range<usize> },

    #[error("quiz block is never closed")]
    UnterminatedQuiz { span: Range<usize> },

    #[error("answer option appears before any question heading")]
    StrayOption { span: Range<usize> },
}

impl QuizError {
    pub fn span(&self) -> Range<usize> {
        match self {
            QuizError::InvalidAnswerCount { span, .. }
            | QuizError::MultipleCorrectAnswers { span, .. }
            | QuizError::EmptyOption { span, .. }
            | QuizError::MissingExplanation { span, .. }
            | QuizError::EmptyQuiz { span }
            | QuizError::MultipleQuizBlocks { span, .. }
            | QuizError::UnterminatedQuiz { span }
            | QuizError::StrayOption { span } => span.clone(),
        }
    }

    pub fn kind(&self) -> IssueKind {
        match self {
            QuizError::InvalidAnswerCount { .. } => IssueKind::InvalidAnswerCount,
            QuizError::MultipleCorrectAnswers { .. } => IssueKind::MultipleCorrectAnswers,
            QuizError::EmptyOption { .. } => IssueKind::EmptyOption,
            QuizError::MissingExplanation { .. } => IssueKind::MissingExplanation,
            QuizError::EmptyQuiz { .. } => IssueKind::EmptyQuiz,
            QuizError::MultipleQuizBlocks { .. } => IssueKind::MultipleQuizBlocks,
            QuizError::UnterminatedQuiz { .. } => IssueKind::UnterminatedQuiz,
            QuizError::StrayOption { .. } => IssueKind::StrayOption,
        }
    }
}

/// Per-document problems with source location information.
#[derive(Debug, Clone)]
pub struct ParseError {
    pub kind: IssueKind,
    pub message: String,
    pub span: Range<usize>,
    pub file_id: usize,
    pub severity: Severity,
    pub notes: Vec<String>,
}

impl ParseError {
    pub fn new(kind: IssueKind, message: impl Into<String>, span: Range<usize>, file_id: usize) -> Self {
        ParseError {
            kind,
            message: message.into(),
            span,
            file_id,
            severity: kind.severity(),
            notes: Vec::new(),
        }
    }

    pub fn from_front_matter(error: &FrontMatterError, file_id: usize) -> Self {
        let parse_error = ParseError::new(error.kind(), error.to_string(), error.span(), file_id);
        match error {
            FrontMatterError::DuplicateKey { first, .. } => parse_error
                .with_note(format!("first declared at bytes {}..{}", first.start, first.end))
                .with_note("the document is skipped until one declaration is removed"),
            FrontMatterError::InvalidEncoding { .. } => {
                parse_error.with_note("invalid bytes are shown as U+FFFD")
            }
            _ => parse_error,
        }
    }

    pub fn from_quiz(error: &QuizError, file_id: usize) -> Self {
        let parse_error = ParseError::new(error.kind(), error.to_string(), error.span(), file_id);
        if error.kind().rejects_quiz() {
            parse_error.with_note("the quiz for this document is rejected")
        } else {
            parse_error
        }
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    pub fn is_warning(&self) -> bool {
        self.severity == Severity::Warning
    }

    /// Convert to a codespan-reporting Diagnostic for display.
    pub fn to_diagnostic(&self) -> Diagnostic<usize> {
        Diagnostic::new(self.severity.to_codespan())
            .with_code(self.kind.name())
            .with_message(&self.message)
            .with_labels(vec![Label::primary(self.file_id, self.span.clone())])
            .with_notes(self.notes.clone())
    }
}
