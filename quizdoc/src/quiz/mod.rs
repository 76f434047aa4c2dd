use std::ops::Range;

use serde::Serialize;

/// The quiz attached to a document. Only built when every question passed
/// validation, so `questions` is never empty.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuizBlock {
    pub questions: Vec<Question>,
    /// Byte span of the whole block in the source file.
    #[serde(skip)]
    pub span: Range<usize>,
}

impl QuizBlock {
    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Question {
    /// Heading text.
    pub text: String,
    /// Markdown between the heading and the first option, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
    pub options: Vec<QuizOption>,
    pub explanation: String,
    #[serde(skip)]
    pub span: Range<usize>,
}

impl Question {
    /// Index of the option marked correct. Validation guarantees exactly one.
    pub fn correct(&self) -> Option<usize> {
        self.options.iter().position(|o| o.correct)
    }

    pub fn correct_count(&self) -> usize {
        self.options.iter().filter(|o| o.correct).count()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuizOption {
    pub label: String,
    pub correct: bool,
    #[serde(skip)]
    pub span: Range<usize>,
}
