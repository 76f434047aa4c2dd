pub mod error;
pub mod front_matter;
pub mod quiz;
pub mod references;

pub use error::{FrontMatterError, ParseError, QuizError};

use tracing::debug;

use crate::document::Document;
use crate::path::DocPath;

/// Quiz fence language / div class recognised by default.
pub const DEFAULT_QUIZ_LANGUAGE: &str = "quizdown";

/// Decode raw file contents. Invalid UTF-8 is replaced lossily and the
/// offset of the first invalid byte is returned with the text.
pub fn decode(bytes: Vec<u8>) -> (String, Option<usize>) {
    match String::from_utf8(bytes) {
        Ok(text) => (text, None),
        Err(err) => {
            let offset = err.utf8_error().valid_up_to();
            (String::from_utf8_lossy(err.as_bytes()).into_owned(), Some(offset))
        }
    }
}

/// Everything learned from one file.
///
/// `document` is `None` when the front matter could not be decoded; the
/// reason is in `diagnostics`. A rejected quiz leaves the document in place
/// with `quiz: None`.
#[derive(Debug)]
pub struct ParseOutcome {
    pub path: DocPath,
    pub file_id: usize,
    pub document: Option<Document>,
    pub diagnostics: Vec<ParseError>,
}

impl ParseOutcome {
    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(|d| !d.is_warning())
    }
}

/// Parser entry point.
pub struct Parser {
    path: DocPath,
    source: String,
    file_id: usize,
    quiz_language: String,
    invalid_utf8: Option<usize>,
}

impl Parser {
    pub fn new(path: DocPath, source: String, file_id: usize) -> Self {
        Parser {
            path,
            source,
            file_id,
            quiz_language: DEFAULT_QUIZ_LANGUAGE.to_string(),
            invalid_utf8: None,
        }
    }

    pub fn with_quiz_language(mut self, language: impl Into<String>) -> Self {
        self.quiz_language = language.into();
        self
    }

    /// Mark the source as lossily decoded from bytes that stopped being
    /// valid UTF-8 at `offset` (see [`decode`]). Such a source is rejected.
    pub fn with_invalid_utf8(mut self, offset: Option<usize>) -> Self {
        self.invalid_utf8 = offset;
        self
    }

    /// Parse front matter, quiz and references.
    pub fn parse(&self) -> ParseOutcome {
        let mut diagnostics = Vec::new();

        let extracted = match self
            .check_encoding()
            .and_then(|()| front_matter::extract(&self.source))
        {
            Ok(extracted) => extracted,
            Err(err) => {
                debug!(path = %self.path, error = %err, "front matter rejected");
                diagnostics.push(ParseError::from_front_matter(&err, self.file_id));
                return ParseOutcome {
                    path: self.path.clone(),
                    file_id: self.file_id,
                    document: None,
                    diagnostics,
                };
            }
        };

        let quiz = quiz::extract(extracted.body, extracted.body_offset, &self.quiz_language);
        diagnostics.extend(
            quiz.errors
                .iter()
                .map(|err| ParseError::from_quiz(err, self.file_id)),
        );

        let references = references::extract(extracted.body, extracted.body_offset);

        let document = Document {
            path: self.path.clone(),
            front_matter: extracted.front_matter,
            body: extracted.body.to_string(),
            body_offset: extracted.body_offset,
            body_line: crate::line_number(&self.source, extracted.body_offset),
            quiz: quiz.quiz,
            references,
        };

        ParseOutcome {
            path: self.path.clone(),
            file_id: self.file_id,
            document: Some(document),
            diagnostics,
        }
    }

    fn check_encoding(&self) -> Result<(), FrontMatterError> {
        match self.invalid_utf8 {
            Some(offset) => {
                let start = offset.min(self.source.len());
                let end = (start + char::REPLACEMENT_CHARACTER.len_utf8()).min(self.source.len());
                Err(FrontMatterError::InvalidEncoding { span: start..end })
            }
            None => Ok(()),
        }
    }
}
