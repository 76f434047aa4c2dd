pub mod reference;

use serde::Serialize;

use crate::document::reference::RawReference;
use crate::front_matter::FrontMatter;
use crate::path::DocPath;
use crate::quiz::QuizBlock;

/// One parsed content file. Never mutated after parsing: a changed file is
/// parsed again into a new `Document`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Document {
    pub path: DocPath,
    pub front_matter: FrontMatter,
    /// Raw Markdown following the front matter.
    #[serde(skip)]
    pub body: String,
    /// Byte offset of `body` within the file.
    #[serde(skip)]
    pub body_offset: usize,
    /// 1-based line of the file on which `body` starts.
    #[serde(skip)]
    pub body_line: usize,
    /// The accepted quiz, if the body carries one that passed validation.
    pub quiz: Option<QuizBlock>,
    /// Internal references found in the body, unresolved.
    pub references: Vec<RawReference>,
}

impl Document {
    pub fn title(&self) -> &str {
        &self.front_matter.title
    }

    pub fn canonical(&self) -> &str {
        &self.front_matter.canonical
    }

    pub fn nav_weight(&self) -> u64 {
        self.front_matter.nav_weight
    }

    /// Translate a file-relative byte offset inside the body to a 1-based file line.
    pub fn line_at(&self, offset: usize) -> usize {
        let relative = offset.saturating_sub(self.body_offset);
        self.body_line + crate::line_number(&self.body, relative) - 1
    }
}
