pub mod document;
pub mod front_matter;
pub mod issue;
pub mod parser;
pub mod path;
pub mod quiz;

pub use document::Document;
pub use front_matter::{DocDate, FrontMatter};
pub use issue::{IssueKind, Severity};
pub use parser::{ParseError, ParseOutcome, Parser};
pub use path::DocPath;
pub use quiz::{QuizBlock, QuizOption, Question};

/// Convert a byte offset in `source` to a 1-based line number.
pub fn line_number(source: &str, offset: usize) -> usize {
    source.as_bytes()[..offset.min(source.len())]
        .iter()
        .filter(|&&b| b == b'\n')
        .count()
        + 1
}

/// Iterate the lines of `text` together with the byte offset each line starts at.
/// Yielded lines have their `\n` / `\r\n` terminator removed.
pub(crate) fn lines_with_offsets(text: &str) -> impl Iterator<Item = (usize, &str)> {
    let mut offset = 0;
    text.split_inclusive('\n').map(move |raw| {
        let start = offset;
        offset += raw.len();
        let line = raw.strip_suffix('\n').unwrap_or(raw);
        let line = line.strip_suffix('\r').unwrap_or(line);
        (start, line)
    })
}
