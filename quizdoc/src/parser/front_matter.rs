use std::collections::HashMap;
use std::ops::Range;

use serde_yaml::{Mapping, Value};

use crate::front_matter::FrontMatter;
use crate::lines_with_offsets;
use crate::parser::error::FrontMatterError;

const DELIMITER: &str = "---";

/// Front matter split off a document, with the body that follows it.
#[derive(Debug)]
pub struct Extracted<'a> {
    pub front_matter: FrontMatter,
    pub body: &'a str,
    /// Byte offset of `body` within the original source.
    pub body_offset: usize,
}

/// Split the leading `---` block from `source` and decode it.
pub fn extract(source: &str) -> Result<Extracted<'_>, FrontMatterError> {
    let start = if source.starts_with('\u{feff}') {
        '\u{feff}'.len_utf8()
    } else {
        0
    };

    let lines: Vec<(usize, &str)> = lines_with_offsets(&source[start..])
        .map(|(offset, line)| (offset + start, line))
        .collect();

    let Some(&(open_at, opening)) = lines.first() else {
        return Err(FrontMatterError::MissingOpening { span: 0..0 });
    };
    let opening_span = open_at..open_at + opening.len();
    if opening.trim_end() != DELIMITER {
        return Err(FrontMatterError::MissingOpening { span: opening_span });
    }

    let close_index = lines
        .iter()
        .skip(1)
        .position(|(_, line)| line.trim_end() == DELIMITER)
        .map(|i| i + 1)
        .ok_or(FrontMatterError::MissingClosing {
            span: opening_span.clone(),
        })?;

    let (yaml_start, _) = lines[1];
    let (close_at, closing) = lines[close_index];
    let yaml = &source[yaml_start..close_at];
    let body_offset = lines
        .get(close_index + 1)
        .map(|(offset, _)| *offset)
        .unwrap_or(source.len());

    let block_span = open_at..close_at + closing.len();
    let front_matter = decode_block(yaml, yaml_start, block_span)?;

    Ok(Extracted {
        front_matter,
        body: &source[body_offset..],
        body_offset,
    })
}

/// Decode a bare YAML block located at `base` in the source.
pub(crate) fn decode_block(
    yaml: &str,
    base: usize,
    block_span: Range<usize>,
) -> Result<FrontMatter, FrontMatterError> {
    let key_spans = scan_top_level_keys(yaml, base)?;
    if yaml.trim().is_empty() {
        return FrontMatter::decode(&Mapping::new(), &key_spans, block_span);
    }

    let value: Value = serde_yaml::from_str(yaml).map_err(|e| {
        let span = e
            .location()
            .and_then(|loc| line_span(yaml, base, loc.line()))
            .unwrap_or_else(|| block_span.clone());
        FrontMatterError::Syntax {
            message: e.to_string(),
            span,
        }
    })?;

    let map = match value {
        Value::Mapping(map) => map,
        Value::Null => Mapping::new(),
        _ => return Err(FrontMatterError::NotAMapping { span: block_span }),
    };

    FrontMatter::decode(&map, &key_spans, block_span)
}

/// Record the span of every top-level key, rejecting repeated keys before the
/// YAML decoder gets a chance to keep only one of them.
fn scan_top_level_keys(
    yaml: &str,
    base: usize,
) -> Result<HashMap<String, Range<usize>>, FrontMatterError> {
    let mut seen: HashMap<String, Range<usize>> = HashMap::new();
    for (offset, line) in lines_with_offsets(yaml) {
        let Some(key) = top_level_key(line) else {
            continue;
        };
        let span = base + offset..base + offset + line.len();
        if let Some(first) = seen.get(key) {
            return Err(FrontMatterError::DuplicateKey {
                key: key.to_string(),
                first: first.clone(),
                span,
            });
        }
        seen.insert(key.to_string(), span);
    }
    Ok(seen)
}

/// The key of a `key: value` line that starts in column zero.
fn top_level_key(line: &str) -> Option<&str> {
    let first = line.chars().next()?;
    if first.is_whitespace()
        || matches!(
            first,
            '#' | '-' | '[' | '{' | '?' | '|' | '>' | '&' | '*' | '!' | '%' | '@' | '`'
        )
    {
        return None;
    }
    let line = line.trim_end();
    let colon = match line.find(": ") {
        Some(pos) => pos,
        None => line.strip_suffix(':')?.len(),
    };
    let key = line[..colon].trim().trim_matches(|c| c == '"' || c == '\'');
    if key.is_empty() { None } else { Some(key) }
}

/// Byte span of the 1-based `line` of `text`, shifted by `base`.
fn line_span(text: &str, base: usize, line: usize) -> Option<Range<usize>> {
    let (offset, content) = lines_with_offsets(text).nth(line.checked_sub(1)?)?;
    Some(base + offset..base + offset + content.len())
}
