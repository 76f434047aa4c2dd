use std::ops::Range;

use pulldown_cmark::{Event, LinkType, Options, Parser as CmarkParser, Tag, TagEnd};

use crate::document::reference::{RawReference, ReferenceKind};

/// Collect internal references from a document body. Code (fenced, indented
/// and inline) is never scanned.
pub fn extract(body: &str, base: usize) -> Vec<RawReference> {
    let options = Options::ENABLE_STRIKETHROUGH | Options::ENABLE_TABLES | Options::ENABLE_TASKLISTS;
    let events: Vec<(Event<'_>, Range<usize>)> =
        CmarkParser::new_ext(body, options).into_offset_iter().collect();

    let mut references = Vec::new();
    let mut code_depth = 0usize;
    let mut link_depth = 0usize;
    let mut prose = Prose::default();

    for (event, range) in &events {
        match event {
            Event::Text(text) if code_depth == 0 && link_depth == 0 => {
                prose.push(body, text, range);
                continue;
            }
            _ => prose.flush(base, &mut references),
        }
        match event {
            Event::Start(Tag::CodeBlock(_)) => code_depth += 1,
            Event::End(TagEnd::CodeBlock) => code_depth = code_depth.saturating_sub(1),
            Event::Start(Tag::Link {
                link_type, dest_url, ..
            }) => {
                link_depth += 1;
                if *link_type != LinkType::Email && is_internal_target(dest_url) {
                    references.push(RawReference {
                        kind: ReferenceKind::Link,
                        target: dest_url.to_string(),
                        span: base + range.start..base + range.end,
                    });
                }
            }
            Event::End(TagEnd::Link) => link_depth = link_depth.saturating_sub(1),
            _ => {}
        }
    }
    prose.flush(base, &mut references);

    references
}

/// Adjacent text events, merged. The parser splits a run of prose at
/// delimiter characters such as `_`, which would cut paths like `a/_index.md`.
#[derive(Default)]
struct Prose {
    text: String,
    range: Option<Range<usize>>,
    exact: bool,
}

impl Prose {
    fn push(&mut self, body: &str, text: &str, range: &Range<usize>) {
        // Offsets inside the text are only exact when every piece is a
        // verbatim slice of the source (no escapes or entities).
        let verbatim = body.get(range.clone()) == Some(text);
        self.range = Some(match self.range.take() {
            Some(current) if current.end == range.start => {
                self.exact &= verbatim;
                current.start..range.end
            }
            Some(current) => {
                // Not contiguous: positions can no longer be mapped back.
                self.exact = false;
                current.start..range.end
            }
            None => {
                self.exact = verbatim;
                range.clone()
            }
        });
        self.text.push_str(text);
    }

    fn flush(&mut self, base: usize, out: &mut Vec<RawReference>) {
        if let Some(range) = self.range.take() {
            scan_prose(&self.text, base + range.start, self.exact, out);
        }
        self.text.clear();
    }
}

/// Whether a link destination points inside the corpus.
pub fn is_internal_target(target: &str) -> bool {
    let target = target.trim();
    !(target.is_empty()
        || target.starts_with('#')
        || target.starts_with('?')
        || target.starts_with("//")
        || has_uri_scheme(target))
}

pub fn has_uri_scheme(target: &str) -> bool {
    let Some((scheme, _)) = target.split_once(':') else {
        return false;
    };
    let mut chars = scheme.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    if !first.is_ascii_alphabetic() {
        return false;
    }
    chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '.' | '-'))
}

fn scan_prose(text: &str, start: usize, exact: bool, out: &mut Vec<RawReference>) {
    let words = words(text);
    for (index, &(offset, word)) in words.iter().enumerate() {
        let at = if exact { start + offset } else { start };

        let candidate = trim_punctuation(word);
        if candidate.contains('/') && candidate.ends_with(".md") && !has_uri_scheme(candidate) {
            out.push(RawReference {
                kind: ReferenceKind::PathMention,
                target: candidate.to_string(),
                span: at..at + if exact { word.len() } else { 0 },
            });
            continue;
        }

        let is_section_word = candidate.eq_ignore_ascii_case("section")
            || candidate.eq_ignore_ascii_case("sections");
        if !is_section_word {
            continue;
        }
        let Some(&(next_offset, next)) = words.get(index + 1) else {
            continue;
        };
        let number = trim_punctuation(next);
        if is_section_number(number) {
            let end = if exact { start + next_offset + next.len() } else { start };
            out.push(RawReference {
                kind: ReferenceKind::Section,
                target: number.to_string(),
                span: at..end,
            });
        }
    }
}

/// Whitespace-separated words with their byte offsets.
fn words(text: &str) -> Vec<(usize, &str)> {
    let mut words = Vec::new();
    let mut start = None;
    for (i, c) in text.char_indices() {
        match (c.is_whitespace(), start) {
            (true, Some(s)) => {
                words.push((s, &text[s..i]));
                start = None;
            }
            (false, None) => start = Some(i),
            _ => {}
        }
    }
    if let Some(s) = start {
        words.push((s, &text[s..]));
    }
    words
}

fn trim_punctuation(word: &str) -> &str {
    let is_wrapping = |c: char| {
        matches!(
            c,
            '(' | ')' | '[' | ']' | '"' | '\'' | ',' | ';' | ':' | '!' | '?' | '<' | '>' | '*' | '`'
        )
    };
    word.trim_start_matches(is_wrapping)
        .trim_end_matches(|c: char| is_wrapping(c) || c == '.')
}

/// `5`, `5.2`, `5.2.1`
fn is_section_number(text: &str) -> bool {
    !text.is_empty()
        && text
            .split('.')
            .all(|part| !part.is_empty() && part.chars().all(|c| c.is_ascii_digit()))
}
