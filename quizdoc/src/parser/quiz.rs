use std::ops::Range;

use crate::lines_with_offsets;
use crate::parser::error::QuizError;
use crate::quiz::{QuizBlock, QuizOption, Question};

/// Result of scanning a body for its quiz.
#[derive(Debug, Default)]
pub struct QuizExtraction {
    /// Present only when exactly one block was found and nothing rejected it.
    pub quiz: Option<QuizBlock>,
    /// Rejections and warnings, in source order.
    pub errors: Vec<QuizError>,
}

/// Locate and validate the quiz in `body`. `base` is the byte offset of the
/// body within its file; every span produced is file-relative.
pub fn extract(body: &str, base: usize, language: &str) -> QuizExtraction {
    let (regions, mut errors) = find_regions(body, base, language);

    if regions.len() > 1 {
        errors.push(QuizError::MultipleQuizBlocks {
            count: regions.len(),
            span: regions[1].span.clone(),
        });
    }

    let Some(region) = regions.first() else {
        return QuizExtraction { quiz: None, errors };
    };

    let questions = parse_questions(&region.lines, &mut errors);
    if questions.is_empty() && !errors.iter().any(|e| matches!(e, QuizError::StrayOption { .. })) {
        errors.push(QuizError::EmptyQuiz {
            span: region.span.clone(),
        });
    }

    let rejected = errors.iter().any(|e| e.kind().rejects_quiz());
    let quiz = if rejected {
        None
    } else {
        Some(QuizBlock {
            questions,
            span: region.span.clone(),
        })
    };

    QuizExtraction { quiz, errors }
}

// ---------------------------------------------------------------------------
// Block location
// ---------------------------------------------------------------------------

struct Region<'a> {
    span: Range<usize>,
    /// Lines strictly between the opening and closing markers.
    lines: Vec<(usize, &'a str)>,
}

fn find_regions<'a>(body: &'a str, base: usize, language: &str) -> (Vec<Region<'a>>, Vec<QuizError>) {
    let lines: Vec<(usize, &str)> = lines_with_offsets(body)
        .map(|(offset, line)| (offset + base, line))
        .collect();
    let line_span = |index: usize| {
        let (offset, line) = lines[index];
        offset..offset + line.len()
    };

    let mut regions = Vec::new();
    let mut errors = Vec::new();
    let mut i = 0;

    while i < lines.len() {
        let (_, line) = lines[i];

        if let Some(fence) = Fence::open(line) {
            let is_quiz = fence.info.split_whitespace().next() == Some(language);
            let close = lines[i + 1..]
                .iter()
                .position(|(_, l)| fence.closes(l))
                .map(|p| p + i + 1);
            match close {
                Some(end) => {
                    if is_quiz {
                        regions.push(Region {
                            span: line_span(i).start..line_span(end).end,
                            lines: lines[i + 1..end].to_vec(),
                        });
                    }
                    i = end + 1;
                }
                None => {
                    // An unclosed fence swallows the rest of the document.
                    if is_quiz {
                        errors.push(QuizError::UnterminatedQuiz { span: line_span(i) });
                    }
                    break;
                }
            }
            continue;
        }

        if let Some(open) = Shortcode::open(line, language) {
            let mut inner_fence: Option<Fence<'_>> = None;
            let mut end = None;
            for (j, &(_, inner)) in lines.iter().enumerate().skip(i + 1) {
                if let Some(fence) = &inner_fence {
                    if fence.closes(inner) {
                        inner_fence = None;
                    }
                } else if let Some(fence) = Fence::open(inner) {
                    inner_fence = Some(fence);
                } else if open.closes(inner, language) {
                    end = Some(j);
                    break;
                }
            }
            match end {
                Some(end) => {
                    regions.push(Region {
                        span: line_span(i).start..line_span(end).end,
                        lines: lines[i + 1..end].to_vec(),
                    });
                    i = end + 1;
                }
                None => {
                    errors.push(QuizError::UnterminatedQuiz { span: line_span(i) });
                    break;
                }
            }
            continue;
        }

        if is_quiz_div(line, language) {
            let mut depth = div_delta(line);
            let mut end = if depth <= 0 { Some(i) } else { None };
            let mut inner_fence: Option<Fence<'_>> = None;
            let mut j = i + 1;
            while end.is_none() && j < lines.len() {
                let (_, inner) = lines[j];
                if let Some(fence) = &inner_fence {
                    if fence.closes(inner) {
                        inner_fence = None;
                    }
                } else if let Some(fence) = Fence::open(inner) {
                    inner_fence = Some(fence);
                } else {
                    depth += div_delta(inner);
                    if depth <= 0 {
                        end = Some(j);
                    }
                }
                j += 1;
            }
            match end {
                Some(end) => {
                    let inner_lines = if end > i {
                        lines[i + 1..end].to_vec()
                    } else {
                        Vec::new()
                    };
                    regions.push(Region {
                        span: line_span(i).start..line_span(end).end,
                        lines: inner_lines,
                    });
                    i = end + 1;
                }
                None => {
                    errors.push(QuizError::UnterminatedQuiz { span: line_span(i) });
                    break;
                }
            }
            continue;
        }

        i += 1;
    }

    (regions, errors)
}

/// An opening code fence (```` ``` ```` or `~~~`).
struct Fence<'a> {
    marker: char,
    len: usize,
    info: &'a str,
}

impl<'a> Fence<'a> {
    fn open(line: &'a str) -> Option<Fence<'a>> {
        let trimmed = strip_indent(line)?;
        let marker = trimmed.chars().next()?;
        if marker != '`' && marker != '~' {
            return None;
        }
        let len = trimmed.chars().take_while(|&c| c == marker).count();
        if len < 3 {
            return None;
        }
        let info = trimmed[len..].trim();
        if marker == '`' && info.contains('`') {
            return None;
        }
        Some(Fence { marker, len, info })
    }

    fn closes(&self, line: &str) -> bool {
        let Some(trimmed) = strip_indent(line) else {
            return false;
        };
        let run = trimmed.chars().take_while(|&c| c == self.marker).count();
        run >= self.len && trimmed[run..].trim().is_empty()
    }
}

/// Strip up to three spaces of indentation; `None` if the line is indented
/// further (an indented code block).
fn strip_indent(line: &str) -> Option<&str> {
    let indent = line.chars().take_while(|&c| c == ' ').count();
    if indent > 3 { None } else { Some(&line[indent..]) }
}

/// A Hugo shortcode opening a quiz: `{{< quizdown >}}` or `{{% quizdown %}}`.
/// Whitespace inside the delimiters is optional and parameters are ignored.
struct Shortcode {
    delimiter: char,
}

impl Shortcode {
    fn open(line: &str, language: &str) -> Option<Shortcode> {
        let (delimiter, inner) = shortcode_tag(line)?;
        (inner.split_whitespace().next() == Some(language)).then_some(Shortcode { delimiter })
    }

    fn closes(&self, line: &str, language: &str) -> bool {
        shortcode_tag(line).is_some_and(|(delimiter, inner)| {
            delimiter == self.delimiter
                && inner.strip_prefix('/').map(str::trim) == Some(language)
        })
    }
}

/// Split a line holding a single shortcode tag into its delimiter and the
/// trimmed text between the delimiters.
fn shortcode_tag(line: &str) -> Option<(char, &str)> {
    let trimmed = line.trim();
    let (delimiter, inner) = if let Some(rest) = trimmed.strip_prefix("{{<") {
        ('<', rest.strip_suffix(">}}")?)
    } else {
        ('%', trimmed.strip_prefix("{{%")?.strip_suffix("%}}")?)
    };
    Some((delimiter, inner.trim()))
}

fn is_quiz_div(line: &str, language: &str) -> bool {
    let trimmed = line.trim_start();
    if !trimmed.starts_with("<div") {
        return false;
    }
    let Some(pos) = trimmed.find("class=") else {
        return false;
    };
    let rest = &trimmed[pos + "class=".len()..];
    let Some(quote) = rest.chars().next().filter(|c| *c == '"' || *c == '\'') else {
        return false;
    };
    let value = rest[1..].split(quote).next().unwrap_or("");
    value.split_whitespace().any(|class| class == language)
}

fn div_delta(line: &str) -> i32 {
    line.matches("<div").count() as i32 - line.matches("</div>").count() as i32
}

// ---------------------------------------------------------------------------
// Question parsing
// ---------------------------------------------------------------------------

#[derive(Clone, Copy, PartialEq, Eq)]
enum Stage {
    Prompt,
    Options,
    Explanation,
}

struct QuestionBuilder<'a> {
    text: String,
    start: usize,
    end: usize,
    stage: Stage,
    prompt: Vec<&'a str>,
    options: Vec<QuizOption>,
    explanation: Vec<&'a str>,
}

impl QuestionBuilder<'_> {
    fn finish(self, errors: &mut Vec<QuizError>) -> Question {
        let span = self.start..self.end;

        for option in &self.options {
            if option.label.is_empty() {
                errors.push(QuizError::EmptyOption {
                    question: self.text.clone(),
                    span: option.span.clone(),
                });
            }
        }

        let prompt = self.prompt.join("\n");
        let prompt = prompt.trim();
        let question = Question {
            text: self.text,
            prompt: if prompt.is_empty() { None } else { Some(prompt.to_string()) },
            options: self.options,
            explanation: clean_explanation(&self.explanation),
            span,
        };

        match question.correct_count() {
            0 => errors.push(QuizError::InvalidAnswerCount {
                question: question.text.clone(),
                span: question.span.clone(),
            }),
            1 => {}
            count => errors.push(QuizError::MultipleCorrectAnswers {
                question: question.text.clone(),
                count,
                span: question.span.clone(),
            }),
        }

        if question.explanation.is_empty() {
            errors.push(QuizError::MissingExplanation {
                question: question.text.clone(),
                span: question.span.clone(),
            });
        }

        question
    }
}

fn parse_questions(lines: &[(usize, &str)], errors: &mut Vec<QuizError>) -> Vec<Question> {
    let mut questions = Vec::new();
    let mut current: Option<QuestionBuilder<'_>> = None;
    let mut fence: Option<Fence<'_>> = None;

    for &(offset, line) in lines {
        let line_end = offset + line.len();

        // Code inside a prompt is copied verbatim and never scanned for options.
        if let Some(open) = &fence {
            if open.closes(line) {
                fence = None;
            }
            if let Some(q) = current.as_mut().filter(|q| q.stage == Stage::Prompt) {
                q.prompt.push(line);
                q.end = line_end;
            }
            continue;
        }
        if let Some(open) = Fence::open(line) {
            fence = Some(open);
            if let Some(q) = current.as_mut().filter(|q| q.stage == Stage::Prompt) {
                q.prompt.push(line);
                q.end = line_end;
            }
            continue;
        }

        let trimmed = line.trim();

        if let Some(text) = heading_text(trimmed) {
            if let Some(done) = current.take() {
                questions.push(done.finish(errors));
            }
            current = Some(QuestionBuilder {
                text: text.to_string(),
                start: offset,
                end: line_end,
                stage: Stage::Prompt,
                prompt: Vec::new(),
                options: Vec::new(),
                explanation: Vec::new(),
            });
            continue;
        }

        if let Some((correct, label)) = option_line(trimmed) {
            match current.as_mut() {
                Some(q) => {
                    q.options.push(QuizOption {
                        label: label.to_string(),
                        correct,
                        span: offset..line_end,
                    });
                    q.stage = Stage::Options;
                    q.end = line_end;
                }
                None => errors.push(QuizError::StrayOption {
                    span: offset..line_end,
                }),
            }
            continue;
        }

        let Some(q) = current.as_mut() else {
            continue;
        };

        if let Some(quoted) = trimmed.strip_prefix('>') {
            let quoted = quoted.strip_prefix(' ').unwrap_or(quoted);
            match q.stage {
                Stage::Prompt => q.prompt.push(line),
                Stage::Options | Stage::Explanation => {
                    q.explanation.push(quoted);
                    q.stage = Stage::Explanation;
                }
            }
            q.end = line_end;
        } else if trimmed.starts_with('<') {
            // HTML wrapper lines (`<div id=...>`, `</div>`) carry no quiz content.
        } else if q.stage == Stage::Prompt {
            q.prompt.push(line);
            if !trimmed.is_empty() {
                q.end = line_end;
            }
        }
    }

    if let Some(done) = current.take() {
        questions.push(done.finish(errors));
    }

    questions
}

/// Text of an ATX heading line (`#` to `######`).
fn heading_text(trimmed: &str) -> Option<&str> {
    let level = trimmed.chars().take_while(|&c| c == '#').count();
    if level == 0 || level > 6 {
        return None;
    }
    let rest = &trimmed[level..];
    if !rest.is_empty() && !rest.starts_with([' ', '\t']) {
        return None;
    }
    let text = rest.trim().trim_end_matches('#').trim_end();
    Some(text)
}

/// A task-list item: returns whether it is checked and its trimmed label.
fn option_line(trimmed: &str) -> Option<(bool, &str)> {
    let rest = trimmed
        .strip_prefix("- ")
        .or_else(|| trimmed.strip_prefix("* "))
        .or_else(|| trimmed.strip_prefix("+ "))?
        .trim_start();
    let (correct, label) = if let Some(label) = rest.strip_prefix("[ ]") {
        (false, label)
    } else if let Some(label) = rest
        .strip_prefix("[x]")
        .or_else(|| rest.strip_prefix("[X]"))
    {
        (true, label)
    } else {
        return None;
    };
    Some((correct, label.trim()))
}

const EXPLANATION_LABELS: &[&str] = &[
    "**Explanation:**",
    "**Explanation**:",
    "*Explanation:*",
    "Explanation:",
];

fn clean_explanation(lines: &[&str]) -> String {
    let joined = lines.join("\n");
    let text = joined.trim();
    for label in EXPLANATION_LABELS {
        let matches_label = text
            .get(..label.len())
            .is_some_and(|prefix| prefix.eq_ignore_ascii_case(label));
        if matches_label {
            return text[label.len()..].trim().to_string();
        }
    }
    text.to_string()
}
