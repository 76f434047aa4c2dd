use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use std::ops::Range;

use chrono::{DateTime, FixedOffset, NaiveDate, SecondsFormat};
use serde::{Serialize, Serializer};
use serde_yaml::{Mapping, Value};

use crate::parser::error::FrontMatterError;

/// Keys every document must declare.
pub const REQUIRED_KEYS: &[&str] = &["canonical", "title", "nav_weight"];

/// Typed metadata block at the top of a document.
///
/// Keys not modelled here are kept verbatim in `extra` so that
/// [`FrontMatter::to_yaml`] loses nothing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrontMatter {
    pub canonical: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub nav_weight: u64,
    #[serde(skip_serializing_if = "BTreeSet::is_empty")]
    pub tags: BTreeSet<String>,
    #[serde(skip_serializing_if = "BTreeSet::is_empty")]
    pub categories: BTreeSet<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub license: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<DocDate>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl FrontMatter {
    /// Decode a bare YAML block (without `---` delimiters).
    pub fn from_yaml(yaml: &str) -> Result<Self, FrontMatterError> {
        crate::parser::front_matter::decode_block(yaml, 0, 0..yaml.len())
    }

    /// Serialize back to a bare YAML block.
    pub fn to_yaml(&self) -> Result<String, serde_yaml::Error> {
        serde_yaml::to_string(self)
    }

    /// Decode a YAML mapping. `key_spans` locates each top-level key in the
    /// source; errors for keys without a recorded span point at `block_span`.
    pub(crate) fn decode(
        map: &Mapping,
        key_spans: &HashMap<String, Range<usize>>,
        block_span: Range<usize>,
    ) -> Result<Self, FrontMatterError> {
        let span_of = |key: &str| {
            key_spans
                .get(key)
                .cloned()
                .unwrap_or_else(|| block_span.clone())
        };
        let invalid = |key: &str, reason: &str| FrontMatterError::InvalidValue {
            key: key.to_string(),
            reason: reason.to_string(),
            span: span_of(key),
        };

        for key in REQUIRED_KEYS {
            if map.get(*key).is_none() {
                return Err(FrontMatterError::MissingKey {
                    key: *key,
                    span: block_span.clone(),
                });
            }
        }

        let canonical = match map.get("canonical") {
            Some(Value::String(url)) => {
                let url = url.trim();
                validate_url(url).map_err(|reason| invalid("canonical", reason))?;
                url.to_string()
            }
            _ => return Err(invalid("canonical", "must be a URL string")),
        };

        let title = match map.get("title") {
            Some(Value::String(title)) if !title.trim().is_empty() => title.trim().to_string(),
            Some(Value::String(_)) => return Err(invalid("title", "must not be empty")),
            _ => return Err(invalid("title", "must be a string")),
        };

        let nav_weight = match map.get("nav_weight") {
            Some(Value::Number(n)) => n
                .as_u64()
                .ok_or_else(|| invalid("nav_weight", "must be a non-negative integer"))?,
            _ => return Err(invalid("nav_weight", "must be a non-negative integer")),
        };

        let description = optional_string(map, "description").map_err(|r| invalid("description", r))?;
        let license = optional_string(map, "license").map_err(|r| invalid("license", r))?;
        let kind = optional_string(map, "type").map_err(|r| invalid("type", r))?;
        let tags = string_set(map, "tags").map_err(|r| invalid("tags", r))?;
        let categories = string_set(map, "categories").map_err(|r| invalid("categories", r))?;

        let date = match map.get("date") {
            None | Some(Value::Null) => None,
            Some(Value::String(text)) => Some(
                DocDate::parse(text).ok_or_else(|| invalid("date", "must be YYYY-MM-DD or RFC 3339"))?,
            ),
            Some(_) => return Err(invalid("date", "must be a date string")),
        };

        let mut extra = BTreeMap::new();
        for (key, value) in map {
            let Value::String(key) = key else {
                return Err(FrontMatterError::InvalidValue {
                    key: format!("{key:?}"),
                    reason: "keys must be strings".to_string(),
                    span: block_span.clone(),
                });
            };
            if !is_modelled_key(key) {
                extra.insert(key.clone(), value.clone());
            }
        }

        Ok(FrontMatter {
            canonical,
            title,
            description,
            nav_weight,
            tags,
            categories,
            license,
            date,
            kind,
            extra,
        })
    }
}

fn is_modelled_key(key: &str) -> bool {
    matches!(
        key,
        "canonical"
            | "title"
            | "description"
            | "nav_weight"
            | "tags"
            | "categories"
            | "license"
            | "date"
            | "type"
    )
}

fn optional_string(map: &Mapping, key: &str) -> Result<Option<String>, &'static str> {
    match map.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(_) => Err("must be a string"),
    }
}

fn string_set(map: &Mapping, key: &str) -> Result<BTreeSet<String>, &'static str> {
    match map.get(key) {
        None | Some(Value::Null) => Ok(BTreeSet::new()),
        Some(Value::Sequence(items)) => items
            .iter()
            .map(|item| match item {
                Value::String(s) if !s.trim().is_empty() => Ok(s.trim().to_string()),
                _ => Err("must be a list of non-empty strings"),
            })
            .collect(),
        Some(_) => Err("must be a list of strings"),
    }
}

/// A `date` value. Timestamps keep their time and offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocDate {
    Day(NaiveDate),
    Timestamp(DateTime<FixedOffset>),
}

impl DocDate {
    /// Accepts `YYYY-MM-DD` or a full RFC 3339 timestamp.
    pub fn parse(text: &str) -> Option<DocDate> {
        let text = text.trim();
        NaiveDate::parse_from_str(text, "%Y-%m-%d")
            .map(DocDate::Day)
            .or_else(|_| DateTime::parse_from_rfc3339(text).map(DocDate::Timestamp))
            .ok()
    }

    /// The calendar day, in the timestamp's own offset.
    pub fn day(&self) -> NaiveDate {
        match self {
            DocDate::Day(day) => *day,
            DocDate::Timestamp(timestamp) => timestamp.date_naive(),
        }
    }
}

impl fmt::Display for DocDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocDate::Day(day) => write!(f, "{}", day.format("%Y-%m-%d")),
            DocDate::Timestamp(timestamp) => {
                f.write_str(&timestamp.to_rfc3339_opts(SecondsFormat::AutoSi, true))
            }
        }
    }
}

impl Serialize for DocDate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Check that `url` is an absolute http(s) URL with a host.
pub fn validate_url(url: &str) -> Result<(), &'static str> {
    if url.chars().any(char::is_whitespace) {
        return Err("must not contain whitespace");
    }
    let Some((scheme, rest)) = url.split_once("://") else {
        return Err("must be an absolute URL");
    };
    if !scheme.eq_ignore_ascii_case("http") && !scheme.eq_ignore_ascii_case("https") {
        return Err("must use the http or https scheme");
    }
    let host_end = rest.find(['/', '?', '#']).unwrap_or(rest.len());
    let host = &rest[..host_end];
    let host_valid = !host.is_empty()
        && host
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | ':' | '[' | ']'));
    if !host_valid {
        return Err("must have a valid host");
    }
    Ok(())
}
