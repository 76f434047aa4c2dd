use std::fmt;

use serde::{Serialize, Serializer};

/// Location of a document inside the corpus, as a sequence of path segments
/// relative to the corpus root (`content/5/2/index.md`).
///
/// Paths are always lexically normalized: empty and `.` segments are dropped
/// and `..` pops the previous segment. A `..` that would climb above the root
/// is discarded.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DocPath {
    segments: Vec<String>,
}

impl DocPath {
    /// The corpus root (no segments).
    pub fn root() -> Self {
        DocPath::default()
    }

    pub fn from_segments<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut path = DocPath::root();
        for segment in segments {
            path.push_normalized(segment.as_ref());
        }
        path
    }

    /// Parse a `/`-separated path. Backslashes are treated as separators too.
    pub fn parse(text: &str) -> Self {
        DocPath::from_segments(text.split(['/', '\\']))
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn file_name(&self) -> Option<&str> {
        self.segments.last().map(String::as_str)
    }

    /// Extension of the last segment, without the dot.
    pub fn extension(&self) -> Option<&str> {
        let name = self.file_name()?;
        let (stem, ext) = name.rsplit_once('.')?;
        if stem.is_empty() { None } else { Some(ext) }
    }

    /// The containing directory, or `None` for the root.
    pub fn parent(&self) -> Option<DocPath> {
        if self.segments.is_empty() {
            return None;
        }
        Some(DocPath {
            segments: self.segments[..self.segments.len() - 1].to_vec(),
        })
    }

    /// Resolve a relative `/`-separated path against this path (treated as a directory).
    pub fn join(&self, relative: &str) -> DocPath {
        let mut path = self.clone();
        for segment in relative.split(['/', '\\']) {
            path.push_normalized(segment);
        }
        path
    }

    pub fn child(&self, segment: &str) -> DocPath {
        self.join(segment)
    }

    pub fn depth(&self) -> usize {
        self.segments.len()
    }

    fn push_normalized(&mut self, segment: &str) {
        match segment {
            "" | "." => {}
            ".." => {
                self.segments.pop();
            }
            other => self.segments.push(other.to_string()),
        }
    }
}

impl fmt::Display for DocPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.segments.join("/"))
    }
}

impl From<&str> for DocPath {
    fn from(text: &str) -> Self {
        DocPath::parse(text)
    }
}

impl Serialize for DocPath {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
