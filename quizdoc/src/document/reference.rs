use std::ops::Range;

use serde::Serialize;

/// How an internal reference was written in the body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceKind {
    /// A Markdown link destination: `[text](../2/index.md)`
    Link,
    /// A bare path in prose: `see content/5/2/index.md`
    PathMention,
    /// A numbered section: `see section 5.2`
    Section,
}

/// A reference found in a document body, before resolution.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RawReference {
    pub kind: ReferenceKind,
    /// Target exactly as written (`5.2` for sections).
    pub target: String,
    /// Byte span in the source file.
    #[serde(skip)]
    pub span: Range<usize>,
}
