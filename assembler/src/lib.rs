pub mod config;
pub mod corpus;
pub mod error;
pub mod graph;
pub mod linker;
pub mod pipeline;
pub mod report;

pub use config::{BuildConfig, ConfigError};
pub use corpus::Corpus;
pub use error::{BuildError, Collision};
pub use graph::{NavNode, NavTree, build_tree};
pub use linker::{CrossReference, Linker, link};
pub use pipeline::{BuildOutcome, SourceFile, parse_all, run};
pub use report::{Counts, Issue, Report};
