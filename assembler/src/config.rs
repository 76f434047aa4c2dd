use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use quizdoc::parser::DEFAULT_QUIZ_LANGUAGE;

/// Name of the optional configuration file at the content root.
pub const CONFIG_FILE_NAME: &str = "quizdoc.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid configuration: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Build settings, usually read from `quizdoc.toml`. Every field has a default.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BuildConfig {
    pub content: ContentConfig,
    pub quiz: QuizConfig,
    pub links: LinksConfig,
    pub build: JobsConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ContentConfig {
    /// File names that stand for their directory in the navigation tree.
    pub index_files: Vec<String>,
    /// Extensions of content files, without the dot.
    pub extensions: Vec<String>,
    /// Directory names skipped during discovery.
    pub ignore: Vec<String>,
}

impl Default for ContentConfig {
    fn default() -> Self {
        ContentConfig {
            index_files: vec!["_index.md".to_string(), "index.md".to_string()],
            extensions: vec!["md".to_string()],
            ignore: [".git", "node_modules", "target", "public"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct QuizConfig {
    /// Fence info string / div class marking a quiz block.
    pub language: String,
}

impl Default for QuizConfig {
    fn default() -> Self {
        QuizConfig {
            language: DEFAULT_QUIZ_LANGUAGE.to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LinksConfig {
    /// Directory that `section N.M` references are resolved under.
    /// An empty string disables section references.
    pub section_root: Option<String>,
}

impl Default for LinksConfig {
    fn default() -> Self {
        LinksConfig {
            section_root: Some("content".to_string()),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct JobsConfig {
    /// Parser worker threads; 0 means one per available core.
    pub jobs: usize,
}

impl BuildConfig {
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: BuildConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        BuildConfig::from_toml_str(&text)
    }

    /// Load `quizdoc.toml` from `root` if present, defaults otherwise.
    pub fn discover(root: &Path) -> Result<Self, ConfigError> {
        let path = root.join(CONFIG_FILE_NAME);
        if path.is_file() {
            BuildConfig::from_file(&path)
        } else {
            Ok(BuildConfig::default())
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.content.index_files.is_empty() {
            return Err(ConfigError::Invalid(
                "`content.index_files` must name at least one file".to_string(),
            ));
        }
        if self.quiz.language.trim().is_empty() {
            return Err(ConfigError::Invalid("`quiz.language` must not be empty".to_string()));
        }
        Ok(())
    }

    pub fn section_root(&self) -> Option<&str> {
        self.links
            .section_root
            .as_deref()
            .map(|root| root.trim_matches('/'))
            .filter(|root| !root.is_empty())
    }

    pub fn is_index_file(&self, name: &str) -> bool {
        self.content.index_files.iter().any(|index| index == name)
    }

    /// Number of parser threads to use for `documents` files.
    pub fn worker_count(&self, documents: usize) -> usize {
        let jobs = if self.build.jobs == 0 {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
        } else {
            self.build.jobs
        };
        jobs.min(documents).max(1)
    }
}
