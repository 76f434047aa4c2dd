use assembler::{BuildConfig, ConfigError};

#[test]
fn defaults() {
    let config = BuildConfig::default();
    assert_eq!(config.content.index_files, vec!["_index.md", "index.md"]);
    assert_eq!(config.content.extensions, vec!["md"]);
    assert!(config.content.ignore.iter().any(|dir| dir == ".git"));
    assert_eq!(config.quiz.language, "quizdown");
    assert_eq!(config.section_root(), Some("content"));
    assert!(config.is_index_file("index.md"));
    assert!(!config.is_index_file("readme.md"));
}

#[test]
fn empty_file_is_all_defaults() {
    let config = BuildConfig::from_toml_str("").expect("empty config");
    assert_eq!(config.quiz.language, "quizdown");
    assert_eq!(config.build.jobs, 0);
}

#[test]
fn partial_tables_keep_other_defaults() {
    let config = BuildConfig::from_toml_str(
        "[quiz]\nlanguage = \"quiz\"\n\n[links]\nsection_root = \"/docs/\"\n",
    )
    .expect("valid config");
    assert_eq!(config.quiz.language, "quiz");
    assert_eq!(config.section_root(), Some("docs"));
    assert_eq!(config.content.index_files, vec!["_index.md", "index.md"]);
}

#[test]
fn empty_section_root_disables_sections() {
    let config = BuildConfig::from_toml_str("[links]\nsection_root = \"\"\n").expect("valid");
    assert_eq!(config.section_root(), None);
}

#[test]
fn unknown_keys_are_rejected() {
    let err = BuildConfig::from_toml_str("[quiz]\nlang = \"quiz\"\n").unwrap_err();
    assert!(matches!(err, ConfigError::Toml(_)));
}

#[test]
fn invalid_values_are_rejected() {
    let err = BuildConfig::from_toml_str("[content]\nindex_files = []\n").unwrap_err();
    assert!(matches!(err, ConfigError::Invalid(_)));

    let err = BuildConfig::from_toml_str("[quiz]\nlanguage = \"  \"\n").unwrap_err();
    assert!(matches!(err, ConfigError::Invalid(_)));
}

#[test]
fn worker_count_is_bounded() {
    let config = BuildConfig::from_toml_str("[build]\njobs = 4\n").expect("valid");
    assert_eq!(config.worker_count(100), 4);
    assert_eq!(config.worker_count(2), 2);
    assert_eq!(config.worker_count(0), 1);

    let auto = BuildConfig::default();
    assert!(auto.worker_count(1000) >= 1);
}
