use assembler::{BuildConfig, BuildOutcome, SourceFile, run};
use quizdoc::document::reference::ReferenceKind;
use quizdoc::{DocPath, IssueKind, Severity};

fn doc(canonical: &str, title: &str, weight: u64, body: &str) -> String {
    format!("---\ncanonical: {canonical}\ntitle: {title}\nnav_weight: {weight}\n---\n{body}")
}

/// A small, clean corpus: every directory has an index document.
fn base() -> Vec<SourceFile> {
    vec![
        SourceFile::new("index.md", doc("https://example.com/", "Home", 0, "Welcome.\n")),
        SourceFile::new(
            "content/_index.md",
            doc("https://example.com/content/", "Tutorial", 1, "Chapters.\n"),
        ),
        SourceFile::new(
            "content/5/_index.md",
            doc("https://example.com/content/5/", "Functions", 5000, "Functions.\n"),
        ),
        SourceFile::new(
            "content/5/closures.md",
            doc("https://example.com/content/5/closures/", "Closures", 5100, "Closures.\n"),
        ),
    ]
}

fn with(mut sources: Vec<SourceFile>, path: &str, text: String) -> Vec<SourceFile> {
    sources.retain(|source| source.path != DocPath::parse(path));
    sources.push(SourceFile::new(path, text));
    sources
}

fn build(sources: &[SourceFile]) -> BuildOutcome {
    run(sources, &BuildConfig::default())
}

fn kinds(outcome: &BuildOutcome) -> Vec<IssueKind> {
    outcome.report.issues.iter().map(|issue| issue.kind).collect()
}

#[test]
fn clean_corpus_builds_without_issues() {
    let outcome = build(&base());
    assert!(outcome.report.is_empty(), "{:?}", outcome.report.issues);
    assert_eq!(outcome.exit_code(false), 0);
    assert_eq!(outcome.exit_code(true), 0);

    let tree = outcome.tree.expect("tree");
    let order: Vec<String> = tree.nodes().iter().map(|node| node.path.to_string()).collect();
    assert_eq!(
        order,
        vec![
            "index.md",
            "content/_index.md",
            "content/5/_index.md",
            "content/5/closures.md",
        ]
    );
    assert_eq!(tree.documents().len(), 4);
}

#[test]
fn shared_nav_weight_warns_once() {
    let sources = with(
        with(
            base(),
            "content/5/closures.md",
            doc("https://example.com/content/5/closures/", "Closures", 5200, "A.\n"),
        ),
        "content/5/hoisting.md",
        doc("https://example.com/content/5/hoisting/", "Hoisting", 5200, "B.\n"),
    );
    let outcome = build(&sources);

    assert_eq!(kinds(&outcome), vec![IssueKind::DuplicateNavWeight]);
    let issue = &outcome.report.issues[0];
    assert_eq!(issue.severity, Severity::Warning);
    assert_eq!(issue.path, Some(DocPath::parse("content/5/closures.md")));
    assert_eq!(issue.related, vec![DocPath::parse("content/5/hoisting.md")]);
    assert_eq!(outcome.exit_code(false), 0);
    assert_eq!(outcome.exit_code(true), 2);

    let tree = outcome.tree.expect("build succeeds");
    let chapter = tree
        .find(&DocPath::parse("content/5/_index.md"))
        .expect("chapter node");
    let titles: Vec<&str> = chapter.children.iter().map(|c| c.title.as_str()).collect();
    assert_eq!(titles, vec!["Closures", "Hoisting"]);
}

#[test]
fn siblings_sort_by_weight_then_path() {
    let sources = with(
        with(
            base(),
            "content/5/b.md",
            doc("https://example.com/b", "B", 10, "b\n"),
        ),
        "content/5/a.md",
        doc("https://example.com/a", "A", 9000, "a\n"),
    );
    let outcome = build(&sources);
    let tree = outcome.tree.expect("tree");
    let chapter = tree.find(&DocPath::parse("content/5/_index.md")).expect("chapter");
    let paths: Vec<String> = chapter.children.iter().map(|c| c.path.to_string()).collect();
    assert_eq!(
        paths,
        vec!["content/5/b.md", "content/5/closures.md", "content/5/a.md"]
    );
}

#[test]
fn double_checked_answer_rejects_only_that_quiz() {
    let bad = "```quizdown\n### Which?\n\n- [x] a\n- [x] b\n\n> **Explanation:** both.\n```\n";
    let good = "```quizdown\n### Which?\n\n- [ ] a\n- [x] b\n\n> **Explanation:** b.\n```\n";
    let sources = with(
        with(
            base(),
            "content/5/closures.md",
            doc("https://example.com/content/5/closures/", "Closures", 5100, bad),
        ),
        "content/5/scope.md",
        doc("https://example.com/content/5/scope/", "Scope", 5300, good),
    );
    let outcome = build(&sources);

    assert_eq!(kinds(&outcome), vec![IssueKind::MultipleCorrectAnswers]);
    let issue = &outcome.report.issues[0];
    assert_eq!(issue.severity, Severity::Error);
    assert_eq!(issue.path, Some(DocPath::parse("content/5/closures.md")));
    assert_eq!(issue.line, Some(7));
    assert_eq!(outcome.exit_code(false), 1);

    let closures = outcome
        .corpus
        .get(&DocPath::parse("content/5/closures.md"))
        .expect("document kept");
    assert!(closures.quiz.is_none());
    let scope = outcome
        .corpus
        .get(&DocPath::parse("content/5/scope.md"))
        .expect("other document");
    assert_eq!(scope.quiz.as_ref().map(|quiz| quiz.len()), Some(1));
    assert!(outcome.tree.is_some());
}

#[test]
fn canonical_collision_aborts() {
    let sources = with(
        with(
            base(),
            "content/5/a.md",
            doc("\"https://example.com/x\"", "A", 1, "a\n"),
        ),
        "content/5/b.md",
        doc("https://example.com/x  ", "B", 2, "b\n"),
    );
    let outcome = build(&sources);

    assert!(outcome.is_aborted());
    assert!(outcome.tree.is_none());
    assert!(outcome.references.is_empty());
    assert_ne!(outcome.exit_code(false), 0);

    let collisions: Vec<_> = outcome.report.of_kind(IssueKind::CanonicalCollision).collect();
    assert_eq!(collisions.len(), 1);
    assert_eq!(collisions[0].severity, Severity::Fatal);
    assert_eq!(collisions[0].path, Some(DocPath::parse("content/5/a.md")));
    assert_eq!(collisions[0].related, vec![DocPath::parse("content/5/b.md")]);
    assert!(collisions[0].message.contains("https://example.com/x"));
}

#[test]
fn missing_target_is_a_broken_link() {
    let body = "Intro.\n\nAs shown in content/9/9/9/index.md, closures capture.\n";
    let sources = with(
        base(),
        "content/5/closures.md",
        doc("https://example.com/content/5/closures/", "Closures", 5100, body),
    );
    let outcome = build(&sources);

    assert_eq!(kinds(&outcome), vec![IssueKind::BrokenLink]);
    let issue = &outcome.report.issues[0];
    assert_eq!(issue.severity, Severity::Warning);
    assert_eq!(issue.line, Some(8));
    assert!(issue.message.contains("content/9/9/9/index.md"));
    assert_eq!(outcome.exit_code(false), 0);

    assert_eq!(outcome.references.len(), 1);
    let reference = &outcome.references[0];
    assert!(!reference.resolved);
    assert_eq!(reference.kind, ReferenceKind::PathMention);
    assert_eq!(reference.source, DocPath::parse("content/5/closures.md"));
}

#[test]
fn existing_targets_resolve() {
    let body = "See [the chapter](./_index.md), [home](/), [hoisting](../5/hoisting) \
                and content/5/_index.md.\n\n\
                Section 5 covers functions; [the url](/5/hoisting/#top) too.\n";
    let sources = with(
        with(
            base(),
            "content/5/closures.md",
            doc("https://example.com/content/5/closures/", "Closures", 5100, body),
        ),
        "content/5/hoisting.md",
        doc("https://example.com/content/5/hoisting/", "Hoisting", 5200, "H.\n"),
    );
    let outcome = build(&sources);

    assert!(outcome.report.is_empty(), "{:?}", outcome.report.issues);
    let resolved: Vec<(ReferenceKind, String)> = outcome
        .references
        .iter()
        .map(|r| {
            assert!(r.resolved, "{r:?}");
            (r.kind, r.target.to_string())
        })
        .collect();
    assert_eq!(
        resolved,
        vec![
            (ReferenceKind::Link, "content/5/_index.md".to_string()),
            (ReferenceKind::Link, "index.md".to_string()),
            (ReferenceKind::Link, "content/5/hoisting.md".to_string()),
            (ReferenceKind::PathMention, "content/5/_index.md".to_string()),
            (ReferenceKind::Section, "content/5/_index.md".to_string()),
            (ReferenceKind::Link, "5/hoisting".to_string()),
        ]
    );
}

#[test]
fn missing_section_is_broken() {
    let sources = with(
        base(),
        "content/5/closures.md",
        doc(
            "https://example.com/content/5/closures/",
            "Closures",
            5100,
            "See section 9.9 for more.\n",
        ),
    );
    let outcome = build(&sources);
    assert_eq!(kinds(&outcome), vec![IssueKind::BrokenLink]);
    assert_eq!(
        outcome.references[0].target,
        DocPath::parse("content/9/9/_index.md")
    );

    let config = BuildConfig::from_toml_str("[links]\nsection_root = \"\"\n").expect("config");
    let outcome = run(&sources, &config);
    assert!(outcome.report.is_empty());
    assert!(outcome.references.is_empty());
}

#[test]
fn missing_title_excludes_the_document() {
    let broken = "---\ncanonical: https://example.com/content/5/scope/\nnav_weight: 5300\n---\nBody.\n";
    let sources = with(base(), "content/5/scope.md", broken.to_string());
    let outcome = build(&sources);

    assert_eq!(kinds(&outcome), vec![IssueKind::MalformedFrontMatter]);
    let issue = &outcome.report.issues[0];
    assert_eq!(issue.severity, Severity::Error);
    assert!(issue.message.contains("title"));
    assert_eq!(outcome.exit_code(false), 1);

    let scope = DocPath::parse("content/5/scope.md");
    assert!(!outcome.corpus.contains(&scope));
    let tree = outcome.tree.expect("others still build");
    assert!(tree.find(&scope).is_none());
    assert_eq!(tree.documents().len(), 4);
}

#[test]
fn malformed_root_index_is_fatal() {
    let sources = with(
        base(),
        "index.md",
        "---\ncanonical: https://example.com/\nnav_weight: 0\n---\n".to_string(),
    );
    let outcome = build(&sources);

    assert!(outcome.is_aborted());
    assert!(outcome.tree.is_none());
    assert!(outcome.report.has_fatal());
    assert_eq!(kinds(&outcome), vec![IssueKind::MalformedFrontMatter]);
    assert_eq!(outcome.report.issues[0].severity, Severity::Fatal);
}

#[test]
fn duplicate_key_excludes_but_only_warns() {
    let text = "---\ncanonical: https://example.com/d\ntitle: A\ntitle: B\nnav_weight: 1\n---\n";
    let sources = with(base(), "content/5/dup.md", text.to_string());
    let outcome = build(&sources);

    assert_eq!(kinds(&outcome), vec![IssueKind::DuplicateKey]);
    assert!(!outcome.corpus.contains(&DocPath::parse("content/5/dup.md")));
    assert_eq!(outcome.exit_code(false), 0);
    assert_eq!(outcome.exit_code(true), 2);
}

#[test]
fn duplicate_key_in_root_index_is_fatal() {
    let text = "---\ncanonical: https://example.com/\ncanonical: https://example.com/home\ntitle: Home\nnav_weight: 0\n---\n";
    let sources = with(base(), "index.md", text.to_string());
    let outcome = build(&sources);

    assert!(outcome.is_aborted());
    assert!(outcome.tree.is_none());
    assert_eq!(kinds(&outcome), vec![IssueKind::DuplicateKey]);
    assert_eq!(outcome.report.issues[0].severity, Severity::Fatal);
    assert_eq!(outcome.exit_code(false), 1);
}

#[test]
fn repeated_source_path_keeps_the_first() {
    let mut sources = base();
    sources.push(SourceFile::new(
        "content/5/closures.md",
        doc("https://example.com/content/5/again/", "Again", 5200, "Again.\n"),
    ));
    let outcome = build(&sources);

    assert_eq!(kinds(&outcome), vec![IssueKind::DuplicatePath]);
    assert_eq!(outcome.report.issues[0].severity, Severity::Error);
    assert_eq!(outcome.corpus.len(), 4);
    let kept = outcome.corpus.get(&DocPath::parse("content/5/closures.md")).expect("kept");
    assert_eq!(kept.title(), "Closures");
    assert!(outcome.tree.is_some());
    assert_eq!(outcome.exit_code(false), 1);
}

#[test]
fn documents_without_a_parent_index_are_orphans() {
    let sources = with(
        base(),
        "guides/setup/install.md",
        doc("https://example.com/guides/setup/install/", "Install", 1, "Steps.\n"),
    );
    let outcome = build(&sources);

    assert_eq!(kinds(&outcome), vec![IssueKind::OrphanDocument]);
    assert_eq!(
        outcome.report.issues[0].path,
        Some(DocPath::parse("guides/setup/install.md"))
    );

    let tree = outcome.tree.expect("tree");
    let top: Vec<(String, Option<u64>)> = tree
        .root
        .children
        .iter()
        .map(|c| (c.path.to_string(), c.nav_weight))
        .collect();
    assert_eq!(
        top,
        vec![
            ("content/_index.md".to_string(), Some(1)),
            ("guides".to_string(), None),
        ]
    );
    let guides = &tree.root.children[1];
    assert!(guides.is_structural());
    assert_eq!(guides.children[0].path, DocPath::parse("guides/setup"));
    assert_eq!(guides.children[0].children[0].title, "Install");
}

#[test]
fn parallel_and_serial_builds_agree() {
    let mut sources = base();
    for i in 0..40 {
        sources.push(SourceFile::new(
            format!("content/5/page-{i:02}.md").as_str(),
            doc(
                &format!("https://example.com/content/5/page-{i:02}/"),
                &format!("Page {i}"),
                6000 + (i % 7),
                "See content/5/closures.md and content/5/missing.md.\n",
            ),
        ));
    }

    let serial = run(&sources, &BuildConfig::from_toml_str("[build]\njobs = 1\n").expect("config"));
    let parallel = run(&sources, &BuildConfig::from_toml_str("[build]\njobs = 8\n").expect("config"));

    assert_eq!(serial.report.issues, parallel.report.issues);
    assert_eq!(serial.references, parallel.references);
    assert_eq!(
        serial.tree.expect("tree").to_json().expect("json"),
        parallel.tree.expect("tree").to_json().expect("json"),
    );
    assert_eq!(serial.report.count_of(IssueKind::BrokenLink), 40);
    assert_eq!(serial.report.count_of(IssueKind::DuplicateNavWeight), 7);
}

#[test]
fn tree_serializes_to_json() {
    let outcome = build(&base());
    let json = outcome.tree.expect("tree").to_json().expect("json");
    let value: serde_json::Value = serde_json::from_str(&json).expect("valid json");

    assert_eq!(value["path"], "index.md");
    assert_eq!(value["title"], "Home");
    assert_eq!(value["nav_weight"], 0);
    assert_eq!(value["children"][0]["path"], "content/_index.md");
    assert_eq!(
        value["children"][0]["children"][0]["children"][0]["title"],
        "Closures"
    );
    assert!(value.get("document").is_none());
}

#[test]
fn report_groups_by_severity_then_path() {
    let sources = with(
        with(
            base(),
            "content/5/scope.md",
            "---\ntitle: Scope\n---\n".to_string(),
        ),
        "content/5/closures.md",
        doc(
            "https://example.com/content/5/closures/",
            "Closures",
            5100,
            "See content/1/index.md.\n",
        ),
    );
    let outcome = build(&sources);
    let grouped = outcome.report.grouped();
    let severities: Vec<Severity> = grouped.keys().copied().collect();
    assert_eq!(severities, vec![Severity::Error, Severity::Warning]);
    assert!(grouped[&Severity::Error].contains_key("content/5/scope.md"));
    assert!(grouped[&Severity::Warning].contains_key("content/5/closures.md"));

    let counts = outcome.report.counts();
    assert_eq!((counts.fatal, counts.errors, counts.warnings), (0, 1, 1));
}

#[test]
fn undecodable_source_is_excluded() {
    let mut sources = base();
    sources.push(SourceFile::from_bytes(
        "content/5/bad.md",
        b"---\ncanonical: https://example.com/bad\ntitle: \xff\xfe\nnav_weight: 9\n---\n".to_vec(),
    ));
    let outcome = build(&sources);

    assert_eq!(kinds(&outcome), vec![IssueKind::MalformedFrontMatter]);
    let issue = &outcome.report.issues[0];
    assert_eq!(issue.severity, Severity::Error);
    assert_eq!(issue.line, Some(3));
    assert!(issue.message.contains("UTF-8"));
    assert!(!outcome.corpus.contains(&DocPath::parse("content/5/bad.md")));
    assert!(outcome.tree.is_some());
}
