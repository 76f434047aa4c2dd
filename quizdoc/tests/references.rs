use quizdoc::DocPath;
use quizdoc::document::reference::ReferenceKind;
use quizdoc::parser::references::{extract, is_internal_target};

fn targets(body: &str) -> Vec<(ReferenceKind, String)> {
    extract(body, 0)
        .into_iter()
        .map(|r| (r.kind, r.target))
        .collect()
}

#[test]
fn markdown_links() {
    let refs = targets(
        "See [closures](../5/index.md) and [the spec](https://tc39.es/) \
         or [this heading](#scope) or [mail](mailto:a@b.c).\n",
    );
    assert_eq!(refs, vec![(ReferenceKind::Link, "../5/index.md".to_string())]);
}

#[test]
fn bare_path_mentions() {
    let refs = targets("As shown in content/9/9/9/index.md, hoisting (see ./hoisting.md).\n");
    assert_eq!(
        refs,
        vec![
            (ReferenceKind::PathMention, "content/9/9/9/index.md".to_string()),
            (ReferenceKind::PathMention, "./hoisting.md".to_string()),
        ]
    );
}

#[test]
fn section_numbers() {
    let refs = targets("This is covered in Section 5.2. Also see sections 3 and section x.\n");
    assert_eq!(
        refs,
        vec![
            (ReferenceKind::Section, "5.2".to_string()),
            (ReferenceKind::Section, "3".to_string()),
        ]
    );
}

#[test]
fn underscores_do_not_split_paths() {
    let refs = targets("See content/5/_index.md and *content/6/_index.md*.\n");
    assert_eq!(
        refs,
        vec![
            (ReferenceKind::PathMention, "content/5/_index.md".to_string()),
            (ReferenceKind::PathMention, "content/6/_index.md".to_string()),
        ]
    );
}

#[test]
fn code_is_never_scanned() {
    let body = "```js\n// see content/1/index.md\n```\n\n    section 1.1\n\nInline `content/2/index.md` too.\n";
    assert!(targets(body).is_empty());
}

#[test]
fn link_text_is_not_double_counted() {
    let refs = targets("[content/1/index.md](content/1/index.md)\n");
    assert_eq!(refs, vec![(ReferenceKind::Link, "content/1/index.md".to_string())]);
}

#[test]
fn spans_are_shifted_by_base() {
    let body = "Read content/3/index.md now.\n";
    let refs = extract(body, 100);
    assert_eq!(refs.len(), 1);
    assert_eq!(refs[0].span, 105..123);
}

#[test]
fn internal_target_classification() {
    assert!(is_internal_target("../a.md"));
    assert!(is_internal_target("/content/a/"));
    assert!(!is_internal_target("https://example.com"));
    assert!(!is_internal_target("//cdn.example.com/x.js"));
    assert!(!is_internal_target("#anchor"));
    assert!(!is_internal_target(""));
}

#[test]
fn doc_path_normalizes() {
    let path = DocPath::parse("content/./5/../6//index.md");
    assert_eq!(path.to_string(), "content/6/index.md");
    assert_eq!(path.file_name(), Some("index.md"));
    assert_eq!(path.extension(), Some("md"));
    assert_eq!(path.parent().map(|p| p.to_string()).as_deref(), Some("content/6"));
    assert_eq!(DocPath::parse("../../a").to_string(), "a");
    assert!(DocPath::root().is_root());
    assert_eq!(DocPath::parse("content/5").join("../4/index.md").to_string(), "content/4/index.md");
    assert!(DocPath::parse("a/b") < DocPath::parse("a/b/c"));
}
