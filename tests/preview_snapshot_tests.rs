//! Preview documents for the course's framework code.

use std::fs;

use proctor::preview::PreviewStatus;
use proctor::{Engine, IsolatedDocument, PreviewTemplate};

fn fixture(name: &str) -> String {
    fs::read_to_string(format!("tests/fixtures/lessons/{name}")).expect("fixture")
}

fn preview(learner: &str, template: &PreviewTemplate) -> IsolatedDocument {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .expect("runtime");
    runtime.block_on(Engine::default().render_preview(learner, template))
}

/// The `<body>` contents, without the fixed head.
fn body(html: &str) -> &str {
    let start = html.find("<body>").map_or(0, |i| i + "<body>".len());
    let end = html.rfind("</body>").unwrap_or(html.len());
    html[start..end].trim()
}

#[test]
fn test_complete_page_renders_static_markup() {
    let template = PreviewTemplate::default()
        .with_prelude(fixture("step5.solution.js"))
        .with_entry("appTree");
    let doc = preview(&fixture("step6.solution.js"), &template);

    assert_eq!(doc.status, PreviewStatus::Rendered);
    insta::assert_snapshot!(body(&doc.html), @r#"<div id="root"><div><h1>Welcome!</h1><p>Create your h1, p, a, and button elements!</p><a href="https://example.com" target="_blank">Example Link</a><button>Click me</button></div></div>"#);
    assert!(doc.html.contains("default-src 'none'"));
}

#[test]
fn test_framework_without_entry_renders_success_tree() {
    let doc = preview(&fixture("step5.solution.js"), &PreviewTemplate::default());
    assert_eq!(doc.status, PreviewStatus::Rendered);
    insta::assert_snapshot!(body(&doc.html), @r#"<div id="root"><div class="success"><h1>Framework Working!</h1><p>Your createElement and render functions are working correctly.</p></div></div>"#);
}

#[test]
fn test_partial_framework_gets_the_note() {
    let doc = preview(&fixture("step1.framework.js"), &PreviewTemplate::default());
    assert_eq!(doc.status, PreviewStatus::Note);
    insta::assert_snapshot!(body(&doc.html), @r#"<div id="root"><div class="error"><strong>Note:</strong> This preview works best when you have createElement and render functions. Continue building your framework!</div></div>"#);
}

#[test]
fn test_rejected_code_shows_only_the_diagnostic() {
    let doc = preview(
        "document.body.innerHTML = '<img src=x onerror=alert(1)>'",
        &PreviewTemplate::default(),
    );
    assert_eq!(doc.status, PreviewStatus::Rejected);
    assert!(!doc.html.contains("<img"));
    assert!(doc.html.contains("Code validation failed:"));
    assert!(doc.html.contains("document.body"));
}
