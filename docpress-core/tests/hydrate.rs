use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use docpress_core::contract::{MockArchiver, MockRenderer};
use docpress_core::error::{HydrateError, JobError, RenderError};
use docpress_core::hydrate::{hydrate, HydrateRequest};
use docpress_core::markdown::GfmConverter;
use docpress_core::pipeline::Pipeline;
use docpress_core::publish::Publisher;
use docpress_core::template::DocumentShell;
use tempfile::tempdir;

type Captured = Arc<Mutex<Vec<(PathBuf, String)>>>;

fn capturing_renderer() -> (MockRenderer, Captured) {
    let captured: Captured = Arc::new(Mutex::new(Vec::new()));
    let sink = captured.clone();
    let mut renderer = MockRenderer::new();
    renderer.expect_render().returning(move |html, output| {
        sink.lock().unwrap().push((output.to_path_buf(), html.to_string()));
        fs::write(output, b"%PDF-stub").map_err(RenderError::Io)
    });
    (renderer, captured)
}

fn request(dir: &Path, template: &str) -> HydrateRequest {
    HydrateRequest {
        template_path: dir.join(template),
        data_path: dir.join("data.json"),
        output_dir: dir.join("out"),
        images_dir: None,
    }
}

#[tokio::test]
async fn renders_one_document_per_entry_in_name_order() {
    let dir = tempdir().unwrap();
    fs::write(
        dir.path().join("letter.html"),
        r#"<h1>Dear {{ Name }}</h1><p>{{ body }}</p><img src="logo.png">"#,
    )
    .unwrap();
    fs::write(dir.path().join("logo.png"), b"PNG").unwrap();
    fs::write(
        dir.path().join("data.json"),
        r#"{"bob": {"Title": "Letter to Bob", "Name": "Bob", "body": "x < y"}, "alice": {"Name": "Alice", "body": "hi"}}"#,
    )
    .unwrap();

    let (renderer, captured) = capturing_renderer();
    let archiver = MockArchiver::new();
    let converter = GfmConverter::new();
    let shell = DocumentShell::new().unwrap();
    let pipeline = Pipeline::new(&converter, &shell, Publisher::new(&renderer, &archiver));

    let report = hydrate(&pipeline, &request(dir.path(), "letter.html"))
        .await
        .unwrap();

    assert!(report.failures.is_empty());
    let paths: Vec<&PathBuf> = report.artifacts.iter().map(|a| &a.path).collect();
    assert_eq!(
        paths,
        vec![&dir.path().join("out/alice.pdf"), &dir.path().join("out/bob.pdf")]
    );

    let docs = captured.lock().unwrap();
    assert!(docs[0].1.contains("<title>alice</title>"), "{}", docs[0].1);
    assert!(docs[1].1.contains("<title>Letter to Bob</title>"), "{}", docs[1].1);
    assert!(docs[1].1.contains("<p>x &lt; y</p>"), "{}", docs[1].1);
    assert!(docs[1].1.contains(r#"<img src="data:image/png;base64,UE5H">"#), "{}", docs[1].1);
}

#[tokio::test]
async fn styled_html_template_is_used_as_is() {
    let dir = tempdir().unwrap();
    fs::write(
        dir.path().join("card.html"),
        "<style>p { color: red }</style><p>{{ value }}</p>",
    )
    .unwrap();
    fs::write(dir.path().join("data.json"), r#"{"one": 1}"#).unwrap();

    let (renderer, captured) = capturing_renderer();
    let archiver = MockArchiver::new();
    let converter = GfmConverter::new();
    let shell = DocumentShell::new().unwrap();
    let pipeline = Pipeline::new(&converter, &shell, Publisher::new(&renderer, &archiver));

    hydrate(&pipeline, &request(dir.path(), "card.html"))
        .await
        .unwrap();

    let docs = captured.lock().unwrap();
    assert_eq!(docs[0].1, "<style>p { color: red }</style><p>1</p>");
}

#[tokio::test]
async fn markdown_template_is_always_wrapped() {
    let dir = tempdir().unwrap();
    fs::write(
        dir.path().join("card.md"),
        "<style>p { color: red }</style>\n\n# {{ Title }}\n\nA & B\n",
    )
    .unwrap();
    fs::write(dir.path().join("data.json"), r#"{"one": {"Title": "Card One"}}"#).unwrap();

    let (renderer, captured) = capturing_renderer();
    let archiver = MockArchiver::new();
    let converter = GfmConverter::new();
    let shell = DocumentShell::new().unwrap();
    let pipeline = Pipeline::new(&converter, &shell, Publisher::new(&renderer, &archiver));

    hydrate(&pipeline, &request(dir.path(), "card.md"))
        .await
        .unwrap();

    let docs = captured.lock().unwrap();
    let html = &docs[0].1;
    assert!(html.starts_with("<!DOCTYPE html>"), "{html}");
    assert!(html.contains("<title>Card One</title>"), "{html}");
    assert!(html.contains(r#"<h1 id="card-one">Card One</h1>"#), "{html}");
}

#[tokio::test]
async fn failed_entry_does_not_stop_the_rest() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("t.html"), "<p>{{ value }}</p>").unwrap();
    fs::write(dir.path().join("data.json"), r#"{"a": "first", "b": "second"}"#).unwrap();

    let mut renderer = MockRenderer::new();
    renderer.expect_render().returning(|_, output| {
        if output.ends_with("a.pdf") {
            Err(RenderError::BrowserNotFound)
        } else {
            fs::write(output, b"%PDF-stub").map_err(RenderError::Io)
        }
    });
    let archiver = MockArchiver::new();
    let converter = GfmConverter::new();
    let shell = DocumentShell::new().unwrap();
    let pipeline = Pipeline::new(&converter, &shell, Publisher::new(&renderer, &archiver));

    let report = hydrate(&pipeline, &request(dir.path(), "t.html"))
        .await
        .unwrap();

    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].name, "a");
    assert_eq!(report.artifacts.len(), 1);
    assert!(dir.path().join("out/b.pdf").is_file());
}

#[tokio::test]
async fn malformed_data_is_fatal() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("t.html"), "<p>{{ value }}</p>").unwrap();
    fs::write(dir.path().join("data.json"), "{not json").unwrap();

    let mut renderer = MockRenderer::new();
    renderer.expect_render().times(0);
    let archiver = MockArchiver::new();
    let converter = GfmConverter::new();
    let shell = DocumentShell::new().unwrap();
    let pipeline = Pipeline::new(&converter, &shell, Publisher::new(&renderer, &archiver));

    let err = hydrate(&pipeline, &request(dir.path(), "t.html"))
        .await
        .unwrap_err();
    assert!(matches!(err, HydrateError::Data { .. }), "{err:?}");
    assert!(!dir.path().join("out").exists());
}

#[tokio::test]
async fn unparsable_template_is_fatal() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("t.html"), "<p>{% if %}</p>").unwrap();
    fs::write(dir.path().join("data.json"), r#"{"a": 1}"#).unwrap();

    let renderer = MockRenderer::new();
    let archiver = MockArchiver::new();
    let converter = GfmConverter::new();
    let shell = DocumentShell::new().unwrap();
    let pipeline = Pipeline::new(&converter, &shell, Publisher::new(&renderer, &archiver));

    let err = hydrate(&pipeline, &request(dir.path(), "t.html"))
        .await
        .unwrap_err();
    assert!(matches!(err, HydrateError::Template { .. }), "{err:?}");
}

#[tokio::test]
async fn entry_names_cannot_escape_the_output_directory() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("t.html"), "<p>{{ value }}</p>").unwrap();
    fs::write(
        dir.path().join("data.json"),
        r#"{"../escape": "no", "sub/dir": "no", "ok": "yes"}"#,
    )
    .unwrap();

    let (renderer, captured) = capturing_renderer();
    let archiver = MockArchiver::new();
    let converter = GfmConverter::new();
    let shell = DocumentShell::new().unwrap();
    let pipeline = Pipeline::new(&converter, &shell, Publisher::new(&renderer, &archiver));

    let report = hydrate(&pipeline, &request(dir.path(), "t.html"))
        .await
        .unwrap();

    let failed: Vec<&str> = report.failures.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(failed, vec!["../escape", "sub/dir"]);
    assert!(report
        .failures
        .iter()
        .all(|f| matches!(f.error, JobError::InvalidEntryName(_))));
    assert_eq!(report.artifacts.len(), 1);
    assert_eq!(captured.lock().unwrap().len(), 1);
    assert!(!dir.path().join("escape.pdf").exists());
    assert!(dir.path().join("out/ok.pdf").is_file());
}
