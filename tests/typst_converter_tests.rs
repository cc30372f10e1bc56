//! `TypstConverter` against small shell scripts standing in for the compiler.
//! The converter calls `<bin> compile <source> <output>` from inside the
//! render target.
#![cfg(unix)]

mod common;

use certificate_issuer::certificate::{
    compute_eligibility, verify_pdf, CertificateRenderer, DocumentConverter, IssuerProfile,
    RenderFailure, RenderedDocument, TypstConverter,
};
use common::{pdf_with_pages, test_event, test_participant, test_renderer};
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempDir;

struct Fixture {
    dir: TempDir,
    render_root: PathBuf,
}

impl Fixture {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let render_root = dir.path().join("renders");
        fs::create_dir(&render_root).unwrap();
        Self { dir, render_root }
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    /// Write a PDF with `pages` pages next to the scripts.
    fn pdf(&self, name: &str, pages: usize) -> PathBuf {
        let path = self.path(name);
        fs::write(&path, pdf_with_pages(pages)).unwrap();
        path
    }

    fn script(&self, body: &str) -> PathBuf {
        let path = self.path("fake-typst");
        fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    fn converter(&self, script: &Path) -> TypstConverter {
        TypstConverter::new(script).with_work_root(&self.render_root)
    }

    fn leftover_targets(&self) -> usize {
        fs::read_dir(&self.render_root).unwrap().count()
    }
}

fn document(participant_id: i64) -> RenderedDocument {
    let event = test_event(3, 12.0, 3);
    let participant = test_participant(participant_id, 3, "Ana \"Nina\" Souza", &[true, true, false]);
    let eligibility = compute_eligibility(&event, &participant);
    test_renderer().render(&participant, &event, &eligibility)
}

#[tokio::test]
async fn test_successful_conversion_returns_pdf() {
    let fixture = Fixture::new();
    let pdf = fixture.pdf("two-pages.pdf", 2);
    let script = fixture.script(&format!("cp '{}' \"$3\"", pdf.display()));

    let bytes = fixture.converter(&script).convert(&document(1)).await.unwrap();

    assert_eq!(bytes, fs::read(&pdf).unwrap());
    assert_eq!(fixture.leftover_targets(), 0);
}

#[tokio::test]
async fn test_compiler_receives_full_source() {
    let fixture = Fixture::new();
    let pdf = fixture.pdf("two-pages.pdf", 2);
    let captured = fixture.path("captured.typ");
    let script = fixture.script(&format!(
        "[ \"$1\" = compile ] || exit 9\ncp \"$2\" '{}'\ncp '{}' \"$3\"",
        captured.display(),
        pdf.display()
    ));

    fixture.converter(&script).convert(&document(1)).await.unwrap();

    let source = fs::read_to_string(&captured).unwrap();
    assert!(source.starts_with("#set page(paper: \"a4\", flipped: true, margin: 0mm)"));
    assert!(source.contains("// test style"));
    assert!(source.contains(r#"participant: "ANA \"NINA\" SOUZA","#));
    assert!(source.contains(r#"hours: "8","#));
    assert!(source.contains(r#"code: "CERT-1-3","#));
    assert_eq!(source.matches("#pagebreak()").count(), 1);
}

#[tokio::test]
async fn test_compiler_error_carries_stderr() {
    let fixture = Fixture::new();
    let script = fixture.script("echo 'error: unknown variable: cert' >&2\nexit 1");

    let result = fixture.converter(&script).convert(&document(1)).await;

    match result {
        Err(RenderFailure::CompilerExit { code, stderr }) => {
            assert_eq!(code, 1);
            assert_eq!(stderr, "error: unknown variable: cert");
        }
        other => panic!("expected CompilerExit, got {:?}", other),
    }
    assert_eq!(fixture.leftover_targets(), 0);
}

#[tokio::test]
async fn test_missing_output_is_a_read_failure() {
    let fixture = Fixture::new();
    let script = fixture.script("exit 0");

    let result = fixture.converter(&script).convert(&document(1)).await;

    assert!(matches!(result, Err(RenderFailure::ReadPdf(_))));
    assert_eq!(fixture.leftover_targets(), 0);
}

#[tokio::test]
async fn test_non_pdf_output_is_rejected() {
    let fixture = Fixture::new();
    let script = fixture.script("printf 'not a pdf' > \"$3\"");

    let result = fixture.converter(&script).convert(&document(1)).await;

    assert!(matches!(result, Err(RenderFailure::NotAPdf)));
}

#[tokio::test]
async fn test_wrong_page_count_is_rejected() {
    let fixture = Fixture::new();
    let pdf = fixture.pdf("one-page.pdf", 1);
    let script = fixture.script(&format!("cp '{}' \"$3\"", pdf.display()));

    let result = fixture.converter(&script).convert(&document(1)).await;

    assert!(matches!(
        result,
        Err(RenderFailure::PageCount {
            expected: 2,
            actual: 1
        })
    ));
    assert_eq!(fixture.leftover_targets(), 0);
}

#[tokio::test]
async fn test_hung_compiler_times_out() {
    let fixture = Fixture::new();
    let script = fixture.script("exec sleep 5");
    let converter = fixture
        .converter(&script)
        .with_timeout(Duration::from_millis(200));

    let result = converter.convert(&document(1)).await;

    assert!(matches!(result, Err(RenderFailure::Timeout(_))));
    assert_eq!(fixture.leftover_targets(), 0);
}

#[tokio::test]
async fn test_each_conversion_gets_its_own_target() {
    let fixture = Fixture::new();
    let pdf = fixture.pdf("two-pages.pdf", 2);
    let log = fixture.path("dirs.log");
    let script = fixture.script(&format!(
        "pwd >> '{}'\ncp '{}' \"$3\"",
        log.display(),
        pdf.display()
    ));
    let converter = fixture.converter(&script);

    let (first, second) = (document(1), document(2));

    let (a, b) = tokio::join!(converter.convert(&first), converter.convert(&second));
    a.unwrap();
    b.unwrap();

    let dirs: Vec<String> = fs::read_to_string(&log)
        .unwrap()
        .lines()
        .map(str::to_string)
        .collect();
    assert_eq!(dirs.len(), 2);
    assert_ne!(dirs[0], dirs[1]);
    assert_eq!(fixture.leftover_targets(), 0);
}

fn typst_available() -> bool {
    std::process::Command::new("typst")
        .arg("--version")
        .output()
        .map(|output| output.status.success())
        .unwrap_or(false)
}

#[tokio::test]
async fn test_shipped_template_compiles_to_two_pages() {
    if !typst_available() {
        eprintln!("typst not on PATH, skipping");
        return;
    }

    let event = test_event(3, 12.0, 3);
    let participant = test_participant(
        7,
        3,
        "Zé \"] #panic(\"x\") \\ $x$ <lbl> @ref",
        &[true, false, true],
    );
    let renderer = CertificateRenderer::new(IssuerProfile::default()).unwrap();
    let document = renderer.render(&participant, &event, &compute_eligibility(&event, &participant));
    let root = tempfile::tempdir().unwrap();

    let pdf = TypstConverter::default()
        .with_work_root(root.path())
        .convert(&document)
        .await
        .unwrap();

    verify_pdf(&pdf, 2).unwrap();
    assert_eq!(fs::read_dir(root.path()).unwrap().count(), 0);
}
