//! Typst rendering engine.
//!
//! Writes a certificate's Typst source into a fresh temporary directory,
//! invokes the compiler and reads back the PDF. The directory is the render
//! target of exactly one conversion and is removed on every exit path.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tempfile::TempDir;
use tokio::process::Command;

use super::template::RenderedDocument;
use super::traits::DocumentConverter;
use super::RenderFailure;

const SOURCE_FILE: &str = "certificado.typ";
const OUTPUT_FILE: &str = "certificado.pdf";
const PAGES_PER_CERTIFICATE: usize = 2;

/// Page setup applied to every certificate.
#[derive(Debug, Clone, PartialEq)]
pub struct PageGeometry {
    pub paper: String,
    pub landscape: bool,
    pub margin_mm: f32,
}

impl Default for PageGeometry {
    fn default() -> Self {
        Self {
            paper: "a4".to_string(),
            landscape: true,
            margin_mm: 0.0,
        }
    }
}

impl PageGeometry {
    pub fn set_rule(&self) -> String {
        format!(
            "#set page(paper: \"{}\", flipped: {}, margin: {}mm)\n",
            self.paper, self.landscape, self.margin_mm
        )
    }
}

/// Full Typst source: geometry, style, bindings, front, forced break, back.
pub fn compose_source(document: &RenderedDocument, geometry: &PageGeometry) -> String {
    let mut source = geometry.set_rule();
    source.push_str(&document.style);
    source.push('\n');
    source.push_str(&document.bindings);
    source.push('\n');
    source.push_str(&document.front);
    source.push_str("\n#pagebreak()\n");
    source.push_str(&document.back);
    source
}

/// Temporary directory owned by one conversion.
struct RenderTarget {
    dir: TempDir,
}

impl RenderTarget {
    fn acquire(root: Option<&Path>) -> Result<Self, RenderFailure> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("certificado-");
        let dir = match root {
            Some(root) => builder.tempdir_in(root),
            None => builder.tempdir(),
        }
        .map_err(RenderFailure::TempDir)?;

        log::debug!("Acquired render target {}", dir.path().display());
        Ok(Self { dir })
    }

    fn path(&self) -> &Path {
        self.dir.path()
    }
}

impl Drop for RenderTarget {
    fn drop(&mut self) {
        log::debug!("Releasing render target {}", self.dir.path().display());
    }
}

/// Converter backed by the `typst` command-line compiler.
#[derive(Debug, Clone)]
pub struct TypstConverter {
    binary: PathBuf,
    geometry: PageGeometry,
    timeout: Duration,
    work_root: Option<PathBuf>,
}

impl Default for TypstConverter {
    fn default() -> Self {
        Self::new("typst")
    }
}

impl TypstConverter {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
            geometry: PageGeometry::default(),
            timeout: Duration::from_secs(60),
            work_root: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Create render targets under `root` instead of the system temp dir.
    pub fn with_work_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.work_root = Some(root.into());
        self
    }

    pub fn geometry(&self) -> &PageGeometry {
        &self.geometry
    }

    async fn compile(&self, target: &RenderTarget, source: &str) -> Result<Vec<u8>, RenderFailure> {
        let source_path = target.path().join(SOURCE_FILE);
        let output_path = target.path().join(OUTPUT_FILE);

        tokio::fs::write(&source_path, source)
            .await
            .map_err(RenderFailure::WriteSource)?;

        let child = Command::new(&self.binary)
            .arg("compile")
            .arg(&source_path)
            .arg(&output_path)
            .current_dir(target.path())
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(RenderFailure::CompilerIo)?;

        let output = tokio::time::timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| RenderFailure::Timeout(self.timeout))?
            .map_err(RenderFailure::CompilerIo)?;

        if !output.status.success() {
            return Err(RenderFailure::CompilerExit {
                code: output.status.code().unwrap_or(-1),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let pdf = tokio::fs::read(&output_path)
            .await
            .map_err(RenderFailure::ReadPdf)?;
        verify_pdf(&pdf, PAGES_PER_CERTIFICATE)?;
        Ok(pdf)
    }
}

#[async_trait]
impl DocumentConverter for TypstConverter {
    async fn convert(&self, document: &RenderedDocument) -> Result<Vec<u8>, RenderFailure> {
        let source = compose_source(document, &self.geometry);
        let target = RenderTarget::acquire(self.work_root.as_deref())?;

        let result = self.compile(&target, &source).await;
        drop(target);

        if let Err(ref e) = result {
            log::debug!("Conversion of {} failed: {}", document.code, e);
        }
        result
    }
}

/// Reject anything that is not a PDF with exactly `expected_pages` pages.
pub fn verify_pdf(data: &[u8], expected_pages: usize) -> Result<(), RenderFailure> {
    if !data.starts_with(b"%PDF") {
        return Err(RenderFailure::NotAPdf);
    }

    let document =
        lopdf::Document::load_mem(data).map_err(|e| RenderFailure::CorruptPdf(e.to_string()))?;
    let pages = document.get_pages().len();
    if pages != expected_pages {
        return Err(RenderFailure::PageCount {
            expected: expected_pages,
            actual: pages,
        });
    }
    Ok(())
}
