//! Certificate pipeline: eligibility, Typst templating, PDF conversion,
//! batch orchestration and ZIP packing.
//!
//! - `eligibility` - attendance to credited hours
//! - `template` - two-page Typst document per participant
//! - `engine` - Typst CLI converter with per-conversion render targets
//! - `batch` - batch runs with progress, cancellation and failure isolation
//! - `archive` - in-memory ZIP of the generated PDFs
//! - `issue` / `preview` - single certificates and the eligibility table

pub mod archive;
pub mod batch;
pub mod common;
pub mod eligibility;
pub mod engine;
pub mod issue;
pub mod preview;
pub mod template;
pub mod traits;
pub mod validation;

pub use archive::{pack, ArchiveError};
pub use batch::{BatchError, BatchFailure, BatchOutcome, BatchRunner};
pub use eligibility::{compute_eligibility, EligibilityResult};
pub use engine::{verify_pdf, PageGeometry, TypstConverter};
pub use issue::{issue_certificate, IssueError};
pub use preview::{preview, EligibilityPreview, IssueStatus, PreviewRow};
pub use template::{CertificateRenderer, IssuerProfile, RenderedDocument};
pub use traits::{DocumentConverter, Validator};
pub use validation::{ValidationError, ValidationErrors};

use std::time::Duration;
use thiserror::Error;

/// Errors raised while setting up the certificate renderer.
#[derive(Debug, Error)]
pub enum CertificateError {
    #[error("failed to load certificate style: {0}")]
    TemplateIo(#[source] std::io::Error),
}

/// Why one certificate could not be converted to PDF.
#[derive(Debug, Error)]
pub enum RenderFailure {
    #[error("failed to create render directory: {0}")]
    TempDir(#[source] std::io::Error),
    #[error("failed to write Typst source: {0}")]
    WriteSource(#[source] std::io::Error),
    #[error("Typst CLI execution failed: {0}")]
    CompilerIo(#[source] std::io::Error),
    #[error("Typst CLI exited with status {code}: {stderr}")]
    CompilerExit { code: i32, stderr: String },
    #[error("Typst CLI did not finish within {0:?}")]
    Timeout(Duration),
    #[error("failed to read generated PDF: {0}")]
    ReadPdf(#[source] std::io::Error),
    #[error("compiler output is not a PDF")]
    NotAPdf,
    #[error("generated PDF is unreadable: {0}")]
    CorruptPdf(String),
    #[error("generated PDF has {actual} page(s), expected {expected}")]
    PageCount { expected: usize, actual: usize },
    #[error("{0}")]
    Other(String),
}

/// One participant's PDF, named for the archive.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedFile {
    pub file_name: String,
    pub bytes: Vec<u8>,
}
