//! Traits at the seams of the certificate pipeline.

use async_trait::async_trait;

use super::template::RenderedDocument;
use super::validation::ValidationErrors;
use super::RenderFailure;

/// Trait for validating records before they enter the pipeline.
pub trait Validator {
    /// Validate the state of the object, reporting every problem found.
    fn validate(&self) -> Result<(), ValidationErrors>;
}

/// Turns one rendered certificate into PDF bytes.
///
/// Implementations must not let state from one conversion reach the next:
/// every call works in its own render target.
#[async_trait]
pub trait DocumentConverter: Send + Sync {
    async fn convert(&self, document: &RenderedDocument) -> Result<Vec<u8>, RenderFailure>;
}
