use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use super::errors::FailureReason;
use super::model::IdentificationResult;
use super::request::IdentificationRequest;
use super::value_objects::{CapturedImage, ImagePayload};

/// Service port for normalizing a captured photo into a transport payload.
///
/// Implementations are pure: the same image always yields the same payload.
pub trait ImagePreprocessor: Send + Sync {
    /// Fails with [`FailureReason::InvalidImage`] when the image cannot be decoded.
    fn prepare(&self, image: &CapturedImage) -> Result<ImagePayload, FailureReason>;
}

/// Service port for the remote recognition service.
///
/// One call is one attempt. Implementations stop working as soon as `cancel`
/// fires and classify every failure into a [`FailureReason`].
#[async_trait]
pub trait RecognitionClient: Send + Sync {
    async fn send(
        &self,
        request: &IdentificationRequest,
        cancel: &CancellationToken,
    ) -> Result<IdentificationResult, FailureReason>;
}
