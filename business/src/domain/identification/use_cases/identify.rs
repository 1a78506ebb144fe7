use async_trait::async_trait;
use tokio::sync::{broadcast, watch};

use crate::domain::identification::state::IdentificationState;
use crate::domain::identification::value_objects::{CapturedImage, RequestId};

pub struct IdentifyParams {
    pub image: CapturedImage,
}

/// Entry point for identifying a captured photo.
///
/// `identify` and `cancel` are the only mutating operations; everything else
/// is read-only observation of the current request.
#[async_trait]
pub trait IdentifyUseCase: Send + Sync {
    /// Supersedes any in-flight request. Failures are reported through the
    /// observable state, never returned.
    async fn identify(&self, params: IdentifyParams) -> RequestId;

    fn cancel(&self);

    fn current_state(&self) -> IdentificationState;

    fn watch(&self) -> watch::Receiver<IdentificationState>;

    fn subscribe(&self) -> broadcast::Receiver<IdentificationState>;
}
