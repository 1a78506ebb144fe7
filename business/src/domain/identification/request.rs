use std::sync::Arc;
use std::time::Duration;

use super::value_objects::{ImagePayload, RequestId};

/// Per-attempt metadata sent alongside the payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttemptMeta {
    pub correlation_id: RequestId,
    pub attempt: u32,
    pub max_attempts: u32,
    pub timeout: Duration,
}

/// One attempt at identifying a payload. Retries build a new request with
/// the same payload and correlation id and the next attempt number.
#[derive(Debug, Clone)]
pub struct IdentificationRequest {
    payload: Arc<ImagePayload>,
    meta: AttemptMeta,
}

impl IdentificationRequest {
    pub fn new(payload: Arc<ImagePayload>, meta: AttemptMeta) -> Self {
        Self { payload, meta }
    }

    pub fn payload(&self) -> &ImagePayload {
        &self.payload
    }

    pub fn meta(&self) -> &AttemptMeta {
        &self.meta
    }

    pub fn correlation_id(&self) -> RequestId {
        self.meta.correlation_id
    }

    pub fn attempt(&self) -> u32 {
        self.meta.attempt
    }
}
