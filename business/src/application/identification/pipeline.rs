use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{broadcast, watch};

use crate::domain::identification::errors::FailureReason;
use crate::domain::identification::model::IdentificationResult;
use crate::domain::identification::request::{AttemptMeta, IdentificationRequest};
use crate::domain::identification::retry::RetryController;
use crate::domain::identification::scheduler::RetryScheduler;
use crate::domain::identification::services::{ImagePreprocessor, RecognitionClient};
use crate::domain::identification::state::IdentificationState;
use crate::domain::identification::state_machine::{
    AttemptOutcome, AttemptTicket, IdentificationStateMachine,
};
use crate::domain::identification::use_cases::identify::{IdentifyParams, IdentifyUseCase};
use crate::domain::identification::value_objects::{ImagePayload, RequestId};
use crate::domain::logger::Logger;

pub const DEFAULT_ATTEMPT_TIMEOUT: Duration = Duration::from_secs(30);

/// Wires preprocessing, the recognition client, the retry controller and the
/// state machine into the identification pipeline.
pub struct IdentifyUseCaseImpl {
    inner: Arc<PipelineInner>,
}

pub struct IdentifyUseCaseDeps {
    pub preprocessor: Arc<dyn ImagePreprocessor>,
    pub client: Arc<dyn RecognitionClient>,
    pub scheduler: Arc<dyn RetryScheduler>,
    pub controller: RetryController,
    pub attempt_timeout: Duration,
    pub logger: Arc<dyn Logger>,
}

struct PipelineInner {
    preprocessor: Arc<dyn ImagePreprocessor>,
    client: Arc<dyn RecognitionClient>,
    scheduler: Arc<dyn RetryScheduler>,
    state_machine: IdentificationStateMachine,
    attempt_timeout: Duration,
    logger: Arc<dyn Logger>,
}

impl IdentifyUseCaseImpl {
    pub fn new(deps: IdentifyUseCaseDeps) -> Self {
        Self {
            inner: Arc::new(PipelineInner {
                preprocessor: deps.preprocessor,
                client: deps.client,
                scheduler: deps.scheduler,
                state_machine: IdentificationStateMachine::new(deps.controller),
                attempt_timeout: deps.attempt_timeout,
                logger: deps.logger,
            }),
        }
    }
}

#[async_trait]
impl IdentifyUseCase for IdentifyUseCaseImpl {
    async fn identify(&self, params: IdentifyParams) -> RequestId {
        let inner = &self.inner;

        // Claim the state before preprocessing so a later identify or cancel
        // wins over this one.
        let started = inner.state_machine.start();
        let request_id = started.request_id;
        if let Some(superseded) = started.superseded {
            inner.scheduler.cancel(superseded);
            inner
                .logger
                .info(&format!("Identification {} superseded", superseded));
        }

        let preprocessor = inner.preprocessor.clone();
        let image = params.image;
        let prepared = tokio::task::spawn_blocking(move || preprocessor.prepare(&image))
            .await
            .unwrap_or_else(|e| {
                inner
                    .logger
                    .error(&format!("Image preprocessing aborted: {}", e));
                Err(FailureReason::InvalidImage)
            });

        match prepared {
            Ok(payload) => {
                let Some(ticket) = inner.state_machine.first_attempt(request_id) else {
                    inner.logger.debug(&format!(
                        "Identification {} dropped after preprocessing, no longer current",
                        request_id
                    ));
                    return request_id;
                };

                inner.logger.info(&format!(
                    "Identification {} started ({}x{} {}, {} bytes)",
                    request_id,
                    payload.width(),
                    payload.height(),
                    payload.mime_type(),
                    payload.bytes().len()
                ));

                PipelineInner::launch(inner.clone(), Arc::new(payload), ticket);
            }
            Err(reason) => {
                if inner.state_machine.reject(request_id, reason) {
                    inner.logger.warn(&format!(
                        "Identification {} rejected before upload: {}",
                        request_id, reason
                    ));
                } else {
                    inner.logger.debug(&format!(
                        "Identification {} failed preprocessing after it was superseded",
                        request_id
                    ));
                }
            }
        }

        request_id
    }

    fn cancel(&self) {
        if let Some(cancelled) = self.inner.state_machine.cancel() {
            self.inner.scheduler.cancel(cancelled);
            self.inner
                .logger
                .info(&format!("Identification {} cancelled", cancelled));
        }
    }

    fn current_state(&self) -> IdentificationState {
        self.inner.state_machine.state()
    }

    fn watch(&self) -> watch::Receiver<IdentificationState> {
        self.inner.state_machine.watch()
    }

    fn subscribe(&self) -> broadcast::Receiver<IdentificationState> {
        self.inner.state_machine.subscribe()
    }
}

impl PipelineInner {
    /// Runs one attempt on a background task.
    fn launch(inner: Arc<Self>, payload: Arc<ImagePayload>, ticket: AttemptTicket) {
        tokio::spawn(async move {
            let request = IdentificationRequest::new(
                payload.clone(),
                AttemptMeta {
                    correlation_id: ticket.request_id,
                    attempt: ticket.attempt,
                    max_attempts: ticket.max_attempts,
                    timeout: inner.attempt_timeout,
                },
            );

            inner.logger.debug(&format!(
                "Identification {} attempt {}/{}",
                ticket.request_id, ticket.attempt, ticket.max_attempts
            ));

            let result = tokio::select! {
                biased;
                _ = ticket.cancel.cancelled() => return,
                sent = tokio::time::timeout(
                    inner.attempt_timeout,
                    inner.client.send(&request, &ticket.cancel),
                ) => sent.unwrap_or(Err(FailureReason::Network)),
            };

            inner.complete(payload, ticket, result);
        });
    }

    fn complete(
        self: Arc<Self>,
        payload: Arc<ImagePayload>,
        ticket: AttemptTicket,
        result: Result<IdentificationResult, FailureReason>,
    ) {
        let request_id = ticket.request_id;
        let attempt = ticket.attempt;
        let summary = result
            .as_ref()
            .ok()
            .map(|r| format!("{} ({})", r.name, r.confidence));

        match self
            .state_machine
            .on_attempt_result(request_id, attempt, result)
        {
            AttemptOutcome::Ignored => {
                self.logger.debug(&format!(
                    "Discarded stale result for identification {} attempt {}",
                    request_id, attempt
                ));
            }
            AttemptOutcome::Succeeded => {
                if let Some(summary) = summary {
                    self.logger.info(&format!(
                        "Identification {} succeeded: {}",
                        request_id, summary
                    ));
                }
            }
            AttemptOutcome::Cancelled => {
                self.logger
                    .info(&format!("Identification {} cancelled by client", request_id));
            }
            AttemptOutcome::Failed(reason) => {
                self.logger.error(&format!(
                    "Identification {} failed on attempt {}: {}",
                    request_id, attempt, reason
                ));
            }
            AttemptOutcome::Retry {
                ticket: next,
                delay,
                reason,
            } => {
                self.logger.warn(&format!(
                    "Identification {} attempt {} failed ({}), retrying in {:?} ({}/{})",
                    request_id, attempt, reason, delay, next.attempt, next.max_attempts
                ));

                let inner = self.clone();
                self.scheduler.schedule_after(
                    delay,
                    request_id,
                    Box::new(move || {
                        if inner.state_machine.is_current(next.request_id) {
                            PipelineInner::launch(inner, payload, next);
                        }
                    }),
                );
            }
        }
    }
}
