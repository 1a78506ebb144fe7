use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::{broadcast, watch};
use tokio_util::sync::CancellationToken;

use super::errors::FailureReason;
use super::model::IdentificationResult;
use super::retry::{RetryController, RetryDecision};
use super::state::IdentificationState;
use super::value_objects::RequestId;

const MIN_TRANSITION_BUFFER: usize = 64;
const MAX_TRANSITION_BUFFER: usize = 4096;

/// Everything an attempt needs to run and to report back.
#[derive(Debug, Clone)]
pub struct AttemptTicket {
    pub request_id: RequestId,
    pub attempt: u32,
    pub max_attempts: u32,
    pub cancel: CancellationToken,
}

#[derive(Debug)]
pub struct StartedRequest {
    pub request_id: RequestId,
    pub superseded: Option<RequestId>,
}

/// What the caller must do after an attempt result was applied.
#[derive(Debug)]
pub enum AttemptOutcome {
    /// The result belonged to a superseded, cancelled or finished attempt.
    Ignored,
    Succeeded,
    Cancelled,
    Retry {
        ticket: AttemptTicket,
        delay: Duration,
        reason: FailureReason,
    },
    Failed(FailureReason),
}

struct ActiveRequest {
    id: RequestId,
    attempt: u32,
    cancel: CancellationToken,
}

/// Single owner of the current request id and the observable state.
///
/// Every transition happens under one lock and is published before the lock
/// is released, so subscribers see transitions exactly once and in order.
pub struct IdentificationStateMachine {
    controller: RetryController,
    active: Mutex<Option<ActiveRequest>>,
    state_tx: watch::Sender<IdentificationState>,
    transitions_tx: broadcast::Sender<IdentificationState>,
}

impl IdentificationStateMachine {
    pub fn new(controller: RetryController) -> Self {
        let (state_tx, _) = watch::channel(IdentificationState::Idle);
        // Room for several complete requests: Processing, every Retrying step
        // and the terminal state.
        let per_request = controller.max_attempts() as usize + 1;
        let capacity = per_request
            .saturating_mul(4)
            .clamp(MIN_TRANSITION_BUFFER, MAX_TRANSITION_BUFFER);
        let (transitions_tx, _) = broadcast::channel(capacity);
        Self {
            controller,
            active: Mutex::new(None),
            state_tx,
            transitions_tx,
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.controller.max_attempts()
    }

    pub fn state(&self) -> IdentificationState {
        self.state_tx.borrow().clone()
    }

    /// Latest state; intermediate transitions may be coalesced.
    pub fn watch(&self) -> watch::Receiver<IdentificationState> {
        self.state_tx.subscribe()
    }

    /// Every transition published after this call, in order.
    ///
    /// The stream is bounded. A receiver that falls behind by more than a few
    /// complete requests gets `RecvError::Lagged` and should resync from
    /// [`state`](Self::state).
    pub fn subscribe(&self) -> broadcast::Receiver<IdentificationState> {
        self.transitions_tx.subscribe()
    }

    pub fn is_current(&self, request_id: RequestId) -> bool {
        self.lock()
            .as_ref()
            .is_some_and(|active| active.id == request_id && !active.cancel.is_cancelled())
    }

    /// Cancels whatever is in flight and makes a new request current.
    ///
    /// The request owns the state from here on, including while its image is
    /// still being prepared. Call [`first_attempt`](Self::first_attempt) or
    /// [`reject`](Self::reject) once preprocessing is done.
    pub fn start(&self) -> StartedRequest {
        let mut active = self.lock();
        let superseded = Self::take_and_cancel(&mut active);

        let request_id = RequestId::new();
        *active = Some(ActiveRequest {
            id: request_id,
            attempt: 1,
            cancel: CancellationToken::new(),
        });

        self.publish(IdentificationState::Processing);
        StartedRequest {
            request_id,
            superseded,
        }
    }

    /// Ticket for attempt 1, or `None` when the request was superseded or
    /// cancelled while its image was being prepared.
    pub fn first_attempt(&self, request_id: RequestId) -> Option<AttemptTicket> {
        let active = self.lock();
        active
            .as_ref()
            .filter(|request| {
                request.id == request_id && request.attempt == 1 && !request.cancel.is_cancelled()
            })
            .map(|request| self.ticket_for(request))
    }

    /// Ends a request that failed before any attempt could run. Returns
    /// `false` when the request is no longer current.
    pub fn reject(&self, request_id: RequestId, reason: FailureReason) -> bool {
        let mut active = self.lock();
        let is_current = active
            .as_ref()
            .is_some_and(|request| request.id == request_id && request.attempt == 1);
        if !is_current {
            return false;
        }

        *active = None;
        self.publish(IdentificationState::Error(reason));
        true
    }

    /// Returns the cancelled request id, or `None` when nothing was in flight.
    pub fn cancel(&self) -> Option<RequestId> {
        let mut active = self.lock();
        let cancelled = Self::take_and_cancel(&mut active)?;

        self.publish(IdentificationState::Idle);
        Some(cancelled)
    }

    pub fn on_attempt_result(
        &self,
        request_id: RequestId,
        attempt: u32,
        result: Result<IdentificationResult, FailureReason>,
    ) -> AttemptOutcome {
        let mut active = self.lock();
        let is_current = active.as_ref().is_some_and(|request| {
            request.id == request_id
                && request.attempt == attempt
                && !request.cancel.is_cancelled()
        });
        if !is_current {
            return AttemptOutcome::Ignored;
        }

        match result {
            Ok(result) => {
                *active = None;
                self.publish(IdentificationState::Success(Box::new(result)));
                AttemptOutcome::Succeeded
            }
            Err(FailureReason::Cancelled) => {
                Self::take_and_cancel(&mut active);
                self.publish(IdentificationState::Idle);
                AttemptOutcome::Cancelled
            }
            Err(reason) => match self.controller.should_retry(&reason, attempt) {
                RetryDecision::RetryAfter(delay) => {
                    let Some(request) = active.as_mut() else {
                        return AttemptOutcome::Ignored;
                    };
                    request.attempt += 1;
                    let ticket = self.ticket_for(request);

                    self.publish(IdentificationState::Retrying {
                        attempt: ticket.attempt,
                        max_attempts: ticket.max_attempts,
                    });
                    AttemptOutcome::Retry {
                        ticket,
                        delay,
                        reason,
                    }
                }
                RetryDecision::Stop => {
                    *active = None;
                    self.publish(IdentificationState::Error(reason));
                    AttemptOutcome::Failed(reason)
                }
            },
        }
    }

    fn lock(&self) -> MutexGuard<'_, Option<ActiveRequest>> {
        self.active.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn take_and_cancel(active: &mut Option<ActiveRequest>) -> Option<RequestId> {
        active.take().map(|request| {
            request.cancel.cancel();
            request.id
        })
    }

    fn ticket_for(&self, request: &ActiveRequest) -> AttemptTicket {
        AttemptTicket {
            request_id: request.id,
            attempt: request.attempt,
            max_attempts: self.max_attempts(),
            cancel: request.cancel.clone(),
        }
    }

    fn publish(&self, state: IdentificationState) {
        self.state_tx.send_replace(state.clone());
        // No subscribers is fine; the watch channel still holds the state.
        let _ = self.transitions_tx.send(state);
    }
}
