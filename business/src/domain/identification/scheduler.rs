use std::time::Duration;

use super::value_objects::RequestId;

pub type ScheduledTask = Box<dyn FnOnce() + Send + 'static>;

/// Deferred execution bound to a request id.
///
/// Cancelling a request id drops every task scheduled for it that has not
/// run yet.
pub trait RetryScheduler: Send + Sync {
    fn schedule_after(&self, delay: Duration, request_id: RequestId, task: ScheduledTask);

    fn cancel(&self, request_id: RequestId);
}
