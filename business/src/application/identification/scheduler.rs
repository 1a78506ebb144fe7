use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::task::JoinHandle;

use crate::domain::identification::scheduler::{RetryScheduler, ScheduledTask};
use crate::domain::identification::value_objects::RequestId;

/// Runs scheduled retries on the tokio timer. Must be used inside a runtime.
#[derive(Default)]
pub struct TokioRetryScheduler {
    pending: Mutex<HashMap<RequestId, Vec<JoinHandle<()>>>>,
}

impl TokioRetryScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of scheduled tasks that have not finished yet.
    pub fn pending(&self) -> usize {
        let mut pending = self.lock();
        Self::prune(&mut pending);
        pending.values().map(Vec::len).sum()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<RequestId, Vec<JoinHandle<()>>>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn prune(pending: &mut HashMap<RequestId, Vec<JoinHandle<()>>>) {
        pending.retain(|_, handles| {
            handles.retain(|handle| !handle.is_finished());
            !handles.is_empty()
        });
    }
}

impl RetryScheduler for TokioRetryScheduler {
    fn schedule_after(&self, delay: Duration, request_id: RequestId, task: ScheduledTask) {
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            task();
        });

        let mut pending = self.lock();
        Self::prune(&mut pending);
        pending.entry(request_id).or_default().push(handle);
    }

    fn cancel(&self, request_id: RequestId) {
        if let Some(handles) = self.lock().remove(&request_id) {
            for handle in handles {
                handle.abort();
            }
        }
    }
}

impl Drop for TokioRetryScheduler {
    fn drop(&mut self) {
        for handles in self.lock().values() {
            for handle in handles {
                handle.abort();
            }
        }
    }
}
