//! A job queue that records instead of publishing.

use atelier_core::jobs::{Job, JobQueue, QueueError};
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// Captures every enqueued job and can simulate a broker outage.
///
/// Cancellation and lifecycle tests assert two things through this fake:
/// which jobs were fired, and that a dispatch failure never surfaces in
/// the primary operation's result.
#[derive(Clone, Default)]
pub struct RecordingJobQueue {
    sent: Arc<Mutex<Vec<Job>>>,
    failing: Arc<AtomicBool>,
}

impl RecordingJobQueue {
    /// Creates an empty recording queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything enqueued so far, in order.
    ///
    /// # Panics
    ///
    /// Panics if a previous test body panicked while holding the lock.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn enqueued(&self) -> Vec<Job> {
        self.sent.lock().expect("queue lock poisoned").clone()
    }

    /// When set, every enqueue fails with [`QueueError::Publish`].
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

impl JobQueue for RecordingJobQueue {
    #[allow(clippy::expect_used)]
    fn enqueue(&self, job: Job) -> Pin<Box<dyn Future<Output = Result<(), QueueError>> + Send + '_>> {
        Box::pin(async move {
            if self.failing.load(Ordering::SeqCst) {
                return Err(QueueError::Publish("injected broker outage".to_string()));
            }
            self.sent.lock().expect("queue lock poisoned").push(job);
            Ok(())
        })
    }
}
