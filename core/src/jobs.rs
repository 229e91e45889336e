//! Asynchronous job contracts and the queue port.
//!
//! The engine fires jobs and forgets them: enqueue failures are logged by
//! the caller and never escalate into the primary operation's result.
//! Retry, backoff and the worker pool belong to the external job runner.

use crate::appointment::AppointmentStatus;
use crate::ids::{AppointmentId, UserId};
use crate::penalty::CancellationPenalty;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::pin::Pin;
use thiserror::Error;
use uuid::Uuid;

/// Job id of the penalty-processing contract, versioned with the payload
/// shape.
pub const PROCESS_PENALTY_V1: &str = "PROCESS_PENALTY_V1";

/// Errors surfaced by job queue implementations.
#[derive(Error, Debug)]
pub enum QueueError {
    /// The broker rejected or never acknowledged the message.
    #[error("publish failed: {0}")]
    Publish(String),

    /// The job payload could not be serialized.
    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Payload of a `PROCESS_PENALTY_V1` job.
///
/// The consumer applies the financial/reputation consequence, moves the
/// row from `Pending` to `Applied`, and emits a follow-up notification.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PenaltyJob {
    /// Always [`PROCESS_PENALTY_V1`].
    pub job_id: String,
    /// The full penalty record.
    pub penalty: CancellationPenalty,
}

impl PenaltyJob {
    /// Wraps a penalty record in its versioned job envelope.
    #[must_use]
    pub fn new(penalty: CancellationPenalty) -> Self {
        Self {
            job_id: PROCESS_PENALTY_V1.to_string(),
            penalty,
        }
    }
}

/// Addressing and content of a customer notification.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationMetadata {
    /// The appointment the notification is about.
    pub appointment_id: AppointmentId,
    /// The customer being notified.
    pub customer_id: UserId,
    /// The artist on the other side.
    pub artist_id: UserId,
    /// The status that triggered the notification.
    pub status: AppointmentStatus,
    /// Human-readable message selected by the per-status mapping.
    pub message: String,
}

/// Payload of a notification job.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationJob {
    /// Unique id of this dispatch.
    pub job_id: Uuid,
    /// Addressing and content.
    pub metadata: NotificationMetadata,
}

impl NotificationJob {
    /// Creates a notification job with a fresh dispatch id.
    #[must_use]
    pub fn new(metadata: NotificationMetadata) -> Self {
        Self {
            job_id: Uuid::new_v4(),
            metadata,
        }
    }
}

/// A job the engine hands to the queue.
///
/// Serialized untagged: the wire shape is exactly the inner payload's,
/// matching the contracts consumed by the external processors.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Job {
    /// Penalty processing (`PROCESS_PENALTY_V1`).
    ProcessPenalty(PenaltyJob),
    /// Customer notification.
    Notify(NotificationJob),
}

impl Job {
    /// Short label used in logs and metrics.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::ProcessPenalty(_) => "process_penalty",
            Self::Notify(_) => "notification",
        }
    }

    /// Partitioning key: jobs about one appointment stay ordered.
    #[must_use]
    pub fn key(&self) -> String {
        match self {
            Self::ProcessPenalty(job) => job.penalty.appointment_id.to_string(),
            Self::Notify(job) => job.metadata.appointment_id.to_string(),
        }
    }
}

/// Durable job queue port.
///
/// Enqueueing is best-effort from the engine's perspective; there is no
/// transaction spanning the database and the queue.
pub trait JobQueue: Send + Sync {
    /// Enqueues one job.
    fn enqueue(&self, job: Job) -> Pin<Box<dyn Future<Output = Result<(), QueueError>> + Send + '_>>;
}

/// Errors surfaced by the reputation collaborator.
#[derive(Error, Debug)]
#[error("reputation adjustment failed: {0}")]
pub struct ReputationError(pub String);

/// External reputation collaborator.
///
/// Consumed by the penalty processor, not by the engine itself; defined
/// here because the job contract references its semantics.
pub trait ReputationAdjuster: Send + Sync {
    /// Applies a reputation delta to a user.
    fn adjust_reputation(
        &self,
        user_id: UserId,
        points: i32,
        reason: String,
    ) -> Pin<Box<dyn Future<Output = Result<(), ReputationError>> + Send + '_>>;
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn notification_wire_shape_is_camel_case() {
        let job = NotificationJob::new(NotificationMetadata {
            appointment_id: AppointmentId::new(),
            customer_id: UserId::new(),
            artist_id: UserId::new(),
            status: AppointmentStatus::InProgress,
            message: "session started".to_string(),
        });
        let value = serde_json::to_value(Job::Notify(job)).unwrap();
        assert!(value.get("jobId").is_some());
        let metadata = value.get("metadata").unwrap();
        assert_eq!(metadata.get("status").unwrap(), "in_progress");
        assert!(metadata.get("appointmentId").is_some());
    }
}
