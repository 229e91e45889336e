//! Redpanda job queue implementation for the Atelier booking engine.
//!
//! Implements the [`JobQueue`] port from `atelier-core` over a
//! Kafka-compatible broker using rdkafka. Jobs are serialized as JSON
//! (the wire shapes defined in `atelier_core::jobs`) and routed by kind:
//! penalty jobs to the penalty topic, notifications to the notification
//! topic. The partition key is the appointment id, so jobs about one
//! appointment stay ordered.
//!
//! Delivery is at-least-once; the external consumers are expected to be
//! idempotent. From the engine's perspective enqueueing is best-effort:
//! the engine logs a failed enqueue and moves on, and the durable state
//! (penalty rows, status logs) is what reconciliation works from.
//!
//! # Example
//!
//! ```no_run
//! use atelier_queue::RedpandaJobQueue;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let queue = RedpandaJobQueue::new(
//!     "localhost:9092",
//!     "atelier-penalties",
//!     "atelier-notifications",
//! )?;
//! # Ok(())
//! # }
//! ```

use atelier_core::jobs::{Job, JobQueue, QueueError};
use rdkafka::config::ClientConfig;
use rdkafka::producer::{FutureProducer, FutureRecord};
use rdkafka::util::Timeout;
use std::env;
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

/// Default producer timeout for a single send.
const SEND_TIMEOUT: Duration = Duration::from_secs(5);

/// Redpanda-backed job queue.
pub struct RedpandaJobQueue {
    producer: FutureProducer,
    penalty_topic: String,
    notification_topic: String,
    timeout: Duration,
}

impl RedpandaJobQueue {
    /// Creates a queue producer against the given brokers.
    ///
    /// # Parameters
    ///
    /// - `brokers`: comma-separated broker addresses (e.g. "localhost:9092")
    /// - `penalty_topic`: destination for `PROCESS_PENALTY_V1` jobs
    /// - `notification_topic`: destination for notification jobs
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::Publish`] when the producer cannot be
    /// created (invalid broker configuration).
    pub fn new(
        brokers: &str,
        penalty_topic: impl Into<String>,
        notification_topic: impl Into<String>,
    ) -> Result<Self, QueueError> {
        let producer = ClientConfig::new()
            .set("bootstrap.servers", brokers)
            .set("message.timeout.ms", "5000")
            .set("acks", "all")
            .create()
            .map_err(|e| QueueError::Publish(format!("failed to create producer: {e}")))?;
        Ok(Self {
            producer,
            penalty_topic: penalty_topic.into(),
            notification_topic: notification_topic.into(),
            timeout: SEND_TIMEOUT,
        })
    }

    /// Creates a queue from `QUEUE_BROKERS`, `PENALTY_TOPIC` and
    /// `NOTIFICATION_TOPIC`, with localhost defaults for development.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::Publish`] when the producer cannot be
    /// created.
    pub fn from_env() -> Result<Self, QueueError> {
        let brokers =
            env::var("QUEUE_BROKERS").unwrap_or_else(|_| "localhost:9092".to_string());
        let penalty_topic =
            env::var("PENALTY_TOPIC").unwrap_or_else(|_| "atelier-penalties".to_string());
        let notification_topic = env::var("NOTIFICATION_TOPIC")
            .unwrap_or_else(|_| "atelier-notifications".to_string());
        Self::new(&brokers, penalty_topic, notification_topic)
    }

    fn topic_for(&self, job: &Job) -> &str {
        match job {
            Job::ProcessPenalty(_) => &self.penalty_topic,
            Job::Notify(_) => &self.notification_topic,
        }
    }
}

impl JobQueue for RedpandaJobQueue {
    fn enqueue(
        &self,
        job: Job,
    ) -> Pin<Box<dyn Future<Output = Result<(), QueueError>> + Send + '_>> {
        Box::pin(async move {
            let payload = serde_json::to_vec(&job)
                .map_err(|e| QueueError::Serialization(e.to_string()))?;
            let key = job.key();
            let topic = self.topic_for(&job);

            let record = FutureRecord::to(topic).payload(&payload).key(key.as_bytes());
            match self.producer.send(record, Timeout::After(self.timeout)).await {
                Ok((partition, offset)) => {
                    tracing::debug!(
                        topic = %topic,
                        partition,
                        offset,
                        kind = %job.kind(),
                        "job published"
                    );
                    Ok(())
                }
                Err((error, _)) => Err(QueueError::Publish(format!("{topic}: {error}"))),
            }
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use atelier_core::appointment::AppointmentStatus;
    use atelier_core::ids::{AppointmentId, UserId};
    use atelier_core::jobs::{NotificationJob, NotificationMetadata};

    #[test]
    fn jobs_route_to_their_topics() {
        // Producer creation is lazy; no broker needed here.
        let queue = RedpandaJobQueue::new("localhost:9092", "penalties", "notifications").unwrap();
        let job = Job::Notify(NotificationJob::new(NotificationMetadata {
            appointment_id: AppointmentId::new(),
            customer_id: UserId::new(),
            artist_id: UserId::new(),
            status: AppointmentStatus::Canceled,
            message: "appointment canceled".to_string(),
        }));
        assert_eq!(queue.topic_for(&job), "notifications");
    }
}
