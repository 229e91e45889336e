//! Persistence ports consumed by the workflow engine.
//!
//! The traits here are deliberately narrow: each names exactly the reads
//! and writes the engine performs, nothing more. Two families of
//! implementations exist:
//!
//! - **`atelier-postgres`** (production): sqlx-backed stores
//! - **in-memory fakes** (in `atelier-testing`): `HashMap` behind a
//!   `tokio::sync::RwLock` for fast, deterministic tests
//!
//! # Dyn Compatibility
//!
//! Methods return explicit `Pin<Box<dyn Future>>` instead of `async fn`
//! so the traits can be used as trait objects (`Arc<dyn AppointmentStore>`)
//! injected into the engine's services.
//!
//! # Concurrency
//!
//! [`AppointmentStore::save`] takes the status the caller read before
//! mutating and must refuse the write when the persisted row has moved on
//! ([`StoreError::StaleWrite`]). This is the optimistic guard that keeps
//! two concurrent cancellations (or a cancellation racing a reschedule)
//! from both passing the "not already canceled" check.

use crate::agenda::{Agenda, BlockedTime};
use crate::appointment::{Appointment, AppointmentStatus};
use crate::ids::{AgendaId, AppointmentId, BlockedTimeId, PenaltyId, QuotationId, UserId};
use crate::penalty::{CancellationPenalty, PenaltyStatus};
use crate::quotation::Quotation;
use chrono::{DateTime, Utc};
use std::future::Future;
use std::pin::Pin;
use thiserror::Error;

/// Errors surfaced by store implementations.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Database connection or query failure.
    #[error("database error: {0}")]
    Database(String),

    /// Persisted data could not be decoded into a domain entity.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// An optimistic write found the row already changed by someone else.
    #[error("stale write: {0}")]
    StaleWrite(String),
}

/// Boxed future returned by store methods.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + Send + 'a>>;

/// Quotation persistence.
pub trait QuotationStore: Send + Sync {
    /// Looks up a quotation by id.
    fn find_by_id(&self, id: QuotationId) -> StoreFuture<'_, Option<Quotation>>;

    /// Inserts a new quotation.
    fn create(&self, quotation: Quotation) -> StoreFuture<'_, ()>;

    /// Persists the current state of an existing quotation.
    fn save(&self, quotation: Quotation) -> StoreFuture<'_, ()>;
}

/// Appointment persistence.
pub trait AppointmentStore: Send + Sync {
    /// Looks up an appointment together with the agenda it belongs to.
    fn find_with_agenda(
        &self,
        id: AppointmentId,
    ) -> StoreFuture<'_, Option<(Appointment, Agenda)>>;

    /// All calendar-blocking (non-canceled) appointments of an agenda
    /// overlapping `[from, until)`.
    fn find_active_between(
        &self,
        agenda_id: AgendaId,
        from: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> StoreFuture<'_, Vec<Appointment>>;

    /// Inserts a new appointment.
    fn create(&self, appointment: Appointment) -> StoreFuture<'_, ()>;

    /// Persists a mutated appointment in a single write.
    ///
    /// `expected_status` is the status the caller read before mutating;
    /// implementations must fail with [`StoreError::StaleWrite`] when the
    /// persisted row no longer carries it.
    fn save(
        &self,
        appointment: Appointment,
        expected_status: AppointmentStatus,
    ) -> StoreFuture<'_, ()>;
}

/// Agenda persistence.
pub trait AgendaStore: Send + Sync {
    /// Looks up an agenda by id.
    fn find_by_id(&self, id: AgendaId) -> StoreFuture<'_, Option<Agenda>>;

    /// Looks up the agenda owned by an artist.
    fn find_by_artist(&self, artist_id: UserId) -> StoreFuture<'_, Option<Agenda>>;

    /// Persists the current state of an agenda.
    fn save(&self, agenda: Agenda) -> StoreFuture<'_, ()>;
}

/// Blocked-time persistence.
pub trait BlockedTimeStore: Send + Sync {
    /// All blocks of an agenda, ordered by start.
    fn find_for_agenda(&self, agenda_id: AgendaId) -> StoreFuture<'_, Vec<BlockedTime>>;

    /// Blocks of an agenda overlapping `[start, end]` under the inclusive
    /// test (`existing.start <= end && existing.end >= start`).
    fn find_overlapping(
        &self,
        agenda_id: AgendaId,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> StoreFuture<'_, Vec<BlockedTime>>;

    /// Inserts a new block.
    fn create(&self, block: BlockedTime) -> StoreFuture<'_, ()>;

    /// Deletes a block scoped to its agenda; returns whether a row was
    /// removed (false when the block is absent or owned by another
    /// agenda).
    fn delete(&self, agenda_id: AgendaId, id: BlockedTimeId) -> StoreFuture<'_, bool>;
}

/// Cancellation-penalty persistence.
pub trait PenaltyStore: Send + Sync {
    /// Inserts a new penalty row.
    fn create(&self, penalty: CancellationPenalty) -> StoreFuture<'_, ()>;

    /// All penalties recorded for an appointment.
    fn find_by_appointment(
        &self,
        appointment_id: AppointmentId,
    ) -> StoreFuture<'_, Vec<CancellationPenalty>>;

    /// Moves a penalty row to a new processing status. Used by the
    /// external processor when the consequence has been enacted.
    fn set_status(&self, id: PenaltyId, status: PenaltyStatus) -> StoreFuture<'_, ()>;
}
