//! Agenda settings management: working hours, availability flags and
//! blocked time.

use atelier_core::agenda::{Agenda, BlockedTime, WorkingDays, WorkingHours};
use atelier_core::error::BookingError;
use atelier_core::ids::{AgendaId, BlockedTimeId};
use atelier_core::store::{AgendaStore, BlockedTimeStore};
use chrono::{DateTime, NaiveTime, Utc};
use std::sync::Arc;

/// The agenda settings service.
pub struct AgendaSettings {
    agendas: Arc<dyn AgendaStore>,
    blocked_times: Arc<dyn BlockedTimeStore>,
}

impl AgendaSettings {
    /// Creates the settings service over its ports.
    #[must_use]
    pub fn new(agendas: Arc<dyn AgendaStore>, blocked_times: Arc<dyn BlockedTimeStore>) -> Self {
        Self {
            agendas,
            blocked_times,
        }
    }

    /// Replaces an agenda's working hours and working days.
    ///
    /// # Errors
    ///
    /// - [`BookingError::BadRequest`] when `end` is not after `start`
    /// - [`BookingError::NotFound`] when the agenda does not exist
    /// - [`BookingError::Store`] when persistence fails
    pub async fn set_working_hours(
        &self,
        agenda_id: AgendaId,
        start: NaiveTime,
        end: NaiveTime,
        days: WorkingDays,
    ) -> Result<Agenda, BookingError> {
        let hours = WorkingHours::new(start, end)?;
        let mut agenda = self.find(agenda_id).await?;
        agenda.hours = hours;
        agenda.working_days = days;
        self.agendas.save(agenda.clone()).await?;
        tracing::info!(agenda_id = %agenda_id, "working hours updated");
        Ok(agenda)
    }

    /// Flips the agenda's `open` (accepting new appointments) and
    /// `public` (visible to customers) flags.
    ///
    /// # Errors
    ///
    /// - [`BookingError::NotFound`] when the agenda does not exist
    /// - [`BookingError::Store`] when persistence fails
    pub async fn set_availability(
        &self,
        agenda_id: AgendaId,
        open: bool,
        public: bool,
    ) -> Result<Agenda, BookingError> {
        let mut agenda = self.find(agenda_id).await?;
        agenda.open = open;
        agenda.public = public;
        self.agendas.save(agenda.clone()).await?;
        tracing::info!(agenda_id = %agenda_id, open, public, "agenda availability updated");
        Ok(agenda)
    }

    /// Declares a blocked interval during which nothing may be booked.
    ///
    /// Two blocks of one agenda may never overlap, under the inclusive
    /// test: full containment and shared endpoints both count.
    ///
    /// # Errors
    ///
    /// - [`BookingError::NotFound`] when the agenda does not exist
    /// - [`BookingError::BadRequest`] when `end` is not after `start`,
    ///   or the interval overlaps an existing block
    /// - [`BookingError::Store`] when persistence fails
    pub async fn create_blocked_time(
        &self,
        agenda_id: AgendaId,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        reason: Option<String>,
    ) -> Result<BlockedTime, BookingError> {
        self.find(agenda_id).await?;
        let block = BlockedTime::new(agenda_id, start, end, reason)?;
        let overlapping = self
            .blocked_times
            .find_overlapping(agenda_id, start, end)
            .await?;
        if !overlapping.is_empty() {
            return Err(BookingError::bad_request(
                "blocked time overlaps an existing blocked interval",
            ));
        }
        self.blocked_times.create(block.clone()).await?;
        tracing::info!(agenda_id = %agenda_id, block_id = %block.id, "blocked time created");
        Ok(block)
    }

    /// Removes a blocked interval, scoped to its agenda.
    ///
    /// # Errors
    ///
    /// - [`BookingError::NotFound`] when the block is absent or belongs
    ///   to a different agenda
    /// - [`BookingError::Store`] when persistence fails
    pub async fn delete_blocked_time(
        &self,
        agenda_id: AgendaId,
        id: BlockedTimeId,
    ) -> Result<(), BookingError> {
        if self.blocked_times.delete(agenda_id, id).await? {
            tracing::info!(agenda_id = %agenda_id, block_id = %id, "blocked time deleted");
            Ok(())
        } else {
            Err(BookingError::not_found("BlockedTime", id))
        }
    }

    async fn find(&self, agenda_id: AgendaId) -> Result<Agenda, BookingError> {
        self.agendas
            .find_by_id(agenda_id)
            .await?
            .ok_or_else(|| BookingError::not_found("Agenda", agenda_id))
    }
}
