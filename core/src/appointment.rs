//! Appointment entity and its append-only status log.

use crate::actor::Actor;
use crate::error::BookingError;
use crate::ids::{AgendaId, AppointmentId, QuotationId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use smallvec::{smallvec, SmallVec};
use std::fmt;

/// Lifecycle status of an appointment.
///
/// `Reviewed` and `Canceled` are terminal. The reachable moves between
/// statuses are owned by the lifecycle state machine in `atelier-engine`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    /// Booked and waiting for the session to start.
    Scheduled,
    /// The session is running.
    InProgress,
    /// Moved to a new time, waiting to be re-confirmed.
    Rescheduled,
    /// The session finished.
    Completed,
    /// Finished, waiting for the artist to upload result photos.
    WaitingForPhotos,
    /// Waiting for the customer's review.
    WaitingForReview,
    /// Terminal: the customer reviewed the session.
    Reviewed,
    /// Terminal: the appointment was canceled.
    Canceled,
}

impl AppointmentStatus {
    /// Every appointment status, in declaration order.
    pub const ALL: [Self; 8] = [
        Self::Scheduled,
        Self::InProgress,
        Self::Rescheduled,
        Self::Completed,
        Self::WaitingForPhotos,
        Self::WaitingForReview,
        Self::Reviewed,
        Self::Canceled,
    ];

    /// String form used in persistence, logs and job payloads.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Scheduled => "scheduled",
            Self::InProgress => "in_progress",
            Self::Rescheduled => "rescheduled",
            Self::Completed => "completed",
            Self::WaitingForPhotos => "waiting_for_photos",
            Self::WaitingForReview => "waiting_for_review",
            Self::Reviewed => "reviewed",
            Self::Canceled => "canceled",
        }
    }

    /// Parses a status from its string form.
    ///
    /// # Errors
    ///
    /// Returns the unrecognized input when it names no known status.
    pub fn parse(s: &str) -> Result<Self, String> {
        match s {
            "scheduled" => Ok(Self::Scheduled),
            "in_progress" => Ok(Self::InProgress),
            "rescheduled" => Ok(Self::Rescheduled),
            "completed" => Ok(Self::Completed),
            "waiting_for_photos" => Ok(Self::WaitingForPhotos),
            "waiting_for_review" => Ok(Self::WaitingForReview),
            "reviewed" => Ok(Self::Reviewed),
            "canceled" => Ok(Self::Canceled),
            other => Err(format!("unknown appointment status: {other}")),
        }
    }

    /// Whether no further transitions are allowed from this status.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Reviewed | Self::Canceled)
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry of an appointment's append-only status log.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StatusLogEntry {
    /// The status the appointment moved to.
    pub status: AppointmentStatus,
    /// When the transition was recorded.
    pub timestamp: DateTime<Utc>,
    /// Who requested the transition.
    pub actor: Actor,
    /// Why, when a reason was supplied.
    pub reason: Option<String>,
    /// Free-text notes attached to the transition.
    pub notes: Option<String>,
}

/// A scheduled occurrence tied to one agenda and at most one quotation.
///
/// The status and its log are private: the only way to change them is
/// [`Appointment::record_status`], which appends the entry and sets the
/// status in one step, so the last log entry always matches the current
/// status and nothing is ever rewritten.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Appointment {
    /// Appointment identifier.
    pub id: AppointmentId,
    /// The agenda (artist calendar) this appointment lives on.
    pub agenda_id: AgendaId,
    /// The booking customer.
    pub customer_id: UserId,
    /// The negotiation that produced this appointment, if any.
    pub quotation_id: Option<QuotationId>,
    /// Scheduled start.
    pub start: DateTime<Utc>,
    /// Scheduled end, always after `start`.
    pub end: DateTime<Utc>,
    /// Free-text notes on the booking itself.
    pub notes: Option<String>,
    status: AppointmentStatus,
    status_log: SmallVec<[StatusLogEntry; 4]>,
}

impl Appointment {
    /// Creates a freshly scheduled appointment with its initial log entry.
    ///
    /// # Errors
    ///
    /// Returns [`BookingError::BadRequest`] when `end` is not after
    /// `start`.
    pub fn schedule(
        agenda_id: AgendaId,
        customer_id: UserId,
        quotation_id: Option<QuotationId>,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        actor: Actor,
        now: DateTime<Utc>,
    ) -> Result<Self, BookingError> {
        if end <= start {
            return Err(BookingError::bad_request(
                "appointment end must be after its start",
            ));
        }
        Ok(Self {
            id: AppointmentId::new(),
            agenda_id,
            customer_id,
            quotation_id,
            start,
            end,
            notes: None,
            status: AppointmentStatus::Scheduled,
            status_log: smallvec![StatusLogEntry {
                status: AppointmentStatus::Scheduled,
                timestamp: now,
                actor,
                reason: None,
                notes: None,
            }],
        })
    }

    /// Reconstructs an appointment from persisted parts.
    ///
    /// Intended for store implementations only.
    ///
    /// # Errors
    ///
    /// Returns a message when the parts violate the entity invariants:
    /// `end` not after `start`, an empty log, or a log tail that does not
    /// match `status`.
    #[allow(clippy::too_many_arguments)]
    pub fn from_parts(
        id: AppointmentId,
        agenda_id: AgendaId,
        customer_id: UserId,
        quotation_id: Option<QuotationId>,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        status: AppointmentStatus,
        status_log: Vec<StatusLogEntry>,
        notes: Option<String>,
    ) -> Result<Self, String> {
        if end <= start {
            return Err(format!("appointment {id}: end is not after start"));
        }
        match status_log.last() {
            None => return Err(format!("appointment {id}: empty status log")),
            Some(last) if last.status != status => {
                return Err(format!(
                    "appointment {id}: log tail {} does not match status {status}",
                    last.status
                ));
            }
            Some(_) => {}
        }
        Ok(Self {
            id,
            agenda_id,
            customer_id,
            quotation_id,
            start,
            end,
            notes,
            status,
            status_log: status_log.into(),
        })
    }

    /// Current lifecycle status.
    #[must_use]
    pub const fn status(&self) -> AppointmentStatus {
        self.status
    }

    /// The append-only status log, oldest entry first.
    #[must_use]
    pub fn status_log(&self) -> &[StatusLogEntry] {
        &self.status_log
    }

    /// Appends a log entry and moves the appointment to its status.
    pub fn record_status(&mut self, entry: StatusLogEntry) {
        self.status = entry.status;
        self.status_log.push(entry);
    }

    /// Moves the appointment to new times (reschedule).
    ///
    /// # Errors
    ///
    /// Returns [`BookingError::BadRequest`] when `end` is not after
    /// `start`.
    pub fn move_to(&mut self, start: DateTime<Utc>, end: DateTime<Utc>) -> Result<(), BookingError> {
        if end <= start {
            return Err(BookingError::bad_request(
                "appointment end must be after its start",
            ));
        }
        self.start = start;
        self.end = end;
        Ok(())
    }

    /// Whether this appointment occupies calendar time: everything but
    /// `canceled` blocks the slot.
    #[must_use]
    pub const fn blocks_calendar(&self) -> bool {
        !matches!(self.status, AppointmentStatus::Canceled)
    }

    /// Half-open interval overlap with `[start, end)`.
    #[must_use]
    pub fn overlaps(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        self.start < end && start < self.end
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn fixed_now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2025-06-01T10:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    fn scheduled() -> Appointment {
        let now = fixed_now();
        Appointment::schedule(
            AgendaId::new(),
            UserId::new(),
            None,
            now + Duration::days(1),
            now + Duration::days(1) + Duration::hours(2),
            Actor::customer(UserId::new()),
            now,
        )
        .unwrap()
    }

    #[test]
    fn schedule_seeds_the_log() {
        let appointment = scheduled();
        assert_eq!(appointment.status(), AppointmentStatus::Scheduled);
        assert_eq!(appointment.status_log().len(), 1);
        assert_eq!(appointment.status_log()[0].status, AppointmentStatus::Scheduled);
    }

    #[test]
    fn schedule_rejects_inverted_interval() {
        let now = fixed_now();
        let result = Appointment::schedule(
            AgendaId::new(),
            UserId::new(),
            None,
            now + Duration::hours(2),
            now + Duration::hours(1),
            Actor::customer(UserId::new()),
            now,
        );
        assert!(matches!(result, Err(BookingError::BadRequest(_))));
    }

    #[test]
    fn record_status_keeps_log_tail_in_sync() {
        let mut appointment = scheduled();
        appointment.record_status(StatusLogEntry {
            status: AppointmentStatus::InProgress,
            timestamp: fixed_now(),
            actor: Actor::artist(UserId::new()),
            reason: None,
            notes: None,
        });
        assert_eq!(appointment.status(), AppointmentStatus::InProgress);
        assert_eq!(
            appointment.status_log().last().unwrap().status,
            AppointmentStatus::InProgress
        );
    }

    #[test]
    fn from_parts_rejects_mismatched_log_tail() {
        let appointment = scheduled();
        let result = Appointment::from_parts(
            appointment.id,
            appointment.agenda_id,
            appointment.customer_id,
            None,
            appointment.start,
            appointment.end,
            AppointmentStatus::Canceled,
            appointment.status_log().to_vec(),
            None,
        );
        assert!(result.is_err());
    }

    #[test]
    fn canceled_appointments_release_the_slot() {
        let mut appointment = scheduled();
        assert!(appointment.blocks_calendar());
        appointment.record_status(StatusLogEntry {
            status: AppointmentStatus::Canceled,
            timestamp: fixed_now(),
            actor: Actor::customer(appointment.customer_id),
            reason: Some("customer request".to_string()),
            notes: None,
        });
        assert!(!appointment.blocks_calendar());
    }

    #[test]
    fn overlap_is_half_open() {
        let appointment = scheduled();
        // Touching intervals do not overlap
        assert!(!appointment.overlaps(appointment.end, appointment.end + Duration::hours(1)));
        assert!(appointment.overlaps(
            appointment.start + Duration::minutes(30),
            appointment.end + Duration::hours(1),
        ));
    }
}
