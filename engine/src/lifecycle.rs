//! Appointment lifecycle state machine.
//!
//! Transitions run through a fixed contract: load and cross-check the
//! appointment, authorize the actor, consult the transition table,
//! append to the audit log and persist in a single write, then fire one
//! best-effort customer notification. A failed notification enqueue is
//! logged and never rolls the transition back.

use atelier_core::actor::{Actor, ActorRole};
use atelier_core::agenda::Agenda;
use atelier_core::appointment::{Appointment, AppointmentStatus, StatusLogEntry};
use atelier_core::clock::Clock;
use atelier_core::error::BookingError;
use atelier_core::ids::{AgendaId, AppointmentId};
use atelier_core::jobs::{Job, JobQueue, NotificationJob, NotificationMetadata};
use atelier_core::store::{AppointmentStore, StoreError};
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// The allowed targets from each status.
///
/// `waiting_for_review` maps to the empty set on purpose: only a review
/// submission (the [`TransitionIntent::AddReview`] entry point) may
/// resolve it.
#[must_use]
pub const fn allowed_targets(status: AppointmentStatus) -> &'static [AppointmentStatus] {
    match status {
        AppointmentStatus::Scheduled => &[
            AppointmentStatus::InProgress,
            AppointmentStatus::Rescheduled,
            AppointmentStatus::Canceled,
        ],
        AppointmentStatus::Rescheduled => &[
            AppointmentStatus::Scheduled,
            AppointmentStatus::Canceled,
        ],
        AppointmentStatus::InProgress => &[
            AppointmentStatus::Completed,
            AppointmentStatus::Canceled,
        ],
        AppointmentStatus::Completed => &[AppointmentStatus::WaitingForPhotos],
        AppointmentStatus::WaitingForPhotos => &[AppointmentStatus::WaitingForReview],
        AppointmentStatus::WaitingForReview
        | AppointmentStatus::Reviewed
        | AppointmentStatus::Canceled => &[],
    }
}

/// Whether `target` is reachable from `from` in one step.
#[must_use]
pub fn is_transition_allowed(from: AppointmentStatus, target: AppointmentStatus) -> bool {
    allowed_targets(from).contains(&target)
}

/// The customer-facing message sent when an appointment reaches a status.
#[must_use]
pub const fn notification_message(status: AppointmentStatus) -> &'static str {
    match status {
        AppointmentStatus::Scheduled => "appointment scheduled",
        AppointmentStatus::InProgress => "session started",
        AppointmentStatus::Rescheduled => "appointment rescheduled",
        AppointmentStatus::Completed => "session completed",
        AppointmentStatus::WaitingForPhotos => "waiting for session photos",
        AppointmentStatus::WaitingForReview => "waiting for your review",
        AppointmentStatus::Reviewed => "review received",
        AppointmentStatus::Canceled => "appointment canceled",
    }
}

/// Semantic entry point tokens for callers that reason in terms of
/// intent rather than destination state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransitionIntent {
    /// The artist starts the session.
    StartSession,
    /// Move the appointment to new times.
    Reschedule,
    /// The artist finishes the session.
    Complete,
    /// The artist asks for result photos to be collected.
    RequestPhotos,
    /// The artist hands over to the customer for review.
    RequestReview,
    /// The customer submits their review.
    AddReview,
    /// Either side cancels the appointment.
    Cancel,
}

impl TransitionIntent {
    /// The concrete status this intent resolves to.
    #[must_use]
    pub const fn target(self) -> AppointmentStatus {
        match self {
            Self::StartSession => AppointmentStatus::InProgress,
            Self::Reschedule => AppointmentStatus::Rescheduled,
            Self::Complete => AppointmentStatus::Completed,
            Self::RequestPhotos => AppointmentStatus::WaitingForPhotos,
            Self::RequestReview => AppointmentStatus::WaitingForReview,
            Self::AddReview => AppointmentStatus::Reviewed,
            Self::Cancel => AppointmentStatus::Canceled,
        }
    }
}

/// Optional context accompanying a transition request.
#[derive(Clone, Debug, Default)]
pub struct TransitionRequest {
    /// Why the transition was requested.
    pub reason: Option<String>,
    /// Free-text notes recorded in the log entry.
    pub notes: Option<String>,
    /// New start when rescheduling.
    pub new_start: Option<DateTime<Utc>>,
    /// New end when rescheduling.
    pub new_end: Option<DateTime<Utc>>,
}

impl TransitionRequest {
    /// A request carrying only a reason.
    #[must_use]
    pub fn with_reason(reason: impl Into<String>) -> Self {
        Self {
            reason: Some(reason.into()),
            ..Self::default()
        }
    }

    /// A reschedule request moving the appointment to `[start, end)`.
    #[must_use]
    pub fn moving_to(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            new_start: Some(start),
            new_end: Some(end),
            ..Self::default()
        }
    }
}

/// Whether `actor` may request moving this appointment to `target`.
///
/// Cancellation and rescheduling are open to the appointment's artist
/// and its customer; every other transition is artist-only. Identity is
/// checked, not just the role: an artist from another agenda is a
/// stranger here.
#[must_use]
pub fn may_request(
    actor: &Actor,
    target: AppointmentStatus,
    appointment: &Appointment,
    agenda: &Agenda,
) -> bool {
    let is_own_artist = actor.role == ActorRole::Artist && actor.id == agenda.artist_id;
    let is_own_customer =
        actor.role == ActorRole::Customer && actor.id == appointment.customer_id;
    match target {
        AppointmentStatus::Canceled | AppointmentStatus::Rescheduled => {
            is_own_artist || is_own_customer
        }
        _ => is_own_artist,
    }
}

/// The appointment lifecycle service.
///
/// Owns the status log: nothing else in the system appends to it.
pub struct EventLifecycle {
    appointments: Arc<dyn AppointmentStore>,
    jobs: Arc<dyn JobQueue>,
    clock: Arc<dyn Clock>,
}

impl EventLifecycle {
    /// Creates the lifecycle service over its ports.
    #[must_use]
    pub fn new(
        appointments: Arc<dyn AppointmentStore>,
        jobs: Arc<dyn JobQueue>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            appointments,
            jobs,
            clock,
        }
    }

    /// Applies a transition to a concrete target status.
    ///
    /// # Errors
    ///
    /// - [`BookingError::NotFound`] when the appointment does not exist
    /// - [`BookingError::UnprocessableEntity`] when the appointment does
    ///   not belong to `agenda_id`, or the target is not reachable from
    ///   the current status
    /// - [`BookingError::BadRequest`] when supplied reschedule times are
    ///   inverted
    /// - [`BookingError::Forbidden`] when the actor may not request this
    ///   transition
    /// - [`BookingError::Conflict`] when a concurrent writer moved the
    ///   appointment first
    pub async fn apply_transition(
        &self,
        agenda_id: AgendaId,
        appointment_id: AppointmentId,
        target: AppointmentStatus,
        actor: Actor,
        request: TransitionRequest,
    ) -> Result<Appointment, BookingError> {
        let (appointment, agenda) = self.load(agenda_id, appointment_id).await?;
        if !may_request(&actor, target, &appointment, &agenda) {
            return Err(BookingError::forbidden(format!(
                "{} {} may not move appointment {} to {}",
                actor.role, actor.id, appointment_id, target
            )));
        }
        if !is_transition_allowed(appointment.status(), target) {
            return Err(BookingError::unprocessable(format!(
                "appointment {}: cannot move from {} to {}",
                appointment_id,
                appointment.status(),
                target
            )));
        }
        self.commit(appointment, &agenda, target, actor, request).await
    }

    /// Applies a transition named by intent instead of target status.
    ///
    /// `AddReview` is special-cased: `reviewed` is unreachable through
    /// the transition table and may only be produced here, by the
    /// appointment's customer, from `waiting_for_review`.
    ///
    /// # Errors
    ///
    /// Same as [`EventLifecycle::apply_transition`].
    pub async fn apply_intent(
        &self,
        agenda_id: AgendaId,
        appointment_id: AppointmentId,
        intent: TransitionIntent,
        actor: Actor,
        request: TransitionRequest,
    ) -> Result<Appointment, BookingError> {
        if intent != TransitionIntent::AddReview {
            return self
                .apply_transition(agenda_id, appointment_id, intent.target(), actor, request)
                .await;
        }

        let (appointment, agenda) = self.load(agenda_id, appointment_id).await?;
        let is_own_customer =
            actor.role == ActorRole::Customer && actor.id == appointment.customer_id;
        if !is_own_customer {
            return Err(BookingError::forbidden(format!(
                "only the booking customer may review appointment {appointment_id}"
            )));
        }
        if appointment.status() != AppointmentStatus::WaitingForReview {
            return Err(BookingError::unprocessable(format!(
                "appointment {}: cannot add a review while {}",
                appointment_id,
                appointment.status()
            )));
        }
        self.commit(appointment, &agenda, AppointmentStatus::Reviewed, actor, request)
            .await
    }

    async fn load(
        &self,
        agenda_id: AgendaId,
        appointment_id: AppointmentId,
    ) -> Result<(Appointment, Agenda), BookingError> {
        let (appointment, agenda) = self
            .appointments
            .find_with_agenda(appointment_id)
            .await?
            .ok_or_else(|| BookingError::not_found("Appointment", appointment_id))?;
        if agenda.id != agenda_id {
            return Err(BookingError::unprocessable(format!(
                "appointment {appointment_id} does not belong to agenda {agenda_id}"
            )));
        }
        Ok((appointment, agenda))
    }

    /// Steps 4 to 6 of the transition contract: apply reschedule times,
    /// append the log entry, persist in one write, notify best-effort.
    async fn commit(
        &self,
        mut appointment: Appointment,
        agenda: &Agenda,
        target: AppointmentStatus,
        actor: Actor,
        request: TransitionRequest,
    ) -> Result<Appointment, BookingError> {
        let prior = appointment.status();
        if request.new_start.is_some() || request.new_end.is_some() {
            let start = request.new_start.unwrap_or(appointment.start);
            let end = request.new_end.unwrap_or(appointment.end);
            appointment.move_to(start, end)?;
        }
        appointment.record_status(StatusLogEntry {
            status: target,
            timestamp: self.clock.now(),
            actor,
            reason: request.reason,
            notes: request.notes,
        });
        match self.appointments.save(appointment.clone(), prior).await {
            Ok(()) => {}
            Err(StoreError::StaleWrite(message)) => {
                return Err(BookingError::conflict(message));
            }
            Err(error) => return Err(error.into()),
        }
        tracing::info!(
            appointment_id = %appointment.id,
            from = %prior,
            to = %target,
            actor_role = %actor.role,
            "appointment transitioned"
        );

        let job = Job::Notify(NotificationJob::new(NotificationMetadata {
            appointment_id: appointment.id,
            customer_id: appointment.customer_id,
            artist_id: agenda.artist_id,
            status: target,
            message: notification_message(target).to_string(),
        }));
        if let Err(error) = self.jobs.enqueue(job).await {
            tracing::warn!(
                appointment_id = %appointment.id,
                %error,
                "notification enqueue failed; transition stands"
            );
        }
        Ok(appointment)
    }
}
