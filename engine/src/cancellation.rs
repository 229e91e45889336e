//! Cancel-and-apply-penalty orchestrator.
//!
//! Composes the penalty calculator, the penalty store, the job queue and
//! the lifecycle state machine. The penalty row write and the
//! appointment transition are sequential, not transactionally linked;
//! the queue enqueue is always a separate best-effort step, since queue
//! and database share no transaction.

use atelier_core::actor::{Actor, ActorRole};
use atelier_core::appointment::AppointmentStatus;
use atelier_core::error::BookingError;
use atelier_core::ids::{AppointmentId, PenaltyId, UserId};
use atelier_core::jobs::{Job, JobQueue, PenaltyJob};
use atelier_core::penalty::CancellationPenalty;
use atelier_core::store::{AppointmentStore, PenaltyStore};
use std::sync::Arc;

use crate::lifecycle::{EventLifecycle, TransitionRequest};
use crate::penalty::PenaltyCalculator;

/// Summary returned to the caller after a cancellation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CancellationOutcome {
    /// The canceled appointment.
    pub appointment_id: AppointmentId,
    /// Whether a penalty row was created.
    pub penalty_applied: bool,
    /// The created penalty row, when one was.
    pub penalty_id: Option<PenaltyId>,
}

/// The cancellation orchestrator.
pub struct CancelAppointment {
    appointments: Arc<dyn AppointmentStore>,
    penalties: Arc<dyn PenaltyStore>,
    jobs: Arc<dyn JobQueue>,
    lifecycle: Arc<EventLifecycle>,
    calculator: PenaltyCalculator,
}

impl CancelAppointment {
    /// Creates the orchestrator over its ports and collaborators.
    #[must_use]
    pub fn new(
        appointments: Arc<dyn AppointmentStore>,
        penalties: Arc<dyn PenaltyStore>,
        jobs: Arc<dyn JobQueue>,
        lifecycle: Arc<EventLifecycle>,
        calculator: PenaltyCalculator,
    ) -> Self {
        Self {
            appointments,
            penalties,
            jobs,
            lifecycle,
            calculator,
        }
    }

    /// Cancels an appointment, recording and dispatching a penalty when
    /// the decision table says the canceler earned one.
    ///
    /// The canceling party is evaluated against their own role's rule
    /// set, and when a penalty results, the canceler is the one
    /// penalized. A dispatch failure of the penalty job is logged and
    /// swallowed: the row stays `Pending` for later reconciliation.
    ///
    /// # Errors
    ///
    /// - [`BookingError::NotFound`] when the appointment does not exist
    /// - [`BookingError::Conflict`] when it is already canceled; a
    ///   second cancellation never creates a second penalty
    /// - [`BookingError::Forbidden`] when the canceling user is neither
    ///   the agenda's artist nor the appointment's customer (per the
    ///   claimed role)
    /// - [`BookingError::Store`] when persistence fails
    pub async fn execute(
        &self,
        appointment_id: AppointmentId,
        canceling_user: UserId,
        canceling_role: ActorRole,
        reason: String,
        notes: Option<String>,
    ) -> Result<CancellationOutcome, BookingError> {
        let (appointment, agenda) = self
            .appointments
            .find_with_agenda(appointment_id)
            .await?
            .ok_or_else(|| BookingError::not_found("Appointment", appointment_id))?;

        if appointment.status() == AppointmentStatus::Canceled {
            return Err(BookingError::conflict(format!(
                "appointment {appointment_id} is already canceled"
            )));
        }

        let authorized = match canceling_role {
            ActorRole::Artist => canceling_user == agenda.artist_id,
            ActorRole::Customer => canceling_user == appointment.customer_id,
        };
        if !authorized {
            return Err(BookingError::forbidden(format!(
                "{} {} may not cancel appointment {}",
                canceling_role, canceling_user, appointment_id
            )));
        }

        let calculated = self
            .calculator
            .calculate_for_user(&appointment, canceling_role)
            .await?;

        let mut outcome = CancellationOutcome {
            appointment_id,
            penalty_applied: false,
            penalty_id: None,
        };

        if let Some(calculated) = calculated {
            let penalty = CancellationPenalty::pending(
                &appointment,
                canceling_user,
                calculated,
                canceling_user,
                Some(reason.clone()),
            );
            self.penalties.create(penalty.clone()).await?;
            tracing::info!(
                penalty_id = %penalty.id,
                appointment_id = %appointment_id,
                penalized_user = %penalty.penalized_user_id,
                penalty_type = %penalty.penalty_type,
                "cancellation penalty recorded"
            );

            if let Err(error) = self
                .jobs
                .enqueue(Job::ProcessPenalty(PenaltyJob::new(penalty.clone())))
                .await
            {
                tracing::warn!(
                    penalty_id = %penalty.id,
                    %error,
                    "penalty job dispatch failed; row stays pending for reconciliation"
                );
            }

            outcome.penalty_applied = true;
            outcome.penalty_id = Some(penalty.id);
        }

        self.lifecycle
            .apply_transition(
                agenda.id,
                appointment_id,
                AppointmentStatus::Canceled,
                Actor {
                    id: canceling_user,
                    role: canceling_role,
                },
                TransitionRequest {
                    reason: Some(reason),
                    notes,
                    new_start: None,
                    new_end: None,
                },
            )
            .await?;

        Ok(outcome)
    }
}
