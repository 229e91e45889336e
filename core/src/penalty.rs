//! Cancellation penalty records.

use crate::actor::ActorRole;
use crate::appointment::Appointment;
use crate::ids::{AgendaId, AppointmentId, PenaltyId, QuotationId, UserId};
use crate::money::Money;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of consequence attached to a late cancellation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PenaltyType {
    /// A flat fee charged to the penalized user.
    FixedFee,
    /// A percentage of the linked quotation's value.
    Percentage,
    /// A pure reputation adjustment with no monetary amount.
    ReputationPoints,
}

impl PenaltyType {
    /// String form used in persistence and job payloads.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::FixedFee => "fixed_fee",
            Self::Percentage => "percentage",
            Self::ReputationPoints => "reputation_points",
        }
    }

    /// Parses a penalty type from its string form.
    ///
    /// # Errors
    ///
    /// Returns the unrecognized input when it names no known type.
    pub fn parse(s: &str) -> Result<Self, String> {
        match s {
            "fixed_fee" => Ok(Self::FixedFee),
            "percentage" => Ok(Self::Percentage),
            "reputation_points" => Ok(Self::ReputationPoints),
            other => Err(format!("unknown penalty type: {other}")),
        }
    }
}

impl fmt::Display for PenaltyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Processing status of a penalty row.
///
/// The orchestrator creates rows as `Pending`; only the external penalty
/// processor moves them to `Applied` once the charge or reputation
/// adjustment has actually been enacted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PenaltyStatus {
    /// Recorded, consequence not yet enacted.
    Pending,
    /// The consequence has been enacted.
    Applied,
    /// Support decided not to enact the consequence.
    Waived,
}

impl PenaltyStatus {
    /// String form used in persistence and job payloads.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Applied => "applied",
            Self::Waived => "waived",
        }
    }

    /// Parses a penalty status from its string form.
    ///
    /// # Errors
    ///
    /// Returns the unrecognized input when it names no known status.
    pub fn parse(s: &str) -> Result<Self, String> {
        match s {
            "pending" => Ok(Self::Pending),
            "applied" => Ok(Self::Applied),
            "waived" => Ok(Self::Waived),
            other => Err(format!("unknown penalty status: {other}")),
        }
    }
}

/// Context recorded with every penalty for audit and reconciliation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PenaltyMetadata {
    /// The role whose rule table produced the penalty.
    pub penalized_role: ActorRole,
    /// When the cancellation happened.
    pub cancellation_time: DateTime<Utc>,
    /// The start the appointment had when it was canceled.
    pub original_event_start: DateTime<Utc>,
    /// Who initiated the cancellation; filled by the orchestrator.
    pub initiator_id: Option<UserId>,
    /// Free-text reason supplied with the cancellation.
    pub reason: Option<String>,
}

/// Output of the penalty calculation engine.
///
/// Carries everything the decision table produced; the orchestrator
/// turns it into a persisted [`CancellationPenalty`] by filling in the
/// initiator and reason.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CalculatedPenalty {
    /// Kind of consequence.
    pub penalty_type: PenaltyType,
    /// Monetary amount; `None` for pure reputation penalties.
    pub amount: Option<Money>,
    /// Reputation delta accompanying the penalty, if any.
    pub reputation_points: Option<i32>,
    /// Calculation context.
    pub metadata: PenaltyMetadata,
}

/// One row per penalized cancellation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CancellationPenalty {
    /// Penalty identifier.
    pub id: PenaltyId,
    /// The canceled appointment.
    pub appointment_id: AppointmentId,
    /// The user bearing the consequence (the canceler).
    pub penalized_user_id: UserId,
    /// The agenda the appointment belonged to.
    pub agenda_id: AgendaId,
    /// The linked quotation, if the appointment had one.
    pub quotation_id: Option<QuotationId>,
    /// Kind of consequence.
    pub penalty_type: PenaltyType,
    /// Monetary amount; `None` for pure reputation penalties.
    pub amount: Option<Money>,
    /// Reputation delta, if any.
    pub reputation_points: Option<i32>,
    /// Processing status.
    pub status: PenaltyStatus,
    /// Audit context.
    pub metadata: PenaltyMetadata,
}

impl CancellationPenalty {
    /// Builds the `Pending` row the orchestrator persists, augmenting the
    /// calculation metadata with the initiator and the supplied reason.
    #[must_use]
    pub fn pending(
        appointment: &Appointment,
        penalized_user_id: UserId,
        calculated: CalculatedPenalty,
        initiator_id: UserId,
        reason: Option<String>,
    ) -> Self {
        let CalculatedPenalty {
            penalty_type,
            amount,
            reputation_points,
            mut metadata,
        } = calculated;
        metadata.initiator_id = Some(initiator_id);
        metadata.reason = reason;
        Self {
            id: PenaltyId::new(),
            appointment_id: appointment.id,
            penalized_user_id,
            agenda_id: appointment.agenda_id,
            quotation_id: appointment.quotation_id,
            penalty_type,
            amount,
            reputation_points,
            status: PenaltyStatus::Pending,
            metadata,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_and_status_string_round_trips() {
        for ty in [
            PenaltyType::FixedFee,
            PenaltyType::Percentage,
            PenaltyType::ReputationPoints,
        ] {
            assert_eq!(PenaltyType::parse(ty.as_str()), Ok(ty));
        }
        for status in [
            PenaltyStatus::Pending,
            PenaltyStatus::Applied,
            PenaltyStatus::Waived,
        ] {
            assert_eq!(PenaltyStatus::parse(status.as_str()), Ok(status));
        }
    }
}
