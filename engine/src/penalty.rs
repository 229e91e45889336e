//! Late-cancellation penalty calculation.
//!
//! A decision table over elapsed time, the canceler's role and the
//! configured amounts. The canceling party is evaluated against their
//! own role's rules: an artist who cancels is judged by the artist
//! thresholds, a customer by the customer thresholds.
//!
//! Buckets compare whole seconds with strict `<`, so 23.99h falls in the
//! "less than 24h" bucket while exactly 24.00h falls through to the
//! next one. The only I/O is the single lookup of the linked quotation's
//! value; everything else is deterministic and replayable.

use atelier_core::actor::ActorRole;
use atelier_core::appointment::Appointment;
use atelier_core::clock::Clock;
use atelier_core::error::BookingError;
use atelier_core::money::Money;
use atelier_core::penalty::{CalculatedPenalty, PenaltyMetadata, PenaltyType};
use atelier_core::store::QuotationStore;
use std::sync::Arc;

use crate::config::PenaltyConfig;

const TWO_HOURS: i64 = 2 * 3_600;
const TWENTY_FOUR_HOURS: i64 = 24 * 3_600;
const FORTY_EIGHT_HOURS: i64 = 48 * 3_600;

/// The penalty calculation engine.
pub struct PenaltyCalculator {
    quotations: Arc<dyn QuotationStore>,
    clock: Arc<dyn Clock>,
    config: PenaltyConfig,
}

impl PenaltyCalculator {
    /// Creates the calculator over its ports.
    #[must_use]
    pub fn new(
        quotations: Arc<dyn QuotationStore>,
        clock: Arc<dyn Clock>,
        config: PenaltyConfig,
    ) -> Self {
        Self {
            quotations,
            clock,
            config,
        }
    }

    /// Evaluates the decision table for a cancellation happening now.
    ///
    /// Returns `None` when the cancellation is early enough to carry no
    /// consequence. The metadata in the result leaves the initiator and
    /// reason empty; the orchestrator fills those in.
    ///
    /// # Errors
    ///
    /// Returns [`BookingError::Store`] when the quotation-value lookup
    /// fails.
    pub async fn calculate_for_user(
        &self,
        appointment: &Appointment,
        role: ActorRole,
    ) -> Result<Option<CalculatedPenalty>, BookingError> {
        let now = self.clock.now();
        let seconds = (now - appointment.start).num_seconds().abs();

        let outcome = match role {
            ActorRole::Customer => {
                if seconds < TWENTY_FOUR_HOURS {
                    Some((
                        PenaltyType::FixedFee,
                        Some(self.config.customer_lt24h_fee),
                        Some(-1),
                    ))
                } else if seconds < FORTY_EIGHT_HOURS {
                    Some((
                        PenaltyType::FixedFee,
                        Some(self.config.customer_lt48h_fee),
                        Some(0),
                    ))
                } else {
                    None
                }
            }
            ActorRole::Artist => {
                if seconds < TWENTY_FOUR_HOURS {
                    let value = self.quotation_value(appointment).await?;
                    if seconds < TWO_HOURS {
                        Some((
                            PenaltyType::Percentage,
                            Some(value.fraction(self.config.artist_lt2h_pct)),
                            Some(-2),
                        ))
                    } else {
                        Some((
                            PenaltyType::Percentage,
                            Some(value.fraction(self.config.artist_lt24h_pct)),
                            Some(-1),
                        ))
                    }
                } else {
                    None
                }
            }
        };

        Ok(outcome.map(|(penalty_type, amount, reputation_points)| CalculatedPenalty {
            penalty_type,
            amount,
            reputation_points,
            metadata: PenaltyMetadata {
                penalized_role: role,
                cancellation_time: now,
                original_event_start: appointment.start,
                initiator_id: None,
                reason: None,
            },
        }))
    }

    /// The linked quotation's value, zero when the appointment has no
    /// quotation or the quotation carries no agreed price.
    async fn quotation_value(&self, appointment: &Appointment) -> Result<Money, BookingError> {
        let Some(quotation_id) = appointment.quotation_id else {
            return Ok(Money::ZERO);
        };
        Ok(self
            .quotations
            .find_by_id(quotation_id)
            .await?
            .map_or(Money::ZERO, |quotation| quotation.value()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use atelier_core::actor::Actor;
    use atelier_core::clock::Clock;
    use atelier_core::ids::{AgendaId, UserId};
    use atelier_testing::memory::InMemoryQuotationStore;
    use atelier_testing::{fixtures, test_clock};
    use chrono::Duration;

    /// Appointment starting `seconds` away from the fixed test clock.
    fn appointment_starting_in(seconds: i64) -> Appointment {
        let now = test_clock().now();
        Appointment::schedule(
            AgendaId::new(),
            UserId::new(),
            None,
            now + Duration::seconds(seconds),
            now + Duration::seconds(seconds) + Duration::hours(2),
            Actor::customer(UserId::new()),
            now - Duration::days(7),
        )
        .unwrap()
    }

    fn calculator(quotations: InMemoryQuotationStore) -> PenaltyCalculator {
        PenaltyCalculator::new(
            Arc::new(quotations),
            Arc::new(test_clock()),
            PenaltyConfig::default(),
        )
    }

    #[tokio::test]
    async fn customer_buckets_are_boundary_exact() {
        let calc = calculator(InMemoryQuotationStore::new());

        // 23.99h -> <24h bucket: fee 25.00, reputation -1
        let close = appointment_starting_in(86_364);
        let penalty = calc
            .calculate_for_user(&close, ActorRole::Customer)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(penalty.penalty_type, PenaltyType::FixedFee);
        assert_eq!(penalty.amount, Some(Money::from_cents(2_500)));
        assert_eq!(penalty.reputation_points, Some(-1));

        // exactly 24.00h -> <48h bucket: fee 10.00, reputation 0
        let day_out = appointment_starting_in(86_400);
        let penalty = calc
            .calculate_for_user(&day_out, ActorRole::Customer)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(penalty.amount, Some(Money::from_cents(1_000)));
        assert_eq!(penalty.reputation_points, Some(0));

        // exactly 48.00h -> no penalty
        let two_days_out = appointment_starting_in(172_800);
        assert!(calc
            .calculate_for_user(&two_days_out, ActorRole::Customer)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn artist_buckets_take_a_cut_of_the_quotation() {
        let customer = UserId::new();
        let artist = UserId::new();
        let quotation = fixtures::priced_quotation(customer, artist, Money::from_units(100));
        let quotations = InMemoryQuotationStore::new();
        quotations.insert(quotation.clone()).await;
        let calc = calculator(quotations);

        let mut one_hour_out = appointment_starting_in(3_600);
        one_hour_out.quotation_id = Some(quotation.id);
        let penalty = calc
            .calculate_for_user(&one_hour_out, ActorRole::Artist)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(penalty.penalty_type, PenaltyType::Percentage);
        assert_eq!(penalty.amount, Some(Money::from_cents(2_000)));
        assert_eq!(penalty.reputation_points, Some(-2));

        // exactly 2.00h -> falls into the <24h bucket (10%)
        let mut two_hours_out = appointment_starting_in(TWO_HOURS);
        two_hours_out.quotation_id = Some(quotation.id);
        let penalty = calc
            .calculate_for_user(&two_hours_out, ActorRole::Artist)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(penalty.amount, Some(Money::from_cents(1_000)));
        assert_eq!(penalty.reputation_points, Some(-1));

        // exactly 24.00h -> no penalty
        let mut day_out = appointment_starting_in(TWENTY_FOUR_HOURS);
        day_out.quotation_id = Some(quotation.id);
        assert!(calc
            .calculate_for_user(&day_out, ActorRole::Artist)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn missing_quotation_means_zero_value() {
        let calc = calculator(InMemoryQuotationStore::new());
        let one_hour_out = appointment_starting_in(3_600);
        let penalty = calc
            .calculate_for_user(&one_hour_out, ActorRole::Artist)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(penalty.penalty_type, PenaltyType::Percentage);
        assert_eq!(penalty.amount, Some(Money::ZERO));
    }

    #[tokio::test]
    async fn elapsed_time_is_absolute() {
        // Cancellation an hour *after* the start still lands in the
        // tightest bucket.
        let calc = calculator(InMemoryQuotationStore::new());
        let started_an_hour_ago = appointment_starting_in(-3_600);
        let penalty = calc
            .calculate_for_user(&started_an_hour_ago, ActorRole::Customer)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(penalty.amount, Some(Money::from_cents(2_500)));
    }

    #[tokio::test]
    async fn metadata_carries_the_calculation_context() {
        let calc = calculator(InMemoryQuotationStore::new());
        let appointment = appointment_starting_in(3_600);
        let penalty = calc
            .calculate_for_user(&appointment, ActorRole::Customer)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(penalty.metadata.penalized_role, ActorRole::Customer);
        assert_eq!(penalty.metadata.cancellation_time, test_clock().now());
        assert_eq!(penalty.metadata.original_event_start, appointment.start);
        assert!(penalty.metadata.initiator_id.is_none());
        assert!(penalty.metadata.reason.is_none());
    }
}
