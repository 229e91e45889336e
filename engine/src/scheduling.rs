//! Scheduling and availability engine.
//!
//! Answers two questions for an agenda: "is this interval bookable?" and
//! "which intervals are bookable?". A day's free intervals are the
//! working-hours window minus every blocked time and every
//! calendar-blocking appointment. All interval arithmetic is half-open:
//! `[a, b)` and `[c, d)` overlap iff `a < d && c < b`, so back-to-back
//! bookings touch without conflicting.
//!
//! All timestamps are UTC; the agenda's working hours are interpreted as
//! UTC times of day.

use atelier_core::agenda::{Agenda, BlockedTime};
use atelier_core::appointment::Appointment;
use atelier_core::clock::Clock;
use atelier_core::error::BookingError;
use atelier_core::ids::{AgendaId, QuotationId};
use atelier_core::store::{AgendaStore, AppointmentStore, BlockedTimeStore, QuotationStore};
use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use crate::config::SchedulingConfig;

/// A candidate bookable interval.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSlot {
    /// Slot start (inclusive).
    pub start: DateTime<Utc>,
    /// Slot end (exclusive).
    pub end: DateTime<Utc>,
}

/// Half-open interval overlap: `[a_start, a_end)` meets `[b_start, b_end)`.
#[must_use]
pub fn intervals_overlap(
    a_start: DateTime<Utc>,
    a_end: DateTime<Utc>,
    b_start: DateTime<Utc>,
    b_end: DateTime<Utc>,
) -> bool {
    a_start < b_end && b_start < a_end
}

/// Why a proposed interval is not bookable.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotRejection {
    /// Outside the agenda's working hours or on a non-working day.
    OutsideWorkingHours,
    /// Overlaps a provider-declared blocked interval.
    InsideBlockedTime,
    /// Overlaps an existing non-canceled appointment.
    ConflictsWithAppointment,
}

impl fmt::Display for SlotRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::OutsideWorkingHours => "outside working hours",
            Self::InsideBlockedTime => "inside blocked time",
            Self::ConflictsWithAppointment => "conflicts with an existing appointment",
        };
        f.write_str(text)
    }
}

/// Result of validating a proposed appointment time.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotValidation {
    /// Whether the interval is fully contained in one free sub-interval.
    pub valid: bool,
    /// Why not, when `valid` is false.
    pub reason: Option<SlotRejection>,
}

impl SlotValidation {
    /// A bookable interval.
    #[must_use]
    pub const fn ok() -> Self {
        Self {
            valid: true,
            reason: None,
        }
    }

    /// An interval rejected for the given reason.
    #[must_use]
    pub const fn rejected(reason: SlotRejection) -> Self {
        Self {
            valid: false,
            reason: Some(reason),
        }
    }
}

/// The agenda's bookable window on a given date, if it works that day.
#[must_use]
pub fn working_window(agenda: &Agenda, date: NaiveDate) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
    if !agenda.working_days.contains(date.weekday()) {
        return None;
    }
    let start = date.and_time(agenda.hours.start).and_utc();
    let end = date.and_time(agenda.hours.end).and_utc();
    Some((start, end))
}

/// Derives the ordered, non-overlapping free sub-intervals of one day:
/// the working window minus every blocked time and every
/// calendar-blocking appointment that touches it.
#[must_use]
pub fn free_intervals(
    agenda: &Agenda,
    blocks: &[BlockedTime],
    appointments: &[Appointment],
    date: NaiveDate,
) -> Vec<TimeSlot> {
    let Some((window_start, window_end)) = working_window(agenda, date) else {
        return Vec::new();
    };

    let mut busy: Vec<(DateTime<Utc>, DateTime<Utc>)> = blocks
        .iter()
        .map(|b| (b.start, b.end))
        .chain(
            appointments
                .iter()
                .filter(|a| a.blocks_calendar())
                .map(|a| (a.start, a.end)),
        )
        .filter(|(s, e)| intervals_overlap(*s, *e, window_start, window_end))
        .collect();
    busy.sort_by_key(|(start, _)| *start);

    let mut free = vec![(window_start, window_end)];
    for (busy_start, busy_end) in busy {
        let mut next = Vec::with_capacity(free.len() + 1);
        for (start, end) in free {
            if !intervals_overlap(start, end, busy_start, busy_end) {
                next.push((start, end));
                continue;
            }
            if start < busy_start {
                next.push((start, busy_start));
            }
            if busy_end < end {
                next.push((busy_end, end));
            }
        }
        free = next;
    }

    free.into_iter()
        .map(|(start, end)| TimeSlot { start, end })
        .collect()
}

/// The availability service.
pub struct Availability {
    agendas: Arc<dyn AgendaStore>,
    blocked_times: Arc<dyn BlockedTimeStore>,
    appointments: Arc<dyn AppointmentStore>,
    quotations: Arc<dyn QuotationStore>,
    clock: Arc<dyn Clock>,
    config: SchedulingConfig,
}

impl Availability {
    /// Creates the availability service over its ports.
    #[must_use]
    pub fn new(
        agendas: Arc<dyn AgendaStore>,
        blocked_times: Arc<dyn BlockedTimeStore>,
        appointments: Arc<dyn AppointmentStore>,
        quotations: Arc<dyn QuotationStore>,
        clock: Arc<dyn Clock>,
        config: SchedulingConfig,
    ) -> Self {
        Self {
            agendas,
            blocked_times,
            appointments,
            quotations,
            clock,
            config,
        }
    }

    /// Checks whether `[start, start + duration)` is bookable on the
    /// agenda.
    ///
    /// # Errors
    ///
    /// - [`BookingError::NotFound`] when the agenda does not exist
    /// - [`BookingError::BadRequest`] when the duration is zero
    /// - [`BookingError::Store`] when a lookup fails
    pub async fn validate_appointment_time(
        &self,
        agenda_id: AgendaId,
        start: DateTime<Utc>,
        duration_minutes: u32,
    ) -> Result<SlotValidation, BookingError> {
        if duration_minutes == 0 {
            return Err(BookingError::bad_request(
                "appointment duration must be positive",
            ));
        }
        let agenda = self
            .agendas
            .find_by_id(agenda_id)
            .await?
            .ok_or_else(|| BookingError::not_found("Agenda", agenda_id))?;
        let end = start + Duration::minutes(i64::from(duration_minutes));

        // The interval must sit inside one day's working window.
        let inside_window = working_window(&agenda, start.date_naive())
            .is_some_and(|(window_start, window_end)| start >= window_start && end <= window_end);
        if !inside_window {
            return Ok(SlotValidation::rejected(SlotRejection::OutsideWorkingHours));
        }

        let blocks = self
            .blocked_times
            .find_overlapping(agenda_id, start, end)
            .await?;
        if blocks
            .iter()
            .any(|b| intervals_overlap(b.start, b.end, start, end))
        {
            return Ok(SlotValidation::rejected(SlotRejection::InsideBlockedTime));
        }

        let booked = self
            .appointments
            .find_active_between(agenda_id, start, end)
            .await?;
        if booked.iter().any(|a| a.overlaps(start, end)) {
            return Ok(SlotValidation::rejected(
                SlotRejection::ConflictsWithAppointment,
            ));
        }

        Ok(SlotValidation::ok())
    }

    /// Suggests bookable slots for a quotation: scans forward day by day
    /// over the configured horizon, emitting candidates at the
    /// configured step that fit entirely inside a free sub-interval,
    /// soonest first, capped at the configured maximum.
    ///
    /// A closed agenda yields no suggestions.
    ///
    /// # Errors
    ///
    /// - [`BookingError::NotFound`] when the quotation or the artist's
    ///   agenda does not exist
    /// - [`BookingError::UnprocessableEntity`] when the quotation has no
    ///   artist attached yet or requests a zero duration
    /// - [`BookingError::Store`] when a lookup fails
    pub async fn suggested_time_slots(
        &self,
        quotation_id: QuotationId,
    ) -> Result<Vec<TimeSlot>, BookingError> {
        let quotation = self
            .quotations
            .find_by_id(quotation_id)
            .await?
            .ok_or_else(|| BookingError::not_found("Quotation", quotation_id))?;
        let artist_id = quotation.artist_id.ok_or_else(|| {
            BookingError::unprocessable(format!(
                "quotation {quotation_id} has no artist attached yet"
            ))
        })?;
        if quotation.duration_minutes == 0 {
            return Err(BookingError::unprocessable(format!(
                "quotation {quotation_id} requests a zero duration"
            )));
        }
        let agenda = self
            .agendas
            .find_by_artist(artist_id)
            .await?
            .ok_or_else(|| BookingError::not_found("Agenda", artist_id))?;
        if !agenda.open {
            return Ok(Vec::new());
        }

        let now = self.clock.now();
        let earliest = quotation.proposed_start.map_or(now, |start| start.max(now));
        let duration = Duration::minutes(i64::from(quotation.duration_minutes));
        let step = Duration::minutes(i64::from(self.config.slot_step_minutes.max(1)));

        let mut slots = Vec::new();
        'days: for day_offset in 0..self.config.horizon_days {
            let date = (earliest + Duration::days(i64::from(day_offset))).date_naive();
            let free = self.free_intervals_for_day(&agenda, date).await?;
            for interval in free {
                let mut candidate = interval.start;
                while candidate + duration <= interval.end {
                    if candidate >= earliest {
                        slots.push(TimeSlot {
                            start: candidate,
                            end: candidate + duration,
                        });
                        if slots.len() >= self.config.max_suggestions {
                            break 'days;
                        }
                    }
                    candidate = candidate + step;
                }
            }
        }
        Ok(slots)
    }

    /// Free sub-intervals of one day, loading the agenda's blocks and
    /// bookings for that day.
    ///
    /// # Errors
    ///
    /// Returns [`BookingError::Store`] when a lookup fails.
    pub async fn free_intervals_for_day(
        &self,
        agenda: &Agenda,
        date: NaiveDate,
    ) -> Result<Vec<TimeSlot>, BookingError> {
        let day_start = date.and_time(NaiveTime::MIN).and_utc();
        let day_end = day_start + Duration::days(1);
        let blocks = self
            .blocked_times
            .find_overlapping(agenda.id, day_start, day_end)
            .await?;
        let booked = self
            .appointments
            .find_active_between(agenda.id, day_start, day_end)
            .await?;
        Ok(free_intervals(agenda, &blocks, &booked, date))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use atelier_core::agenda::WorkingDays;
    use atelier_core::ids::UserId;
    use atelier_testing::fixtures;
    use proptest::prelude::*;

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn at(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    #[test]
    fn day_off_has_no_free_intervals() {
        let mut agenda = fixtures::open_agenda(UserId::new());
        agenda.working_days = WorkingDays::WEEKDAYS;
        // 2025-06-07 is a Saturday
        let free = free_intervals(&agenda, &[], &[], date("2025-06-07"));
        assert!(free.is_empty());
    }

    #[test]
    fn blocks_and_bookings_split_the_window() {
        let agenda = fixtures::open_agenda(UserId::new());
        let block = BlockedTime::new(
            agenda.id,
            at("2025-06-02T11:00:00Z"),
            at("2025-06-02T12:00:00Z"),
            None,
        )
        .unwrap();
        let appointment = fixtures::scheduled_appointment(
            &agenda,
            UserId::new(),
            at("2025-06-02T14:00:00Z"),
            2,
        );

        let free = free_intervals(&agenda, &[block], &[appointment], date("2025-06-02"));
        let bounds: Vec<(DateTime<Utc>, DateTime<Utc>)> =
            free.iter().map(|slot| (slot.start, slot.end)).collect();
        assert_eq!(
            bounds,
            vec![
                (at("2025-06-02T09:00:00Z"), at("2025-06-02T11:00:00Z")),
                (at("2025-06-02T12:00:00Z"), at("2025-06-02T14:00:00Z")),
                (at("2025-06-02T16:00:00Z"), at("2025-06-02T18:00:00Z")),
            ]
        );
    }

    #[test]
    fn canceled_appointments_do_not_split_the_window() {
        let agenda = fixtures::open_agenda(UserId::new());
        let mut appointment = fixtures::scheduled_appointment(
            &agenda,
            UserId::new(),
            at("2025-06-02T14:00:00Z"),
            2,
        );
        appointment.record_status(atelier_core::appointment::StatusLogEntry {
            status: atelier_core::appointment::AppointmentStatus::Canceled,
            timestamp: at("2025-06-01T14:00:00Z"),
            actor: atelier_core::actor::Actor::customer(appointment.customer_id),
            reason: None,
            notes: None,
        });
        let free = free_intervals(&agenda, &[], &[appointment], date("2025-06-02"));
        assert_eq!(free.len(), 1);
        assert_eq!(free[0].start, at("2025-06-02T09:00:00Z"));
        assert_eq!(free[0].end, at("2025-06-02T18:00:00Z"));
    }

    proptest! {
        /// The overlap predicate is symmetric and touching intervals do
        /// not overlap.
        #[test]
        fn overlap_predicate_properties(a in 0i64..200, len_a in 1i64..50, b in 0i64..200, len_b in 1i64..50) {
            let base = at("2025-06-02T00:00:00Z");
            let (a_start, a_end) = (base + Duration::minutes(a), base + Duration::minutes(a + len_a));
            let (b_start, b_end) = (base + Duration::minutes(b), base + Duration::minutes(b + len_b));

            prop_assert_eq!(
                intervals_overlap(a_start, a_end, b_start, b_end),
                intervals_overlap(b_start, b_end, a_start, a_end)
            );
            // Touching never overlaps
            prop_assert!(!intervals_overlap(a_start, a_end, a_end, a_end + Duration::minutes(1)));
        }

        /// Free intervals never overlap the busy set they were carved
        /// around, and stay ordered.
        #[test]
        fn free_intervals_avoid_busy_time(starts in proptest::collection::vec(0i64..480, 0..6)) {
            let agenda = fixtures::open_agenda(UserId::new());
            let day = date("2025-06-02");
            let base = at("2025-06-02T09:00:00Z");
            let blocks: Vec<BlockedTime> = starts
                .iter()
                .map(|&offset| {
                    BlockedTime::new(
                        agenda.id,
                        base + Duration::minutes(offset),
                        base + Duration::minutes(offset + 30),
                        None,
                    )
                    .unwrap()
                })
                .collect();

            let free = free_intervals(&agenda, &blocks, &[], day);
            for slot in &free {
                prop_assert!(slot.start < slot.end);
                for block in &blocks {
                    prop_assert!(!intervals_overlap(slot.start, slot.end, block.start, block.end));
                }
            }
            for pair in free.windows(2) {
                prop_assert!(pair[0].end <= pair[1].start);
            }
        }
    }
}
