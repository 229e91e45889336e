//! Agenda configuration: working hours, working days and blocked time.

use crate::error::BookingError;
use crate::ids::{AgendaId, BlockedTimeId, UserId};
use chrono::{DateTime, NaiveTime, Utc, Weekday};
use serde::{Deserialize, Serialize};

/// The set of weekdays an agenda accepts appointments on.
///
/// Stored as a bitset with Monday in the lowest bit, matching
/// [`Weekday::num_days_from_monday`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkingDays(u8);

impl WorkingDays {
    const MASK: u8 = 0b0111_1111;

    /// All seven days.
    pub const EVERY_DAY: Self = Self(Self::MASK);

    /// Monday through Friday.
    pub const WEEKDAYS: Self = Self(0b0001_1111);

    /// Builds a set from a slice of weekdays.
    #[must_use]
    pub fn from_days(days: &[Weekday]) -> Self {
        let mut bits = 0u8;
        for day in days {
            bits |= 1 << day.num_days_from_monday();
        }
        Self(bits)
    }

    /// Whether the set contains the given weekday.
    #[must_use]
    pub fn contains(&self, day: Weekday) -> bool {
        self.0 & (1 << day.num_days_from_monday()) != 0
    }

    /// Whether no day is a working day.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// Raw bit form, Monday in the lowest bit.
    #[must_use]
    pub const fn bits(&self) -> u8 {
        self.0
    }

    /// Rebuilds a set from its raw bit form; extra bits are dropped.
    #[must_use]
    pub const fn from_bits(bits: u8) -> Self {
        Self(bits & Self::MASK)
    }
}

/// Daily working-hours window (time of day, inclusive start, exclusive end).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkingHours {
    /// Start of the bookable day.
    pub start: NaiveTime,
    /// End of the bookable day, always after `start`.
    pub end: NaiveTime,
}

impl WorkingHours {
    /// Creates a working-hours window.
    ///
    /// # Errors
    ///
    /// Returns [`BookingError::BadRequest`] when `end` is not after
    /// `start`.
    pub fn new(start: NaiveTime, end: NaiveTime) -> Result<Self, BookingError> {
        if end <= start {
            return Err(BookingError::bad_request(
                "working hours must end after they start",
            ));
        }
        Ok(Self { start, end })
    }
}

/// One artist's calendar configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Agenda {
    /// Agenda identifier.
    pub id: AgendaId,
    /// The owning artist.
    pub artist_id: UserId,
    /// Daily bookable window.
    pub hours: WorkingHours,
    /// Days of the week the artist works.
    pub working_days: WorkingDays,
    /// Whether the agenda accepts new appointments.
    pub open: bool,
    /// Whether customers can see the agenda.
    pub public: bool,
}

impl Agenda {
    /// Creates an open, public agenda for an artist.
    #[must_use]
    pub fn new(artist_id: UserId, hours: WorkingHours, working_days: WorkingDays) -> Self {
        Self {
            id: AgendaId::new(),
            artist_id,
            hours,
            working_days,
            open: true,
            public: true,
        }
    }
}

/// A provider-declared interval during which nothing may be booked.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockedTime {
    /// Block identifier.
    pub id: BlockedTimeId,
    /// The agenda the block belongs to.
    pub agenda_id: AgendaId,
    /// Block start.
    pub start: DateTime<Utc>,
    /// Block end, always after `start`.
    pub end: DateTime<Utc>,
    /// Optional reason ("vacation", "convention", ...).
    pub reason: Option<String>,
}

impl BlockedTime {
    /// Creates a blocked-time interval.
    ///
    /// # Errors
    ///
    /// Returns [`BookingError::BadRequest`] when `end` is not after
    /// `start`.
    pub fn new(
        agenda_id: AgendaId,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        reason: Option<String>,
    ) -> Result<Self, BookingError> {
        if end <= start {
            return Err(BookingError::bad_request(
                "blocked time must end after it starts",
            ));
        }
        Ok(Self {
            id: BlockedTimeId::new(),
            agenda_id,
            start,
            end,
            reason,
        })
    }

    /// Inclusive overlap test used for blocked-time uniqueness:
    /// `self.start <= end && self.end >= start`. Full containment and
    /// shared endpoints both count as overlap.
    #[must_use]
    pub fn overlaps_inclusive(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        self.start <= end && self.end >= start
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn working_days_bitset() {
        let days = WorkingDays::from_days(&[Weekday::Mon, Weekday::Wed, Weekday::Sat]);
        assert!(days.contains(Weekday::Mon));
        assert!(days.contains(Weekday::Sat));
        assert!(!days.contains(Weekday::Sun));
        assert_eq!(WorkingDays::from_bits(days.bits()), days);
        assert!(WorkingDays::EVERY_DAY.contains(Weekday::Sun));
        assert!(!WorkingDays::WEEKDAYS.contains(Weekday::Sun));
    }

    #[test]
    fn working_hours_must_be_ordered() {
        let nine = NaiveTime::from_hms_opt(9, 0, 0).unwrap();
        let five = NaiveTime::from_hms_opt(17, 0, 0).unwrap();
        assert!(WorkingHours::new(nine, five).is_ok());
        assert!(matches!(
            WorkingHours::new(five, nine),
            Err(BookingError::BadRequest(_))
        ));
        assert!(WorkingHours::new(nine, nine).is_err());
    }

    #[test]
    fn blocked_time_overlap_is_inclusive() {
        let start = Utc::now();
        let block =
            BlockedTime::new(AgendaId::new(), start, start + Duration::hours(3), None).unwrap();
        // Full containment counts as overlap
        assert!(block.overlaps_inclusive(
            start + Duration::hours(1),
            start + Duration::hours(2)
        ));
        // Shared endpoint counts as overlap
        assert!(block.overlaps_inclusive(
            start + Duration::hours(3),
            start + Duration::hours(4)
        ));
        // Disjoint does not
        assert!(!block.overlaps_inclusive(
            start + Duration::hours(4),
            start + Duration::hours(5)
        ));
    }
}
