//! Builders for common test entities.
//!
//! All fixtures are anchored around [`crate::mocks::test_clock`]
//! (2025-06-02 09:00 UTC, a Monday) so date arithmetic in tests stays
//! readable.

use atelier_core::actor::Actor;
use atelier_core::agenda::{Agenda, WorkingDays, WorkingHours};
use atelier_core::appointment::Appointment;
use atelier_core::ids::UserId;
use atelier_core::money::Money;
use atelier_core::quotation::Quotation;
use chrono::{DateTime, Duration, NaiveTime, Utc};

use crate::mocks::test_clock;
use atelier_core::clock::Clock;

/// A 09:00-18:00 window.
///
/// # Panics
///
/// Never panics in practice; the literals are valid times.
#[must_use]
#[allow(clippy::expect_used)]
pub fn nine_to_six() -> WorkingHours {
    WorkingHours::new(
        NaiveTime::from_hms_opt(9, 0, 0).expect("valid time"),
        NaiveTime::from_hms_opt(18, 0, 0).expect("valid time"),
    )
    .expect("ordered window")
}

/// An open, public agenda working 09:00-18:00 every day of the week.
#[must_use]
pub fn open_agenda(artist_id: UserId) -> Agenda {
    Agenda::new(artist_id, nine_to_six(), WorkingDays::EVERY_DAY)
}

/// A scheduled appointment of `duration_hours` on the given agenda.
///
/// # Panics
///
/// Panics when `start` + duration inverts the interval, which fixture
/// callers never do.
#[must_use]
#[allow(clippy::expect_used)]
pub fn scheduled_appointment(
    agenda: &Agenda,
    customer_id: UserId,
    start: DateTime<Utc>,
    duration_hours: i64,
) -> Appointment {
    Appointment::schedule(
        agenda.id,
        customer_id,
        None,
        start,
        start + Duration::hours(duration_hours),
        Actor::customer(customer_id),
        test_clock().now(),
    )
    .expect("fixture appointment interval is valid")
}

/// A quoted direct negotiation with an agreed price, ready to accept.
#[must_use]
pub fn priced_quotation(customer_id: UserId, artist_id: UserId, value: Money) -> Quotation {
    let mut quotation = Quotation::direct(
        customer_id,
        artist_id,
        "full sleeve session",
        120,
        test_clock().now(),
    );
    quotation.status = atelier_core::quotation::QuotationStatus::Quoted;
    quotation.agreed_price = Some(value);
    quotation
}
