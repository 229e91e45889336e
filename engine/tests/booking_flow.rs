//! Negotiation-to-appointment flows against the in-memory fakes.

#![allow(clippy::unwrap_used)]

use atelier_core::actor::Actor;
use atelier_core::appointment::AppointmentStatus;
use atelier_core::clock::Clock;
use atelier_core::error::BookingError;
use atelier_core::ids::UserId;
use atelier_core::money::Money;
use atelier_core::quotation::QuotationStatus;
use atelier_core::store::{AgendaStore, BlockedTimeStore};
use atelier_engine::config::SchedulingConfig;
use atelier_engine::negotiation::Negotiation;
use atelier_engine::scheduling::{intervals_overlap, Availability};
use atelier_testing::memory::{
    InMemoryAgendaStore, InMemoryAppointmentStore, InMemoryBlockedTimeStore,
    InMemoryQuotationStore,
};
use atelier_testing::{fixtures, test_clock};
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;

struct World {
    negotiation: Negotiation,
    availability: Arc<Availability>,
    agendas: InMemoryAgendaStore,
    appointments: InMemoryAppointmentStore,
    blocked_times: InMemoryBlockedTimeStore,
    artist_id: UserId,
    customer_id: UserId,
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

async fn world() -> World {
    init_tracing();
    let artist_id = UserId::new();
    let customer_id = UserId::new();

    let agendas = InMemoryAgendaStore::new();
    agendas.insert(fixtures::open_agenda(artist_id)).await;
    let appointments = InMemoryAppointmentStore::new(agendas.clone());
    let blocked_times = InMemoryBlockedTimeStore::new();
    let quotations = InMemoryQuotationStore::new();
    let clock = Arc::new(test_clock());

    let availability = Arc::new(Availability::new(
        Arc::new(agendas.clone()),
        Arc::new(blocked_times.clone()),
        Arc::new(appointments.clone()),
        Arc::new(quotations.clone()),
        clock.clone(),
        SchedulingConfig::default(),
    ));
    let negotiation = Negotiation::new(
        Arc::new(quotations),
        Arc::new(agendas.clone()),
        Arc::new(appointments.clone()),
        availability.clone(),
        clock,
    );

    World {
        negotiation,
        availability,
        agendas,
        appointments,
        blocked_times,
        artist_id,
        customer_id,
    }
}

/// Tomorrow at the given hour, relative to the fixed test clock.
fn tomorrow_at(hour: i64) -> DateTime<Utc> {
    test_clock().now() + Duration::days(1) + Duration::hours(hour - 9)
}

#[tokio::test]
async fn direct_negotiation_ends_in_a_scheduled_appointment() {
    let w = world().await;

    let quotation = w
        .negotiation
        .request_direct(
            w.customer_id,
            w.artist_id,
            "fine-line forearm piece",
            120,
            Some(tomorrow_at(10)),
            None,
        )
        .await
        .unwrap();
    assert_eq!(quotation.status, QuotationStatus::Pending);

    let quotation = w
        .negotiation
        .submit_quote(quotation.id, w.artist_id, Money::from_units(250), None)
        .await
        .unwrap();
    assert_eq!(quotation.status, QuotationStatus::Quoted);

    let (quotation, appointment) = w
        .negotiation
        .accept(quotation.id, w.customer_id)
        .await
        .unwrap();
    assert_eq!(quotation.status, QuotationStatus::Accepted);
    assert_eq!(appointment.status(), AppointmentStatus::Scheduled);
    assert_eq!(appointment.quotation_id, Some(quotation.id));
    assert_eq!(appointment.start, tomorrow_at(10));
    assert_eq!(appointment.end, tomorrow_at(12));

    // It now blocks the calendar.
    let validation = w
        .availability
        .validate_appointment_time(appointment.agenda_id, tomorrow_at(11), 60)
        .await
        .unwrap();
    assert!(!validation.valid);
}

#[tokio::test]
async fn appealed_quotes_can_be_requoted_and_accepted() {
    let w = world().await;
    let quotation = w
        .negotiation
        .request_direct(
            w.customer_id,
            w.artist_id,
            "cover-up",
            60,
            Some(tomorrow_at(14)),
            None,
        )
        .await
        .unwrap();

    w.negotiation
        .submit_quote(quotation.id, w.artist_id, Money::from_units(400), None)
        .await
        .unwrap();
    let appealed = w
        .negotiation
        .appeal(quotation.id, w.customer_id)
        .await
        .unwrap();
    assert_eq!(appealed.status, QuotationStatus::Appealed);

    let requoted = w
        .negotiation
        .submit_quote(quotation.id, w.artist_id, Money::from_units(320), None)
        .await
        .unwrap();
    assert_eq!(requoted.status, QuotationStatus::Quoted);
    assert_eq!(requoted.agreed_price, Some(Money::from_units(320)));

    let (accepted, _) = w
        .negotiation
        .accept(quotation.id, w.customer_id)
        .await
        .unwrap();
    assert_eq!(accepted.status, QuotationStatus::Accepted);
}

#[tokio::test]
async fn accept_refuses_a_conflicting_slot() {
    let w = world().await;
    let agenda = w.agendas.find_by_artist(w.artist_id).await.unwrap().unwrap();

    // Another customer already holds 10:00-12:00 tomorrow.
    let existing =
        fixtures::scheduled_appointment(&agenda, UserId::new(), tomorrow_at(10), 2);
    w.appointments.insert(existing).await;

    let quotation = w
        .negotiation
        .request_direct(
            w.customer_id,
            w.artist_id,
            "walk-in flash",
            60,
            Some(tomorrow_at(11)),
            None,
        )
        .await
        .unwrap();
    w.negotiation
        .submit_quote(quotation.id, w.artist_id, Money::from_units(120), None)
        .await
        .unwrap();

    let result = w.negotiation.accept(quotation.id, w.customer_id).await;
    assert!(matches!(result, Err(BookingError::UnprocessableEntity(_))));
}

#[tokio::test]
async fn open_quotations_collect_offers_until_one_is_chosen() {
    let w = world().await;
    let quotation = w
        .negotiation
        .request_open(
            w.customer_id,
            "blackwork sleeve, artist's choice",
            180,
            Some(tomorrow_at(9)),
            None,
        )
        .await
        .unwrap();

    let bidder = w.artist_id;
    let quotation = w
        .negotiation
        .submit_offer(
            quotation.id,
            bidder,
            Money::from_units(500),
            Some("portfolio attached".to_string()),
        )
        .await
        .unwrap();
    assert_eq!(quotation.offers.len(), 1);

    let chosen = w
        .negotiation
        .choose_offer(quotation.id, w.customer_id, quotation.offers[0].id)
        .await
        .unwrap();
    assert_eq!(chosen.status, QuotationStatus::Quoted);
    assert_eq!(chosen.artist_id, Some(bidder));
    assert_eq!(chosen.agreed_price, Some(Money::from_units(500)));

    // Offers stop once the negotiation left `pending`.
    let late_offer = w
        .negotiation
        .submit_offer(quotation.id, UserId::new(), Money::from_units(450), None)
        .await;
    assert!(matches!(late_offer, Err(BookingError::UnprocessableEntity(_))));

    let (accepted, appointment) = w
        .negotiation
        .accept(quotation.id, w.customer_id)
        .await
        .unwrap();
    assert_eq!(accepted.status, QuotationStatus::Accepted);
    assert_eq!(appointment.end - appointment.start, Duration::minutes(180));
}

#[tokio::test]
async fn suggested_slots_avoid_blocked_and_booked_time() {
    let w = world().await;
    let agenda = w.agendas.find_by_artist(w.artist_id).await.unwrap().unwrap();

    // Tomorrow: block 11:00-12:00, booking 14:00-16:00.
    let block = atelier_core::agenda::BlockedTime::new(
        agenda.id,
        tomorrow_at(11),
        tomorrow_at(12),
        Some("walk-ins".to_string()),
    )
    .unwrap();
    w.blocked_times
        .create(block.clone())
        .await
        .unwrap();
    let booked = fixtures::scheduled_appointment(&agenda, UserId::new(), tomorrow_at(14), 2);
    w.appointments.insert(booked.clone()).await;

    let quotation = w
        .negotiation
        .request_direct(
            w.customer_id,
            w.artist_id,
            "one hour touch-up",
            60,
            Some(tomorrow_at(9)),
            None,
        )
        .await
        .unwrap();

    let slots = w
        .availability
        .suggested_time_slots(quotation.id)
        .await
        .unwrap();

    // Capped, soonest first, and clean of conflicts.
    assert_eq!(slots.len(), SchedulingConfig::default().max_suggestions);
    assert_eq!(slots[0].start, tomorrow_at(9));
    for pair in slots.windows(2) {
        assert!(pair[0].start < pair[1].start);
    }
    for slot in &slots {
        assert!(!intervals_overlap(slot.start, slot.end, block.start, block.end));
        assert!(!intervals_overlap(slot.start, slot.end, booked.start, booked.end));
    }
}

#[tokio::test]
async fn closed_agendas_take_no_new_bookings() {
    let w = world().await;
    let mut agenda = w.agendas.find_by_artist(w.artist_id).await.unwrap().unwrap();
    agenda.open = false;
    w.agendas.save(agenda).await.unwrap();

    let request = w
        .negotiation
        .request_direct(
            w.customer_id,
            w.artist_id,
            "anything",
            60,
            Some(tomorrow_at(10)),
            None,
        )
        .await;
    assert!(matches!(request, Err(BookingError::UnprocessableEntity(_))));

    let direct = w
        .negotiation
        .book_direct(w.customer_id, w.artist_id, tomorrow_at(10), 60, None)
        .await;
    assert!(matches!(direct, Err(BookingError::UnprocessableEntity(_))));
}

#[tokio::test]
async fn direct_booking_validates_the_slot() {
    let w = world().await;

    // 30 minutes before closing: a one-hour session does not fit.
    let too_late = w
        .negotiation
        .book_direct(
            w.customer_id,
            w.artist_id,
            tomorrow_at(17) + Duration::minutes(30),
            60,
            None,
        )
        .await;
    assert!(matches!(too_late, Err(BookingError::UnprocessableEntity(_))));

    let booked = w
        .negotiation
        .book_direct(
            w.customer_id,
            w.artist_id,
            tomorrow_at(16),
            60,
            Some("walk-in".to_string()),
        )
        .await
        .unwrap();
    assert_eq!(booked.status(), AppointmentStatus::Scheduled);
    assert!(booked.quotation_id.is_none());
    assert_eq!(booked.notes.as_deref(), Some("walk-in"));
}

#[tokio::test]
async fn rejecting_is_open_to_both_parties_only() {
    let w = world().await;
    let quotation = w
        .negotiation
        .request_direct(
            w.customer_id,
            w.artist_id,
            "script lettering",
            60,
            Some(tomorrow_at(10)),
            None,
        )
        .await
        .unwrap();

    let stranger = w
        .negotiation
        .reject(quotation.id, Actor::artist(UserId::new()))
        .await;
    assert!(matches!(stranger, Err(BookingError::Forbidden(_))));

    let rejected = w
        .negotiation
        .reject(quotation.id, Actor::artist(w.artist_id))
        .await
        .unwrap();
    assert_eq!(rejected.status, QuotationStatus::Rejected);

    // Terminal: the customer cannot cancel afterwards.
    let cancel = w.negotiation.cancel(quotation.id, w.customer_id).await;
    assert!(matches!(cancel, Err(BookingError::UnprocessableEntity(_))));
}
