//! End-to-end cancellation scenarios against the in-memory fakes.

#![allow(clippy::unwrap_used, clippy::panic)]

use atelier_core::actor::ActorRole;
use atelier_core::appointment::{Appointment, AppointmentStatus};
use atelier_core::clock::Clock;
use atelier_core::error::BookingError;
use atelier_core::ids::{AppointmentId, UserId};
use atelier_core::jobs::{Job, PROCESS_PENALTY_V1};
use atelier_core::money::Money;
use atelier_core::penalty::{PenaltyStatus, PenaltyType};
use atelier_engine::cancellation::CancelAppointment;
use atelier_engine::config::PenaltyConfig;
use atelier_engine::lifecycle::EventLifecycle;
use atelier_engine::penalty::PenaltyCalculator;
use atelier_testing::memory::{
    InMemoryAgendaStore, InMemoryAppointmentStore, InMemoryPenaltyStore, InMemoryQuotationStore,
};
use atelier_testing::{fixtures, test_clock, RecordingJobQueue};
use chrono::Duration;
use std::sync::Arc;

struct World {
    orchestrator: CancelAppointment,
    appointments: InMemoryAppointmentStore,
    penalties: InMemoryPenaltyStore,
    queue: RecordingJobQueue,
    artist_id: UserId,
    customer_id: UserId,
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// An appointment starting `hours_out` from the fixed clock, linked to a
/// quotation worth 100.00.
async fn world(hours_out: i64) -> (World, Appointment) {
    init_tracing();
    let artist_id = UserId::new();
    let customer_id = UserId::new();
    let agenda = fixtures::open_agenda(artist_id);

    let agendas = InMemoryAgendaStore::new();
    agendas.insert(agenda.clone()).await;
    let appointments = InMemoryAppointmentStore::new(agendas);

    let quotation = fixtures::priced_quotation(customer_id, artist_id, Money::from_units(100));
    let quotations = InMemoryQuotationStore::new();
    quotations.insert(quotation.clone()).await;

    let start = test_clock().now() + Duration::hours(hours_out);
    let mut appointment = fixtures::scheduled_appointment(&agenda, customer_id, start, 2);
    appointment.quotation_id = Some(quotation.id);
    appointments.insert(appointment.clone()).await;

    let penalties = InMemoryPenaltyStore::new();
    let queue = RecordingJobQueue::new();
    let clock = Arc::new(test_clock());

    let lifecycle = Arc::new(EventLifecycle::new(
        Arc::new(appointments.clone()),
        Arc::new(queue.clone()),
        clock.clone(),
    ));
    let calculator = PenaltyCalculator::new(
        Arc::new(quotations),
        clock.clone(),
        PenaltyConfig::default(),
    );
    let orchestrator = CancelAppointment::new(
        Arc::new(appointments.clone()),
        Arc::new(penalties.clone()),
        Arc::new(queue.clone()),
        lifecycle,
        calculator,
    );

    (
        World {
            orchestrator,
            appointments,
            penalties,
            queue,
            artist_id,
            customer_id,
        },
        appointment,
    )
}

#[tokio::test]
async fn artist_canceling_one_hour_before_pays_twenty_percent() {
    let (world, appointment) = world(1).await;

    let outcome = world
        .orchestrator
        .execute(
            appointment.id,
            world.artist_id,
            ActorRole::Artist,
            "machine broke down".to_string(),
            None,
        )
        .await
        .unwrap();

    assert!(outcome.penalty_applied);
    let penalty_id = outcome.penalty_id.unwrap();

    // The penalty row: 20% of 100.00, reputation -2, pending, audited.
    let rows = world.penalties.all().await;
    assert_eq!(rows.len(), 1);
    let row = &rows[0];
    assert_eq!(row.id, penalty_id);
    assert_eq!(row.penalty_type, PenaltyType::Percentage);
    assert_eq!(row.amount, Some(Money::from_cents(2_000)));
    assert_eq!(row.reputation_points, Some(-2));
    assert_eq!(row.status, PenaltyStatus::Pending);
    assert_eq!(row.penalized_user_id, world.artist_id);
    assert_eq!(row.metadata.initiator_id, Some(world.artist_id));
    assert_eq!(row.metadata.reason.as_deref(), Some("machine broke down"));
    assert_eq!(row.metadata.penalized_role, ActorRole::Artist);

    // The appointment ended up canceled with the reason in its log.
    let stored = world.appointments.get(appointment.id).await.unwrap();
    assert_eq!(stored.status(), AppointmentStatus::Canceled);
    let last = stored.status_log().last().unwrap();
    assert_eq!(last.reason.as_deref(), Some("machine broke down"));

    // One penalty job (versioned envelope), then one notification.
    let jobs = world.queue.enqueued();
    assert_eq!(jobs.len(), 2);
    let Job::ProcessPenalty(penalty_job) = &jobs[0] else {
        panic!("expected the penalty job first");
    };
    assert_eq!(penalty_job.job_id, PROCESS_PENALTY_V1);
    assert_eq!(penalty_job.penalty.id, penalty_id);
    let Job::Notify(notification) = &jobs[1] else {
        panic!("expected the notification second");
    };
    assert_eq!(notification.metadata.message, "appointment canceled");
    assert_eq!(notification.metadata.customer_id, world.customer_id);
}

#[tokio::test]
async fn customer_canceling_thirty_hours_before_pays_the_reduced_fee() {
    let (world, appointment) = world(30).await;

    let outcome = world
        .orchestrator
        .execute(
            appointment.id,
            world.customer_id,
            ActorRole::Customer,
            "found another studio".to_string(),
            None,
        )
        .await
        .unwrap();

    assert!(outcome.penalty_applied);
    let rows = world.penalties.all().await;
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].penalty_type, PenaltyType::FixedFee);
    assert_eq!(rows[0].amount, Some(Money::from_cents(1_000)));
    assert_eq!(rows[0].reputation_points, Some(0));
    assert_eq!(rows[0].penalized_user_id, world.customer_id);
}

#[tokio::test]
async fn customer_canceling_fifty_hours_before_pays_nothing() {
    let (world, appointment) = world(50).await;

    let outcome = world
        .orchestrator
        .execute(
            appointment.id,
            world.customer_id,
            ActorRole::Customer,
            "found another studio".to_string(),
            None,
        )
        .await
        .unwrap();

    assert!(!outcome.penalty_applied);
    assert!(outcome.penalty_id.is_none());
    assert!(world.penalties.all().await.is_empty());

    let stored = world.appointments.get(appointment.id).await.unwrap();
    assert_eq!(stored.status(), AppointmentStatus::Canceled);

    // Only the cancellation notification was fired.
    let jobs = world.queue.enqueued();
    assert_eq!(jobs.len(), 1);
    assert!(matches!(jobs[0], Job::Notify(_)));
}

#[tokio::test]
async fn second_cancellation_conflicts_and_creates_no_second_penalty() {
    let (world, appointment) = world(1).await;

    world
        .orchestrator
        .execute(
            appointment.id,
            world.customer_id,
            ActorRole::Customer,
            "first".to_string(),
            None,
        )
        .await
        .unwrap();
    assert_eq!(world.penalties.all().await.len(), 1);

    let second = world
        .orchestrator
        .execute(
            appointment.id,
            world.customer_id,
            ActorRole::Customer,
            "second".to_string(),
            None,
        )
        .await;
    assert!(matches!(second, Err(BookingError::Conflict(_))));
    assert_eq!(world.penalties.all().await.len(), 1);
}

#[tokio::test]
async fn broker_outage_leaves_the_penalty_pending() {
    let (world, appointment) = world(1).await;
    world.queue.set_failing(true);

    let outcome = world
        .orchestrator
        .execute(
            appointment.id,
            world.customer_id,
            ActorRole::Customer,
            "sick".to_string(),
            Some("has a doctor's note".to_string()),
        )
        .await
        .unwrap();

    // The dispatch failure is swallowed: the cancellation succeeded, the
    // row stays pending for reconciliation, nothing reached the broker.
    assert!(outcome.penalty_applied);
    let rows = world.penalties.all().await;
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].status, PenaltyStatus::Pending);
    assert!(world.queue.enqueued().is_empty());

    let stored = world.appointments.get(appointment.id).await.unwrap();
    assert_eq!(stored.status(), AppointmentStatus::Canceled);
}

#[tokio::test]
async fn strangers_cannot_cancel() {
    let (world, appointment) = world(1).await;

    for role in [ActorRole::Artist, ActorRole::Customer] {
        let result = world
            .orchestrator
            .execute(
                appointment.id,
                UserId::new(),
                role,
                "not mine".to_string(),
                None,
            )
            .await;
        assert!(matches!(result, Err(BookingError::Forbidden(_))));
    }
    assert!(world.penalties.all().await.is_empty());
    let stored = world.appointments.get(appointment.id).await.unwrap();
    assert_eq!(stored.status(), AppointmentStatus::Scheduled);
}

#[tokio::test]
async fn unknown_appointment_is_not_found() {
    let (world, _) = world(1).await;
    let result = world
        .orchestrator
        .execute(
            AppointmentId::new(),
            world.customer_id,
            ActorRole::Customer,
            "whoops".to_string(),
            None,
        )
        .await;
    assert!(matches!(result, Err(BookingError::NotFound { .. })));
}
