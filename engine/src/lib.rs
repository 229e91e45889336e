//! # Atelier Engine
//!
//! The booking workflow engine: everything between "a customer wants an
//! appointment" and "the appointment ended in a review or a
//! cancellation".
//!
//! ## Components
//!
//! - [`quotation`]: the negotiation state machine, a pure validator
//!   over [`QuotationStatus`](atelier_core::quotation::QuotationStatus)
//! - [`lifecycle`]: the appointment state machine with role-based
//!   authorization, the append-only audit log and best-effort customer
//!   notifications
//! - [`scheduling`]: free-interval derivation, slot validation and slot
//!   suggestion against working hours, blocked time and existing
//!   bookings
//! - [`penalty`]: the configuration-driven late-cancellation decision
//!   table
//! - [`agenda`]: working-hours and blocked-time management
//! - [`cancellation`]: the orchestrator composing penalty calculation,
//!   the lifecycle machine and asynchronous penalty processing
//! - [`negotiation`]: the service wiring the quotation machine to the
//!   scheduling engine, turning accepted quotations into appointments
//!
//! ## Architecture
//!
//! Services own no state; they hold `Arc<dyn ...>` ports from
//! `atelier-core` (stores, job queue, clock) and validate before they
//! persist. Domain errors propagate synchronously as
//! [`BookingError`](atelier_core::error::BookingError); side-effect jobs
//! are fire-and-forget: an enqueue failure is logged and never rolls
//! back a persisted state change.

pub mod agenda;
pub mod cancellation;
pub mod config;
pub mod lifecycle;
pub mod negotiation;
pub mod penalty;
pub mod quotation;
pub mod scheduling;

pub use cancellation::{CancelAppointment, CancellationOutcome};
pub use config::EngineConfig;
pub use lifecycle::{EventLifecycle, TransitionIntent, TransitionRequest};
pub use scheduling::{Availability, SlotValidation, TimeSlot};
