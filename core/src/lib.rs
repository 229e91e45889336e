//! # Atelier Core
//!
//! Domain types and ports for the Atelier booking platform.
//!
//! Atelier connects service providers ("artists") with customers: a
//! customer opens a quotation, the artist answers it, an accepted
//! quotation becomes a calendar appointment, and appointments move
//! through a lifecycle that ends in a review or a cancellation (possibly
//! with a financial or reputation penalty).
//!
//! This crate holds everything the workflow engine and the
//! infrastructure crates agree on:
//!
//! - **Value objects**: [`ids`], [`money::Money`], [`actor::Actor`]
//! - **Entities**: [`quotation::Quotation`], [`appointment::Appointment`],
//!   [`agenda::Agenda`], [`agenda::BlockedTime`],
//!   [`penalty::CancellationPenalty`]
//! - **Error taxonomy**: [`error::BookingError`]
//! - **Ports**: [`clock::Clock`], the store traits in [`store`], and the
//!   job queue contract in [`jobs`]
//!
//! There is no I/O here. The business rules live in `atelier-engine`;
//! the Postgres and Redpanda implementations of the ports live in
//! `atelier-postgres` and `atelier-queue`.
//!
//! # Dyn Compatibility
//!
//! The port traits return explicit `Pin<Box<dyn Future>>` instead of
//! `async fn` so they can be used as trait objects (`Arc<dyn
//! AppointmentStore>`) and injected into the engine's services.

pub mod actor;
pub mod agenda;
pub mod appointment;
pub mod clock;
pub mod error;
pub mod ids;
pub mod jobs;
pub mod money;
pub mod penalty;
pub mod quotation;
pub mod store;

pub use actor::{Actor, ActorRole};
pub use error::BookingError;
pub use money::Money;

// Re-export commonly used external types
pub use chrono::{DateTime, Utc};
pub use smallvec::{smallvec, SmallVec};
