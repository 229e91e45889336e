//! `PostgreSQL` store implementations for the Atelier booking engine.
//!
//! One store struct per port from `atelier_core::store`, each holding a
//! cloned [`PgPool`]. Queries are runtime-checked (`sqlx::query`), rows
//! are mapped by hand, and status enums travel as their `as_str` forms.
//! Structured values (status logs, offers, penalty metadata) are stored
//! as JSONB.
//!
//! # Concurrency
//!
//! - [`PostgresAppointmentStore::save`] is an optimistic write: the
//!   `UPDATE` is guarded by the status the caller read, and a guard miss
//!   surfaces as [`StoreError::StaleWrite`]. Two concurrent
//!   cancellations cannot both pass the "not already canceled" check.
//! - The `blocked_times` table carries a btree-gist exclusion constraint
//!   over `(agenda_id, tstzrange(start_time, end_time, '[]'))`, so the
//!   application-level overlap check is backed by the database even when
//!   two creators race.
//!
//! # Schema
//!
//! [`schema::ensure_schema`] creates the tables, indexes and the
//! exclusion constraint on startup (idempotent `IF NOT EXISTS` DDL).

pub mod agendas;
pub mod appointments;
pub mod blocked_times;
pub mod penalties;
pub mod quotations;
pub mod schema;

pub use agendas::PostgresAgendaStore;
pub use appointments::PostgresAppointmentStore;
pub use blocked_times::PostgresBlockedTimeStore;
pub use penalties::PostgresPenaltyStore;
pub use quotations::PostgresQuotationStore;

use atelier_core::money::Money;
use atelier_core::store::StoreError;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

/// Connects a pool with the given size.
///
/// # Errors
///
/// Returns [`StoreError::Database`] when the pool cannot be created.
pub async fn connect(url: &str, max_connections: u32) -> Result<PgPool, StoreError> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(url)
        .await
        .map_err(db_err)
}

pub(crate) fn db_err(error: sqlx::Error) -> StoreError {
    StoreError::Database(error.to_string())
}

/// Money is stored as `BIGINT` cents.
#[allow(clippy::cast_possible_wrap)]
pub(crate) fn cents_to_db(money: Money) -> i64 {
    money.cents() as i64
}

pub(crate) fn cents_from_db(cents: i64) -> Result<Money, StoreError> {
    u64::try_from(cents)
        .map(Money::from_cents)
        .map_err(|_| StoreError::Serialization(format!("negative money amount: {cents}")))
}
