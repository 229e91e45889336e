//! Idempotent schema bootstrap.

use atelier_core::store::StoreError;
use sqlx::PgPool;

use crate::db_err;

/// Every DDL statement the stores rely on, in dependency order.
const STATEMENTS: &[&str] = &[
    "CREATE EXTENSION IF NOT EXISTS btree_gist",
    r"CREATE TABLE IF NOT EXISTS agendas (
        id UUID PRIMARY KEY,
        artist_id UUID NOT NULL UNIQUE,
        hours_start TIME NOT NULL,
        hours_end TIME NOT NULL,
        working_days SMALLINT NOT NULL,
        is_open BOOLEAN NOT NULL,
        is_public BOOLEAN NOT NULL,
        CHECK (hours_end > hours_start)
    )",
    r"CREATE TABLE IF NOT EXISTS quotations (
        id UUID PRIMARY KEY,
        customer_id UUID NOT NULL,
        artist_id UUID,
        status TEXT NOT NULL,
        kind TEXT NOT NULL,
        description TEXT NOT NULL,
        budget_min_cents BIGINT,
        budget_max_cents BIGINT,
        proposed_start TIMESTAMPTZ,
        duration_minutes INTEGER NOT NULL,
        agreed_price_cents BIGINT,
        offers JSONB NOT NULL DEFAULT '[]'::jsonb,
        created_at TIMESTAMPTZ NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS idx_quotations_customer ON quotations (customer_id)",
    "CREATE INDEX IF NOT EXISTS idx_quotations_artist ON quotations (artist_id)",
    r"CREATE TABLE IF NOT EXISTS appointments (
        id UUID PRIMARY KEY,
        agenda_id UUID NOT NULL REFERENCES agendas (id),
        customer_id UUID NOT NULL,
        quotation_id UUID REFERENCES quotations (id),
        start_time TIMESTAMPTZ NOT NULL,
        end_time TIMESTAMPTZ NOT NULL,
        status TEXT NOT NULL,
        status_log JSONB NOT NULL,
        notes TEXT,
        CHECK (end_time > start_time)
    )",
    "CREATE INDEX IF NOT EXISTS idx_appointments_agenda_time
        ON appointments (agenda_id, start_time)",
    r"CREATE TABLE IF NOT EXISTS blocked_times (
        id UUID PRIMARY KEY,
        agenda_id UUID NOT NULL REFERENCES agendas (id),
        start_time TIMESTAMPTZ NOT NULL,
        end_time TIMESTAMPTZ NOT NULL,
        reason TEXT,
        CHECK (end_time > start_time),
        EXCLUDE USING gist (
            agenda_id WITH =,
            tstzrange(start_time, end_time, '[]') WITH &&
        )
    )",
    r"CREATE TABLE IF NOT EXISTS cancellation_penalties (
        id UUID PRIMARY KEY,
        appointment_id UUID NOT NULL REFERENCES appointments (id),
        penalized_user_id UUID NOT NULL,
        agenda_id UUID NOT NULL REFERENCES agendas (id),
        quotation_id UUID REFERENCES quotations (id),
        penalty_type TEXT NOT NULL,
        amount_cents BIGINT,
        reputation_points INTEGER,
        status TEXT NOT NULL,
        metadata JSONB NOT NULL,
        created_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )",
    "CREATE INDEX IF NOT EXISTS idx_penalties_appointment
        ON cancellation_penalties (appointment_id)",
];

/// Creates the tables, indexes and constraints if they do not exist.
///
/// # Errors
///
/// Returns [`StoreError::Database`] when a statement fails.
pub async fn ensure_schema(pool: &PgPool) -> Result<(), StoreError> {
    for statement in STATEMENTS {
        sqlx::query(statement).execute(pool).await.map_err(db_err)?;
    }
    tracing::info!("booking schema ensured");
    Ok(())
}
