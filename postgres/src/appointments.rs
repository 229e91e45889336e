//! Appointment store.
//!
//! `save` is the optimistic write described in `atelier_core::store`:
//! the `UPDATE` only lands when the persisted status still matches what
//! the caller read, so concurrent transitions of one appointment cannot
//! silently overwrite each other.

use atelier_core::agenda::{Agenda, WorkingDays, WorkingHours};
use atelier_core::appointment::{Appointment, AppointmentStatus, StatusLogEntry};
use atelier_core::ids::{AgendaId, AppointmentId, QuotationId, UserId};
use atelier_core::store::{AppointmentStore, StoreError, StoreFuture};
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::db_err;

/// `PostgreSQL`-backed [`AppointmentStore`].
#[derive(Clone)]
pub struct PostgresAppointmentStore {
    pool: PgPool,
}

impl PostgresAppointmentStore {
    /// Creates a store over the given pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const COLUMNS: &str = "id, agenda_id, customer_id, quotation_id, start_time, end_time, \
     status, status_log, notes";

fn row_to_appointment(row: &PgRow) -> Result<Appointment, StoreError> {
    let id: Uuid = row.try_get("id").map_err(db_err)?;
    let agenda_id: Uuid = row.try_get("agenda_id").map_err(db_err)?;
    let customer_id: Uuid = row.try_get("customer_id").map_err(db_err)?;
    let quotation_id: Option<Uuid> = row.try_get("quotation_id").map_err(db_err)?;
    let status: String = row.try_get("status").map_err(db_err)?;
    let status_log: serde_json::Value = row.try_get("status_log").map_err(db_err)?;
    let status_log: Vec<StatusLogEntry> = serde_json::from_value(status_log)
        .map_err(|e| StoreError::Serialization(e.to_string()))?;

    Appointment::from_parts(
        AppointmentId::from_uuid(id),
        AgendaId::from_uuid(agenda_id),
        UserId::from_uuid(customer_id),
        quotation_id.map(QuotationId::from_uuid),
        row.try_get("start_time").map_err(db_err)?,
        row.try_get("end_time").map_err(db_err)?,
        AppointmentStatus::parse(&status).map_err(StoreError::Serialization)?,
        status_log,
        row.try_get("notes").map_err(db_err)?,
    )
    .map_err(StoreError::Serialization)
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn row_to_agenda(row: &PgRow) -> Result<Agenda, StoreError> {
    let agenda_id: Uuid = row.try_get("agenda_id").map_err(db_err)?;
    let artist_id: Uuid = row.try_get("artist_id").map_err(db_err)?;
    let working_days: i16 = row.try_get("working_days").map_err(db_err)?;
    Ok(Agenda {
        id: AgendaId::from_uuid(agenda_id),
        artist_id: UserId::from_uuid(artist_id),
        hours: WorkingHours {
            start: row.try_get("hours_start").map_err(db_err)?,
            end: row.try_get("hours_end").map_err(db_err)?,
        },
        working_days: WorkingDays::from_bits(working_days as u8),
        open: row.try_get("is_open").map_err(db_err)?,
        public: row.try_get("is_public").map_err(db_err)?,
    })
}

fn log_json(appointment: &Appointment) -> Result<serde_json::Value, StoreError> {
    serde_json::to_value(appointment.status_log())
        .map_err(|e| StoreError::Serialization(e.to_string()))
}

impl AppointmentStore for PostgresAppointmentStore {
    fn find_with_agenda(
        &self,
        id: AppointmentId,
    ) -> StoreFuture<'_, Option<(Appointment, Agenda)>> {
        Box::pin(async move {
            let row = sqlx::query(
                r"SELECT a.id, a.agenda_id, a.customer_id, a.quotation_id,
                         a.start_time, a.end_time, a.status, a.status_log, a.notes,
                         g.artist_id, g.hours_start, g.hours_end, g.working_days,
                         g.is_open, g.is_public
                  FROM appointments a
                  JOIN agendas g ON g.id = a.agenda_id
                  WHERE a.id = $1",
            )
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;
            row.as_ref()
                .map(|row| Ok((row_to_appointment(row)?, row_to_agenda(row)?)))
                .transpose()
        })
    }

    fn find_active_between(
        &self,
        agenda_id: AgendaId,
        from: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> StoreFuture<'_, Vec<Appointment>> {
        Box::pin(async move {
            let rows = sqlx::query(&format!(
                r"SELECT {COLUMNS}
                  FROM appointments
                  WHERE agenda_id = $1
                    AND status <> 'canceled'
                    AND start_time < $3
                    AND end_time > $2
                  ORDER BY start_time"
            ))
            .bind(agenda_id.as_uuid())
            .bind(from)
            .bind(until)
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?;
            rows.iter().map(row_to_appointment).collect()
        })
    }

    fn create(&self, appointment: Appointment) -> StoreFuture<'_, ()> {
        Box::pin(async move {
            sqlx::query(
                r"INSERT INTO appointments
                      (id, agenda_id, customer_id, quotation_id, start_time, end_time,
                       status, status_log, notes)
                  VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
            )
            .bind(appointment.id.as_uuid())
            .bind(appointment.agenda_id.as_uuid())
            .bind(appointment.customer_id.as_uuid())
            .bind(appointment.quotation_id.map(|id| *id.as_uuid()))
            .bind(appointment.start)
            .bind(appointment.end)
            .bind(appointment.status().as_str())
            .bind(log_json(&appointment)?)
            .bind(&appointment.notes)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
            Ok(())
        })
    }

    fn save(
        &self,
        appointment: Appointment,
        expected_status: AppointmentStatus,
    ) -> StoreFuture<'_, ()> {
        Box::pin(async move {
            let result = sqlx::query(
                r"UPDATE appointments SET
                      start_time = $3,
                      end_time = $4,
                      status = $5,
                      status_log = $6,
                      notes = $7
                  WHERE id = $1 AND status = $2",
            )
            .bind(appointment.id.as_uuid())
            .bind(expected_status.as_str())
            .bind(appointment.start)
            .bind(appointment.end)
            .bind(appointment.status().as_str())
            .bind(log_json(&appointment)?)
            .bind(&appointment.notes)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;

            if result.rows_affected() > 0 {
                return Ok(());
            }

            // Guard miss: tell a stale write apart from a missing row.
            let current: Option<String> =
                sqlx::query_scalar("SELECT status FROM appointments WHERE id = $1")
                    .bind(appointment.id.as_uuid())
                    .fetch_optional(&self.pool)
                    .await
                    .map_err(db_err)?;
            match current {
                Some(status) => Err(StoreError::StaleWrite(format!(
                    "appointment {} is {} but the caller read {}",
                    appointment.id, status, expected_status
                ))),
                None => Err(StoreError::Database(format!(
                    "appointment {} does not exist",
                    appointment.id
                ))),
            }
        })
    }
}
