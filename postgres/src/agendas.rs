//! Agenda store.

use atelier_core::agenda::{Agenda, WorkingDays, WorkingHours};
use atelier_core::ids::{AgendaId, UserId};
use atelier_core::store::{AgendaStore, StoreError, StoreFuture};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::db_err;

/// `PostgreSQL`-backed [`AgendaStore`].
#[derive(Clone)]
pub struct PostgresAgendaStore {
    pool: PgPool,
}

impl PostgresAgendaStore {
    /// Creates a store over the given pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const COLUMNS: &str = "id, artist_id, hours_start, hours_end, working_days, is_open, is_public";

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn row_to_agenda(row: &PgRow) -> Result<Agenda, StoreError> {
    let id: Uuid = row.try_get("id").map_err(db_err)?;
    let artist_id: Uuid = row.try_get("artist_id").map_err(db_err)?;
    let working_days: i16 = row.try_get("working_days").map_err(db_err)?;
    Ok(Agenda {
        id: AgendaId::from_uuid(id),
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

impl AgendaStore for PostgresAgendaStore {
    fn find_by_id(&self, id: AgendaId) -> StoreFuture<'_, Option<Agenda>> {
        Box::pin(async move {
            let row = sqlx::query(&format!("SELECT {COLUMNS} FROM agendas WHERE id = $1"))
                .bind(id.as_uuid())
                .fetch_optional(&self.pool)
                .await
                .map_err(db_err)?;
            row.as_ref().map(row_to_agenda).transpose()
        })
    }

    fn find_by_artist(&self, artist_id: UserId) -> StoreFuture<'_, Option<Agenda>> {
        Box::pin(async move {
            let row =
                sqlx::query(&format!("SELECT {COLUMNS} FROM agendas WHERE artist_id = $1"))
                    .bind(artist_id.as_uuid())
                    .fetch_optional(&self.pool)
                    .await
                    .map_err(db_err)?;
            row.as_ref().map(row_to_agenda).transpose()
        })
    }

    fn save(&self, agenda: Agenda) -> StoreFuture<'_, ()> {
        Box::pin(async move {
            sqlx::query(
                r"INSERT INTO agendas (id, artist_id, hours_start, hours_end, working_days, is_open, is_public)
                  VALUES ($1, $2, $3, $4, $5, $6, $7)
                  ON CONFLICT (id) DO UPDATE SET
                      hours_start = EXCLUDED.hours_start,
                      hours_end = EXCLUDED.hours_end,
                      working_days = EXCLUDED.working_days,
                      is_open = EXCLUDED.is_open,
                      is_public = EXCLUDED.is_public",
            )
            .bind(agenda.id.as_uuid())
            .bind(agenda.artist_id.as_uuid())
            .bind(agenda.hours.start)
            .bind(agenda.hours.end)
            .bind(i16::from(agenda.working_days.bits()))
            .bind(agenda.open)
            .bind(agenda.public)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
            Ok(())
        })
    }
}
