//! Blocked-time store.
//!
//! The table carries a btree-gist exclusion constraint over
//! `(agenda_id, tstzrange(start_time, end_time, '[]'))`, so overlapping
//! inserts racing past the engine's check are rejected by the database.

use atelier_core::agenda::BlockedTime;
use atelier_core::ids::{AgendaId, BlockedTimeId};
use atelier_core::store::{BlockedTimeStore, StoreError, StoreFuture};
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::db_err;

/// `PostgreSQL`-backed [`BlockedTimeStore`].
#[derive(Clone)]
pub struct PostgresBlockedTimeStore {
    pool: PgPool,
}

impl PostgresBlockedTimeStore {
    /// Creates a store over the given pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn row_to_block(row: &PgRow) -> Result<BlockedTime, StoreError> {
    let id: Uuid = row.try_get("id").map_err(db_err)?;
    let agenda_id: Uuid = row.try_get("agenda_id").map_err(db_err)?;
    Ok(BlockedTime {
        id: BlockedTimeId::from_uuid(id),
        agenda_id: AgendaId::from_uuid(agenda_id),
        start: row.try_get("start_time").map_err(db_err)?,
        end: row.try_get("end_time").map_err(db_err)?,
        reason: row.try_get("reason").map_err(db_err)?,
    })
}

impl BlockedTimeStore for PostgresBlockedTimeStore {
    fn find_for_agenda(&self, agenda_id: AgendaId) -> StoreFuture<'_, Vec<BlockedTime>> {
        Box::pin(async move {
            let rows = sqlx::query(
                r"SELECT id, agenda_id, start_time, end_time, reason
                  FROM blocked_times
                  WHERE agenda_id = $1
                  ORDER BY start_time",
            )
            .bind(agenda_id.as_uuid())
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?;
            rows.iter().map(row_to_block).collect()
        })
    }

    fn find_overlapping(
        &self,
        agenda_id: AgendaId,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> StoreFuture<'_, Vec<BlockedTime>> {
        Box::pin(async move {
            let rows = sqlx::query(
                r"SELECT id, agenda_id, start_time, end_time, reason
                  FROM blocked_times
                  WHERE agenda_id = $1 AND start_time <= $3 AND end_time >= $2
                  ORDER BY start_time",
            )
            .bind(agenda_id.as_uuid())
            .bind(start)
            .bind(end)
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?;
            rows.iter().map(row_to_block).collect()
        })
    }

    fn create(&self, block: BlockedTime) -> StoreFuture<'_, ()> {
        Box::pin(async move {
            sqlx::query(
                r"INSERT INTO blocked_times (id, agenda_id, start_time, end_time, reason)
                  VALUES ($1, $2, $3, $4, $5)",
            )
            .bind(block.id.as_uuid())
            .bind(block.agenda_id.as_uuid())
            .bind(block.start)
            .bind(block.end)
            .bind(&block.reason)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
            Ok(())
        })
    }

    fn delete(&self, agenda_id: AgendaId, id: BlockedTimeId) -> StoreFuture<'_, bool> {
        Box::pin(async move {
            let result = sqlx::query(
                "DELETE FROM blocked_times WHERE id = $1 AND agenda_id = $2",
            )
            .bind(id.as_uuid())
            .bind(agenda_id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
            Ok(result.rows_affected() > 0)
        })
    }
}
