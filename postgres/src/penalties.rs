//! Cancellation-penalty store.

use atelier_core::ids::{AgendaId, AppointmentId, PenaltyId, QuotationId, UserId};
use atelier_core::penalty::{CancellationPenalty, PenaltyMetadata, PenaltyStatus, PenaltyType};
use atelier_core::store::{PenaltyStore, StoreError, StoreFuture};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::{cents_from_db, cents_to_db, db_err};

/// `PostgreSQL`-backed [`PenaltyStore`].
#[derive(Clone)]
pub struct PostgresPenaltyStore {
    pool: PgPool,
}

impl PostgresPenaltyStore {
    /// Creates a store over the given pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn row_to_penalty(row: &PgRow) -> Result<CancellationPenalty, StoreError> {
    let id: Uuid = row.try_get("id").map_err(db_err)?;
    let appointment_id: Uuid = row.try_get("appointment_id").map_err(db_err)?;
    let penalized_user_id: Uuid = row.try_get("penalized_user_id").map_err(db_err)?;
    let agenda_id: Uuid = row.try_get("agenda_id").map_err(db_err)?;
    let quotation_id: Option<Uuid> = row.try_get("quotation_id").map_err(db_err)?;
    let penalty_type: String = row.try_get("penalty_type").map_err(db_err)?;
    let amount: Option<i64> = row.try_get("amount_cents").map_err(db_err)?;
    let status: String = row.try_get("status").map_err(db_err)?;
    let metadata: serde_json::Value = row.try_get("metadata").map_err(db_err)?;
    let metadata: PenaltyMetadata = serde_json::from_value(metadata)
        .map_err(|e| StoreError::Serialization(e.to_string()))?;

    Ok(CancellationPenalty {
        id: PenaltyId::from_uuid(id),
        appointment_id: AppointmentId::from_uuid(appointment_id),
        penalized_user_id: UserId::from_uuid(penalized_user_id),
        agenda_id: AgendaId::from_uuid(agenda_id),
        quotation_id: quotation_id.map(QuotationId::from_uuid),
        penalty_type: PenaltyType::parse(&penalty_type).map_err(StoreError::Serialization)?,
        amount: amount.map(cents_from_db).transpose()?,
        reputation_points: row.try_get("reputation_points").map_err(db_err)?,
        status: PenaltyStatus::parse(&status).map_err(StoreError::Serialization)?,
        metadata,
    })
}

impl PenaltyStore for PostgresPenaltyStore {
    fn create(&self, penalty: CancellationPenalty) -> StoreFuture<'_, ()> {
        Box::pin(async move {
            let metadata = serde_json::to_value(&penalty.metadata)
                .map_err(|e| StoreError::Serialization(e.to_string()))?;
            sqlx::query(
                r"INSERT INTO cancellation_penalties
                      (id, appointment_id, penalized_user_id, agenda_id, quotation_id,
                       penalty_type, amount_cents, reputation_points, status, metadata,
                       created_at)
                  VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)",
            )
            .bind(penalty.id.as_uuid())
            .bind(penalty.appointment_id.as_uuid())
            .bind(penalty.penalized_user_id.as_uuid())
            .bind(penalty.agenda_id.as_uuid())
            .bind(penalty.quotation_id.map(|id| *id.as_uuid()))
            .bind(penalty.penalty_type.as_str())
            .bind(penalty.amount.map(cents_to_db))
            .bind(penalty.reputation_points)
            .bind(penalty.status.as_str())
            .bind(metadata)
            .bind(penalty.metadata.cancellation_time)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
            Ok(())
        })
    }

    fn find_by_appointment(
        &self,
        appointment_id: AppointmentId,
    ) -> StoreFuture<'_, Vec<CancellationPenalty>> {
        Box::pin(async move {
            let rows = sqlx::query(
                r"SELECT id, appointment_id, penalized_user_id, agenda_id, quotation_id,
                         penalty_type, amount_cents, reputation_points, status, metadata
                  FROM cancellation_penalties
                  WHERE appointment_id = $1
                  ORDER BY created_at",
            )
            .bind(appointment_id.as_uuid())
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?;
            rows.iter().map(row_to_penalty).collect()
        })
    }

    fn set_status(&self, id: PenaltyId, status: PenaltyStatus) -> StoreFuture<'_, ()> {
        Box::pin(async move {
            let result =
                sqlx::query("UPDATE cancellation_penalties SET status = $2 WHERE id = $1")
                    .bind(id.as_uuid())
                    .bind(status.as_str())
                    .execute(&self.pool)
                    .await
                    .map_err(db_err)?;
            if result.rows_affected() == 0 {
                return Err(StoreError::Database(format!("penalty {id} does not exist")));
            }
            Ok(())
        })
    }
}
