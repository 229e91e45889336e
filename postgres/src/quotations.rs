//! Quotation store.

use atelier_core::ids::{QuotationId, UserId};
use atelier_core::money::Money;
use atelier_core::quotation::{BudgetRange, Offer, Quotation, QuotationStatus, QuotationType};
use atelier_core::store::{QuotationStore, StoreError, StoreFuture};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::{cents_from_db, cents_to_db, db_err};

/// `PostgreSQL`-backed [`QuotationStore`].
#[derive(Clone)]
pub struct PostgresQuotationStore {
    pool: PgPool,
}

impl PostgresQuotationStore {
    /// Creates a store over the given pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const COLUMNS: &str = "id, customer_id, artist_id, status, kind, description, \
     budget_min_cents, budget_max_cents, proposed_start, duration_minutes, \
     agreed_price_cents, offers, created_at";

#[allow(clippy::cast_sign_loss)]
fn row_to_quotation(row: &PgRow) -> Result<Quotation, StoreError> {
    let id: Uuid = row.try_get("id").map_err(db_err)?;
    let customer_id: Uuid = row.try_get("customer_id").map_err(db_err)?;
    let artist_id: Option<Uuid> = row.try_get("artist_id").map_err(db_err)?;
    let status: String = row.try_get("status").map_err(db_err)?;
    let kind: String = row.try_get("kind").map_err(db_err)?;
    let budget_min: Option<i64> = row.try_get("budget_min_cents").map_err(db_err)?;
    let budget_max: Option<i64> = row.try_get("budget_max_cents").map_err(db_err)?;
    let duration_minutes: i32 = row.try_get("duration_minutes").map_err(db_err)?;
    let agreed_price: Option<i64> = row.try_get("agreed_price_cents").map_err(db_err)?;
    let offers: serde_json::Value = row.try_get("offers").map_err(db_err)?;
    let offers: Vec<Offer> =
        serde_json::from_value(offers).map_err(|e| StoreError::Serialization(e.to_string()))?;

    let budget = match (budget_min, budget_max) {
        (Some(min), Some(max)) => Some(BudgetRange {
            min: cents_from_db(min)?,
            max: cents_from_db(max)?,
        }),
        _ => None,
    };

    Ok(Quotation {
        id: QuotationId::from_uuid(id),
        customer_id: UserId::from_uuid(customer_id),
        artist_id: artist_id.map(UserId::from_uuid),
        status: QuotationStatus::parse(&status).map_err(StoreError::Serialization)?,
        kind: QuotationType::parse(&kind).map_err(StoreError::Serialization)?,
        description: row.try_get("description").map_err(db_err)?,
        budget,
        proposed_start: row.try_get("proposed_start").map_err(db_err)?,
        duration_minutes: duration_minutes as u32,
        agreed_price: agreed_price.map(cents_from_db).transpose()?,
        offers,
        created_at: row.try_get("created_at").map_err(db_err)?,
    })
}

fn offers_json(offers: &[Offer]) -> Result<serde_json::Value, StoreError> {
    serde_json::to_value(offers).map_err(|e| StoreError::Serialization(e.to_string()))
}

impl QuotationStore for PostgresQuotationStore {
    fn find_by_id(&self, id: QuotationId) -> StoreFuture<'_, Option<Quotation>> {
        Box::pin(async move {
            let row = sqlx::query(&format!("SELECT {COLUMNS} FROM quotations WHERE id = $1"))
                .bind(id.as_uuid())
                .fetch_optional(&self.pool)
                .await
                .map_err(db_err)?;
            row.as_ref().map(row_to_quotation).transpose()
        })
    }

    #[allow(clippy::cast_possible_wrap)]
    fn create(&self, quotation: Quotation) -> StoreFuture<'_, ()> {
        Box::pin(async move {
            sqlx::query(
                r"INSERT INTO quotations
                      (id, customer_id, artist_id, status, kind, description,
                       budget_min_cents, budget_max_cents, proposed_start,
                       duration_minutes, agreed_price_cents, offers, created_at)
                  VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)",
            )
            .bind(quotation.id.as_uuid())
            .bind(quotation.customer_id.as_uuid())
            .bind(quotation.artist_id.map(|id| *id.as_uuid()))
            .bind(quotation.status.as_str())
            .bind(quotation.kind.as_str())
            .bind(&quotation.description)
            .bind(quotation.budget.map(|b| cents_to_db(b.min)))
            .bind(quotation.budget.map(|b| cents_to_db(b.max)))
            .bind(quotation.proposed_start)
            .bind(quotation.duration_minutes as i32)
            .bind(quotation.agreed_price.map(cents_to_db))
            .bind(offers_json(&quotation.offers)?)
            .bind(quotation.created_at)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
            Ok(())
        })
    }

    #[allow(clippy::cast_possible_wrap)]
    fn save(&self, quotation: Quotation) -> StoreFuture<'_, ()> {
        Box::pin(async move {
            let result = sqlx::query(
                r"UPDATE quotations SET
                      artist_id = $2,
                      status = $3,
                      proposed_start = $4,
                      duration_minutes = $5,
                      agreed_price_cents = $6,
                      offers = $7
                  WHERE id = $1",
            )
            .bind(quotation.id.as_uuid())
            .bind(quotation.artist_id.map(|id| *id.as_uuid()))
            .bind(quotation.status.as_str())
            .bind(quotation.proposed_start)
            .bind(quotation.duration_minutes as i32)
            .bind(quotation.agreed_price.map(cents_to_db))
            .bind(offers_json(&quotation.offers)?)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
            if result.rows_affected() == 0 {
                return Err(StoreError::Database(format!(
                    "quotation {} does not exist",
                    quotation.id
                )));
            }
            Ok(())
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn money_round_trips_through_cents() {
        let money = Money::from_cents(12_345);
        assert_eq!(cents_from_db(cents_to_db(money)).unwrap(), money);
        assert!(cents_from_db(-1).is_err());
    }
}
