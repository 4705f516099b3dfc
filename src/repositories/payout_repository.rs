use crate::error::{AppError, Result};
use crate::models::{ItemType, Payout, PayoutItem, PayoutStatus};
use chrono::{NaiveDate, Utc};
use sqlx::{PgPool, Postgres, Transaction};

/// Repository for `payouts` and their `payout_items` breakdown rows.
pub struct PayoutRepository {
    pool: PgPool,
}

impl PayoutRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn get_by_id(&self, id: i64) -> Result<Option<Payout>> {
        let row = sqlx::query_as::<_, Payout>(
            r#"
            SELECT id, restaurant_id, amount_cents, currency, as_of, status,
                   created_at, paid_at, failure_reason, metadata
            FROM payouts
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::Database)?;

        Ok(row)
    }

    pub async fn get_by_id_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        id: i64,
    ) -> Result<Option<Payout>> {
        let row = sqlx::query_as::<_, Payout>(
            r#"
            SELECT id, restaurant_id, amount_cents, currency, as_of, status,
                   created_at, paid_at, failure_reason, metadata
            FROM payouts
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&mut **tx)
        .await
        .map_err(AppError::Database)?;

        Ok(row)
    }

    pub async fn get_items(&self, payout_id: i64) -> Result<Vec<PayoutItem>> {
        let rows = sqlx::query_as::<_, PayoutItem>(
            "SELECT id, payout_id, item_type, amount_cents FROM payout_items WHERE payout_id = $1 ORDER BY id",
        )
        .bind(payout_id)
        .fetch_all(&self.pool)
        .await
        .map_err(AppError::Database)?;

        Ok(rows)
    }

    /// True when a non-terminal payout already exists for (restaurant, currency) —
    /// the pending-payout guard shared by both the batch and single-restaurant paths
    /// (§4.3).
    pub async fn has_pending_payout(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        restaurant_id: &str,
        currency: &str,
    ) -> Result<bool> {
        let row: Option<(i64,)> = sqlx::query_as(
            r#"
            SELECT id FROM payouts
            WHERE restaurant_id = $1 AND currency = $2
              AND status IN ('created', 'processing')
            LIMIT 1
            "#,
        )
        .bind(restaurant_id)
        .bind(currency)
        .fetch_optional(&mut **tx)
        .await
        .map_err(AppError::Database)?;

        Ok(row.is_some())
    }

    /// True when a payout already exists for (restaurant, currency, as_of) —
    /// the batch run's idempotency guard (§4.3, §8).
    pub async fn exists_for_as_of(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        restaurant_id: &str,
        currency: &str,
        as_of: NaiveDate,
    ) -> Result<bool> {
        let row: Option<(i64,)> = sqlx::query_as(
            "SELECT id FROM payouts WHERE restaurant_id = $1 AND currency = $2 AND as_of = $3",
        )
        .bind(restaurant_id)
        .bind(currency)
        .bind(as_of)
        .fetch_optional(&mut **tx)
        .await
        .map_err(AppError::Database)?;

        Ok(row.is_some())
    }

    /// Inserts the payout itself. A concurrent identical batch run racing on
    /// `UNIQUE(restaurant_id, currency, as_of)` surfaces as `AppError::Database` and is
    /// treated by the caller as "already done" (§4.3's idempotency note).
    pub async fn create_payout(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        restaurant_id: &str,
        amount_cents: i64,
        currency: &str,
        as_of: NaiveDate,
    ) -> Result<Payout> {
        let row = sqlx::query_as::<_, Payout>(
            r#"
            INSERT INTO payouts (restaurant_id, amount_cents, currency, as_of, status)
            VALUES ($1, $2, $3, $4, 'created')
            RETURNING id, restaurant_id, amount_cents, currency, as_of, status,
                      created_at, paid_at, failure_reason, metadata
            "#,
        )
        .bind(restaurant_id)
        .bind(amount_cents)
        .bind(currency)
        .bind(as_of)
        .fetch_one(&mut **tx)
        .await
        .map_err(AppError::Database)?;

        Ok(row)
    }

    /// Inserts the breakdown rows for a payout, dropping zero totals (§4.3 step 2e,
    /// §8's "zero breakdown lines are dropped" boundary behavior).
    pub async fn create_items(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        payout_id: i64,
        breakdown: &[(ItemType, i64)],
    ) -> Result<Vec<PayoutItem>> {
        let mut created = Vec::with_capacity(breakdown.len());
        for (item_type, amount_cents) in breakdown {
            if *amount_cents == 0 {
                continue;
            }
            let row = sqlx::query_as::<_, PayoutItem>(
                r#"
                INSERT INTO payout_items (payout_id, item_type, amount_cents)
                VALUES ($1, $2, $3)
                RETURNING id, payout_id, item_type, amount_cents
                "#,
            )
            .bind(payout_id)
            .bind(item_type)
            .bind(amount_cents)
            .fetch_one(&mut **tx)
            .await
            .map_err(AppError::Database)?;
            created.push(row);
        }
        Ok(created)
    }

    /// Transitions a payout's status. `Paid` always stamps `paid_at`; `Failed`
    /// requires a reason (§4.5).
    pub async fn update_status(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        payout_id: i64,
        status: PayoutStatus,
        failure_reason: Option<&str>,
    ) -> Result<Payout> {
        let paid_at = matches!(status, PayoutStatus::Paid).then(Utc::now);

        let row = sqlx::query_as::<_, Payout>(
            r#"
            UPDATE payouts
            SET status = $2,
                paid_at = COALESCE($3, paid_at),
                failure_reason = COALESCE($4, failure_reason)
            WHERE id = $1
            RETURNING id, restaurant_id, amount_cents, currency, as_of, status,
                      created_at, paid_at, failure_reason, metadata
            "#,
        )
        .bind(payout_id)
        .bind(status)
        .bind(paid_at)
        .bind(failure_reason)
        .fetch_one(&mut **tx)
        .await
        .map_err(AppError::Database)?;

        Ok(row)
    }
}
