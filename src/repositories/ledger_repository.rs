use crate::error::{AppError, Result};
use crate::models::ledger_entry::NewLedgerEntry;
use crate::models::{EntryType, LedgerEntry};
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Transaction};

/// Repository for the append-only `ledger_entries` table — the single source of
/// truth for balances (§9). Rows are never updated or deleted.
#[derive(Clone)]
pub struct LedgerRepository {
    pool: PgPool,
}

impl LedgerRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Posts one entry within the caller's transaction. Entries are always written
    /// this way — never through the bare pool — so that postings commit atomically
    /// with the event or payout that produced them.
    pub async fn create_entry(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        entry: NewLedgerEntry,
    ) -> Result<LedgerEntry> {
        let entry = entry.checked();

        let row = sqlx::query_as::<_, LedgerEntry>(
            r#"
            INSERT INTO ledger_entries
                (restaurant_id, amount_cents, currency, entry_type, description,
                 related_event_id, related_payout_id, available_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id, restaurant_id, amount_cents, currency, entry_type, description,
                      related_event_id, related_payout_id, available_at, created_at, metadata
            "#,
        )
        .bind(&entry.restaurant_id)
        .bind(entry.amount_cents)
        .bind(&entry.currency)
        .bind(entry.entry_type)
        .bind(&entry.description)
        .bind(&entry.related_event_id)
        .bind(entry.related_payout_id)
        .bind(entry.available_at)
        .fetch_one(&mut **tx)
        .await
        .map_err(AppError::Database)?;

        Ok(row)
    }

    /// Single aggregate query backing the balance calculator (§4.4): conditional
    /// summation splits matured from pending entries in one pass, and a second
    /// conditional aggregate finds the last event-linked posting.
    pub async fn get_balance_summary(
        &self,
        restaurant_id: &str,
        currency: &str,
    ) -> Result<(i64, i64, Option<DateTime<Utc>>)> {
        let row: (i64, i64, Option<DateTime<Utc>>) = sqlx::query_as(
            r#"
            SELECT
                COALESCE(SUM(CASE WHEN available_at IS NULL OR available_at <= now()
                                   THEN amount_cents ELSE 0 END), 0) AS available,
                COALESCE(SUM(CASE WHEN available_at > now()
                                   THEN amount_cents ELSE 0 END), 0) AS pending,
                MAX(CASE WHEN related_event_id IS NOT NULL THEN created_at END) AS last_event_at
            FROM ledger_entries
            WHERE restaurant_id = $1 AND currency = $2
            "#,
        )
        .bind(restaurant_id)
        .bind(currency)
        .fetch_one(&self.pool)
        .await
        .map_err(AppError::Database)?;

        Ok(row)
    }

    /// Same query as [`get_balance_summary`](Self::get_balance_summary), run inside an
    /// open transaction rather than against the bare pool — used when a caller needs a
    /// read-your-own-writes view before committing.
    pub async fn get_balance_summary_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        restaurant_id: &str,
        currency: &str,
    ) -> Result<(i64, i64, Option<DateTime<Utc>>)> {
        let row: (i64, i64, Option<DateTime<Utc>>) = sqlx::query_as(
            r#"
            SELECT
                COALESCE(SUM(CASE WHEN available_at IS NULL OR available_at <= now()
                                   THEN amount_cents ELSE 0 END), 0) AS available,
                COALESCE(SUM(CASE WHEN available_at > now()
                                   THEN amount_cents ELSE 0 END), 0) AS pending,
                MAX(CASE WHEN related_event_id IS NOT NULL THEN created_at END) AS last_event_at
            FROM ledger_entries
            WHERE restaurant_id = $1 AND currency = $2
            "#,
        )
        .bind(restaurant_id)
        .bind(currency)
        .fetch_one(&mut **tx)
        .await
        .map_err(AppError::Database)?;

        Ok(row)
    }

    /// Locks every matured ledger row for (restaurant, currency) with `SELECT ...
    /// FOR UPDATE` and sums them, satisfying §5's row-locking requirement for payout
    /// generation: concurrent payout runs for the same pair serialize on these rows,
    /// and no reader can observe the balance mid-insert of a reserving entry.
    ///
    /// Postgres does not allow `FOR UPDATE` directly alongside an aggregate, so the
    /// lock is taken in a subquery and the sum computed over the locked rows.
    pub async fn get_available_balance_locked(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        restaurant_id: &str,
        currency: &str,
    ) -> Result<i64> {
        let row: (i64,) = sqlx::query_as(
            r#"
            SELECT COALESCE(SUM(amount_cents), 0)
            FROM (
                SELECT amount_cents
                FROM ledger_entries
                WHERE restaurant_id = $1
                  AND currency = $2
                  AND (available_at IS NULL OR available_at <= now())
                FOR UPDATE
            ) locked_rows
            "#,
        )
        .bind(restaurant_id)
        .bind(currency)
        .fetch_one(&mut **tx)
        .await
        .map_err(AppError::Database)?;

        Ok(row.0)
    }

    /// Sums matured entries grouped by `entry_type`, restricted to the three types
    /// that feed a payout breakdown (§4.3 step 2e). The `FOR UPDATE` lock is taken in
    /// the inner subquery — Postgres rejects `FOR UPDATE` combined with `GROUP BY` —
    /// so the grouping runs over the already-locked rows, consistent with the amount
    /// reserved by [`get_available_balance_locked`](Self::get_available_balance_locked).
    pub async fn get_breakdown_locked(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        restaurant_id: &str,
        currency: &str,
    ) -> Result<Vec<(EntryType, i64)>> {
        let rows: Vec<(EntryType, i64)> = sqlx::query_as(
            r#"
            SELECT entry_type, SUM(amount_cents) AS total
            FROM (
                SELECT entry_type, amount_cents
                FROM ledger_entries
                WHERE restaurant_id = $1
                  AND currency = $2
                  AND entry_type IN ('sale', 'commission', 'refund')
                  AND (available_at IS NULL OR available_at <= now())
                FOR UPDATE
            ) locked_rows
            GROUP BY entry_type
            "#,
        )
        .bind(restaurant_id)
        .bind(currency)
        .fetch_all(&mut **tx)
        .await
        .map_err(AppError::Database)?;

        Ok(rows)
    }

    /// Sums matured entries across every restaurant for one currency — the
    /// process-wide total backing the `balance_total` gauge (§4.1 step 6). Read
    /// within the caller's transaction so the recomputed gauge reflects postings
    /// just made, before commit.
    pub async fn get_total_available_balance(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        currency: &str,
    ) -> Result<i64> {
        let row: (i64,) = sqlx::query_as(
            r#"
            SELECT COALESCE(SUM(amount_cents), 0)
            FROM ledger_entries
            WHERE currency = $1
              AND (available_at IS NULL OR available_at <= now())
            "#,
        )
        .bind(currency)
        .fetch_one(&mut **tx)
        .await
        .map_err(AppError::Database)?;

        Ok(row.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_ledger_entry_checked_matches_entry_type_sign() {
        let e = NewLedgerEntry {
            restaurant_id: "res_a".to_string(),
            amount_cents: -250,
            currency: "PEN".to_string(),
            entry_type: EntryType::Commission,
            description: None,
            related_event_id: Some("e1".to_string()),
            related_payout_id: None,
            available_at: None,
        }
        .checked();
        assert_eq!(e.amount_cents, -250);
    }
}
