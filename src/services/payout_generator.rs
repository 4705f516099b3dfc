use crate::error::{AppError, Result};
use crate::models::{ItemType, Payout};
use crate::observability::metrics::get_metrics;
use crate::repositories::{LedgerRepository, PayoutRepository, RestaurantRepository};
use crate::services::ledger_service::LedgerService;
use chrono::NaiveDate;
use sqlx::{PgPool, Postgres, Transaction};

/// Creates payouts — both the batch-by-currency path (§4.3 "Batch") and the
/// per-restaurant path (§4.3 "Single") — reserving available balance against a
/// future bank disbursement.
pub struct PayoutGenerator {
    restaurant_repo: RestaurantRepository,
    payout_repo: PayoutRepository,
    ledger_repo: LedgerRepository,
    ledger_service: LedgerService,
}

impl PayoutGenerator {
    /// Minimum payout amount for the single-restaurant path (§4.3, §9's open-question
    /// resolution: the batch path takes its own threshold from the request instead).
    pub const MIN_PAYOUT_AMOUNT: i64 = 10_000;

    pub fn new(
        restaurant_repo: RestaurantRepository,
        payout_repo: PayoutRepository,
        ledger_repo: LedgerRepository,
        ledger_service: LedgerService,
    ) -> Self {
        Self {
            restaurant_repo,
            payout_repo,
            ledger_repo,
            ledger_service,
        }
    }

    /// Iterates every active restaurant, skipping ineligible ones, and materializes a
    /// payout for each restaurant with matured balance at or above `min_amount`.
    /// Returns the count of payouts created (§4.3 "Batch").
    ///
    /// Each restaurant gets its own transaction, committed before moving to the next
    /// one: a failure (or a skip) for one restaurant must not roll back payouts
    /// already materialized for restaurants processed earlier in the same run.
    pub async fn generate_batch(
        &self,
        pool: &PgPool,
        currency: &str,
        as_of: NaiveDate,
        min_amount: i64,
    ) -> Result<usize> {
        let restaurant_ids = self.restaurant_repo.list_active_restaurant_ids().await?;
        let mut created = 0usize;

        for restaurant_id in restaurant_ids {
            let mut tx = match pool.begin().await {
                Ok(tx) => tx,
                Err(e) => {
                    tracing::error!(error = %e, restaurant_id, "batch: failed to open transaction, skipping restaurant");
                    continue;
                }
            };

            match self
                .generate_batch_entry(&mut tx, &restaurant_id, currency, as_of, min_amount)
                .await
            {
                Ok(true) => match tx.commit().await {
                    Ok(()) => created += 1,
                    Err(e) => tracing::error!(error = %e, restaurant_id, "batch: commit failed, skipping restaurant"),
                },
                Ok(false) => {
                    let _ = tx.rollback().await;
                }
                Err(e) => {
                    tracing::error!(error = %e, restaurant_id, currency, "batch: payout generation failed for restaurant, continuing with the rest of the run");
                    let _ = tx.rollback().await;
                }
            }
        }

        Ok(created)
    }

    /// One restaurant's worth of the batch loop body, inside its own transaction.
    /// Returns `Ok(true)` if a payout was materialized, `Ok(false)` if the restaurant
    /// was skipped as ineligible.
    async fn generate_batch_entry(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        restaurant_id: &str,
        currency: &str,
        as_of: NaiveDate,
        min_amount: i64,
    ) -> Result<bool> {
        if self
            .payout_repo
            .has_pending_payout(tx, restaurant_id, currency)
            .await?
        {
            tracing::debug!(restaurant_id, currency, "skipping: pending payout exists");
            return Ok(false);
        }

        if self
            .payout_repo
            .exists_for_as_of(tx, restaurant_id, currency, as_of)
            .await?
        {
            tracing::debug!(restaurant_id, currency, %as_of, "skipping: already paid out for this day");
            return Ok(false);
        }

        let balance = self
            .ledger_repo
            .get_available_balance_locked(tx, restaurant_id, currency)
            .await?;

        if balance < min_amount {
            tracing::debug!(restaurant_id, currency, balance, min_amount, "skipping: below threshold");
            return Ok(false);
        }

        self.materialize_payout(tx, restaurant_id, currency, as_of, balance)
            .await?;
        Ok(true)
    }

    /// Per-restaurant payout path (§4.3 "Single"): rejects outright rather than
    /// silently skipping, using `MIN_PAYOUT_AMOUNT` rather than a caller-supplied
    /// threshold.
    pub async fn generate_single(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        restaurant_id: &str,
        currency: &str,
        as_of: NaiveDate,
    ) -> Result<Payout> {
        if self
            .payout_repo
            .has_pending_payout(tx, restaurant_id, currency)
            .await?
        {
            return Err(AppError::payout_already_pending(restaurant_id, currency));
        }

        let balance = self
            .ledger_repo
            .get_available_balance_locked(tx, restaurant_id, currency)
            .await?;

        if balance < Self::MIN_PAYOUT_AMOUNT {
            return Err(AppError::insufficient_balance(
                restaurant_id,
                balance,
                Self::MIN_PAYOUT_AMOUNT,
            ));
        }

        self.materialize_payout(tx, restaurant_id, currency, as_of, balance)
            .await
    }

    /// Shared tail of both paths: insert the payout, its breakdown, and the reserving
    /// ledger entry (§4.3 steps 2d–2f). The caller has already locked and validated
    /// `balance`.
    async fn materialize_payout(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        restaurant_id: &str,
        currency: &str,
        as_of: NaiveDate,
        balance: i64,
    ) -> Result<Payout> {
        let payout = self
            .payout_repo
            .create_payout(tx, restaurant_id, balance, currency, as_of)
            .await?;

        let breakdown = self
            .ledger_repo
            .get_breakdown_locked(tx, restaurant_id, currency)
            .await?;
        let items: Vec<(ItemType, i64)> = breakdown
            .into_iter()
            .filter_map(|(entry_type, total)| {
                ItemType::from_entry_type(entry_type).map(|item_type| (item_type, total))
            })
            .collect();
        self.payout_repo.create_items(tx, payout.id, &items).await?;

        self.ledger_service
            .create_payout_entry(tx, restaurant_id, payout.id, balance, currency)
            .await?;

        get_metrics().record_payout(payout.status.as_str());
        let total = self
            .ledger_repo
            .get_total_available_balance(tx, currency)
            .await?;
        get_metrics().set_balance_total(currency, total as f64);

        tracing::info!(
            payout_id = payout.id,
            restaurant_id,
            currency,
            amount_cents = balance,
            "payout created"
        );

        Ok(payout)
    }
}
