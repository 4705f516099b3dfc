use crate::error::Result;
use crate::models::{EventType, PayoutStatus, ProcessorEvent};
use crate::observability::metrics::get_metrics;
use crate::repositories::{EventRepository, LedgerRepository, PayoutRepository, RestaurantRepository};
use crate::services::ledger_service::LedgerService;
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::{Postgres, Transaction};

/// Idempotent event ingestion orchestrating restaurant upsert, event store, and
/// ledger postings (§4.1).
pub struct EventProcessor {
    restaurant_repo: RestaurantRepository,
    event_repo: EventRepository,
    payout_repo: PayoutRepository,
    ledger_repo: LedgerRepository,
    ledger_service: LedgerService,
}

impl EventProcessor {
    pub fn new(
        restaurant_repo: RestaurantRepository,
        event_repo: EventRepository,
        payout_repo: PayoutRepository,
        ledger_repo: LedgerRepository,
    ) -> Self {
        Self {
            restaurant_repo,
            event_repo,
            payout_repo,
            ledger_service: LedgerService::new(ledger_repo.clone()),
            ledger_repo,
        }
    }

    /// Runs the six-step algorithm of §4.1 inside the caller's transaction. Returns
    /// `(event, is_new)`; `is_new = false` is the idempotent-hit shape, produced with
    /// no further side effects.
    #[allow(clippy::too_many_arguments)]
    pub async fn process_event(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        event_id: &str,
        event_type: EventType,
        occurred_at: DateTime<Utc>,
        restaurant_id: &str,
        currency: &str,
        amount_cents: i64,
        fee_cents: i64,
        metadata: Option<Value>,
    ) -> Result<(ProcessorEvent, bool)> {
        self.restaurant_repo.get_or_create(tx, restaurant_id).await?;

        let (event, is_new) = self
            .event_repo
            .create_event(
                tx,
                event_id,
                event_type,
                occurred_at,
                restaurant_id,
                currency,
                amount_cents,
                fee_cents,
                metadata,
            )
            .await?;

        if is_new {
            tracing::info!(
                event_id = %event.event_id,
                event_type = event.event_type.as_str(),
                restaurant_id = %event.restaurant_id,
                "processing new event"
            );

            match event.event_type {
                EventType::ChargeSucceeded => {
                    let entries = self
                        .ledger_service
                        .create_sale_entries(
                            tx,
                            &event.restaurant_id,
                            &event.event_id,
                            event.amount_cents,
                            event.fee_cents,
                            event.occurred_at,
                            &event.currency,
                        )
                        .await?;
                    for entry in &entries {
                        get_metrics().record_ledger_entry(entry.entry_type.as_str());
                    }
                }
                EventType::RefundSucceeded => {
                    let entry = self
                        .ledger_service
                        .create_refund_entry(
                            tx,
                            &event.restaurant_id,
                            &event.event_id,
                            event.amount_cents,
                            &event.currency,
                        )
                        .await?;
                    get_metrics().record_ledger_entry(entry.entry_type.as_str());
                }
                EventType::PayoutPaid => {
                    self.process_payout_paid(tx, &event).await?;
                }
            }

            get_metrics().record_event(event.event_type.as_str());

            let total = self
                .ledger_repo
                .get_total_available_balance(tx, &event.currency)
                .await?;
            get_metrics().set_balance_total(&event.currency, total as f64);
        } else {
            tracing::info!(event_id = %event.event_id, "idempotent hit: event already processed");
        }

        Ok((event, is_new))
    }

    /// Step 5's `payout_paid` branch: locate the payout via `metadata.payout_id` and
    /// transition it to `paid`. A missing or unresolvable reference is logged and
    /// skipped — never a fatal error (§4.1 step 5, §7).
    async fn process_payout_paid(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        event: &ProcessorEvent,
    ) -> Result<()> {
        let payout_id = event
            .metadata
            .as_ref()
            .and_then(|m| m.get("payout_id"))
            .and_then(Value::as_i64);

        let Some(payout_id) = payout_id else {
            tracing::warn!(
                event_id = %event.event_id,
                "payout_paid event missing payout_id in metadata"
            );
            return Ok(());
        };

        let Some(payout) = self.payout_repo.get_by_id_tx(tx, payout_id).await? else {
            tracing::warn!(
                event_id = %event.event_id,
                payout_id,
                "payout_paid event references non-existent payout"
            );
            return Ok(());
        };

        self.payout_repo
            .update_status(tx, payout.id, PayoutStatus::Paid, None)
            .await?;
        get_metrics().record_payout(PayoutStatus::Paid.as_str());

        tracing::info!(
            event_id = %event.event_id,
            payout_id,
            "payout marked as paid from event"
        );
        Ok(())
    }
}
