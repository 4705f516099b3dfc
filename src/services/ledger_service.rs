use crate::error::Result;
use crate::models::ledger_entry::NewLedgerEntry;
use crate::models::{EntryType, LedgerEntry};
use crate::repositories::LedgerRepository;
use chrono::{DateTime, Duration, Utc};
use sqlx::{Postgres, Transaction};

/// Translates business events into signed, immutable ledger postings (§4.2).
pub struct LedgerService {
    ledger_repo: LedgerRepository,
}

impl LedgerService {
    /// Days between a sale's `occurred_at` and its `available_at`: the chargeback /
    /// hold window this platform enforces before a sale's proceeds are spendable.
    pub const MATURITY_DAYS: i64 = 7;

    pub fn new(ledger_repo: LedgerRepository) -> Self {
        Self { ledger_repo }
    }

    /// Posts a `sale` entry maturing at `occurred_at + MATURITY_DAYS`, plus a
    /// `commission` entry (immediately available) when `fee_cents > 0`.
    pub async fn create_sale_entries(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        restaurant_id: &str,
        event_id: &str,
        amount_cents: i64,
        fee_cents: i64,
        occurred_at: DateTime<Utc>,
        currency: &str,
    ) -> Result<Vec<LedgerEntry>> {
        let available_at = occurred_at + Duration::days(Self::MATURITY_DAYS);
        let mut entries = Vec::with_capacity(2);

        let sale = self
            .ledger_repo
            .create_entry(
                tx,
                NewLedgerEntry {
                    restaurant_id: restaurant_id.to_string(),
                    amount_cents,
                    currency: currency.to_string(),
                    entry_type: EntryType::Sale,
                    description: Some(format!("Sale from event {}", event_id)),
                    related_event_id: Some(event_id.to_string()),
                    related_payout_id: None,
                    available_at: Some(available_at),
                },
            )
            .await?;
        entries.push(sale);

        if fee_cents > 0 {
            let commission = self
                .ledger_repo
                .create_entry(
                    tx,
                    NewLedgerEntry {
                        restaurant_id: restaurant_id.to_string(),
                        amount_cents: -fee_cents,
                        currency: currency.to_string(),
                        entry_type: EntryType::Commission,
                        description: Some(format!("Commission for event {}", event_id)),
                        related_event_id: Some(event_id.to_string()),
                        related_payout_id: None,
                        available_at: None,
                    },
                )
                .await?;
            entries.push(commission);
        }

        Ok(entries)
    }

    /// Posts a `refund` entry. Refunds reduce the available balance immediately
    /// (`available_at = NULL`) rather than waiting on the sale's own maturity — see
    /// §9's note on this deliberate asymmetry.
    pub async fn create_refund_entry(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        restaurant_id: &str,
        event_id: &str,
        amount_cents: i64,
        currency: &str,
    ) -> Result<LedgerEntry> {
        self.ledger_repo
            .create_entry(
                tx,
                NewLedgerEntry {
                    restaurant_id: restaurant_id.to_string(),
                    amount_cents: -amount_cents,
                    currency: currency.to_string(),
                    entry_type: EntryType::Refund,
                    description: Some(format!("Refund from event {}", event_id)),
                    related_event_id: Some(event_id.to_string()),
                    related_payout_id: None,
                    available_at: None,
                },
            )
            .await
    }

    /// Posts the reserving entry for a newly created payout (§4.3 step 2f), debiting
    /// the available balance by the payout's full amount.
    pub async fn create_payout_entry(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        restaurant_id: &str,
        payout_id: i64,
        amount_cents: i64,
        currency: &str,
    ) -> Result<LedgerEntry> {
        self.ledger_repo
            .create_entry(
                tx,
                NewLedgerEntry {
                    restaurant_id: restaurant_id.to_string(),
                    amount_cents: -amount_cents,
                    currency: currency.to_string(),
                    entry_type: EntryType::PayoutReserve,
                    description: Some(format!("Payout reserve for payout {}", payout_id)),
                    related_event_id: None,
                    related_payout_id: Some(payout_id),
                    available_at: None,
                },
            )
            .await
    }
}
