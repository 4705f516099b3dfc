use crate::error::Result;
use crate::repositories::LedgerRepository;
use chrono::{DateTime, Utc};

/// A restaurant's derived balance for one currency (§4.4). Never stored — always
/// recomputed from the ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestaurantBalance {
    pub restaurant_id: String,
    pub currency: String,
    pub available_cents: i64,
    pub pending_cents: i64,
    pub total_cents: i64,
    pub last_event_at: Option<DateTime<Utc>>,
}

/// Computes available / pending / total balance from the ledger (§4.4). With no
/// entries for the pair, returns all zeros and `last_event_at = None`.
pub struct BalanceCalculator {
    ledger_repo: LedgerRepository,
}

impl BalanceCalculator {
    pub fn new(ledger_repo: LedgerRepository) -> Self {
        Self { ledger_repo }
    }

    pub async fn get_balance(&self, restaurant_id: &str, currency: &str) -> Result<RestaurantBalance> {
        let (available, pending, last_event_at) = self
            .ledger_repo
            .get_balance_summary(restaurant_id, currency)
            .await?;

        Ok(RestaurantBalance {
            restaurant_id: restaurant_id.to_string(),
            currency: currency.to_string(),
            available_cents: available,
            pending_cents: pending,
            total_cents: available + pending,
            last_event_at,
        })
    }
}
