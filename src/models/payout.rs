use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;

/// Lifecycle state of a `Payout`. `Paid` and `Failed` are terminal: no transition
/// leaves either state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PayoutStatus {
    Created,
    Processing,
    Paid,
    Failed,
}

impl PayoutStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PayoutStatus::Created => "created",
            PayoutStatus::Processing => "processing",
            PayoutStatus::Paid => "paid",
            PayoutStatus::Failed => "failed",
        }
    }

    /// `created` and `processing` both count as "a payout is already in flight" for
    /// the purposes of §4.3's pending-payout guard.
    pub fn is_non_terminal(&self) -> bool {
        matches!(self, PayoutStatus::Created | PayoutStatus::Processing)
    }

    pub fn is_terminal(&self) -> bool {
        !self.is_non_terminal()
    }
}

/// A materialized payout reserving a restaurant's available balance against a future
/// bank disbursement. `UNIQUE(restaurant_id, currency, as_of)` is the batch run's
/// idempotency guard; see §4.3.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Payout {
    pub id: i64,
    pub restaurant_id: String,
    pub amount_cents: i64,
    pub currency: String,
    pub as_of: NaiveDate,
    pub status: PayoutStatus,
    pub created_at: DateTime<Utc>,
    pub paid_at: Option<DateTime<Utc>>,
    pub failure_reason: Option<String>,
    pub metadata: Option<Value>,
}

impl Payout {
    /// True precisely when the state machine invariant from §8 holds for this row:
    /// `paid_at` is non-null iff `status = paid`.
    pub fn paid_at_invariant_holds(&self) -> bool {
        match self.status {
            PayoutStatus::Paid => self.paid_at.is_some(),
            _ => self.paid_at.is_none(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payout(status: PayoutStatus, paid_at: Option<DateTime<Utc>>) -> Payout {
        Payout {
            id: 1,
            restaurant_id: "res_a".to_string(),
            amount_cents: 14750,
            currency: "PEN".to_string(),
            as_of: NaiveDate::from_ymd_opt(2025, 12, 27).unwrap(),
            status,
            created_at: Utc::now(),
            paid_at,
            failure_reason: None,
            metadata: None,
        }
    }

    #[test]
    fn non_terminal_statuses() {
        assert!(PayoutStatus::Created.is_non_terminal());
        assert!(PayoutStatus::Processing.is_non_terminal());
        assert!(!PayoutStatus::Paid.is_non_terminal());
        assert!(!PayoutStatus::Failed.is_non_terminal());
    }

    #[test]
    fn paid_invariant_requires_paid_at() {
        assert!(!payout(PayoutStatus::Paid, None).paid_at_invariant_holds());
        assert!(payout(PayoutStatus::Paid, Some(Utc::now())).paid_at_invariant_holds());
    }

    #[test]
    fn non_terminal_forbids_paid_at() {
        assert!(!payout(PayoutStatus::Created, Some(Utc::now())).paid_at_invariant_holds());
        assert!(payout(PayoutStatus::Created, None).paid_at_invariant_holds());
    }
}
