use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;

/// The kind of posting a ledger entry represents. Sign invariants are enforced at
/// construction time, not just documented: `sale` is always positive, the other three
/// are always negative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum EntryType {
    Sale,
    Commission,
    Refund,
    PayoutReserve,
}

impl EntryType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryType::Sale => "sale",
            EntryType::Commission => "commission",
            EntryType::Refund => "refund",
            EntryType::PayoutReserve => "payout_reserve",
        }
    }

    /// Validates `amount_cents` against this entry type's sign invariant (§3, §8).
    /// `Sale` and `Refund` allow zero — a zero-value charge or refund is an accepted
    /// boundary case (§8) — while `Commission` and `PayoutReserve` are only ever
    /// constructed for a strictly positive fee or reserved amount, so they stay
    /// strictly negative.
    pub fn sign_ok(&self, amount_cents: i64) -> bool {
        match self {
            EntryType::Sale => amount_cents >= 0,
            EntryType::Refund => amount_cents <= 0,
            EntryType::Commission | EntryType::PayoutReserve => amount_cents < 0,
        }
    }
}

/// A single append-only posting to the ledger. `LedgerEntry` rows are never updated or
/// deleted; the balance for a (restaurant, currency) pair is always derived by summing
/// these rows, never stored.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct LedgerEntry {
    pub id: i64,
    pub restaurant_id: String,
    pub amount_cents: i64,
    pub currency: String,
    pub entry_type: EntryType,
    pub description: Option<String>,
    pub related_event_id: Option<String>,
    pub related_payout_id: Option<i64>,
    pub available_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub metadata: Option<Value>,
}

/// Fields needed to insert a new `LedgerEntry`; `id` and `created_at` are assigned by
/// the database.
#[derive(Debug, Clone)]
pub struct NewLedgerEntry {
    pub restaurant_id: String,
    pub amount_cents: i64,
    pub currency: String,
    pub entry_type: EntryType,
    pub description: Option<String>,
    pub related_event_id: Option<String>,
    pub related_payout_id: Option<i64>,
    pub available_at: Option<DateTime<Utc>>,
}

impl NewLedgerEntry {
    /// Validates the sign invariant for the entry's type before it reaches the
    /// repository. A violation here indicates a bug in the caller, not bad user input,
    /// so this panics rather than returning `AppError::Validation` — callers are
    /// services, never request handlers.
    pub fn checked(self) -> Self {
        debug_assert!(
            self.entry_type.sign_ok(self.amount_cents),
            "entry_type {:?} cannot carry amount_cents {}",
            self.entry_type, self.amount_cents
        );
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entry_type_sign_expectations() {
        assert!(EntryType::Sale.sign_ok(0));
        assert!(EntryType::Sale.sign_ok(100));
        assert!(!EntryType::Sale.sign_ok(-1));

        assert!(EntryType::Refund.sign_ok(0));
        assert!(EntryType::Refund.sign_ok(-100));
        assert!(!EntryType::Refund.sign_ok(1));

        assert!(!EntryType::Commission.sign_ok(0));
        assert!(EntryType::Commission.sign_ok(-1));

        assert!(!EntryType::PayoutReserve.sign_ok(0));
        assert!(EntryType::PayoutReserve.sign_ok(-1));
    }

    #[test]
    fn entry_type_as_str_matches_wire_format() {
        assert_eq!(EntryType::Sale.as_str(), "sale");
        assert_eq!(EntryType::Commission.as_str(), "commission");
        assert_eq!(EntryType::Refund.as_str(), "refund");
        assert_eq!(EntryType::PayoutReserve.as_str(), "payout_reserve");
    }

    #[test]
    fn checked_accepts_valid_sale() {
        let entry = NewLedgerEntry {
            restaurant_id: "res_a".to_string(),
            amount_cents: 1000,
            currency: "PEN".to_string(),
            entry_type: EntryType::Sale,
            description: None,
            related_event_id: Some("e1".to_string()),
            related_payout_id: None,
            available_at: None,
        }
        .checked();
        assert_eq!(entry.amount_cents, 1000);
    }

    #[test]
    #[should_panic]
    fn checked_rejects_negative_sale_in_debug() {
        NewLedgerEntry {
            restaurant_id: "res_a".to_string(),
            amount_cents: -1000,
            currency: "PEN".to_string(),
            entry_type: EntryType::Sale,
            description: None,
            related_event_id: None,
            related_payout_id: None,
            available_at: None,
        }
        .checked();
    }
}
