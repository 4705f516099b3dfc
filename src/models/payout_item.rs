use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A line of a `Payout`'s breakdown. Rows are removed automatically (`ON DELETE
/// CASCADE`) when the parent payout is deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ItemType {
    NetSales,
    Fees,
    Refunds,
}

impl ItemType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemType::NetSales => "net_sales",
            ItemType::Fees => "fees",
            ItemType::Refunds => "refunds",
        }
    }

    /// The `LedgerEntry::entry_type` whose sum feeds this breakdown line; see §4.3 step 2e.
    pub fn from_entry_type(entry_type: crate::models::EntryType) -> Option<Self> {
        use crate::models::EntryType;
        match entry_type {
            EntryType::Sale => Some(ItemType::NetSales),
            EntryType::Commission => Some(ItemType::Fees),
            EntryType::Refund => Some(ItemType::Refunds),
            EntryType::PayoutReserve => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PayoutItem {
    pub id: i64,
    pub payout_id: i64,
    pub item_type: ItemType,
    pub amount_cents: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::EntryType;

    #[test]
    fn breakdown_mapping_matches_spec_4_3() {
        assert_eq!(ItemType::from_entry_type(EntryType::Sale), Some(ItemType::NetSales));
        assert_eq!(ItemType::from_entry_type(EntryType::Commission), Some(ItemType::Fees));
        assert_eq!(ItemType::from_entry_type(EntryType::Refund), Some(ItemType::Refunds));
        assert_eq!(ItemType::from_entry_type(EntryType::PayoutReserve), None);
    }
}
