pub mod ledger_entry;
pub mod payout;
pub mod payout_item;
pub mod processor_event;
pub mod restaurant;

pub use ledger_entry::{EntryType, LedgerEntry};
pub use payout::{Payout, PayoutStatus};
pub use payout_item::{ItemType, PayoutItem};
pub use processor_event::{EventType, ProcessorEvent};
pub use restaurant::Restaurant;
