pub mod event_repository;
pub mod ledger_repository;
pub mod payout_repository;
pub mod restaurant_repository;

pub use event_repository::EventRepository;
pub use ledger_repository::LedgerRepository;
pub use payout_repository::PayoutRepository;
pub use restaurant_repository::RestaurantRepository;

use sqlx::PgPool;

/// Database connection pool type alias.
pub type DbPool = PgPool;
