pub mod balance_calculator;
pub mod event_processor;
pub mod ledger_service;
pub mod payout_generator;

pub use balance_calculator::{BalanceCalculator, RestaurantBalance};
pub use event_processor::EventProcessor;
pub use ledger_service::LedgerService;
pub use payout_generator::PayoutGenerator;
