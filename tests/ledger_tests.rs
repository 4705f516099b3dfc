mod common;

use chrono::{Duration, Utc};
use restaurant_ledger::models::EntryType;
use restaurant_ledger::repositories::{LedgerRepository, RestaurantRepository};
use restaurant_ledger::services::LedgerService;

#[tokio::test]
async fn sale_entry_matures_seven_days_after_occurred_at() {
    let pool = common::setup_test_db().await;
    common::cleanup_test_data(&pool).await;

    let restaurant_id = common::unique_restaurant_id();
    let ledger_repo = LedgerRepository::new(pool.clone());
    let service = LedgerService::new(ledger_repo);
    let occurred_at = Utc::now();

    let mut tx = pool.begin().await.unwrap();
    RestaurantRepository::new(pool.clone())
        .get_or_create(&mut tx, &restaurant_id)
        .await
        .unwrap();
    let entries = service
        .create_sale_entries(&mut tx, &restaurant_id, &common::unique_event_id(), 10_000, 0, occurred_at, "PEN")
        .await
        .unwrap();
    tx.commit().await.unwrap();

    assert_eq!(entries.len(), 1);
    let sale = &entries[0];
    assert_eq!(sale.entry_type, EntryType::Sale);
    let expected_available_at = occurred_at + Duration::days(LedgerService::MATURITY_DAYS);
    let available_at = sale.available_at.expect("sale entries mature at a specific time");
    assert!((available_at - expected_available_at).num_seconds().abs() < 2);

    common::cleanup_test_data(&pool).await;
}

#[tokio::test]
async fn balance_summary_splits_matured_from_pending() {
    let pool = common::setup_test_db().await;
    common::cleanup_test_data(&pool).await;

    let restaurant_id = common::unique_restaurant_id();
    let ledger_repo = LedgerRepository::new(pool.clone());
    let service = LedgerService::new(LedgerRepository::new(pool.clone()));

    let mut tx = pool.begin().await.unwrap();
    RestaurantRepository::new(pool.clone())
        .get_or_create(&mut tx, &restaurant_id)
        .await
        .unwrap();
    // A sale occurring far enough in the past that it has already matured.
    let matured_occurred_at = Utc::now() - Duration::days(LedgerService::MATURITY_DAYS + 1);
    service
        .create_sale_entries(&mut tx, &restaurant_id, &common::unique_event_id(), 10_000, 0, matured_occurred_at, "PEN")
        .await
        .unwrap();
    // A sale that just happened and hasn't matured yet.
    service
        .create_sale_entries(&mut tx, &restaurant_id, &common::unique_event_id(), 4_000, 0, Utc::now(), "PEN")
        .await
        .unwrap();
    tx.commit().await.unwrap();

    let (available, pending, _) = ledger_repo.get_balance_summary(&restaurant_id, "PEN").await.unwrap();
    assert_eq!(available, 10_000);
    assert_eq!(pending, 4_000);

    common::cleanup_test_data(&pool).await;
}

#[tokio::test]
async fn refund_and_payout_reserve_reduce_available_balance_immediately() {
    let pool = common::setup_test_db().await;
    common::cleanup_test_data(&pool).await;

    let restaurant_id = common::unique_restaurant_id();
    let ledger_repo = LedgerRepository::new(pool.clone());
    let service = LedgerService::new(LedgerRepository::new(pool.clone()));
    let matured_occurred_at = Utc::now() - Duration::days(LedgerService::MATURITY_DAYS + 1);

    let mut tx = pool.begin().await.unwrap();
    RestaurantRepository::new(pool.clone())
        .get_or_create(&mut tx, &restaurant_id)
        .await
        .unwrap();
    service
        .create_sale_entries(&mut tx, &restaurant_id, &common::unique_event_id(), 20_000, 0, matured_occurred_at, "PEN")
        .await
        .unwrap();
    service
        .create_refund_entry(&mut tx, &restaurant_id, &common::unique_event_id(), 5_000, "PEN")
        .await
        .unwrap();
    tx.commit().await.unwrap();

    let (available, pending, _) = ledger_repo.get_balance_summary(&restaurant_id, "PEN").await.unwrap();
    assert_eq!(available, 15_000);
    assert_eq!(pending, 0);

    common::cleanup_test_data(&pool).await;
}

#[tokio::test]
async fn get_available_balance_locked_matches_balance_summary() {
    let pool = common::setup_test_db().await;
    common::cleanup_test_data(&pool).await;

    let restaurant_id = common::unique_restaurant_id();
    let ledger_repo = LedgerRepository::new(pool.clone());
    let service = LedgerService::new(LedgerRepository::new(pool.clone()));
    let matured_occurred_at = Utc::now() - Duration::days(LedgerService::MATURITY_DAYS + 1);

    let mut tx = pool.begin().await.unwrap();
    RestaurantRepository::new(pool.clone())
        .get_or_create(&mut tx, &restaurant_id)
        .await
        .unwrap();
    service
        .create_sale_entries(&mut tx, &restaurant_id, &common::unique_event_id(), 12_345, 345, matured_occurred_at, "PEN")
        .await
        .unwrap();
    tx.commit().await.unwrap();

    let mut tx = pool.begin().await.unwrap();
    let locked = ledger_repo.get_available_balance_locked(&mut tx, &restaurant_id, "PEN").await.unwrap();
    let breakdown = ledger_repo.get_breakdown_locked(&mut tx, &restaurant_id, "PEN").await.unwrap();
    tx.commit().await.unwrap();

    assert_eq!(locked, 12_000);
    let total: i64 = breakdown.iter().map(|(_, total)| *total).sum();
    assert_eq!(total, 12_000);
}
