mod common;

use restaurant_ledger::observability::{
    mask_amount, mask_restaurant_id, mask_sensitive, AggregatedHealth, DependencyHealth,
    HealthChecker, HealthStatus, LatencyTimer, LogFormat,
};

#[test]
fn mask_sensitive_preserves_prefix_and_suffix() {
    let masked = mask_sensitive("res_0123456789abcdef", 4);
    assert!(masked.starts_with("res_"));
    assert!(masked.ends_with("cdef"));
    assert!(masked.contains('*'));
}

#[test]
fn mask_sensitive_fully_masks_short_strings() {
    assert_eq!(mask_sensitive("abc", 4), "***");
}

#[test]
fn mask_restaurant_id_masks_the_middle() {
    let masked = mask_restaurant_id("res_9f8e7d6c5b4a");
    assert_ne!(masked, "res_9f8e7d6c5b4a");
    assert!(masked.starts_with("res_"));
}

#[test]
fn mask_amount_buckets_by_magnitude() {
    assert_eq!(mask_amount(99), "***");
    assert_eq!(mask_amount(150_000), "***K+");
    assert_eq!(mask_amount(150_000_000), "***M+");
    assert_eq!(mask_amount(-150_000_000), "***M+", "sign must not affect the magnitude bucket");
}

#[test]
fn log_format_parses_known_values_and_defaults_to_pretty() {
    assert_eq!(LogFormat::from("json"), LogFormat::Json);
    assert_eq!(LogFormat::from("compact"), LogFormat::Compact);
    assert_eq!(LogFormat::from("something-else"), LogFormat::Pretty);
}

#[test]
fn latency_timer_reports_nondecreasing_elapsed_time() {
    let timer = LatencyTimer::new();
    let first = timer.elapsed_ms();
    std::thread::sleep(std::time::Duration::from_millis(5));
    let second = timer.elapsed_ms();
    assert!(second >= first);
}

#[test]
fn aggregated_health_status_is_the_worst_of_its_dependencies() {
    let healthy = AggregatedHealth::new(
        "0.1.0".to_string(),
        10,
        vec![DependencyHealth::healthy("database", 1.5)],
    );
    assert!(healthy.status.is_healthy());

    let degraded = AggregatedHealth::new(
        "0.1.0".to_string(),
        10,
        vec![
            DependencyHealth::healthy("database", 1.5),
            DependencyHealth::degraded("database", "high latency"),
        ],
    );
    assert_eq!(degraded.status, HealthStatus::Degraded);

    let unhealthy = AggregatedHealth::new(
        "0.1.0".to_string(),
        10,
        vec![
            DependencyHealth::degraded("database", "slow"),
            DependencyHealth::unhealthy("database", "connection refused"),
        ],
    );
    assert_eq!(unhealthy.status, HealthStatus::Unhealthy);
}

#[tokio::test]
async fn health_checker_reports_database_as_healthy_against_a_live_pool() {
    let pool = common::setup_test_db().await;
    let checker = HealthChecker::new(pool);

    let health = checker.check_all().await;
    assert!(health.status.is_healthy());
    assert_eq!(health.dependencies.len(), 1);
    assert_eq!(health.dependencies[0].name, "database");
    assert!(checker.is_ready().await);
    assert!(checker.is_alive());
}
