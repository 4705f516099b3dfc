use metrics::{counter, describe_counter, describe_gauge, gauge, Unit};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::sync::OnceLock;
use std::time::Instant;

static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Global metrics instance.
pub static METRICS: OnceLock<Metrics> = OnceLock::new();

/// Metrics collector for the ledger-and-payout engine (§6, §2's "Metrics & logging"
/// component): counters for events/entries/payouts and a gauge for current total
/// balance.
#[derive(Debug, Clone)]
pub struct Metrics {
    initialized: bool,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    pub fn new() -> Self {
        Self { initialized: true }
    }

    /// `events_total{event_type}` — one processor event observed, regardless of
    /// whether it was an idempotent hit (idempotent hits skip this call entirely;
    /// see `EventProcessor::process_event`).
    pub fn record_event(&self, event_type: &str) {
        counter!("events_total", "event_type" => event_type.to_string()).increment(1);
    }

    /// `ledger_entries_total{entry_type}` — one ledger posting created.
    pub fn record_ledger_entry(&self, entry_type: &str) {
        counter!("ledger_entries_total", "entry_type" => entry_type.to_string()).increment(1);
    }

    /// `payouts_total{status}` — one payout created or transitioned to this status.
    pub fn record_payout(&self, status: &str) {
        counter!("payouts_total", "status" => status.to_string()).increment(1);
    }

    /// `balance_total{currency}` gauge — current total balance for one currency
    /// across all restaurants, recomputed after a write that could have moved it
    /// (§4.1 step 6).
    pub fn set_balance_total(&self, currency: &str, value: f64) {
        gauge!("balance_total", "currency" => currency.to_string()).set(value);
    }
}

/// Timer for measuring operation latency.
pub struct LatencyTimer {
    start: Instant,
}

impl LatencyTimer {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    pub fn elapsed_ms(&self) -> f64 {
        self.start.elapsed().as_secs_f64() * 1000.0
    }
}

impl Default for LatencyTimer {
    fn default() -> Self {
        Self::new()
    }
}

/// Initializes the metrics system and returns the Prometheus handle.
pub fn init_metrics() -> PrometheusHandle {
    let handle = METRICS_HANDLE.get_or_init(|| {
        let builder = PrometheusBuilder::new();
        let handle = builder
            .install_recorder()
            .expect("Failed to install Prometheus recorder");

        describe_metrics();
        handle
    });

    METRICS.get_or_init(Metrics::new);

    handle.clone()
}

/// Describes all metrics for Prometheus.
fn describe_metrics() {
    describe_counter!("events_total", Unit::Count, "Total processor events ingested");
    describe_counter!("ledger_entries_total", Unit::Count, "Total ledger entries created");
    describe_counter!("payouts_total", Unit::Count, "Total payouts created or transitioned");
    describe_gauge!("balance_total", Unit::Count, "Current total balance across all restaurants, per currency");
}

/// Returns the global metrics instance.
pub fn get_metrics() -> &'static Metrics {
    METRICS.get_or_init(Metrics::new)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_latency_timer() {
        let timer = LatencyTimer::new();
        std::thread::sleep(std::time::Duration::from_millis(10));
        let elapsed = timer.elapsed_ms();
        assert!(elapsed >= 10.0);
    }

    #[test]
    fn test_metrics_creation() {
        let metrics = Metrics::new();
        assert!(metrics.initialized);
    }
}
