use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use metrics::{counter, gauge, histogram};
use once_cell::sync::OnceCell;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

static TRACING_INIT: OnceCell<()> = OnceCell::new();

/// Process-wide counters. Each update also goes to the `metrics` facade so
/// an installed exporter sees the same numbers the snapshot reports.
#[derive(Debug, Default)]
pub struct AppMetrics {
    turns_total: AtomicU64,
    trips_created_total: AtomicU64,
    trip_creation_failures_total: AtomicU64,
    ambiguous_matches_total: AtomicU64,
    unparsed_dates_total: AtomicU64,
    catalog_refreshes_total: AtomicU64,
    catalog_fetch_failures_total: AtomicU64,
    total_latency_micros: AtomicU64,
}

#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub turns_total: u64,
    pub trips_created_total: u64,
    pub trip_creation_failures_total: u64,
    pub ambiguous_matches_total: u64,
    pub unparsed_dates_total: u64,
    pub catalog_refreshes_total: u64,
    pub catalog_fetch_failures_total: u64,
    pub avg_turn_latency_millis: f64,
}

impl AppMetrics {
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn inc_turn(&self) {
        self.turns_total.fetch_add(1, Ordering::Relaxed);
        counter!("snowtrip_dialogue_turns_total").increment(1);
    }

    pub fn inc_trip_created(&self) {
        self.trips_created_total.fetch_add(1, Ordering::Relaxed);
        counter!("snowtrip_trips_created_total").increment(1);
    }

    pub fn inc_creation_failure(&self) {
        self.trip_creation_failures_total
            .fetch_add(1, Ordering::Relaxed);
        counter!("snowtrip_trip_creation_failures_total").increment(1);
    }

    pub fn inc_ambiguous_match(&self) {
        self.ambiguous_matches_total.fetch_add(1, Ordering::Relaxed);
        counter!("snowtrip_ambiguous_matches_total").increment(1);
    }

    pub fn inc_unparsed_date(&self) {
        self.unparsed_dates_total.fetch_add(1, Ordering::Relaxed);
        counter!("snowtrip_unparsed_dates_total").increment(1);
    }

    /// Catalog counters are owned by the cache; this copies its totals.
    pub fn sync_catalog(&self, refreshes: u64, fetch_failures: u64) {
        self.catalog_refreshes_total
            .store(refreshes, Ordering::Relaxed);
        self.catalog_fetch_failures_total
            .store(fetch_failures, Ordering::Relaxed);
        gauge!("snowtrip_catalog_refreshes").set(refreshes as f64);
        gauge!("snowtrip_catalog_fetch_failures").set(fetch_failures as f64);
    }

    pub fn observe_latency(&self, duration: Duration) {
        self.total_latency_micros
            .fetch_add(duration.as_micros() as u64, Ordering::Relaxed);
        histogram!("snowtrip_turn_latency_seconds").record(duration.as_secs_f64());
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let turns = self.turns_total.load(Ordering::Relaxed);
        let latency = self.total_latency_micros.load(Ordering::Relaxed);

        MetricsSnapshot {
            turns_total: turns,
            trips_created_total: self.trips_created_total.load(Ordering::Relaxed),
            trip_creation_failures_total: self
                .trip_creation_failures_total
                .load(Ordering::Relaxed),
            ambiguous_matches_total: self.ambiguous_matches_total.load(Ordering::Relaxed),
            unparsed_dates_total: self.unparsed_dates_total.load(Ordering::Relaxed),
            catalog_refreshes_total: self.catalog_refreshes_total.load(Ordering::Relaxed),
            catalog_fetch_failures_total: self
                .catalog_fetch_failures_total
                .load(Ordering::Relaxed),
            avg_turn_latency_millis: if turns == 0 {
                0.0
            } else {
                latency as f64 / 1000.0 / turns as f64
            },
        }
    }
}

pub fn init_tracing(service_name: &str) {
    TRACING_INIT.get_or_init(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}=info,snowtrip_api=info,snowtrip_dialogue=info,snowtrip_catalog=info",
                service_name
            ))
        });

        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_current_span(true)
            .with_span_list(true)
            .init();
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_averages_latency_per_turn() {
        let metrics = AppMetrics::default();
        metrics.inc_turn();
        metrics.inc_turn();
        metrics.observe_latency(Duration::from_millis(3));
        metrics.observe_latency(Duration::from_millis(5));
        metrics.inc_trip_created();
        metrics.sync_catalog(4, 1);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.turns_total, 2);
        assert_eq!(snapshot.trips_created_total, 1);
        assert_eq!(snapshot.catalog_refreshes_total, 4);
        assert_eq!(snapshot.catalog_fetch_failures_total, 1);
        assert!((snapshot.avg_turn_latency_millis - 4.0).abs() < 1e-9);
    }

    #[test]
    fn empty_snapshot_has_zero_latency() {
        assert_eq!(AppMetrics::default().snapshot().avg_turn_latency_millis, 0.0);
    }
}
