//! Shared fixtures for the integration suites.

use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use snowtrip_api::{build_router, ApiState};
use snowtrip_catalog::{CatalogCache, StaticCatalogSource};
use snowtrip_core::{FixedClock, Settings};
use snowtrip_dialogue::TripPlannerAgent;
use snowtrip_observability::AppMetrics;
use snowtrip_storage::MemoryTripStore;

/// Saturday in the early ski season; bare winter months resolve to 2025/2026.
pub fn season_day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 11, 15).unwrap_or_default()
}

pub struct Harness {
    pub agent: Arc<TripPlannerAgent<MemoryTripStore>>,
    pub store: Arc<MemoryTripStore>,
    pub metrics: Arc<AppMetrics>,
    pub clock: Arc<FixedClock>,
}

impl Harness {
    pub fn on(today: NaiveDate) -> Self {
        let clock = Arc::new(FixedClock::on(today));
        let catalog = Arc::new(CatalogCache::new(
            Arc::new(StaticCatalogSource::builtin()),
            clock.clone(),
            Duration::from_secs(3600),
        ));
        let store = Arc::new(MemoryTripStore::with_clock(clock.clone()));
        let metrics = AppMetrics::shared();
        let agent = Arc::new(TripPlannerAgent::new(
            catalog,
            store.clone(),
            metrics.clone(),
            Settings::default(),
        ));
        Self {
            agent,
            store,
            metrics,
            clock,
        }
    }

    pub fn router(&self) -> axum::Router {
        build_router(ApiState::new(self.agent.clone(), self.metrics.clone()))
    }
}

impl Default for Harness {
    fn default() -> Self {
        Self::on(season_day())
    }
}
