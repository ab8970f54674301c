use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use snowtrip_catalog::{
    source_from_settings, CatalogCache, CatalogIndex, CatalogStats, EntityMatcher,
};
use snowtrip_core::{
    Clock, DialogueContext, Intent, NluError, Settings, SystemClock, TemporalParser, TripRecord,
};
use snowtrip_nlu::{IntentClassifier, RuleIntentClassifier};
use snowtrip_observability::AppMetrics;
use snowtrip_storage::TripRepository;
use tracing::{info, instrument, warn};

use crate::controller::{
    complete_creation, complete_deletion, complete_listing, transition, Effect, TurnOutcome,
};

/// Runs dialogue turns against a live catalog and a trip store.
#[derive(Clone)]
pub struct TripPlannerAgent<S>
where
    S: TripRepository,
{
    catalog: Arc<CatalogCache>,
    store: Arc<S>,
    metrics: Arc<AppMetrics>,
    settings: Settings,
}

impl<S> TripPlannerAgent<S>
where
    S: TripRepository,
{
    pub fn new(
        catalog: Arc<CatalogCache>,
        store: Arc<S>,
        metrics: Arc<AppMetrics>,
        settings: Settings,
    ) -> Self {
        Self {
            catalog,
            store,
            metrics,
            settings,
        }
    }

    /// Catalog source and clock from the settings.
    pub fn from_settings(settings: Settings, store: Arc<S>, metrics: Arc<AppMetrics>) -> Self {
        let clock: Arc<dyn Clock> = Arc::new(SystemClock::with_offset_hours(settings.utc_offset_hours));
        let catalog = Arc::new(CatalogCache::new(
            source_from_settings(&settings),
            clock,
            settings.catalog_ttl,
        ));
        Self::new(catalog, store, metrics, settings)
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        self.catalog.clock()
    }

    /// Classifier bound to the current catalog snapshot and today's date.
    pub async fn classifier(&self) -> RuleIntentClassifier {
        RuleIntentClassifier::new(self.current_index().await, self.catalog.clock().today())
            .with_suggestion_limit(self.settings.suggestion_limit)
    }

    pub async fn matcher(&self) -> EntityMatcher {
        EntityMatcher::new(self.current_index().await)
            .with_suggestion_limit(self.settings.suggestion_limit)
    }

    pub fn parser(&self) -> TemporalParser {
        TemporalParser::new(self.catalog.clock().today())
    }

    pub async fn classify(&self, text: &str) -> Intent {
        self.classifier().await.classify(text)
    }

    pub fn catalog_stats(&self) -> CatalogStats {
        self.catalog.stats()
    }

    pub async fn refresh_catalog(&self) -> CatalogStats {
        self.catalog.invalidate();
        self.current_index().await;
        self.sync_catalog_metrics()
    }

    /// A refresh may read the catalog directory, so it runs on the blocking
    /// pool instead of the caller's worker thread.
    async fn current_index(&self) -> Arc<CatalogIndex> {
        if let Some(index) = self.catalog.cached() {
            return index;
        }
        let catalog = Arc::clone(&self.catalog);
        match tokio::task::spawn_blocking(move || catalog.snapshot()).await {
            Ok(index) => index,
            Err(err) => {
                warn!(error = %err, "catalog refresh task failed");
                self.catalog.last_known()
            }
        }
    }

    #[instrument(skip(self, context, text), fields(from = ?context.state))]
    pub async fn handle_turn(&self, mut context: DialogueContext, text: &str) -> TurnOutcome {
        let started = Instant::now();
        self.metrics.inc_turn();

        context.record_turn(text, self.catalog.clock().now(), self.settings.history_limit);
        let classifier = self.classifier().await;
        let mut outcome = transition(context, text, &classifier);

        if let Some(effect) = outcome.effect.clone() {
            outcome = self.perform(outcome.context, effect).await;
        }

        match &outcome.context.last_error {
            Some(NluError::AmbiguousMatch { .. }) => self.metrics.inc_ambiguous_match(),
            Some(NluError::UnparsableTemporalExpression { .. }) => {
                self.metrics.inc_unparsed_date()
            }
            _ => {}
        }
        self.sync_catalog_metrics();
        self.metrics.observe_latency(started.elapsed());

        info!(
            to = ?outcome.context.state,
            effect = ?outcome.effect.as_ref().map(effect_name),
            suggestions = outcome.response.suggestions.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "dialogue turn handled"
        );
        outcome
    }

    async fn perform(&self, context: DialogueContext, effect: Effect) -> TurnOutcome {
        let mut outcome = match &effect {
            Effect::CreateTrip(trip) => {
                let result = self.store.create_trip(trip.clone()).await;
                match &result {
                    Ok(record) => {
                        self.metrics.inc_trip_created();
                        info!(trip_id = %record.trip_id, resort = %record.resort_id, "trip created");
                    }
                    Err(err) => {
                        self.metrics.inc_creation_failure();
                        warn!(error = %err, resort = %trip.resort.id, "trip creation failed");
                    }
                }
                complete_creation(context, result.map_err(|err| err.to_string()))
            }
            Effect::LoadTrips { deleting } => {
                let trips = self.list_trips().await.map_err(|err| format!("{err:#}"));
                complete_listing(context, trips, *deleting)
            }
            Effect::DeleteTrip(trip_id) => {
                let removed = self.delete_trip(trip_id).await.map_err(|err| format!("{err:#}"));
                let remaining = self.list_trips().await.map_err(|err| format!("{err:#}"));
                complete_deletion(context, removed, remaining)
            }
        };
        outcome.effect = Some(effect);
        outcome
    }

    pub async fn list_trips(&self) -> Result<Vec<TripRecord>> {
        self.store
            .list_trips()
            .await
            .context("failed listing trips")
    }

    #[instrument(skip(self))]
    pub async fn delete_trip(&self, trip_id: &str) -> Result<bool> {
        let removed = self
            .store
            .delete_trip(trip_id)
            .await
            .with_context(|| format!("failed deleting trip {trip_id}"))?;
        info!(removed, "trip delete handled");
        Ok(removed)
    }

    fn sync_catalog_metrics(&self) -> CatalogStats {
        let stats = self.catalog.stats();
        self.metrics
            .sync_catalog(stats.refreshes, stats.fetch_failures);
        stats
    }
}

fn effect_name(effect: &Effect) -> &'static str {
    match effect {
        Effect::CreateTrip(_) => "create_trip",
        Effect::LoadTrips { .. } => "load_trips",
        Effect::DeleteTrip(_) => "delete_trip",
    }
}
