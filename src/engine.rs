//! `Engine`: the composition root. Wires `ObservationStore`,
//! `TimeZoneResolver`, the adapter `AdapterRegistry`, and `HybridComposer`
//! into the three operations a transport layer would expose, per spec.md §6.

use std::sync::Arc;

use chrono::Utc;

use crate::composer::HybridComposer;
use crate::config::Config;
use crate::error::EngineError;
use crate::forecast::open_meteo::OpenMeteoAdapter;
use crate::forecast::registry::AdapterRegistry;
use crate::model::{CombinedSeries, CurrentConditions, GeoCoordinates, SeriesDay};
use crate::push::PushParams;
use crate::store::ObservationStore;
use crate::timezone::TimeZoneResolver;

/// `getCurrent` plus the forecast tail of the cached combined series, the
/// shape the rain-restriction check and a weather-facing endpoint both need.
#[derive(Debug, Clone, PartialEq)]
pub struct WeatherView {
    pub current: CurrentConditions,
    pub forecast: Vec<SeriesDay>,
}

pub struct Engine {
    store: ObservationStore,
    composer: Arc<HybridComposer>,
}

impl Engine {
    /// Builds an `Engine` wired to the real `open-meteo` adapter. Restores
    /// persisted observations when `config.local_persistence_enabled`.
    #[must_use]
    pub fn new(config: Config) -> Self {
        let mut registry = AdapterRegistry::new();
        registry.register(Arc::new(OpenMeteoAdapter::new()));
        Self::with_registry(config, registry)
    }

    /// As `new`, but with a caller-supplied adapter registry — used by tests
    /// and by any future operator wanting to register additional providers.
    #[must_use]
    pub fn with_registry(config: Config, registry: AdapterRegistry) -> Self {
        let store = ObservationStore::new(config.observations_path());
        if config.local_persistence_enabled {
            store.restore();
        }
        let tz = Arc::new(TimeZoneResolver::new());
        let composer = Arc::new(HybridComposer::new(store.clone(), tz, Arc::new(registry)));
        Self { store, composer }
    }

    /// Parses and ingests a single PWS push. Never fails, per spec.md §7 —
    /// missing/absent/unparseable fields are absorbed rather than rejected.
    pub fn ingest_push(&self, params: PushParams) -> Result<(), EngineError> {
        self.store.ingest(params.into_observation(Utc::now()));
        Ok(())
    }

    /// The watering-adjustment view: the full newest-first combined series.
    pub async fn watering_window(
        &self,
        coords: GeoCoordinates,
        provider_tag: &str,
    ) -> Result<CombinedSeries, EngineError> {
        self.composer.view_for_adjustment(coords, provider_tag).await
    }

    /// The rain-restriction / weather-display view: current conditions plus
    /// the forecast tail of the combined series.
    pub async fn current_weather(
        &self,
        coords: GeoCoordinates,
        provider_tag: &str,
    ) -> Result<WeatherView, EngineError> {
        let (current, forecast) = self.composer.view_for_rain_restriction(coords, provider_tag).await?;
        Ok(WeatherView { current, forecast })
    }

    /// Starts the periodic persistence worker. Callers should `shutdown`
    /// with the returned handle before exiting.
    #[must_use]
    pub fn start(&self) -> tokio::task::JoinHandle<()> {
        self.store.start()
    }

    pub fn shutdown(&self, worker: tokio::task::JoinHandle<()>) {
        self.store.shutdown(worker);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forecast::stub::StubAdapter;
    use crate::model::ForecastDay;

    fn registry_with_stub(tag: &'static str, days: Vec<ForecastDay>) -> AdapterRegistry {
        let mut registry = AdapterRegistry::new();
        registry.register(Arc::new(StubAdapter::new(tag, days)));
        registry
    }

    #[tokio::test]
    async fn ingest_then_watering_window_round_trips_through_the_engine() {
        let engine = Engine::with_registry(Config::default(), registry_with_stub("test-provider", Vec::new()));
        let coords = GeoCoordinates::new(37.3382, -121.8863);

        let now = Utc::now();
        for hour in 0..200i64 {
            let ts = now - chrono::Duration::hours(hour);
            engine
                .ingest_push(PushParams {
                    dateutc: Some(ts.format("%Y-%m-%d %H:%M:%S").to_string()),
                    tempf: Some("68".to_string()),
                    humidity: Some("50".to_string()),
                    windspeedmph: Some("3".to_string()),
                    solarradiation: Some("400".to_string()),
                    dailyrainin: Some("0.0".to_string()),
                    rainin: Some("0.0".to_string()),
                })
                .expect("ingest");
        }

        let result = engine.watering_window(coords, "test-provider").await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn ingest_push_absorbs_unparseable_dateutc_instead_of_failing() {
        let engine = Engine::with_registry(Config::default(), registry_with_stub("test-provider", Vec::new()));
        let result = engine.ingest_push(PushParams {
            dateutc: Some("garbage".to_string()),
            ..Default::default()
        });
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn watering_window_fails_insufficient_data_before_any_push() {
        let engine = Engine::with_registry(Config::default(), registry_with_stub("test-provider", Vec::new()));
        let coords = GeoCoordinates::new(37.3382, -121.8863);
        let result = engine.watering_window(coords, "test-provider").await;
        assert!(matches!(result, Err(EngineError::InsufficientData { .. })));
    }
}
