//! `HybridComposer`: combines `LocalProvider` + a selected `ForecastAdapter`
//! into the authoritative `CombinedSeries` for a `(coords, providerTag)`
//! pair, and caches it for short-TTL reuse. See spec.md §4.6.

use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex};

use chrono::{Duration, Utc};
use log::{debug, warn};
use lru::LruCache;
use tokio::sync::Notify;

use crate::error::EngineError;
use crate::forecast::registry::AdapterRegistry;
use crate::local::LocalProvider;
use crate::model::{CachedView, CombinedSeries, CurrentConditions, GeoCoordinates, SeriesDay};
use crate::store::ObservationStore;
use crate::timezone::TimeZoneResolver;

const CACHE_TTL_MINUTES: i64 = 5;
/// Bounds the number of distinct `(coords, providerTag)` views held at once,
/// so an operator hammering novel coordinates can't grow the cache
/// unboundedly.
const CACHE_CAPACITY: usize = 512;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    coords: (i64, i64),
    provider_tag: String,
}

enum CacheEntry {
    /// The first caller is composing; concurrent callers await this notify
    /// rather than re-composing (single-flight, per spec.md §5).
    Composing(Arc<Notify>),
    Ready(Arc<CachedView>),
}

pub struct HybridComposer {
    store: ObservationStore,
    tz: Arc<TimeZoneResolver>,
    registry: Arc<AdapterRegistry>,
    cache: Mutex<LruCache<CacheKey, CacheEntry>>,
}

impl HybridComposer {
    #[must_use]
    pub fn new(store: ObservationStore, tz: Arc<TimeZoneResolver>, registry: Arc<AdapterRegistry>) -> Self {
        Self {
            store,
            tz,
            registry,
            cache: Mutex::new(LruCache::new(
                NonZeroUsize::new(CACHE_CAPACITY).expect("capacity is a nonzero constant"),
            )),
        }
    }

    /// Returns the cached series or composes if stale/missing, newest-first.
    pub async fn view_for_adjustment(
        &self,
        coords: GeoCoordinates,
        provider_tag: &str,
    ) -> Result<CombinedSeries, EngineError> {
        Ok(self.cached_view(coords, provider_tag).await?.series.clone())
    }

    /// `LocalProvider.getCurrent` plus the forecast-day slice of the cached
    /// series.
    pub async fn view_for_rain_restriction(
        &self,
        coords: GeoCoordinates,
        provider_tag: &str,
    ) -> Result<(CurrentConditions, Vec<SeriesDay>), EngineError> {
        let view = self.cached_view(coords, provider_tag).await?;
        let local = LocalProvider::new(&self.store, &self.tz);
        let current = local.get_current(coords)?;
        let forecast_tail = view
            .series
            .iter()
            .filter(|day| day.source == crate::model::Source::Forecast)
            .cloned()
            .collect();
        Ok((current, forecast_tail))
    }

    async fn cached_view(&self, coords: GeoCoordinates, provider_tag: &str) -> Result<Arc<CachedView>, EngineError> {
        let key = CacheKey {
            coords: coords.cache_key(),
            provider_tag: provider_tag.to_string(),
        };

        loop {
            let now = Utc::now();
            let wait_on = {
                let mut cache = self.cache.lock().expect("composer cache lock poisoned");
                match cache.get(&key) {
                    Some(CacheEntry::Ready(view)) if view.is_fresh(now) => {
                        return Ok(Arc::clone(view));
                    }
                    Some(CacheEntry::Composing(notify)) => Some(Arc::clone(notify)),
                    _ => {
                        let notify = Arc::new(Notify::new());
                        cache.put(key.clone(), CacheEntry::Composing(Arc::clone(&notify)));
                        None
                    }
                }
            };

            if let Some(notify) = wait_on {
                notify.notified().await;
                continue;
            }

            return self.compose_and_store(coords, provider_tag, key.clone()).await;
        }
    }

    async fn compose_and_store(
        &self,
        coords: GeoCoordinates,
        provider_tag: &str,
        key: CacheKey,
    ) -> Result<Arc<CachedView>, EngineError> {
        let result = self.compose(coords, provider_tag).await;

        let mut cache = self.cache.lock().expect("composer cache lock poisoned");
        let waiters = match cache.get(&key) {
            Some(CacheEntry::Composing(notify)) => Some(Arc::clone(notify)),
            _ => None,
        };

        match result {
            Ok(series) => {
                let view = Arc::new(CachedView {
                    series,
                    coords,
                    created_at: Utc::now(),
                    ttl: Duration::minutes(CACHE_TTL_MINUTES),
                });
                cache.put(key, CacheEntry::Ready(Arc::clone(&view)));
                if let Some(notify) = waiters {
                    notify.notify_waiters();
                }
                Ok(view)
            }
            Err(err) => {
                // No negative caching: the entry is removed so the next
                // caller retries rather than seeing a poisoned result.
                cache.pop(&key);
                if let Some(notify) = waiters {
                    notify.notify_waiters();
                }
                Err(err)
            }
        }
    }

    /// The compose algorithm itself, per spec.md §4.6 steps 1-7.
    async fn compose(&self, coords: GeoCoordinates, provider_tag: &str) -> Result<CombinedSeries, EngineError> {
        let now = Utc::now();
        let today_calendar_day = self.tz.local_calendar_day(coords, now);

        let local = LocalProvider::new(&self.store, &self.tz);
        let local_result = local.get_watering_window(coords);
        let local_ok = local_result.is_ok();

        let adapter = self.registry.resolve(provider_tag)?;
        let forecast_result = adapter.fetch_daily(coords).await;
        let forecast_ok = forecast_result.is_ok();

        if let Err(err) = &local_result {
            debug!("local watering window unavailable: {err}");
        }
        if let Err(err) = &forecast_result {
            warn!("forecast adapter {provider_tag} failed: {err}");
        }

        let local_days: Vec<SeriesDay> = local_result
            .unwrap_or_default()
            .into_iter()
            .map(SeriesDay::from_bucket)
            .collect();

        let raw_forecast = forecast_result.unwrap_or_default();

        let latest_local_day = local_days
            .first()
            .map(|day| self.tz.calendar_day_of_epoch(coords, day.local_midnight_epoch));
        let cutoff_day = latest_local_day.map_or(today_calendar_day, |day| day.max(today_calendar_day));

        let filtered_forecast: Vec<SeriesDay> = raw_forecast
            .into_iter()
            .filter(|day| {
                let day_calendar = self.tz.calendar_day_of_epoch(coords, day.local_midnight_epoch);
                day_calendar > cutoff_day
            })
            .map(SeriesDay::from_forecast)
            .collect();

        if !local_ok && !forecast_ok {
            return Err(EngineError::insufficient_data(
                "neither local observations nor forecast data were available",
            ));
        }

        let mut combined: CombinedSeries = local_days;
        combined.extend(filtered_forecast);

        if combined.is_empty() {
            return Err(EngineError::insufficient_data(
                "composition produced no usable days",
            ));
        }

        combined.sort_by(|a, b| b.local_midnight_epoch.cmp(&a.local_midnight_epoch));
        Ok(combined)
    }
}
