//! `LocalProvider`: two read-only views over `ObservationStore` — the
//! instantaneous "current conditions" and the aggregated watering window.
//! See spec.md §4.4.

use chrono::Utc;

use crate::aggregate::aggregate;
use crate::error::EngineError;
use crate::model::{CurrentConditions, DayBucket, GeoCoordinates};
use crate::store::ObservationStore;
use crate::timezone::TimeZoneResolver;

const CURRENT_WINDOW_SECS: i64 = 24 * 3600;

pub struct LocalProvider<'a> {
    store: &'a ObservationStore,
    tz: &'a TimeZoneResolver,
}

impl<'a> LocalProvider<'a> {
    #[must_use]
    pub fn new(store: &'a ObservationStore, tz: &'a TimeZoneResolver) -> Self {
        Self { store, tz }
    }

    /// The newest sample within the last 24h, plus the 24h interval-rain
    /// total. Read-only; does not modify the store. Fails `InsufficientData`
    /// when the 24h window is empty.
    pub fn get_current(&self, _coords: GeoCoordinates) -> Result<CurrentConditions, EngineError> {
        let now = Utc::now().timestamp();
        let samples = self.store.snapshot_view();
        let window: Vec<_> = samples
            .iter()
            .filter(|obs| now - obs.timestamp <= CURRENT_WINDOW_SECS)
            .collect();

        let newest = window
            .iter()
            .max_by_key(|obs| obs.timestamp)
            .ok_or_else(|| EngineError::insufficient_data("no observations within the last 24h"))?;

        let precip_24h_in: f64 = window.iter().filter_map(|obs| obs.interval_rain_in).sum();

        Ok(CurrentConditions {
            temp_f: newest.temp_f.unwrap_or(0.0).floor() as i32,
            humidity_pct: newest.humidity_pct.unwrap_or(0.0),
            wind_mph: round_to_one_decimal(newest.wind_mph.unwrap_or(0.0)),
            precip_24h_in,
            raining: precip_24h_in > 0.0,
        })
    }

    /// The aggregator's output: at most 8 `DayBucket`s, newest-first.
    pub fn get_watering_window(&self, coords: GeoCoordinates) -> Result<Vec<DayBucket>, EngineError> {
        let now = Utc::now();
        let local_midnight_today = self.tz.local_midnight(coords, now);
        let samples = self.store.snapshot_view();
        aggregate(&samples, local_midnight_today, now.timestamp())
    }
}

fn round_to_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
