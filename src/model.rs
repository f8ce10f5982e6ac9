//! Shared data model: raw observations, per-day rollups, forecast days, and
//! the unified series the composer hands to its two consumers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Sentinel some PWS firmwares emit for "sensor absent".
pub const ABSENT_SENTINEL: f64 = -9999.0;

/// A lat/lon pair scoped to a single request.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoCoordinates {
    pub lat: f64,
    pub lon: f64,
}

impl GeoCoordinates {
    #[must_use]
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Bit-pattern key suitable for hashing/equality of floating coordinates,
    /// rounded to ~1cm of precision so near-identical requests share a cache
    /// entry.
    #[must_use]
    pub fn cache_key(self) -> (i64, i64) {
        const SCALE: f64 = 1_000_000.0;
        ((self.lat * SCALE).round() as i64, (self.lon * SCALE).round() as i64)
    }
}

/// Which side of the hybrid composition a `CombinedSeries` element came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Source {
    Local,
    Forecast,
}

/// A single raw PWS push, after absent-field normalization but before
/// day-level aggregation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    /// Seconds since epoch, UTC.
    pub timestamp: i64,
    pub temp_f: Option<f64>,
    pub humidity_pct: Option<f64>,
    pub wind_mph: Option<f64>,
    pub solar_kwh_m2_day: Option<f64>,
    /// Running daily total as reported by the station (may reset at local
    /// midnight or power-cycle).
    pub daily_rain_in: Option<f64>,
    /// Instantaneous rain-rate sensor reading ("rainin"); only used to
    /// update `RainCounter::last_rain_epoch`, never averaged or summed.
    pub rain_rate_in_hr: Option<f64>,
    /// Computed at ingest by `RainCounter`: the non-negative delta since the
    /// previous sample, correctly handling the daily reset.
    pub interval_rain_in: Option<f64>,
}

/// Per-calendar-day rollup, keyed by local midnight. Never persisted —
/// derived fresh from `ObservationStore` on every read.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DayBucket {
    pub local_midnight_epoch: i64,
    pub mean_temp_f: f64,
    pub min_temp_f: f64,
    pub max_temp_f: f64,
    pub mean_humidity_pct: f64,
    pub min_humidity_pct: f64,
    pub max_humidity_pct: f64,
    pub precip_in: f64,
    pub mean_solar_kwh_m2_day: Option<f64>,
    pub mean_wind_mph: Option<f64>,
    pub sample_count: usize,
    pub complete: bool,
}

/// A single day of upstream forecast, reduced to the core's canonical units.
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastDay {
    pub local_midnight_epoch: i64,
    pub min_temp_f: f64,
    pub max_temp_f: f64,
    pub precip_in: f64,
    pub humidity_pct: Option<f64>,
    pub solar_kwh_m2_day: Option<f64>,
    pub wind_mph: Option<f64>,
    pub provider_tag: String,
}

/// One element of a `CombinedSeries`: a `DayBucket` or `ForecastDay` unioned
/// into a single shape, tagged with its origin.
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesDay {
    pub local_midnight_epoch: i64,
    pub min_temp_f: f64,
    pub max_temp_f: f64,
    pub mean_temp_f: f64,
    pub min_humidity_pct: Option<f64>,
    pub max_humidity_pct: Option<f64>,
    pub mean_humidity_pct: Option<f64>,
    pub precip_in: f64,
    pub solar_kwh_m2_day: Option<f64>,
    pub wind_mph: Option<f64>,
    pub source: Source,
    pub provider_tag: Option<String>,
}

impl SeriesDay {
    #[must_use]
    pub fn from_bucket(bucket: DayBucket) -> Self {
        Self {
            local_midnight_epoch: bucket.local_midnight_epoch,
            min_temp_f: bucket.min_temp_f,
            max_temp_f: bucket.max_temp_f,
            mean_temp_f: bucket.mean_temp_f,
            min_humidity_pct: Some(bucket.min_humidity_pct),
            max_humidity_pct: Some(bucket.max_humidity_pct),
            mean_humidity_pct: Some(bucket.mean_humidity_pct),
            precip_in: bucket.precip_in,
            solar_kwh_m2_day: bucket.mean_solar_kwh_m2_day,
            wind_mph: bucket.mean_wind_mph,
            source: Source::Local,
            provider_tag: None,
        }
    }

    #[must_use]
    pub fn from_forecast(day: ForecastDay) -> Self {
        Self {
            local_midnight_epoch: day.local_midnight_epoch,
            min_temp_f: day.min_temp_f,
            max_temp_f: day.max_temp_f,
            mean_temp_f: (day.min_temp_f + day.max_temp_f) / 2.0,
            min_humidity_pct: day.humidity_pct,
            max_humidity_pct: day.humidity_pct,
            mean_humidity_pct: day.humidity_pct,
            precip_in: day.precip_in,
            solar_kwh_m2_day: day.solar_kwh_m2_day,
            wind_mph: day.wind_mph,
            source: Source::Forecast,
            provider_tag: Some(day.provider_tag),
        }
    }
}

/// Newest-first sequence of `SeriesDay`s, the authoritative output of a
/// single `HybridComposer::compose` call.
pub type CombinedSeries = Vec<SeriesDay>;

/// A `CombinedSeries` plus the metadata needed to decide staleness.
#[derive(Debug, Clone)]
pub struct CachedView {
    pub series: CombinedSeries,
    pub coords: GeoCoordinates,
    pub created_at: DateTime<Utc>,
    pub ttl: chrono::Duration,
}

impl CachedView {
    #[must_use]
    pub fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        now - self.created_at <= self.ttl
    }
}

/// The newest sample's instantaneous readings plus a rolling 24h precip
/// total, as returned by `LocalProvider::get_current`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CurrentConditions {
    pub temp_f: i32,
    pub humidity_pct: f64,
    pub wind_mph: f64,
    pub precip_24h_in: f64,
    pub raining: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cache_key_is_stable_for_equal_coordinates() {
        let a = GeoCoordinates::new(37.3382, -121.8863);
        let b = GeoCoordinates::new(37.3382, -121.8863);
        assert_eq!(a.cache_key(), b.cache_key());
    }

    #[test]
    fn cache_key_distinguishes_nearby_but_different_coordinates() {
        let a = GeoCoordinates::new(37.3382, -121.8863);
        let b = GeoCoordinates::new(37.4000, -121.8863);
        assert_ne!(a.cache_key(), b.cache_key());
    }

    #[test]
    fn series_day_from_forecast_carries_absent_humidity_through() {
        let day = ForecastDay {
            local_midnight_epoch: 0,
            min_temp_f: 40.0,
            max_temp_f: 60.0,
            precip_in: 0.0,
            humidity_pct: None,
            solar_kwh_m2_day: None,
            wind_mph: None,
            provider_tag: "open-meteo".to_string(),
        };
        let series_day = SeriesDay::from_forecast(day);
        assert_eq!(series_day.mean_humidity_pct, None);
    }
}
