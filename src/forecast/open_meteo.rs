//! Open-Meteo adapter. Grounded on the teacher's own `ForecastClient`
//! (`reqwest::Client` with a 10s timeout, env-var base-URL override, typed
//! `#[derive(Deserialize)]` response shapes).

use async_trait::async_trait;
use log::warn;
use reqwest::Client;
use serde::Deserialize;

use crate::error::EngineError;
use crate::forecast::ForecastAdapter;
use crate::model::{ForecastDay, GeoCoordinates};
use crate::timezone::TimeZoneResolver;

const FORECAST_URL: &str = "https://api.open-meteo.com/v1/forecast";
const PROVIDER_TAG: &str = "open-meteo";

#[derive(Debug, Clone)]
pub struct OpenMeteoAdapter {
    client: Client,
    base_url: String,
}

impl Default for OpenMeteoAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl OpenMeteoAdapter {
    #[must_use]
    pub fn new() -> Self {
        let base_url =
            std::env::var("SPRINKLER_OPEN_METEO_URL").unwrap_or_else(|_| FORECAST_URL.to_string());
        Self::with_base_url(base_url)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .unwrap_or_else(|_| Client::new());
        Self {
            client,
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl ForecastAdapter for OpenMeteoAdapter {
    fn tag(&self) -> &'static str {
        PROVIDER_TAG
    }

    async fn fetch_daily(&self, coords: GeoCoordinates) -> Result<Vec<ForecastDay>, EngineError> {
        let response = self
            .client
            .get(&self.base_url)
            .query(&query_params(coords))
            .send()
            .await
            .map_err(|err| EngineError::upstream_transient(PROVIDER_TAG, err.into()))?
            .error_for_status()
            .map_err(|err| EngineError::upstream_transient(PROVIDER_TAG, err.into()))?;

        let payload: DailyResponse = response
            .json()
            .await
            .map_err(|err| EngineError::upstream_transient(PROVIDER_TAG, err.into()))?;

        parse_forecast_days(&payload, coords)
    }
}

fn query_params(coords: GeoCoordinates) -> Vec<(&'static str, String)> {
    vec![
        ("latitude", coords.lat.to_string()),
        ("longitude", coords.lon.to_string()),
        (
            "daily",
            "temperature_2m_max,temperature_2m_min,precipitation_sum,relative_humidity_2m_mean,wind_speed_10m_max,shortwave_radiation_sum"
                .to_string(),
        ),
        ("temperature_unit", "fahrenheit".to_string()),
        ("precipitation_unit", "inch".to_string()),
        ("wind_speed_unit", "mph".to_string()),
        ("timezone", "auto".to_string()),
        ("forecast_days", "7".to_string()),
    ]
}

fn parse_forecast_days(payload: &DailyResponse, coords: GeoCoordinates) -> Result<Vec<ForecastDay>, EngineError> {
    let daily = &payload.daily;
    let tz = TimeZoneResolver::new();
    let mut out = Vec::with_capacity(daily.time.len());

    for idx in 0..daily.time.len() {
        let Some(date) = chrono::NaiveDate::parse_from_str(&daily.time[idx], "%Y-%m-%d").ok() else {
            warn!("open-meteo emitted an unparseable date {:?}; skipping", daily.time[idx]);
            continue;
        };

        let max_temp_f = field(&daily.temperature_2m_max, idx).ok_or_else(|| EngineError::MissingField {
            provider: PROVIDER_TAG.to_string(),
            field: "temperature_2m_max".to_string(),
        })?;
        let min_temp_f = field(&daily.temperature_2m_min, idx).ok_or_else(|| EngineError::MissingField {
            provider: PROVIDER_TAG.to_string(),
            field: "temperature_2m_min".to_string(),
        })?;
        let precip_in = field(&daily.precipitation_sum, idx).unwrap_or(0.0);

        let midnight = local_midnight_for_date(&tz, coords, date);

        out.push(ForecastDay {
            local_midnight_epoch: midnight,
            min_temp_f,
            max_temp_f,
            precip_in,
            humidity_pct: field(&daily.relative_humidity_2m_mean, idx),
            solar_kwh_m2_day: field(&daily.shortwave_radiation_sum, idx).map(|mj| mj / 3.6),
            wind_mph: field(&daily.wind_speed_10m_max, idx),
            provider_tag: PROVIDER_TAG.to_string(),
        });
    }

    Ok(out)
}

fn local_midnight_for_date(tz: &TimeZoneResolver, coords: GeoCoordinates, date: chrono::NaiveDate) -> i64 {
    use chrono::TimeZone as _;
    let naive_midnight = date.and_hms_opt(12, 0, 0).expect("noon is always valid");
    let instant = chrono::Utc.from_utc_datetime(&naive_midnight);
    tz.local_midnight(coords, instant)
}

fn field(values: &[Option<f64>], idx: usize) -> Option<f64> {
    values.get(idx).copied().flatten()
}

#[derive(Debug, Deserialize)]
struct DailyResponse {
    daily: DailyBlock,
}

#[derive(Debug, Deserialize)]
struct DailyBlock {
    time: Vec<String>,
    temperature_2m_max: Vec<Option<f64>>,
    temperature_2m_min: Vec<Option<f64>>,
    precipitation_sum: Vec<Option<f64>>,
    relative_humidity_2m_mean: Vec<Option<f64>>,
    wind_speed_10m_max: Vec<Option<f64>>,
    shortwave_radiation_sum: Vec<Option<f64>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_payload() -> DailyResponse {
        DailyResponse {
            daily: DailyBlock {
                time: vec!["2026-07-29".to_string(), "bad-date".to_string()],
                temperature_2m_max: vec![Some(95.0), Some(90.0)],
                temperature_2m_min: vec![Some(68.0), Some(66.0)],
                precipitation_sum: vec![Some(0.0), None],
                relative_humidity_2m_mean: vec![None, Some(40.0)],
                wind_speed_10m_max: vec![Some(8.0), Some(9.0)],
                shortwave_radiation_sum: vec![Some(25.2), Some(24.0)],
            },
        }
    }

    #[test]
    fn parse_forecast_days_skips_unparseable_dates() {
        let coords = GeoCoordinates::new(37.3382, -121.8863);
        let days = parse_forecast_days(&sample_payload(), coords).expect("parsed days");
        assert_eq!(days.len(), 1);
    }

    #[test]
    fn parse_forecast_days_leaves_missing_humidity_absent() {
        let coords = GeoCoordinates::new(37.3382, -121.8863);
        let days = parse_forecast_days(&sample_payload(), coords).expect("parsed days");
        assert_eq!(days[0].humidity_pct, None);
    }

    #[test]
    fn parse_forecast_days_fails_on_missing_required_field() {
        let mut payload = sample_payload();
        payload.daily.temperature_2m_max[0] = None;
        let coords = GeoCoordinates::new(37.3382, -121.8863);
        let result = parse_forecast_days(&payload, coords);
        assert!(matches!(result, Err(EngineError::MissingField { .. })));
    }
}
