//! Integration-level scenarios from spec.md §8, driven through the public
//! `Engine` API rather than any single module in isolation.

use std::sync::Arc;

use chrono::{Duration, Utc};
use sprinkler_weather_engine::config::Config;
use sprinkler_weather_engine::engine::Engine;
use sprinkler_weather_engine::error::EngineError;
use sprinkler_weather_engine::forecast::registry::AdapterRegistry;
use sprinkler_weather_engine::forecast::stub::StubAdapter;
use sprinkler_weather_engine::model::{ForecastDay, GeoCoordinates, Source};
use sprinkler_weather_engine::push::PushParams;

const DAY_SECS: i64 = 24 * 3600;
const SAN_JOSE: GeoCoordinates = GeoCoordinates { lat: 37.3382, lon: -121.8863 };

fn registry_with(tag: &'static str, days: Vec<ForecastDay>) -> AdapterRegistry {
    let mut registry = AdapterRegistry::new();
    registry.register(Arc::new(StubAdapter::new(tag, days)));
    registry
}

fn push_at(at: chrono::DateTime<Utc>, temp: f64, humidity: f64) -> PushParams {
    PushParams {
        dateutc: Some(at.format("%Y-%m-%d %H:%M:%S").to_string()),
        tempf: Some(temp.to_string()),
        humidity: Some(humidity.to_string()),
        windspeedmph: Some("3.0".to_string()),
        solarradiation: Some("200".to_string()),
        dailyrainin: Some("0.0".to_string()),
        rainin: Some("0.0".to_string()),
    }
}

/// S2: a freshly started engine with no pushes yet fails with
/// `InsufficientData`, never panics or returns an empty-but-ok series.
#[tokio::test]
async fn s2_cold_start_reports_insufficient_data() {
    let engine = Engine::with_registry(Config::default(), registry_with("test-provider", Vec::new()));
    let result = engine.watering_window(SAN_JOSE, "test-provider").await;
    assert!(matches!(result, Err(EngineError::InsufficientData { .. })));
}

/// S3: 8+ days of hourly local pushes plus a 7-day forecast compose into a
/// 15-element, newest-first series with no calendar-day duplicates; the
/// newest element is forecast-tagged and the oldest is local.
#[tokio::test]
async fn s3_happy_path_combines_fifteen_days_newest_first() {
    let now = Utc::now();
    let mut forecast_days = Vec::new();
    for offset in 1..=7i64 {
        forecast_days.push(ForecastDay {
            local_midnight_epoch: now.timestamp() + offset * DAY_SECS,
            min_temp_f: 55.0,
            max_temp_f: 80.0,
            precip_in: 0.0,
            humidity_pct: Some(35.0),
            solar_kwh_m2_day: Some(6.0),
            wind_mph: Some(5.0),
            provider_tag: "test-provider".to_string(),
        });
    }

    let engine = Engine::with_registry(Config::default(), registry_with("test-provider", forecast_days));
    for hour_ago in 0..200i64 {
        engine
            .ingest_push(push_at(now - Duration::hours(hour_ago), 65.0, 40.0))
            .expect("ingest");
    }

    let series = engine.watering_window(SAN_JOSE, "test-provider").await.expect("series");
    assert_eq!(series.len(), 15);
    assert!(series.windows(2).all(|w| w[0].local_midnight_epoch > w[1].local_midnight_epoch));
    assert_eq!(series.first().unwrap().source, Source::Forecast);
    assert_eq!(series.last().unwrap().source, Source::Local);

    let mut days: Vec<_> = series.iter().map(|d| d.local_midnight_epoch / DAY_SECS).collect();
    let before_dedup = days.len();
    days.dedup();
    assert_eq!(days.len(), before_dedup, "no two entries should share a calendar day");
}

/// S4: a forecast day covering "today" (the same calendar day as the newest
/// local bucket) is dropped rather than duplicated alongside local data.
#[tokio::test]
async fn s4_forecast_day_overlapping_today_is_dropped() {
    let now = Utc::now();
    let mut forecast_days = vec![ForecastDay {
        local_midnight_epoch: now.timestamp(),
        min_temp_f: 55.0,
        max_temp_f: 80.0,
        precip_in: 0.0,
        humidity_pct: Some(35.0),
        solar_kwh_m2_day: None,
        wind_mph: None,
        provider_tag: "test-provider".to_string(),
    }];
    for offset in 1..=6i64 {
        forecast_days.push(ForecastDay {
            local_midnight_epoch: now.timestamp() + offset * DAY_SECS,
            min_temp_f: 55.0,
            max_temp_f: 80.0,
            precip_in: 0.0,
            humidity_pct: Some(35.0),
            solar_kwh_m2_day: None,
            wind_mph: None,
            provider_tag: "test-provider".to_string(),
        });
    }

    let engine = Engine::with_registry(Config::default(), registry_with("test-provider", forecast_days));
    for hour_ago in 0..200i64 {
        engine
            .ingest_push(push_at(now - Duration::hours(hour_ago), 65.0, 40.0))
            .expect("ingest");
    }

    let series = engine.watering_window(SAN_JOSE, "test-provider").await.expect("series");
    let forecast_count = series.iter().filter(|d| d.source == Source::Forecast).count();
    assert_eq!(forecast_count, 6, "today's forecast duplicate must be filtered out");
}

/// S5: forecast adapter down, local observations available — the composer
/// degrades to local-only rather than failing outright.
#[tokio::test]
async fn s5_forecast_down_degrades_to_local_only() {
    let now = Utc::now();
    let mut registry = AdapterRegistry::new();
    registry.register(Arc::new(StubAdapter::failing("test-provider")));

    let engine = Engine::with_registry(Config::default(), registry);
    for hour_ago in 0..200i64 {
        engine
            .ingest_push(push_at(now - Duration::hours(hour_ago), 65.0, 40.0))
            .expect("ingest");
    }

    let series = engine.watering_window(SAN_JOSE, "test-provider").await.expect("series");
    assert!(series.iter().all(|d| d.source == Source::Local));
    assert!(!series.is_empty());
}

/// S6: upstream forecast timestamps that aren't exactly local midnight still
/// get filtered by calendar day, not raw epoch comparison.
#[tokio::test]
async fn s6_non_midnight_forecast_timestamps_are_filtered_by_calendar_day() {
    let now = Utc::now();
    // Forecast "today" arrives at 15:00 rather than 00:00 local.
    let noisy_today = now.timestamp() - (now.timestamp() % DAY_SECS) + 15 * 3600;
    let mut forecast_days = vec![ForecastDay {
        local_midnight_epoch: noisy_today,
        min_temp_f: 55.0,
        max_temp_f: 80.0,
        precip_in: 0.0,
        humidity_pct: Some(35.0),
        solar_kwh_m2_day: None,
        wind_mph: None,
        provider_tag: "test-provider".to_string(),
    }];
    for offset in 1..=6i64 {
        forecast_days.push(ForecastDay {
            local_midnight_epoch: noisy_today + offset * DAY_SECS,
            min_temp_f: 55.0,
            max_temp_f: 80.0,
            precip_in: 0.0,
            humidity_pct: Some(35.0),
            solar_kwh_m2_day: None,
            wind_mph: None,
            provider_tag: "test-provider".to_string(),
        });
    }

    let engine = Engine::with_registry(Config::default(), registry_with("test-provider", forecast_days));
    for hour_ago in 0..200i64 {
        engine
            .ingest_push(push_at(now - Duration::hours(hour_ago), 65.0, 40.0))
            .expect("ingest");
    }

    let series = engine.watering_window(SAN_JOSE, "test-provider").await.expect("series");
    let forecast_count = series.iter().filter(|d| d.source == Source::Forecast).count();
    assert_eq!(
        forecast_count, 6,
        "a noisy same-day forecast timestamp must still be treated as overlapping today"
    );
}
