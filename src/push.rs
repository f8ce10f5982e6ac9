//! Parsing for Weather-Underground-compatible push-ingest query parameters,
//! per spec.md §6. Absent-sentinel folding happens entirely here: by the
//! time an `Observation` exists, every field is either a real value or
//! `None`, never `-9999.0`.

use chrono::{DateTime, NaiveDateTime, Utc};
use log::warn;

use crate::model::{Observation, ABSENT_SENTINEL};

/// Body returned by a successful push, per spec.md §6. No HTTP transport is
/// wired up here; this constant exists for whichever layer eventually is.
pub const PUSH_SUCCESS_BODY: &str = "success\n";

const SENTINEL_EPSILON: f64 = 1e-6;

/// Raw query parameters from a PWS push, still strings: query parsing hands
/// these over verbatim, before any absent-sentinel folding.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PushParams {
    pub dateutc: Option<String>,
    pub tempf: Option<String>,
    pub humidity: Option<String>,
    pub windspeedmph: Option<String>,
    pub solarradiation: Option<String>,
    pub dailyrainin: Option<String>,
    pub rainin: Option<String>,
}

impl PushParams {
    /// Converts to an `Observation`, folding missing/non-numeric/`-9999.0`
    /// values to `None` and resolving `dateutc` (a UTC string or the literal
    /// `now`) against `received_at`. `interval_rain_in` is left `None`; only
    /// `ObservationStore::ingest` computes it, via `RainCounter`. Never fails:
    /// an unparseable `dateutc` falls back to `received_at`, matching the
    /// ingest path's "absent fields are absorbed" contract.
    #[must_use]
    pub fn into_observation(self, received_at: DateTime<Utc>) -> Observation {
        let timestamp = parse_dateutc(self.dateutc.as_deref(), received_at);

        Observation {
            timestamp,
            temp_f: parse_field(self.tempf.as_deref()),
            humidity_pct: parse_field(self.humidity.as_deref()),
            wind_mph: parse_field(self.windspeedmph.as_deref()),
            solar_kwh_m2_day: parse_field(self.solarradiation.as_deref()).map(|w_per_m2| w_per_m2 * 24.0 / 1000.0),
            daily_rain_in: parse_field(self.dailyrainin.as_deref()),
            rain_rate_in_hr: parse_field(self.rainin.as_deref()),
            interval_rain_in: None,
        }
    }
}

fn parse_dateutc(raw: Option<&str>, received_at: DateTime<Utc>) -> i64 {
    match raw {
        None | Some("now") => received_at.timestamp(),
        Some(value) => {
            let normalized = value.replace('+', " ");
            if let Ok(parsed) = DateTime::parse_from_rfc3339(&normalized) {
                return parsed.with_timezone(&Utc).timestamp();
            }
            for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"] {
                if let Ok(naive) = NaiveDateTime::parse_from_str(&normalized, format) {
                    return naive.and_utc().timestamp();
                }
            }
            warn!("unparseable dateutc {value:?}; falling back to received_at");
            received_at.timestamp()
        }
    }
}

fn parse_field(raw: Option<&str>) -> Option<f64> {
    let parsed: f64 = raw?.parse().ok()?;
    if (parsed - ABSENT_SENTINEL).abs() < SENTINEL_EPSILON {
        None
    } else {
        Some(parsed)
    }
}
