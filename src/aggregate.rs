//! `DayAggregator`: turns raw samples into at most 8 `DayBucket`s (7 past +
//! 1 partial today) in the caller's local time zone. See spec.md §4.3.

use crate::error::EngineError;
use crate::model::{DayBucket, Observation};

const DAY_SECS: i64 = 24 * 3600;
const MIN_SPAN_SECS: i64 = 23 * 3600;

/// Builds the bucket for samples whose timestamp falls in `[start, end)`.
/// Unifies the partial-today case and the 1..7 loop behind one window,
/// per spec.md §9's redesign note.
fn build_bucket(samples: &[Observation], start: i64, end: i64) -> Option<DayBucket> {
    let mut temp_sum = 0.0;
    let mut temp_count = 0usize;
    let mut min_temp = f64::INFINITY;
    let mut max_temp = f64::NEG_INFINITY;

    let mut humidity_sum = 0.0;
    let mut humidity_count = 0usize;
    let mut min_humidity = f64::INFINITY;
    let mut max_humidity = f64::NEG_INFINITY;

    let mut precip_sum = 0.0;
    let mut solar_sum = 0.0;
    let mut solar_count = 0usize;
    let mut wind_sum = 0.0;
    let mut wind_count = 0usize;
    let mut sample_count = 0usize;

    for obs in samples {
        if obs.timestamp < start || obs.timestamp >= end {
            continue;
        }
        sample_count += 1;

        if let Some(temp) = obs.temp_f {
            temp_sum += temp;
            temp_count += 1;
            min_temp = min_temp.min(temp);
            max_temp = max_temp.max(temp);
        }
        if let Some(humidity) = obs.humidity_pct {
            humidity_sum += humidity;
            humidity_count += 1;
            min_humidity = min_humidity.min(humidity);
            max_humidity = max_humidity.max(humidity);
        }
        if let Some(rain) = obs.interval_rain_in {
            precip_sum += rain.max(0.0);
        }
        if let Some(solar) = obs.solar_kwh_m2_day {
            solar_sum += solar;
            solar_count += 1;
        }
        if let Some(wind) = obs.wind_mph {
            wind_sum += wind;
            wind_count += 1;
        }
    }

    if temp_count == 0 || humidity_count == 0 {
        return None;
    }
    if !min_temp.is_finite() || !max_temp.is_finite() || !min_humidity.is_finite() || !max_humidity.is_finite() {
        return None;
    }

    // spec.md §3: a bucket is "complete" when it spans >= 23h of wall time,
    // independent of how many samples fall inside that window.
    let spans_23h_or_more = end - start >= MIN_SPAN_SECS;
    Some(DayBucket {
        local_midnight_epoch: start,
        mean_temp_f: temp_sum / temp_count as f64,
        min_temp_f: min_temp,
        max_temp_f: max_temp,
        mean_humidity_pct: humidity_sum / humidity_count as f64,
        min_humidity_pct: min_humidity,
        max_humidity_pct: max_humidity,
        precip_in: precip_sum,
        mean_solar_kwh_m2_day: (solar_count > 0).then(|| solar_sum / solar_count as f64),
        mean_wind_mph: (wind_count > 0).then(|| wind_sum / wind_count as f64),
        sample_count,
        complete: spans_23h_or_more,
    })
}

/// Builds today's partial bucket from `[local_midnight_today, now)`. Emitted
/// iff temp and humidity each have at least one contributing sample and all
/// min/max values are finite, per spec.md §4.3. Its wall-time span is always
/// less than a full day, so `complete` is always `false`.
fn build_today_bucket(samples: &[Observation], local_midnight_today: i64, now: i64) -> Option<DayBucket> {
    build_bucket(samples, local_midnight_today, now)
}

/// Completeness test for any emitted day: temp and humidity means each have
/// at least one contributing sample, and all four min/max values are finite.
/// (`build_bucket` already enforces this by construction — `None` is the
/// failure case — so this just asserts the positive case is non-empty.)
fn is_complete(bucket: &DayBucket) -> bool {
    bucket.sample_count > 0
        && bucket.min_temp_f.is_finite()
        && bucket.max_temp_f.is_finite()
        && bucket.min_humidity_pct.is_finite()
        && bucket.max_humidity_pct.is_finite()
}

/// `aggregate(store, coords, now) -> []DayBucket`, newest-first, per
/// spec.md §4.3. Takes the already-resolved local midnight of "today" so
/// this module stays independent of `TimeZoneResolver`.
pub fn aggregate(
    samples: &[Observation],
    local_midnight_today: i64,
    now: i64,
) -> Result<Vec<DayBucket>, EngineError> {
    let Some(oldest) = samples.iter().map(|o| o.timestamp).min() else {
        return Err(EngineError::insufficient_data("no observations in store"));
    };
    let newest = samples.iter().map(|o| o.timestamp).max().unwrap_or(oldest);
    if newest - oldest < MIN_SPAN_SECS {
        return Err(EngineError::insufficient_data(format!(
            "span {}s is below the required {}s",
            newest - oldest,
            MIN_SPAN_SECS
        )));
    }

    let mut buckets = Vec::with_capacity(8);

    if let Some(today) = build_today_bucket(samples, local_midnight_today, now) {
        buckets.push(today);
    }

    for i in 1..=7i64 {
        let start = local_midnight_today - i * DAY_SECS;
        let end = local_midnight_today - (i - 1) * DAY_SECS;
        match build_bucket(samples, start, end) {
            Some(bucket) if is_complete(&bucket) => buckets.push(bucket),
            _ if i == 1 => {
                return Err(EngineError::insufficient_data(
                    "yesterday's bucket is missing or incomplete",
                ));
            }
            _ => break,
        }
    }

    if buckets.is_empty() {
        return Err(EngineError::insufficient_data("no complete day buckets available"));
    }

    Ok(buckets)
}
