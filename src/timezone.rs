//! `TimeZoneResolver`: coordinates -> IANA zone -> local-midnight epoch. See
//! spec.md §4.7. All day-boundary math in the engine routes through here so
//! no component accidentally reasons in server-local time.

use chrono::{DateTime, Datelike, NaiveDate, TimeZone, Utc};
use chrono_tz::Tz;
use tzf_rs::DefaultFinder;

use crate::model::GeoCoordinates;

/// Resolves coordinates to an IANA zone and exposes local-midnight /
/// calendar-day helpers. Results are stable per `(coords, instant)`;
/// coordinates outside any known zone fall back to UTC, per spec.md §4.7.
pub struct TimeZoneResolver {
    finder: DefaultFinder,
}

impl std::fmt::Debug for TimeZoneResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimeZoneResolver").finish_non_exhaustive()
    }
}

impl Default for TimeZoneResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeZoneResolver {
    #[must_use]
    pub fn new() -> Self {
        Self {
            finder: DefaultFinder::new(),
        }
    }

    #[must_use]
    pub fn zone_for(&self, coords: GeoCoordinates) -> Tz {
        let name = self.finder.get_tz_name(coords.lon, coords.lat);
        name.parse().unwrap_or(chrono_tz::UTC)
    }

    /// 00:00:00 in the resolved zone, as seconds since epoch UTC, for the
    /// calendar date that `instant` falls on in that zone.
    #[must_use]
    pub fn local_midnight(&self, coords: GeoCoordinates, instant: DateTime<Utc>) -> i64 {
        let zone = self.zone_for(coords);
        let local = instant.with_timezone(&zone);
        let midnight = local
            .date_naive()
            .and_hms_opt(0, 0, 0)
            .expect("midnight is always a valid time");
        zone.from_local_datetime(&midnight)
            .single()
            .unwrap_or_else(|| zone.from_utc_datetime(&midnight))
            .with_timezone(&Utc)
            .timestamp()
    }

    /// The `(year, month, day)` calendar date `instant` falls on in the
    /// resolved zone.
    #[must_use]
    pub fn local_calendar_day(&self, coords: GeoCoordinates, instant: DateTime<Utc>) -> NaiveDate {
        let zone = self.zone_for(coords);
        instant.with_timezone(&zone).date_naive()
    }

    /// Calendar date of an epoch timestamp, used when filtering forecast
    /// elements by `(year, month, day)` rather than raw epoch comparison
    /// (spec.md §4.6, tie-break rule for non-midnight upstream marks).
    #[must_use]
    pub fn calendar_day_of_epoch(&self, coords: GeoCoordinates, epoch: i64) -> NaiveDate {
        let instant = Utc
            .timestamp_opt(epoch, 0)
            .single()
            .unwrap_or_else(|| Utc.timestamp_opt(0, 0).single().expect("epoch 0 is valid"));
        self.local_calendar_day(coords, instant)
    }

    #[must_use]
    pub fn year_month_day(date: NaiveDate) -> (i32, u32, u32) {
        (date.year(), date.month(), date.day())
    }
}
