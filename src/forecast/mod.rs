//! `ForecastAdapter`: the per-upstream abstraction reduced to a single
//! `fetch_daily` operation, per spec.md §4.5. One adapter exists per
//! supported upstream; the composer calls the selected adapter by tag
//! through `registry`, never by matching on a concrete type.

pub mod open_meteo;
pub mod registry;
pub mod stub;

use async_trait::async_trait;

use crate::error::EngineError;
use crate::model::{ForecastDay, GeoCoordinates};

/// Output is at least the next 7 calendar days starting no earlier than the
/// provider's own "today". All fields are in the core's canonical units;
/// adapters convert internally. Missing humidity/solar/wind are permitted
/// and represented as absent, never defaulted.
#[async_trait]
pub trait ForecastAdapter: Send + Sync {
    /// The tag this adapter is registered under (e.g. `"open-meteo"`).
    fn tag(&self) -> &'static str;

    async fn fetch_daily(&self, coords: GeoCoordinates) -> Result<Vec<ForecastDay>, EngineError>;
}
