//! Deterministic in-memory adapter, used in tests and as the registry's
//! table-driven-dispatch example. Grounded on the teacher's own fixture style
//! (`test_support.rs`'s hand-built `ForecastBundle`s).

use async_trait::async_trait;
use std::sync::Mutex;

use crate::error::EngineError;
use crate::forecast::ForecastAdapter;
use crate::model::{ForecastDay, GeoCoordinates};

#[derive(Debug)]
pub struct StubAdapter {
    tag: &'static str,
    days: Mutex<Vec<ForecastDay>>,
    fail: bool,
}

impl StubAdapter {
    #[must_use]
    pub fn new(tag: &'static str, days: Vec<ForecastDay>) -> Self {
        Self {
            tag,
            days: Mutex::new(days),
            fail: false,
        }
    }

    #[must_use]
    pub fn failing(tag: &'static str) -> Self {
        Self {
            tag,
            days: Mutex::new(Vec::new()),
            fail: true,
        }
    }
}

#[async_trait]
impl ForecastAdapter for StubAdapter {
    fn tag(&self) -> &'static str {
        self.tag
    }

    async fn fetch_daily(&self, _coords: GeoCoordinates) -> Result<Vec<ForecastDay>, EngineError> {
        if self.fail {
            return Err(EngineError::upstream_transient(
                self.tag,
                anyhow::anyhow!("stub adapter configured to fail"),
            ));
        }
        Ok(self.days.lock().expect("stub adapter lock poisoned").clone())
    }
}
