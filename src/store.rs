//! `ObservationStore`: a bounded, time-ordered sequence of PWS samples with
//! periodic crash-safe persistence. See spec.md §4.1/§4.2.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use log::{debug, info, warn};

use crate::model::Observation;

const RETENTION_SECS: i64 = 8 * 24 * 3600;
const PERSIST_INTERVAL_SECS: u64 = 30 * 60;

/// Stateful filter applied at ingest: converts the PWS's monotonic-with-reset
/// `dailyRain_in` counter into a non-negative per-sample delta. See spec.md
/// §4.2 for the exact formula and rationale.
#[derive(Debug, Clone, Copy, Default)]
pub struct RainCounter {
    last_daily_rain_in: f64,
    last_rain_epoch: Option<i64>,
}

impl RainCounter {
    /// Returns the `intervalRain_in` for this sample, or `None` if
    /// `daily_rain_in` was absent (leaving internal state unchanged).
    pub fn update(&mut self, daily_rain_in: Option<f64>, rain_rate_in_hr: Option<f64>, timestamp: i64) -> Option<f64> {
        if rain_rate_in_hr.is_some_and(|rate| rate > 0.0) {
            self.last_rain_epoch = Some(timestamp);
        }

        let daily_rain_in = daily_rain_in?;
        let interval = if daily_rain_in < self.last_daily_rain_in {
            daily_rain_in
        } else {
            daily_rain_in - self.last_daily_rain_in
        };
        self.last_daily_rain_in = daily_rain_in;
        Some(interval)
    }

    #[must_use]
    pub const fn last_rain_epoch(&self) -> Option<i64> {
        self.last_rain_epoch
    }
}

#[derive(Debug, Default)]
struct StoreInner {
    observations: VecDeque<Observation>,
    rain_counter: RainCounter,
}

/// An append-only ring of `Observation`s, protected by a single reader-writer
/// lock so that `ingest`/`trim`/`persist` are linearizable and `snapshotView`
/// never observes a torn prepend. See spec.md §5.
#[derive(Debug, Clone)]
pub struct ObservationStore {
    inner: Arc<RwLock<StoreInner>>,
    persistence_path: Option<PathBuf>,
}

impl ObservationStore {
    #[must_use]
    pub fn new(persistence_path: Option<PathBuf>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(StoreInner::default())),
            persistence_path,
        }
    }

    /// O(1) prepend. Never fails: absent fields are permitted and the rain
    /// delta is absorbed by `RainCounter`. Updates `lastRainCount`/
    /// `lastRainEpoch` inside the same critical section as the prepend.
    pub fn ingest(&self, mut sample: Observation) {
        let mut guard = self.inner.write().expect("observation store lock poisoned");
        sample.interval_rain_in = guard.rain_counter.update(
            sample.daily_rain_in,
            sample.rain_rate_in_hr,
            sample.timestamp,
        );
        debug!(
            "ingest ts={} temp_f={:?} interval_rain_in={:?}",
            sample.timestamp, sample.temp_f, sample.interval_rain_in
        );
        guard.observations.push_front(sample);
    }

    /// A read-consistent snapshot: the full prior state, possibly plus
    /// zero-or-more new prepends at the head observed concurrently. Safe to
    /// hold across aggregation since it's an owned copy, not a lock guard.
    #[must_use]
    pub fn snapshot_view(&self) -> Vec<Observation> {
        let guard = self.inner.read().expect("observation store lock poisoned");
        guard.observations.iter().cloned().collect()
    }

    /// Removes any observation older than 8 days relative to `now`.
    pub fn trim(&self, now: i64) {
        let mut guard = self.inner.write().expect("observation store lock poisoned");
        let before = guard.observations.len();
        guard
            .observations
            .retain(|obs| now - obs.timestamp <= RETENTION_SECS);
        let removed = before - guard.observations.len();
        if removed > 0 {
            debug!("trim removed {removed} observations older than 8 days");
        }
    }

    #[must_use]
    pub fn last_rain_epoch(&self) -> Option<i64> {
        self.inner
            .read()
            .expect("observation store lock poisoned")
            .rain_counter
            .last_rain_epoch()
    }

    /// Serializes the current store to `persistence_path` via
    /// write-to-temp + rename, so a crash mid-write never corrupts the
    /// previous snapshot.
    pub fn persist(&self) -> std::io::Result<()> {
        let Some(path) = &self.persistence_path else {
            return Ok(());
        };
        let snapshot = self.snapshot_view();
        match write_atomic(path, &snapshot) {
            Ok(()) => {
                info!("persisted {} observations to {}", snapshot.len(), path.display());
                Ok(())
            }
            Err(err) => {
                warn!("failed to persist observation store to {}: {err}", path.display());
                Err(err)
            }
        }
    }

    /// Restores from `persistence_path`. A corrupt file resets the store to
    /// empty and logs the error rather than failing startup.
    pub fn restore(&self) {
        let Some(path) = &self.persistence_path else {
            return;
        };
        match read_snapshot(path) {
            Ok(Some(observations)) => {
                let mut guard = self.inner.write().expect("observation store lock poisoned");
                guard.observations = observations;
                info!("restored {} observations from {}", guard.observations.len(), path.display());
            }
            Ok(None) => {
                debug!("no observation snapshot at {}; starting empty", path.display());
            }
            Err(err) => {
                warn!(
                    "corrupt observation snapshot at {}: {err}; starting empty",
                    path.display()
                );
            }
        }
    }

    /// Spawns the periodic persistence worker. Persists every 30 minutes;
    /// callers should also call `persist()` once more on graceful shutdown.
    #[must_use]
    pub fn start(&self) -> tokio::task::JoinHandle<()> {
        let store = self.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(std::time::Duration::from_secs(PERSIST_INTERVAL_SECS));
            loop {
                interval.tick().await;
                let _ = store.persist();
            }
        })
    }

    pub fn shutdown(&self, worker: tokio::task::JoinHandle<()>) {
        worker.abort();
        let _ = self.persist();
    }
}

fn write_atomic(path: &Path, observations: &VecDeque<Observation>) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    // Spec-mandated on-disk shape: a bare JSON array of Observations in
    // store order, not wrapped in an object.
    let payload: Vec<&Observation> = observations.iter().collect();
    let payload = serde_json::to_vec(&payload).map_err(std::io::Error::other)?;
    let tmp_path = path.with_extension("json.tmp");
    std::fs::write(&tmp_path, payload)?;
    std::fs::rename(&tmp_path, path)
}

fn read_snapshot(path: &Path) -> std::io::Result<Option<VecDeque<Observation>>> {
    let content = match std::fs::read(path) {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(err) => return Err(err),
    };
    let observations: Vec<Observation> =
        serde_json::from_slice(&content).map_err(std::io::Error::other)?;
    Ok(Some(observations.into()))
}
