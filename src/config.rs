//! Configuration read once at start, per spec.md §6. All fields optional;
//! absent values fall back to sane defaults rather than failing startup.

use std::collections::HashMap;
use std::path::PathBuf;

use crate::error::EngineError;

#[derive(Debug, Clone, Default)]
pub struct Config {
    pub persistence_dir: Option<PathBuf>,
    pub local_persistence_enabled: bool,
    pub provider_api_keys: HashMap<String, String>,
    pub http_ports: Vec<u16>,
}

const PROVIDER_KEY_PREFIX: &str = "SPRINKLER_PROVIDER_KEY_";

impl Config {
    /// Reads `PERSISTENCE_LOCATION`, `LOCAL_PERSISTENCE`, any
    /// `SPRINKLER_PROVIDER_KEY_<TAG>` variable, and `HTTP_PORTS` (a
    /// comma-separated list). Never panics; malformed values are logged and
    /// skipped rather than rejected, matching the ingest path's "never
    /// fatal" posture for configuration that the caller doesn't control.
    pub fn from_env() -> Result<Self, EngineError> {
        let persistence_dir = std::env::var_os("PERSISTENCE_LOCATION").map(PathBuf::from);
        let local_persistence_enabled = std::env::var("LOCAL_PERSISTENCE")
            .map(|raw| matches!(raw.to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);

        if local_persistence_enabled {
            if let Some(dir) = &persistence_dir {
                std::fs::create_dir_all(dir).map_err(|err| EngineError::Configuration {
                    detail: format!("persistence directory {} inaccessible: {err}", dir.display()),
                })?;
            } else {
                return Err(EngineError::Configuration {
                    detail: "LOCAL_PERSISTENCE enabled without PERSISTENCE_LOCATION".to_string(),
                });
            }
        }

        let provider_api_keys = std::env::vars()
            .filter_map(|(key, value)| {
                key.strip_prefix(PROVIDER_KEY_PREFIX)
                    .map(|tag| (tag.to_ascii_lowercase(), value))
            })
            .collect();

        let http_ports = std::env::var("HTTP_PORTS")
            .ok()
            .map(|raw| {
                raw.split(',')
                    .filter_map(|part| part.trim().parse::<u16>().ok())
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self {
            persistence_dir,
            local_persistence_enabled,
            provider_api_keys,
            http_ports,
        })
    }

    #[must_use]
    pub fn observations_path(&self) -> Option<PathBuf> {
        self.persistence_dir.as_ref().map(|dir| dir.join("observations.json"))
    }
}
