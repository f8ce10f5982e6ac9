//! Structured error kinds surfaced by the engine. Library code returns
//! `Result<T, EngineError>`; only the demo binary flattens into `anyhow`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("insufficient data: {reason}")]
    InsufficientData { reason: String },

    #[error("upstream {provider} omitted required field {field}")]
    MissingField { provider: String, field: String },

    #[error("upstream {provider} request failed: {source}")]
    UpstreamTransient {
        provider: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("no forecast adapter registered for provider tag {tag:?}")]
    InvalidProvider { tag: String },

    #[error("configuration error: {detail}")]
    Configuration { detail: String },
}

impl EngineError {
    #[must_use]
    pub fn insufficient_data(reason: impl Into<String>) -> Self {
        Self::InsufficientData {
            reason: reason.into(),
        }
    }

    #[must_use]
    pub fn upstream_transient(provider: impl Into<String>, source: anyhow::Error) -> Self {
        Self::UpstreamTransient {
            provider: provider.into(),
            source,
        }
    }

    /// HTTP status an eventual transport layer would map this to, per
    /// the decision endpoint's documented behavior: 5xx for
    /// `InsufficientData` at cold start, 4xx for `InvalidProvider`, 5xx
    /// otherwise.
    #[must_use]
    pub const fn http_status(&self) -> u16 {
        match self {
            Self::InsufficientData { .. } => 503,
            Self::InvalidProvider { .. } => 400,
            Self::MissingField { .. } | Self::UpstreamTransient { .. } | Self::Configuration { .. } => 500,
        }
    }
}

pub type EngineResult<T> = Result<T, EngineError>;
