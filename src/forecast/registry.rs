//! Table-driven registry keyed by provider tag, per spec.md §9's explicit
//! preference over a switch at the composition site.

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::EngineError;
use crate::forecast::ForecastAdapter;

#[derive(Clone, Default)]
pub struct AdapterRegistry {
    adapters: HashMap<&'static str, Arc<dyn ForecastAdapter>>,
}

impl AdapterRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, adapter: Arc<dyn ForecastAdapter>) {
        self.adapters.insert(adapter.tag(), adapter);
    }

    pub fn resolve(&self, tag: &str) -> Result<Arc<dyn ForecastAdapter>, EngineError> {
        self.adapters
            .get(tag)
            .cloned()
            .ok_or_else(|| EngineError::InvalidProvider { tag: tag.to_string() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forecast::stub::StubAdapter;

    #[test]
    fn resolve_returns_invalid_provider_for_unknown_tag() {
        let registry = AdapterRegistry::new();
        let result = registry.resolve("does-not-exist");
        assert!(matches!(result, Err(EngineError::InvalidProvider { .. })));
    }

    #[test]
    fn resolve_finds_registered_adapter_by_tag() {
        let mut registry = AdapterRegistry::new();
        registry.register(Arc::new(StubAdapter::new("test-provider", Vec::new())));
        let adapter = registry.resolve("test-provider").expect("adapter");
        assert_eq!(adapter.tag(), "test-provider");
    }
}
