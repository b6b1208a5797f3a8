use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Result};

use super::backend::DetectorBackend;

/// Thread-safe registry of detector backends.
///
/// Backends are wrapped in `Mutex` because `DetectorBackend::detect` takes
/// `&mut self`. The registry selects an accelerated backend opportunistically
/// and falls back to the first registered backend; the selection changes
/// latency, never output values.
pub struct BackendRegistry {
    backends: Vec<Arc<Mutex<dyn DetectorBackend>>>,
}

impl BackendRegistry {
    pub fn new() -> Self {
        Self {
            backends: Vec::new(),
        }
    }

    /// Register a backend. The first registered backend is the default
    /// fallback when no accelerated backend is available.
    pub fn register<B: DetectorBackend + 'static>(&mut self, backend: B) {
        self.backends.push(Arc::new(Mutex::new(backend)));
    }

    /// List registered backend names.
    pub fn list(&self) -> Vec<&'static str> {
        self.backends
            .iter()
            .filter_map(|b| b.lock().ok().map(|guard| guard.name()))
            .collect()
    }

    /// Select the backend to run on: accelerated when one is registered,
    /// otherwise the default.
    pub fn select(&self) -> Result<Arc<Mutex<dyn DetectorBackend>>> {
        for backend in &self.backends {
            let accelerated = {
                let guard = backend
                    .lock()
                    .map_err(|_| anyhow!("detector backend lock poisoned"))?;
                guard.accelerated()
            };
            if accelerated {
                return Ok(backend.clone());
            }
        }
        self.backends
            .first()
            .cloned()
            .ok_or_else(|| anyhow!("no detector backend registered"))
    }
}

impl Default for BackendRegistry {
    fn default() -> Self {
        Self::new()
    }
}
