//! Application state container
//!
//! This module defines the shared application state that is passed
//! to all request handlers via Axum's state extraction.

use crate::config::Settings;
use crate::metrics::MetricsRegistry;
use std::sync::Arc;
use std::time::Instant;

/// Shared application state
///
/// Holds the resources handlers and middleware need access to. Cheaply
/// cloneable (via Arc) and thread-safe.
#[derive(Clone)]
pub struct AppState {
    /// Application settings
    pub settings: Arc<Settings>,

    /// Request metrics registry, injected into the middleware chain
    pub metrics: Arc<MetricsRegistry>,

    /// Application start time (for uptime calculation)
    pub start_time: Instant,
}

impl AppState {
    /// Create a new application state
    pub fn new(settings: Settings) -> Self {
        Self {
            settings: Arc::new(settings),
            metrics: Arc::new(MetricsRegistry::new()),
            start_time: Instant::now(),
        }
    }

    /// Get the application uptime in seconds
    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_is_cheap_to_clone() {
        let state = AppState::new(Settings::default());
        let clone = state.clone();

        // Both clones share the same registry.
        state.metrics.increment("shared");
        assert_eq!(clone.metrics.snapshot().custom_counters["shared"], 1);
    }
}
