//! Application state.

use std::sync::Arc;

use tablebill_core::ProrationCalculator;
use tablebill_store::Store;

use crate::clock::{Clock, SystemClock};
use crate::config::ServiceConfig;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// The storage backend.
    pub store: Arc<dyn Store>,

    /// Service configuration.
    pub config: ServiceConfig,

    /// Source of "now" for proration and period changes.
    pub clock: Arc<dyn Clock>,
}

impl AppState {
    /// Create a new application state using the system clock.
    #[must_use]
    pub fn new(store: Arc<dyn Store>, config: ServiceConfig) -> Self {
        Self::with_clock(store, config, Arc::new(SystemClock))
    }

    /// Create a new application state with an explicit clock.
    #[must_use]
    pub fn with_clock(store: Arc<dyn Store>, config: ServiceConfig, clock: Arc<dyn Clock>) -> Self {
        tracing::info!(
            plans = config.catalog.len(),
            lookup_policy = ?config.lookup_policy,
            "Billing state initialised"
        );

        if config.service_api_key.is_none() {
            tracing::warn!("SERVICE_API_KEY not configured - all /v1 requests will be rejected");
        }

        Self {
            store,
            config,
            clock,
        }
    }

    /// A proration calculator over the configured catalog and policy.
    #[must_use]
    pub fn calculator(&self) -> ProrationCalculator<'_> {
        ProrationCalculator::new(&self.config.catalog).with_policy(self.config.lookup_policy)
    }
}
