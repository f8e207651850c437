//! Common test utilities for tablebill integration tests.

#![allow(dead_code)] // Some utilities are used by different test files

use std::sync::Arc;

use axum::Router;
use axum_test::TestServer;
use chrono::{DateTime, TimeZone, Utc};

use tablebill_core::{LookupPolicy, PlanCatalog, SubscriberId};
use tablebill_service::{create_router, AppState, FixedClock, ServiceConfig};
use tablebill_store::MemoryStore;

/// Test harness containing everything needed for integration tests.
pub struct TestHarness {
    /// The test server for making HTTP requests.
    pub server: TestServer,
    /// The service clock; tests move it to simulate time passing.
    pub clock: Arc<FixedClock>,
    /// A subscriber ID for subscription requests.
    pub subscriber_id: SubscriberId,
    /// The service API key for service-to-service requests.
    pub service_api_key: String,
}

/// 2025-01-01T00:00:00Z, where every harness clock starts.
pub fn jan_first() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap()
}

impl TestHarness {
    /// Create a new test harness with an empty store and the default catalog.
    pub fn new() -> Self {
        Self::with_policy(LookupPolicy::Strict)
    }

    /// Create a harness whose proration uses `policy`.
    pub fn with_policy(lookup_policy: LookupPolicy) -> Self {
        let service_api_key = "test-service-key".to_string();

        let config = ServiceConfig {
            listen_addr: "127.0.0.1:0".into(),
            service_api_key: Some(service_api_key.clone()),
            max_body_bytes: 1024 * 1024,
            catalog: PlanCatalog::default(),
            lookup_policy,
            ..ServiceConfig::default()
        };

        let clock = Arc::new(FixedClock::new(jan_first()));
        let state = AppState::with_clock(Arc::new(MemoryStore::new()), config, clock.clone());
        let router: Router = create_router(state);

        let server = TestServer::new(router).expect("Failed to create test server");

        Self {
            server,
            clock,
            subscriber_id: SubscriberId::generate(),
            service_api_key,
        }
    }

    /// Path of the harness subscriber's resource, plus `suffix`.
    pub fn subscription_path(&self, suffix: &str) -> String {
        format!("/v1/subscriptions/{}{suffix}", self.subscriber_id)
    }

    /// Activate the harness subscriber on `plan_id` (monthly, USD) at the
    /// current clock time.
    pub async fn activate(&self, plan_id: &str) -> serde_json::Value {
        let response = self
            .server
            .post("/v1/subscriptions")
            .add_header("x-api-key", self.service_api_key.clone())
            .json(&serde_json::json!({
                "subscriber_id": self.subscriber_id.to_string(),
                "plan_id": plan_id,
            }))
            .await;

        response.assert_status_ok();
        response.json()
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}
