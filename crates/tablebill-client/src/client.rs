//! Tablebill HTTP client implementation.

use reqwest::{Client, RequestBuilder};
use std::time::Duration;

use tablebill_core::SubscriberId;

use crate::error::ClientError;
use crate::types::{
    ActivateSubscriptionRequest, ApiErrorResponse, ChangePlanRequest, ListPlansResponse, Period,
    PeriodPage, PlanChange, PlanInfo, Proration, ProrationPreviewRequest,
};

/// Tablebill API client.
///
/// Provides methods for previewing prorations and managing subscriptions.
#[derive(Debug, Clone)]
pub struct TablebillClient {
    client: Client,
    base_url: String,
    api_key: String,
    service_name: String,
}

impl TablebillClient {
    /// Create a new tablebill client.
    ///
    /// # Arguments
    ///
    /// * `base_url` - Base URL of the tablebill service (e.g., `"http://tablebill:8080"`)
    /// * `api_key` - Service API key for authentication
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Configuration` if the HTTP client cannot be built.
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Result<Self, ClientError> {
        Self::with_options(base_url, api_key, ClientOptions::default())
    }

    /// Create a new tablebill client with custom options.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Configuration` if the HTTP client cannot be built.
    pub fn with_options(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        options: ClientOptions,
    ) -> Result<Self, ClientError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(options.timeout_seconds))
            .build()
            .map_err(|e| ClientError::Configuration(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            service_name: options.service_name,
        })
    }

    /// List the plan catalog.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server returns an error.
    pub async fn list_plans(&self) -> Result<Vec<PlanInfo>, ClientError> {
        let url = format!("{}/v1/plans", self.base_url);
        let response: ListPlansResponse = self.send(self.client.get(&url)).await?;
        Ok(response.plans)
    }

    /// Calculate a proration for an explicit period without touching any
    /// subscription.
    ///
    /// # Errors
    ///
    /// Returns `UnknownPlan`, `UnknownCurrency` or `InvalidPeriod` when the
    /// service rejects the request, or another error if the request fails.
    pub async fn preview_proration(
        &self,
        request: &ProrationPreviewRequest,
    ) -> Result<Proration, ClientError> {
        let url = format!("{}/v1/proration/preview", self.base_url);
        self.send(self.client.post(&url).json(request)).await
    }

    /// Activate a subscription, starting its first period now.
    ///
    /// # Errors
    ///
    /// Returns `Conflict` if the subscriber already has a subscription, or
    /// another error if the request fails.
    pub async fn activate_subscription(
        &self,
        request: &ActivateSubscriptionRequest,
    ) -> Result<Period, ClientError> {
        let url = format!("{}/v1/subscriptions", self.base_url);
        self.send(self.client.post(&url).json(request)).await
    }

    /// Get the subscriber's current period.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the subscriber has no subscription, or another
    /// error if the request fails.
    pub async fn get_subscription(&self, subscriber_id: &SubscriberId) -> Result<Period, ClientError> {
        let url = self.subscription_url(subscriber_id, "");
        self.send(self.client.get(&url)).await
    }

    /// List the subscriber's periods, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server returns an error.
    pub async fn list_periods(
        &self,
        subscriber_id: &SubscriberId,
        limit: usize,
        offset: usize,
    ) -> Result<PeriodPage, ClientError> {
        let url = self.subscription_url(subscriber_id, "/periods");
        let request = self
            .client
            .get(&url)
            .query(&[("limit", limit), ("offset", offset)]);
        self.send(request).await
    }

    /// Preview what a plan change would charge or credit right now.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server returns an error.
    pub async fn preview_change(
        &self,
        subscriber_id: &SubscriberId,
        request: &ChangePlanRequest,
    ) -> Result<Proration, ClientError> {
        let url = self.subscription_url(subscriber_id, "/change/preview");
        self.send(self.client.post(&url).json(request)).await
    }

    /// Change the subscriber's plan or cycle now.
    ///
    /// # Errors
    ///
    /// Returns `Conflict` for a no-op change, a change after the period has
    /// ended, or a concurrent change; another error if the request fails.
    pub async fn change_plan(
        &self,
        subscriber_id: &SubscriberId,
        request: &ChangePlanRequest,
    ) -> Result<PlanChange, ClientError> {
        let url = self.subscription_url(subscriber_id, "/change");
        self.send(self.client.post(&url).json(request)).await
    }

    /// Start the subscriber's next period.
    ///
    /// # Errors
    ///
    /// Returns `Conflict` if the current period has not ended yet, or another
    /// error if the request fails.
    pub async fn renew(&self, subscriber_id: &SubscriberId) -> Result<Period, ClientError> {
        let url = self.subscription_url(subscriber_id, "/renew");
        self.send(self.client.post(&url)).await
    }

    fn subscription_url(&self, subscriber_id: &SubscriberId, suffix: &str) -> String {
        format!("{}/v1/subscriptions/{subscriber_id}{suffix}", self.base_url)
    }

    /// Authenticate, send, and decode a request.
    async fn send<T: serde::de::DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<T, ClientError> {
        let response = request
            .header("x-api-key", &self.api_key)
            .header("x-service-name", &self.service_name)
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// Handle API response and convert errors.
    async fn handle_response<T: serde::de::DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, ClientError> {
        let status = response.status();

        if status.is_success() {
            let body = response.bytes().await?;
            return Ok(serde_json::from_slice(&body)?);
        }

        // Try to parse error response
        let error_body: Result<ApiErrorResponse, _> = response.json().await;

        match error_body {
            Ok(api_error) => {
                let code = api_error.error.code.as_str();
                let message = api_error.error.message;
                let detail = |key: &str| {
                    api_error
                        .error
                        .details
                        .as_ref()
                        .and_then(|d| d.get(key))
                        .and_then(serde_json::Value::as_str)
                        .unwrap_or_default()
                        .to_string()
                };

                tracing::debug!(status = %status, code = %code, "tablebill request rejected");

                // Map specific error codes to typed errors
                match code {
                    "unknown_plan" => Err(ClientError::UnknownPlan {
                        plan_id: detail("plan_id"),
                    }),
                    "unknown_currency" => Err(ClientError::UnknownCurrency {
                        plan_id: detail("plan_id"),
                        currency: detail("currency"),
                    }),
                    "invalid_period" => Err(ClientError::InvalidPeriod { message }),
                    "not_found" => Err(ClientError::NotFound { message }),
                    "conflict" => Err(ClientError::Conflict { message }),
                    "unauthorized" => Err(ClientError::Unauthorized),
                    _ => Err(ClientError::Api {
                        code: code.to_string(),
                        message,
                        status: status.as_u16(),
                    }),
                }
            }
            Err(_) => Err(ClientError::Api {
                code: "unknown".to_string(),
                message: format!("HTTP {status}"),
                status: status.as_u16(),
            }),
        }
    }
}

/// Client options for customization.
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// Request timeout in seconds (default: 30).
    pub timeout_seconds: u64,
    /// Service name to include in requests.
    pub service_name: String,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            timeout_seconds: 30,
            service_name: "unknown".to_string(),
        }
    }
}

impl ClientOptions {
    /// Create options with a service name.
    #[must_use]
    pub fn with_service_name(name: impl Into<String>) -> Self {
        Self {
            service_name: name.into(),
            ..Self::default()
        }
    }
}
