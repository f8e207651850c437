//! Stateless proration preview.
//!
//! Lets the dashboard show "you will be charged X today" for an arbitrary
//! period without a stored subscription.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use tablebill_core::{PlanId, ProrationRequest, ProrationResult};

use crate::auth::ServiceAuth;
use crate::error::ApiError;
use crate::handlers::{parse_currency, parse_cycle};
use crate::state::AppState;

/// Proration preview request.
#[derive(Debug, Deserialize)]
pub struct PreviewProrationRequest {
    /// Plan the subscriber is on.
    pub current_plan: String,
    /// Plan the subscriber wants.
    pub new_plan: String,
    /// Cycle the subscriber is on (default: monthly).
    #[serde(default = "default_cycle")]
    pub current_cycle: String,
    /// Cycle the subscriber wants (default: the current cycle).
    #[serde(default)]
    pub new_cycle: Option<String>,
    /// Billing currency.
    pub currency: String,
    /// Start of the current period.
    pub period_start: DateTime<Utc>,
    /// End of the current period.
    pub period_end: DateTime<Utc>,
    /// Instant to prorate at (default: the service clock).
    #[serde(default)]
    pub now: Option<DateTime<Utc>>,
}

fn default_cycle() -> String {
    "monthly".to_string()
}

/// Proration result with display formatting.
#[derive(Debug, Serialize)]
pub struct ProrationResponse {
    /// The calculation.
    #[serde(flatten)]
    pub result: ProrationResult,
    /// Net amount formatted for display, e.g. `"-$14.50"`.
    pub amount_formatted: String,
    /// The instant the proration was calculated at.
    pub calculated_at: DateTime<Utc>,
}

impl ProrationResponse {
    /// Wrap a calculation made at `calculated_at`.
    #[must_use]
    pub fn new(result: ProrationResult, calculated_at: DateTime<Utc>) -> Self {
        Self {
            amount_formatted: result.amount().to_string(),
            result,
            calculated_at,
        }
    }
}

/// Preview a plan change for an explicit period.
pub async fn preview_proration(
    State(state): State<Arc<AppState>>,
    auth: ServiceAuth,
    Json(body): Json<PreviewProrationRequest>,
) -> Result<Json<ProrationResponse>, ApiError> {
    let current_cycle = parse_cycle(&body.current_cycle)?;
    let new_cycle = match body.new_cycle.as_deref() {
        Some(raw) => parse_cycle(raw)?,
        None => current_cycle,
    };

    let request = ProrationRequest {
        current_plan: PlanId::new(body.current_plan),
        new_plan: PlanId::new(body.new_plan),
        current_cycle,
        new_cycle,
        currency: parse_currency(&body.currency)?,
        period_start: body.period_start,
        period_end: body.period_end,
    };
    let now = body.now.unwrap_or_else(|| state.clock.now());

    let result = state.calculator().calculate(&request, now)?;

    tracing::debug!(
        service = %auth.service_name,
        current_plan = %request.current_plan,
        new_plan = %request.new_plan,
        amount = result.proration_amount,
        "Proration previewed"
    );

    Ok(Json(ProrationResponse::new(result, now)))
}
