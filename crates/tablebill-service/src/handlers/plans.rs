//! Plan catalog handlers.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use tablebill_core::{CurrencyCode, Money, PlanId, PlanPricing};

use crate::auth::ServiceAuth;
use crate::state::AppState;

/// One plan's prices in one currency.
#[derive(Debug, Serialize)]
pub struct PlanPriceResponse {
    /// Currency code.
    pub currency: CurrencyCode,
    /// Monthly price in minor units.
    pub monthly_minor: i64,
    /// Yearly price in minor units.
    pub yearly_minor: i64,
    /// Monthly price formatted for display.
    pub monthly_formatted: String,
    /// Yearly price formatted for display.
    pub yearly_formatted: String,
    /// Whole-percent saving of yearly over twelve monthly payments.
    pub yearly_discount_percent: Option<u8>,
}

/// A plan in the catalog.
#[derive(Debug, Serialize)]
pub struct PlanResponse {
    /// Plan identifier.
    pub plan_id: PlanId,
    /// Display name.
    pub name: String,
    /// Prices per currency.
    pub prices: Vec<PlanPriceResponse>,
}

impl PlanResponse {
    fn new(plan_id: &PlanId, pricing: &PlanPricing) -> Self {
        let prices = pricing
            .prices
            .iter()
            .map(|(currency, price)| PlanPriceResponse {
                currency: *currency,
                monthly_minor: price.monthly_minor,
                yearly_minor: price.yearly_minor,
                monthly_formatted: Money::new(price.monthly_minor, *currency).to_string(),
                yearly_formatted: Money::new(price.yearly_minor, *currency).to_string(),
                yearly_discount_percent: price.yearly_discount_percent(),
            })
            .collect();

        Self {
            plan_id: plan_id.clone(),
            name: pricing.name.clone(),
            prices,
        }
    }
}

/// List plans response.
#[derive(Debug, Serialize)]
pub struct ListPlansResponse {
    /// Plans, ordered by plan ID.
    pub plans: Vec<PlanResponse>,
}

/// List the plan catalog.
pub async fn list_plans(
    State(state): State<Arc<AppState>>,
    _auth: ServiceAuth,
) -> Json<ListPlansResponse> {
    let plans = state
        .config
        .catalog
        .iter()
        .map(|(plan_id, pricing)| PlanResponse::new(plan_id, pricing))
        .collect();

    Json(ListPlansResponse { plans })
}
