//! Request and response types for the tablebill client.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use tablebill_core::{
    BillingCycle, CurrencyCode, Money, PeriodId, PlanId, ProrationResult, SubscriberId,
    SubscriptionPeriod,
};

/// One plan's prices in one currency.
#[derive(Debug, Clone, Deserialize)]
pub struct PlanPriceInfo {
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

/// A plan in the service's catalog.
#[derive(Debug, Clone, Deserialize)]
pub struct PlanInfo {
    /// Plan identifier.
    pub plan_id: PlanId,
    /// Display name.
    pub name: String,
    /// Prices per currency.
    pub prices: Vec<PlanPriceInfo>,
}

impl PlanInfo {
    /// The plan's prices in `currency`, if it is sold in it.
    #[must_use]
    pub fn price_in(&self, currency: CurrencyCode) -> Option<&PlanPriceInfo> {
        self.prices.iter().find(|p| p.currency == currency)
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct ListPlansResponse {
    pub plans: Vec<PlanInfo>,
}

/// Stateless proration preview request.
#[derive(Debug, Clone, Serialize)]
pub struct ProrationPreviewRequest {
    /// Plan the subscriber is on.
    pub current_plan: PlanId,
    /// Plan the subscriber wants.
    pub new_plan: PlanId,
    /// Cycle the subscriber is on.
    pub current_cycle: BillingCycle,
    /// Cycle the subscriber wants (default: `current_cycle`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_cycle: Option<BillingCycle>,
    /// Billing currency.
    pub currency: CurrencyCode,
    /// Start of the current period.
    pub period_start: DateTime<Utc>,
    /// End of the current period.
    pub period_end: DateTime<Utc>,
    /// Instant to prorate at (default: the service's clock).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub now: Option<DateTime<Utc>>,
}

/// A proration calculated by the service.
#[derive(Debug, Clone, Deserialize)]
pub struct Proration {
    /// The calculation.
    #[serde(flatten)]
    pub result: ProrationResult,
    /// Net amount formatted for display.
    pub amount_formatted: String,
    /// The instant the proration was calculated at.
    pub calculated_at: DateTime<Utc>,
}

impl Proration {
    /// The net amount: positive is charged today, negative is credited.
    #[must_use]
    pub fn amount(&self) -> Money {
        self.result.amount()
    }
}

/// Subscription activation request.
#[derive(Debug, Clone, Serialize)]
pub struct ActivateSubscriptionRequest {
    /// The subscriber (restaurant) ID.
    pub subscriber_id: SubscriberId,
    /// Plan to subscribe to.
    pub plan_id: PlanId,
    /// Billing cycle (default: monthly).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cycle: Option<BillingCycle>,
    /// Billing currency (default: USD).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency: Option<CurrencyCode>,
}

/// A stored subscription period with its list price.
#[derive(Debug, Clone, Deserialize)]
pub struct Period {
    /// The period.
    #[serde(flatten)]
    pub period: SubscriptionPeriod,
    /// Full-period price of the plan and cycle, if the catalog has one.
    pub price_minor: Option<i64>,
    /// `price_minor` formatted for display.
    pub price_formatted: Option<String>,
}

/// A page of a subscriber's period history.
#[derive(Debug, Clone, Deserialize)]
pub struct PeriodPage {
    /// Periods (newest first).
    pub periods: Vec<SubscriptionPeriod>,
    /// Whether there are more periods.
    pub has_more: bool,
}

/// Plan change request.
#[derive(Debug, Clone, Serialize)]
pub struct ChangePlanRequest {
    /// Plan to switch to.
    pub plan_id: PlanId,
    /// Cycle to switch to (default: the current cycle).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cycle: Option<BillingCycle>,
}

impl ChangePlanRequest {
    /// Switch to `plan_id`, keeping the current cycle.
    #[must_use]
    pub fn to_plan(plan_id: impl Into<PlanId>) -> Self {
        Self {
            plan_id: plan_id.into(),
            cycle: None,
        }
    }

    /// Also switch the billing cycle.
    #[must_use]
    pub fn with_cycle(mut self, cycle: BillingCycle) -> Self {
        self.cycle = Some(cycle);
        self
    }
}

/// Outcome of a plan change.
#[derive(Debug, Clone, Deserialize)]
pub struct PlanChange {
    /// The amount charged or credited for the change.
    pub proration: Proration,
    /// The period that was replaced.
    pub previous_period_id: PeriodId,
    /// The new current period.
    pub period: Period,
}

/// API error response body.
#[derive(Debug, Deserialize)]
pub(crate) struct ApiErrorResponse {
    pub error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiErrorBody {
    pub code: String,
    pub message: String,
    #[serde(default)]
    pub details: Option<serde_json::Value>,
}
