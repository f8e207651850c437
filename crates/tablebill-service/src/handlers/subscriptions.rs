//! Subscription lifecycle handlers.
//!
//! A subscription is the chain of periods stored for a subscriber. Every
//! mutation appends the next revision; the store rejects an append that does
//! not follow the latest revision, which turns concurrent plan changes into
//! a 409 for all but the first.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use tablebill_core::{
    BillingCycle, CurrencyCode, Money, PeriodId, PlanId, SubscriberId, SubscriptionPeriod,
};

use crate::auth::ServiceAuth;
use crate::error::ApiError;
use crate::handlers::proration::ProrationResponse;
use crate::handlers::{parse_currency, parse_cycle, parse_subscriber_id};
use crate::state::AppState;

/// A stored period with its list price.
#[derive(Debug, Serialize)]
pub struct PeriodResponse {
    /// The period.
    #[serde(flatten)]
    pub period: SubscriptionPeriod,
    /// Full-period price of the plan and cycle, if the catalog has one.
    pub price_minor: Option<i64>,
    /// `price_minor` formatted for display.
    pub price_formatted: Option<String>,
}

impl PeriodResponse {
    fn new(state: &AppState, period: SubscriptionPeriod) -> Self {
        let price_minor = state
            .config
            .catalog
            .price(&period.plan_id, period.currency, period.cycle)
            .ok();

        Self {
            price_formatted: price_minor.map(|p| Money::new(p, period.currency).to_string()),
            price_minor,
            period,
        }
    }
}

/// Activate subscription request.
#[derive(Debug, Deserialize)]
pub struct ActivateRequest {
    /// The subscriber (restaurant) ID.
    pub subscriber_id: String,
    /// Plan to subscribe to.
    pub plan_id: String,
    /// Billing cycle (default: monthly).
    #[serde(default)]
    pub cycle: Option<String>,
    /// Billing currency (default: USD).
    #[serde(default)]
    pub currency: Option<String>,
}

/// Activate a subscription, starting its first period now.
pub async fn activate_subscription(
    State(state): State<Arc<AppState>>,
    auth: ServiceAuth,
    Json(body): Json<ActivateRequest>,
) -> Result<Json<PeriodResponse>, ApiError> {
    let subscriber_id = parse_subscriber_id(&body.subscriber_id)?;
    let plan_id = PlanId::new(body.plan_id);
    let cycle = match body.cycle.as_deref() {
        Some(raw) => parse_cycle(raw)?,
        None => BillingCycle::Monthly,
    };
    let currency = match body.currency.as_deref() {
        Some(raw) => parse_currency(raw)?,
        None => CurrencyCode::USD,
    };

    // Subscribing always needs a real price, whatever the lookup policy
    state.config.catalog.price(&plan_id, currency, cycle)?;

    if state.store.current_period(&subscriber_id)?.is_some() {
        return Err(ApiError::Conflict(format!(
            "subscriber {subscriber_id} already has a subscription"
        )));
    }

    let now = state.clock.now();
    let period = SubscriptionPeriod::activate(subscriber_id, plan_id, cycle, currency, now);
    state.store.append_period(&period)?;

    tracing::info!(
        service = %auth.service_name,
        subscriber_id = %subscriber_id,
        plan_id = %period.plan_id,
        cycle = %period.cycle,
        currency = %period.currency,
        period_end = %period.end,
        "Subscription activated"
    );

    Ok(Json(PeriodResponse::new(&state, period)))
}

/// Get the subscriber's current period.
pub async fn get_subscription(
    State(state): State<Arc<AppState>>,
    _auth: ServiceAuth,
    Path(subscriber_id): Path<String>,
) -> Result<Json<PeriodResponse>, ApiError> {
    let subscriber_id = parse_subscriber_id(&subscriber_id)?;
    let period = current_period(&state, &subscriber_id)?;

    Ok(Json(PeriodResponse::new(&state, period)))
}

/// Period history query parameters.
#[derive(Debug, Deserialize)]
pub struct ListPeriodsQuery {
    /// Maximum number of periods to return (default: 50).
    #[serde(default = "default_limit")]
    pub limit: usize,
    /// Offset for pagination (default: 0).
    #[serde(default)]
    pub offset: usize,
}

fn default_limit() -> usize {
    50
}

/// Period history response.
#[derive(Debug, Serialize)]
pub struct ListPeriodsResponse {
    /// Periods (newest first).
    pub periods: Vec<SubscriptionPeriod>,
    /// Whether there are more periods.
    pub has_more: bool,
}

/// List the subscriber's period history.
pub async fn list_periods(
    State(state): State<Arc<AppState>>,
    _auth: ServiceAuth,
    Path(subscriber_id): Path<String>,
    Query(query): Query<ListPeriodsQuery>,
) -> Result<Json<ListPeriodsResponse>, ApiError> {
    let subscriber_id = parse_subscriber_id(&subscriber_id)?;
    current_period(&state, &subscriber_id)?;

    // Fetch one more than requested to determine has_more
    let limit = query.limit.min(100);
    let mut periods = state
        .store
        .list_periods(&subscriber_id, limit + 1, query.offset)?;

    let has_more = periods.len() > limit;
    periods.truncate(limit);

    Ok(Json(ListPeriodsResponse { periods, has_more }))
}

/// Plan change request.
#[derive(Debug, Deserialize)]
pub struct ChangePlanRequest {
    /// Plan to switch to.
    pub plan_id: String,
    /// Cycle to switch to (default: the current cycle).
    #[serde(default)]
    pub cycle: Option<String>,
}

/// Preview the proration of a plan change against the current period.
pub async fn preview_change(
    State(state): State<Arc<AppState>>,
    _auth: ServiceAuth,
    Path(subscriber_id): Path<String>,
    Json(body): Json<ChangePlanRequest>,
) -> Result<Json<ProrationResponse>, ApiError> {
    let subscriber_id = parse_subscriber_id(&subscriber_id)?;
    let current = current_period(&state, &subscriber_id)?;
    let now = state.clock.now();
    let (plan_id, cycle) = change_target(&state, &current, body, now)?;

    let result = state
        .calculator()
        .calculate(&current.proration_request(plan_id, cycle), now)?;

    Ok(Json(ProrationResponse::new(result, now)))
}

/// Plan change response.
#[derive(Debug, Serialize)]
pub struct ChangePlanResponse {
    /// The proration charged or credited for the change.
    pub proration: ProrationResponse,
    /// The period that was replaced.
    pub previous_period_id: PeriodId,
    /// The new current period.
    pub period: PeriodResponse,
}

/// Switch the subscriber to another plan or cycle now.
///
/// The new period keeps the current renewal boundary; the returned proration
/// is what the dashboard charges or credits today.
pub async fn change_plan(
    State(state): State<Arc<AppState>>,
    auth: ServiceAuth,
    Path(subscriber_id): Path<String>,
    Json(body): Json<ChangePlanRequest>,
) -> Result<Json<ChangePlanResponse>, ApiError> {
    let subscriber_id = parse_subscriber_id(&subscriber_id)?;
    let current = current_period(&state, &subscriber_id)?;
    let now = state.clock.now();
    let (plan_id, cycle) = change_target(&state, &current, body, now)?;

    if plan_id == current.plan_id && cycle == current.cycle {
        return Err(ApiError::Conflict(format!(
            "subscriber is already on {plan_id} ({cycle})"
        )));
    }

    let result = state
        .calculator()
        .calculate(&current.proration_request(plan_id.clone(), cycle), now)?;

    let next = current.change_plan(plan_id, cycle, now);
    state.store.append_period(&next)?;

    tracing::info!(
        service = %auth.service_name,
        subscriber_id = %subscriber_id,
        from_plan = %current.plan_id,
        to_plan = %next.plan_id,
        cycle = %next.cycle,
        revision = next.revision,
        amount = result.proration_amount,
        "Subscription plan changed"
    );

    Ok(Json(ChangePlanResponse {
        proration: ProrationResponse::new(result, now),
        previous_period_id: current.id,
        period: PeriodResponse::new(&state, next),
    }))
}

/// Start the next period once the current one has ended.
///
/// Each call advances by one period, so a subscriber several periods behind
/// is caught up by calling this repeatedly.
pub async fn renew_subscription(
    State(state): State<Arc<AppState>>,
    auth: ServiceAuth,
    Path(subscriber_id): Path<String>,
) -> Result<Json<PeriodResponse>, ApiError> {
    let subscriber_id = parse_subscriber_id(&subscriber_id)?;
    let current = current_period(&state, &subscriber_id)?;
    let now = state.clock.now();

    if !current.is_due_for_renewal(now) {
        return Err(ApiError::Conflict(format!(
            "current period runs until {}",
            current.end.to_rfc3339()
        )));
    }

    let next = current.renew(now);
    state.store.append_period(&next)?;

    tracing::info!(
        service = %auth.service_name,
        subscriber_id = %subscriber_id,
        plan_id = %next.plan_id,
        revision = next.revision,
        period_end = %next.end,
        "Subscription renewed"
    );

    Ok(Json(PeriodResponse::new(&state, next)))
}

fn current_period(
    state: &AppState,
    subscriber_id: &SubscriberId,
) -> Result<SubscriptionPeriod, ApiError> {
    state
        .store
        .current_period(subscriber_id)?
        .ok_or_else(|| ApiError::NotFound(format!("no subscription for {subscriber_id}")))
}

/// Resolve and check the plan and cycle a change request asks for.
fn change_target(
    state: &AppState,
    current: &SubscriptionPeriod,
    body: ChangePlanRequest,
    now: DateTime<Utc>,
) -> Result<(PlanId, BillingCycle), ApiError> {
    let plan_id = PlanId::new(body.plan_id);
    let cycle = match body.cycle.as_deref() {
        Some(raw) => parse_cycle(raw)?,
        None => current.cycle,
    };

    // The target plan must be sellable even when lookups are lenient
    state.config.catalog.price(&plan_id, current.currency, cycle)?;

    if current.is_due_for_renewal(now) {
        return Err(ApiError::Conflict(format!(
            "current period ended at {}, renew before changing plan",
            current.end.to_rfc3339()
        )));
    }

    Ok((plan_id, cycle))
}
