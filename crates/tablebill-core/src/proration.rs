//! Proration of plan and billing-cycle changes.
//!
//! When a subscriber switches plan (or cycle) part-way through a billing
//! period, they are credited the unused share of the current plan and charged
//! the same share of the new plan. The next full-price charge happens at the
//! end of the current period, which stays the renewal boundary.
//!
//! ```text
//! remaining_fraction = (period_end - now) / (period_end - period_start)   in [0, 1]
//! unused_credit      = current_plan_price * remaining_fraction
//! new_plan_cost      = new_plan_price     * remaining_fraction
//! proration_amount   = new_plan_cost - unused_credit
//! ```
//!
//! Amounts are integer minor units. Scaling by the remaining fraction is done
//! in exact integer arithmetic on milliseconds and rounded half away from zero
//! once, on the net difference, so that swapping the two plans negates the
//! amount exactly.
//!
//! The calculator is pure: the catalog and the current time are parameters.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::currency::{CurrencyCode, Money};
use crate::error::{BillingError, Result};
use crate::plan::{BillingCycle, PlanCatalog, PlanId};

/// What to do when a plan or currency is missing from the catalog.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LookupPolicy {
    /// Fail with `UnknownPlan` / `UnknownCurrency`.
    #[default]
    Strict,
    /// Treat the missing price as zero (legacy dashboard behaviour).
    ZeroPriceFallback,
}

/// Input to a proration calculation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProrationRequest {
    /// Plan the subscriber is on.
    pub current_plan: PlanId,
    /// Plan the subscriber wants.
    pub new_plan: PlanId,
    /// Cycle the subscriber is on.
    pub current_cycle: BillingCycle,
    /// Cycle the subscriber wants.
    pub new_cycle: BillingCycle,
    /// Currency used to pick prices from the catalog.
    pub currency: CurrencyCode,
    /// Start of the current billing period.
    pub period_start: DateTime<Utc>,
    /// End of the current billing period.
    pub period_end: DateTime<Utc>,
}

/// Outcome of a proration calculation. All amounts are in minor units of
/// `currency`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProrationResult {
    /// Currency of every amount below.
    pub currency: CurrencyCode,
    /// Full-period price of the current plan and cycle.
    pub current_plan_price: i64,
    /// Full-period price of the new plan and cycle.
    pub new_plan_price: i64,
    /// Value of the current plan's unused time.
    pub unused_credit: i64,
    /// Cost of the new plan for the remaining time.
    pub new_plan_cost: i64,
    /// Net amount: positive is charged today, negative is credited.
    pub proration_amount: i64,
    /// Share of the period still ahead, in `[0, 1]`.
    pub remaining_fraction: f64,
    /// The change costs more for the remaining period.
    pub is_upgrade: bool,
    /// The change costs less for the remaining period.
    pub is_downgrade: bool,
    /// Explanation suitable for showing to the subscriber.
    pub message: String,
}

impl ProrationResult {
    /// The net amount as money.
    #[must_use]
    pub fn amount(&self) -> Money {
        Money::new(self.proration_amount, self.currency)
    }
}

/// Computes prorated charges against a plan catalog.
#[derive(Debug, Clone, Copy)]
pub struct ProrationCalculator<'a> {
    catalog: &'a PlanCatalog,
    policy: LookupPolicy,
}

impl<'a> ProrationCalculator<'a> {
    /// Create a calculator with the strict lookup policy.
    #[must_use]
    pub fn new(catalog: &'a PlanCatalog) -> Self {
        Self {
            catalog,
            policy: LookupPolicy::default(),
        }
    }

    /// Set the lookup policy.
    #[must_use]
    pub fn with_policy(mut self, policy: LookupPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// The lookup policy in use.
    #[must_use]
    pub fn policy(&self) -> LookupPolicy {
        self.policy
    }

    /// Calculate the proration for `request` as of `now`.
    ///
    /// `now` is clamped into the period, so a change requested before the
    /// period starts prorates the whole period and one requested after it ends
    /// prorates nothing.
    ///
    /// # Errors
    ///
    /// - `BillingError::InvalidPeriod` if `period_end <= period_start`.
    /// - `BillingError::UnknownPlan` / `BillingError::UnknownCurrency` under
    ///   [`LookupPolicy::Strict`] when a price is missing.
    #[allow(clippy::cast_precision_loss)]
    pub fn calculate(
        &self,
        request: &ProrationRequest,
        now: DateTime<Utc>,
    ) -> Result<ProrationResult> {
        // An empty or inverted period is rejected under every lookup policy
        // instead of being given a minimum length.
        if request.period_end <= request.period_start {
            return Err(BillingError::InvalidPeriod {
                start: request.period_start,
                end: request.period_end,
            });
        }

        let current_plan_price =
            self.lookup(&request.current_plan, request.currency, request.current_cycle)?;
        let new_plan_price = self.lookup(&request.new_plan, request.currency, request.new_cycle)?;

        // Sub-millisecond periods still count as one unit.
        let total = (request.period_end - request.period_start)
            .num_milliseconds()
            .max(1);
        let elapsed = (now - request.period_start)
            .num_milliseconds()
            .clamp(0, total);
        let remaining = total - elapsed;

        let unused_credit = scale_rounded(i128::from(current_plan_price), remaining, total);
        let new_plan_cost = scale_rounded(i128::from(new_plan_price), remaining, total);
        let proration_amount = scale_rounded(
            i128::from(new_plan_price) - i128::from(current_plan_price),
            remaining,
            total,
        );

        Ok(ProrationResult {
            currency: request.currency,
            current_plan_price,
            new_plan_price,
            unused_credit,
            new_plan_cost,
            proration_amount,
            remaining_fraction: remaining as f64 / total as f64,
            is_upgrade: proration_amount > 0,
            is_downgrade: proration_amount < 0,
            message: proration_message(Money::new(proration_amount, request.currency)),
        })
    }

    fn lookup(&self, plan_id: &PlanId, currency: CurrencyCode, cycle: BillingCycle) -> Result<i64> {
        match (self.catalog.price(plan_id, currency, cycle), self.policy) {
            (Ok(price), _) => Ok(price),
            (
                Err(BillingError::UnknownPlan { .. } | BillingError::UnknownCurrency { .. }),
                LookupPolicy::ZeroPriceFallback,
            ) => Ok(0),
            (Err(e), _) => Err(e),
        }
    }
}

/// Calculate a proration with the strict lookup policy.
///
/// # Errors
///
/// See [`ProrationCalculator::calculate`].
pub fn calculate_proration(
    catalog: &PlanCatalog,
    request: &ProrationRequest,
    now: DateTime<Utc>,
) -> Result<ProrationResult> {
    ProrationCalculator::new(catalog).calculate(request, now)
}

/// The subscriber-facing explanation for a net proration amount.
#[must_use]
pub fn proration_message(amount: Money) -> String {
    match amount.amount_minor.signum() {
        1 => format!(
            "You will be charged {amount} today for the upgrade, covering the rest of your current billing period."
        ),
        -1 => format!(
            "You will receive a credit of {} applied to your account for the unused portion of your current plan.",
            amount.abs()
        ),
        _ => "No additional charge. The new plan costs the same for your remaining billing period."
            .to_string(),
    }
}

/// `amount * numerator / denominator`, rounded half away from zero.
///
/// Requires `0 <= numerator <= denominator` and `denominator > 0`.
fn scale_rounded(amount: i128, numerator: i64, denominator: i64) -> i64 {
    let numerator = i128::from(numerator);
    let denominator = i128::from(denominator);

    let product = amount.saturating_mul(numerator);
    let mut quotient = product / denominator;
    let remainder = product % denominator;
    if remainder.abs() * 2 >= denominator {
        quotient += product.signum();
    }

    i64::try_from(quotient).unwrap_or(if quotient < 0 { i64::MIN } else { i64::MAX })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::{PlanPrice, PlanPricing};
    use chrono::{Duration, TimeZone};
    use std::collections::BTreeMap;

    fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
    }

    /// 30-day period starting 2025-01-01.
    fn request(current: &str, new: &str, cycle: BillingCycle) -> ProrationRequest {
        ProrationRequest {
            current_plan: PlanId::new(current),
            new_plan: PlanId::new(new),
            current_cycle: cycle,
            new_cycle: cycle,
            currency: CurrencyCode::USD,
            period_start: at(2025, 1, 1),
            period_end: at(2025, 1, 31),
        }
    }

    fn sample_times(req: &ProrationRequest) -> Vec<DateTime<Utc>> {
        let total = req.period_end - req.period_start;
        vec![
            req.period_start,
            req.period_start + Duration::hours(1),
            req.period_start + total / 3,
            req.period_start + total / 2,
            req.period_end - Duration::seconds(1),
            req.period_end,
        ]
    }

    #[test]
    fn upgrade_half_way_through_month() {
        let catalog = PlanCatalog::default();
        let req = request("starter", "pro", BillingCycle::Monthly);

        let result = calculate_proration(&catalog, &req, at(2025, 1, 16)).unwrap();

        assert!((result.remaining_fraction - 0.5).abs() < f64::EPSILON);
        assert_eq!(result.current_plan_price, 2900);
        assert_eq!(result.new_plan_price, 7900);
        assert_eq!(result.unused_credit, 1450);
        assert_eq!(result.new_plan_cost, 3950);
        assert_eq!(result.proration_amount, 2500);
        assert!(result.is_upgrade);
        assert!(!result.is_downgrade);
        assert_eq!(
            result.message,
            "You will be charged $25.00 today for the upgrade, covering the rest of your current billing period."
        );
    }

    #[test]
    fn downgrade_half_way_through_month() {
        let catalog = PlanCatalog::default();
        let req = request("pro", "starter", BillingCycle::Monthly);

        let result = calculate_proration(&catalog, &req, at(2025, 1, 16)).unwrap();

        assert_eq!(result.proration_amount, -2500);
        assert!(result.is_downgrade);
        assert!(!result.is_upgrade);
        assert_eq!(
            result.message,
            "You will receive a credit of $25.00 applied to your account for the unused portion of your current plan."
        );
    }

    #[test]
    fn same_plan_and_cycle_is_free_at_any_time() {
        let catalog = PlanCatalog::default();
        for plan in ["starter", "pro", "elite"] {
            for cycle in [BillingCycle::Monthly, BillingCycle::Yearly] {
                let req = request(plan, plan, cycle);
                for now in sample_times(&req) {
                    let result = calculate_proration(&catalog, &req, now).unwrap();
                    assert_eq!(result.proration_amount, 0);
                    assert!(!result.is_upgrade);
                    assert!(!result.is_downgrade);
                    assert_eq!(
                        result.message,
                        "No additional charge. The new plan costs the same for your remaining billing period."
                    );
                }
            }
        }
    }

    #[test]
    fn change_at_period_start_costs_full_difference() {
        let catalog = PlanCatalog::default();
        let req = request("starter", "elite", BillingCycle::Monthly);

        let result = calculate_proration(&catalog, &req, req.period_start).unwrap();

        assert!((result.remaining_fraction - 1.0).abs() < f64::EPSILON);
        assert_eq!(result.proration_amount, 14_900 - 2900);
    }

    #[test]
    fn change_at_period_end_costs_nothing() {
        let catalog = PlanCatalog::default();
        let req = request("starter", "elite", BillingCycle::Monthly);

        let result = calculate_proration(&catalog, &req, req.period_end).unwrap();

        assert_eq!(result.remaining_fraction, 0.0);
        assert_eq!(result.proration_amount, 0);
        assert_eq!(result.unused_credit, 0);
        assert_eq!(result.new_plan_cost, 0);
        assert!(!result.is_upgrade && !result.is_downgrade);
    }

    #[test]
    fn now_outside_period_is_clamped() {
        let catalog = PlanCatalog::default();
        let req = request("starter", "pro", BillingCycle::Monthly);

        let early = calculate_proration(&catalog, &req, at(2024, 12, 1)).unwrap();
        assert_eq!(early.proration_amount, 5000);

        let late = calculate_proration(&catalog, &req, at(2025, 3, 1)).unwrap();
        assert_eq!(late.proration_amount, 0);
    }

    #[test]
    fn more_expensive_plan_is_an_upgrade_while_time_remains() {
        let catalog = PlanCatalog::default();
        let req = request("pro", "elite", BillingCycle::Yearly);
        for now in sample_times(&req) {
            // Too little time left to be worth a whole cent.
            if now >= req.period_end - Duration::minutes(1) {
                continue;
            }
            let result = calculate_proration(&catalog, &req, now).unwrap();
            assert!(result.proration_amount > 0, "at {now}");
            assert!(result.is_upgrade);
        }
    }

    #[test]
    fn swapping_plans_negates_amount() {
        let catalog = PlanCatalog::default();
        let pairs = [("starter", "pro"), ("pro", "elite"), ("starter", "elite")];
        for (a, b) in pairs {
            let forward = request(a, b, BillingCycle::Monthly);
            let backward = request(b, a, BillingCycle::Monthly);
            for now in sample_times(&forward) {
                let f = calculate_proration(&catalog, &forward, now).unwrap();
                let r = calculate_proration(&catalog, &backward, now).unwrap();
                assert_eq!(f.proration_amount, -r.proration_amount, "{a}->{b} at {now}");
                assert_eq!(f.is_upgrade, r.is_downgrade);
                assert_eq!(f.is_downgrade, r.is_upgrade);
            }
        }
    }

    #[test]
    fn monthly_to_yearly_prices_each_side_by_its_cycle() {
        let catalog = PlanCatalog::default();
        let mut req = request("pro", "pro", BillingCycle::Monthly);
        req.new_cycle = BillingCycle::Yearly;

        let result = calculate_proration(&catalog, &req, at(2025, 1, 16)).unwrap();

        assert_eq!(result.current_plan_price, 7900);
        assert_eq!(result.new_plan_price, 79_000);
        assert_eq!(result.proration_amount, (79_000 - 7900) / 2);
        assert!(result.is_upgrade);
    }

    #[test]
    fn odd_fraction_rounds_half_away_from_zero() {
        let catalog = PlanCatalog::empty()
            .with_plan("a", priced(1))
            .with_plan("b", priced(2));
        let mut req = request("a", "b", BillingCycle::Monthly);
        req.period_end = req.period_start + Duration::milliseconds(2);
        let now = req.period_start + Duration::milliseconds(1);

        let up = calculate_proration(&catalog, &req, now).unwrap();
        assert_eq!(up.proration_amount, 1);

        let mut reverse = req.clone();
        std::mem::swap(&mut reverse.current_plan, &mut reverse.new_plan);
        let down = calculate_proration(&catalog, &reverse, now).unwrap();
        assert_eq!(down.proration_amount, -1);
    }

    #[test]
    fn zero_decimal_currency_rounds_to_whole_units() {
        let mut prices = BTreeMap::new();
        prices.insert(
            CurrencyCode::JPY,
            PlanPrice {
                monthly_minor: 1000,
                yearly_minor: 10_000,
            },
        );
        let mut pro_prices = prices.clone();
        pro_prices.insert(
            CurrencyCode::JPY,
            PlanPrice {
                monthly_minor: 3001,
                yearly_minor: 30_000,
            },
        );
        let catalog = PlanCatalog::empty()
            .with_plan("starter", PlanPricing { name: "Starter".into(), prices })
            .with_plan("pro", PlanPricing { name: "Pro".into(), prices: pro_prices });

        let mut req = request("starter", "pro", BillingCycle::Monthly);
        req.currency = CurrencyCode::JPY;

        let result = calculate_proration(&catalog, &req, at(2025, 1, 16)).unwrap();
        // 2001 * 0.5 = 1000.5 -> 1001
        assert_eq!(result.proration_amount, 1001);
        assert!(result.message.contains("¥1001"));
    }

    #[test]
    fn unknown_currency_is_rejected_by_default() {
        let catalog = PlanCatalog::default();
        let mut req = request("starter", "pro", BillingCycle::Monthly);
        req.currency = "CHF".parse().unwrap();

        let err = calculate_proration(&catalog, &req, at(2025, 1, 16)).unwrap_err();
        assert!(matches!(err, BillingError::UnknownCurrency { .. }));
    }

    #[test]
    fn unknown_currency_prices_as_zero_under_fallback() {
        let catalog = PlanCatalog::default();
        let mut req = request("starter", "pro", BillingCycle::Monthly);
        req.currency = "CHF".parse().unwrap();

        let result = ProrationCalculator::new(&catalog)
            .with_policy(LookupPolicy::ZeroPriceFallback)
            .calculate(&req, at(2025, 1, 16))
            .unwrap();

        assert_eq!(result.current_plan_price, 0);
        assert_eq!(result.new_plan_price, 0);
        assert_eq!(result.proration_amount, 0);
        assert!(!result.is_upgrade && !result.is_downgrade);
    }

    #[test]
    fn unknown_plan_is_rejected_by_default() {
        let catalog = PlanCatalog::default();
        let req = request("starter", "platinum", BillingCycle::Monthly);

        let err = calculate_proration(&catalog, &req, at(2025, 1, 16)).unwrap_err();
        assert!(matches!(err, BillingError::UnknownPlan { plan_id } if plan_id == "platinum"));
    }

    #[test]
    fn unknown_plan_prices_as_zero_under_fallback() {
        let catalog = PlanCatalog::default();
        let req = request("pro", "platinum", BillingCycle::Monthly);

        let result = ProrationCalculator::new(&catalog)
            .with_policy(LookupPolicy::ZeroPriceFallback)
            .calculate(&req, at(2025, 1, 16))
            .unwrap();

        assert_eq!(result.new_plan_price, 0);
        assert_eq!(result.proration_amount, -3950);
        assert!(result.is_downgrade);
    }

    #[test]
    fn empty_or_inverted_period_is_rejected_under_every_policy() {
        let catalog = PlanCatalog::default();
        let mut empty = request("starter", "pro", BillingCycle::Monthly);
        empty.period_end = empty.period_start;
        let mut inverted = request("starter", "pro", BillingCycle::Monthly);
        std::mem::swap(&mut inverted.period_start, &mut inverted.period_end);

        for policy in [LookupPolicy::Strict, LookupPolicy::ZeroPriceFallback] {
            let calculator = ProrationCalculator::new(&catalog).with_policy(policy);
            for req in [&empty, &inverted] {
                let err = calculator.calculate(req, at(2025, 1, 16)).unwrap_err();
                assert!(matches!(err, BillingError::InvalidPeriod { .. }));
            }
        }
    }

    #[test]
    fn scale_rounded_is_exact_at_bounds() {
        assert_eq!(scale_rounded(7900, 10, 10), 7900);
        assert_eq!(scale_rounded(7900, 0, 10), 0);
        assert_eq!(scale_rounded(-5, 1, 2), -3);
        assert_eq!(scale_rounded(5, 1, 2), 3);
        assert_eq!(scale_rounded(4, 1, 3), 1);
    }

    #[test]
    fn credit_message_handles_extreme_amounts() {
        let message = proration_message(Money::new(i64::MIN, CurrencyCode::USD));
        assert!(message.contains("credit"));
        assert!(message.contains("$92233720368547758.07"));
    }

    fn priced(monthly: i64) -> PlanPricing {
        PlanPricing {
            name: "Test".into(),
            prices: BTreeMap::from([(
                CurrencyCode::USD,
                PlanPrice {
                    monthly_minor: monthly,
                    yearly_minor: monthly * 10,
                },
            )]),
        }
    }
}
