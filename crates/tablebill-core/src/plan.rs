//! Subscription plans, billing cycles and the plan price catalog.
//!
//! The catalog is a plain value that callers construct (or load) and pass into
//! the proration calculator. Nothing in this crate reads prices from global
//! state.

use chrono::{DateTime, Months, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use crate::currency::CurrencyCode;
use crate::error::{BillingError, Result};

// ============================================================================
// Built-in catalog prices (minor units)
// ============================================================================

/// Starter plan monthly price in US cents ($29).
pub const STARTER_MONTHLY_USD_CENTS: i64 = 2900;

/// Pro plan monthly price in US cents ($79).
pub const PRO_MONTHLY_USD_CENTS: i64 = 7900;

/// Elite plan monthly price in US cents ($149).
pub const ELITE_MONTHLY_USD_CENTS: i64 = 14_900;

/// Months charged for a yearly subscription in the built-in catalog (two free).
pub const YEARLY_BILLED_MONTHS: i64 = 10;

/// A plan identifier such as `starter`, `pro` or `elite`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlanId(String);

impl PlanId {
    /// Create a plan identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PlanId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// How often a subscriber is charged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BillingCycle {
    /// Charged every calendar month.
    Monthly,
    /// Charged every twelve calendar months.
    Yearly,
}

impl BillingCycle {
    /// Number of calendar months in one period of this cycle.
    #[must_use]
    pub const fn months(self) -> u32 {
        match self {
            Self::Monthly => 1,
            Self::Yearly => 12,
        }
    }

    /// End of a period of this cycle that starts at `start`.
    ///
    /// Month arithmetic clamps to the last day of shorter months, so a monthly
    /// period starting on January 31st ends on the last day of February.
    #[must_use]
    pub fn next_period_end(self, start: DateTime<Utc>) -> DateTime<Utc> {
        start
            .checked_add_months(Months::new(self.months()))
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    /// Lower-case name used on the wire.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Monthly => "monthly",
            Self::Yearly => "yearly",
        }
    }
}

impl fmt::Display for BillingCycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BillingCycle {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "monthly" => Ok(Self::Monthly),
            "yearly" | "annual" => Ok(Self::Yearly),
            other => Err(format!("unknown billing cycle: {other}")),
        }
    }
}

/// Prices of one plan in one currency, in minor units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanPrice {
    /// Price of one monthly period.
    pub monthly_minor: i64,
    /// Price of one yearly period.
    pub yearly_minor: i64,
}

impl PlanPrice {
    /// Price of one period of `cycle`.
    #[must_use]
    pub const fn for_cycle(&self, cycle: BillingCycle) -> i64 {
        match cycle {
            BillingCycle::Monthly => self.monthly_minor,
            BillingCycle::Yearly => self.yearly_minor,
        }
    }

    /// Yearly saving against twelve monthly payments, as a whole percentage.
    ///
    /// `None` when the yearly price is not cheaper than twelve months.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn yearly_discount_percent(&self) -> Option<u8> {
        let twelve_months = i128::from(self.monthly_minor) * 12;
        let yearly = i128::from(self.yearly_minor);
        if twelve_months <= 0 || yearly >= twelve_months {
            return None;
        }
        let percent = (twelve_months - yearly) * 100 / twelve_months;
        Some(percent as u8)
    }
}

/// A plan's display name and its prices per currency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanPricing {
    /// Human-readable plan name.
    pub name: String,
    /// Prices keyed by currency.
    pub prices: BTreeMap<CurrencyCode, PlanPrice>,
}

/// The table of subscription plans and their prices.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlanCatalog {
    plans: BTreeMap<PlanId, PlanPricing>,
}

impl Default for PlanCatalog {
    fn default() -> Self {
        let mut catalog = Self::empty();

        // (plan, name, USD, EUR, GBP) monthly prices in minor units
        let table = [
            ("starter", "Starter", STARTER_MONTHLY_USD_CENTS, 2700, 2300),
            ("pro", "Pro", PRO_MONTHLY_USD_CENTS, 7300, 6300),
            ("elite", "Elite", ELITE_MONTHLY_USD_CENTS, 13_900, 11_900),
        ];

        for (id, name, usd, eur, gbp) in table {
            let prices = [
                (CurrencyCode::USD, usd),
                (CurrencyCode::EUR, eur),
                (CurrencyCode::GBP, gbp),
            ]
            .into_iter()
            .map(|(currency, monthly)| {
                (
                    currency,
                    PlanPrice {
                        monthly_minor: monthly,
                        yearly_minor: monthly * YEARLY_BILLED_MONTHS,
                    },
                )
            })
            .collect();

            catalog.insert(
                PlanId::new(id),
                PlanPricing {
                    name: name.to_string(),
                    prices,
                },
            );
        }

        catalog
    }
}

impl PlanCatalog {
    /// Create a catalog with no plans.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            plans: BTreeMap::new(),
        }
    }

    /// Add or replace a plan.
    pub fn insert(&mut self, plan_id: PlanId, pricing: PlanPricing) {
        self.plans.insert(plan_id, pricing);
    }

    /// Builder-style variant of [`insert`](Self::insert).
    #[must_use]
    pub fn with_plan(mut self, plan_id: impl Into<PlanId>, pricing: PlanPricing) -> Self {
        self.insert(plan_id.into(), pricing);
        self
    }

    /// Look up a plan.
    #[must_use]
    pub fn get(&self, plan_id: &PlanId) -> Option<&PlanPricing> {
        self.plans.get(plan_id)
    }

    /// Iterate over all plans in identifier order.
    pub fn iter(&self) -> impl Iterator<Item = (&PlanId, &PlanPricing)> {
        self.plans.iter()
    }

    /// Number of plans.
    #[must_use]
    pub fn len(&self) -> usize {
        self.plans.len()
    }

    /// Whether the catalog has no plans.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.plans.is_empty()
    }

    /// Every currency priced by at least one plan.
    #[must_use]
    pub fn currencies(&self) -> BTreeSet<CurrencyCode> {
        self.plans
            .values()
            .flat_map(|p| p.prices.keys().copied())
            .collect()
    }

    /// Price of one period of `cycle` for `plan_id` in `currency`.
    ///
    /// # Errors
    ///
    /// - `BillingError::UnknownPlan` if the plan is not in the catalog.
    /// - `BillingError::UnknownCurrency` if the plan has no price in `currency`.
    pub fn price(
        &self,
        plan_id: &PlanId,
        currency: CurrencyCode,
        cycle: BillingCycle,
    ) -> Result<i64> {
        let pricing = self.get(plan_id).ok_or_else(|| BillingError::UnknownPlan {
            plan_id: plan_id.to_string(),
        })?;

        let price = pricing
            .prices
            .get(&currency)
            .ok_or_else(|| BillingError::UnknownCurrency {
                plan_id: plan_id.to_string(),
                currency: currency.to_string(),
            })?;

        Ok(price.for_cycle(cycle))
    }

    /// Yearly discount of a plan in a currency, if it has one.
    #[must_use]
    pub fn yearly_discount_percent(&self, plan_id: &PlanId, currency: CurrencyCode) -> Option<u8> {
        self.get(plan_id)?
            .prices
            .get(&currency)?
            .yearly_discount_percent()
    }

    /// Check the catalog's invariants.
    ///
    /// # Errors
    ///
    /// Returns `BillingError::InvalidCatalog` if the catalog is empty, a price
    /// is negative, or a plan lacks a currency that another plan offers.
    pub fn validate(&self) -> Result<()> {
        if self.is_empty() {
            return Err(BillingError::InvalidCatalog("catalog has no plans".into()));
        }

        let currencies = self.currencies();

        for (plan_id, pricing) in &self.plans {
            for currency in &currencies {
                let Some(price) = pricing.prices.get(currency) else {
                    return Err(BillingError::InvalidCatalog(format!(
                        "plan {plan_id} has no price in {currency}"
                    )));
                };

                if price.monthly_minor < 0 || price.yearly_minor < 0 {
                    return Err(BillingError::InvalidCatalog(format!(
                        "plan {plan_id} has a negative price in {currency}"
                    )));
                }
            }
        }

        Ok(())
    }

    /// Parse and validate a catalog from JSON.
    ///
    /// # Errors
    ///
    /// Returns `BillingError::InvalidCatalog` if the JSON is malformed or the
    /// catalog fails [`validate`](Self::validate).
    pub fn from_json(json: &str) -> Result<Self> {
        let catalog: Self = serde_json::from_str(json)
            .map_err(|e| BillingError::InvalidCatalog(e.to_string()))?;
        catalog.validate()?;
        Ok(catalog)
    }
}
