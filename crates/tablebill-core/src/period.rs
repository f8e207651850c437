//! Subscription periods.
//!
//! A subscriber's history is an append-only chain of periods. Activating a
//! subscription creates revision 1; every plan change or renewal creates the
//! next revision, pointing at the period it supersedes. Existing periods are
//! never modified.
//!
//! `start` and `end` are the billing interval, which only a renewal moves. A
//! plan change keeps the interval and records when it happened in
//! `effective_from`, so every proration within one interval is measured
//! against the same whole interval.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::currency::CurrencyCode;
use crate::error::{BillingError, Result};
use crate::ids::{PeriodId, SubscriberId};
use crate::plan::{BillingCycle, PlanId};
use crate::proration::ProrationRequest;

/// The billing interval a subscriber is currently in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionPeriod {
    /// Unique period ID (ULID for time-ordering).
    pub id: PeriodId,

    /// The subscriber this period belongs to.
    pub subscriber_id: SubscriberId,

    /// Position in the subscriber's history, starting at 1.
    pub revision: u32,

    /// The period this one replaced, if any.
    pub supersedes: Option<PeriodId>,

    /// Plan in effect during the period.
    pub plan_id: PlanId,

    /// Billing cycle in effect during the period.
    pub cycle: BillingCycle,

    /// The subscriber's billing currency.
    pub currency: CurrencyCode,

    /// Start of the billing interval (inclusive).
    pub start: DateTime<Utc>,

    /// End of the billing interval, which is also the next renewal boundary.
    pub end: DateTime<Utc>,

    /// When this revision's plan took effect, within `[start, end]`.
    pub effective_from: DateTime<Utc>,

    /// When the period record was created.
    pub created_at: DateTime<Utc>,
}

impl SubscriptionPeriod {
    /// Start a new subscription at `now`, running for one full cycle.
    #[must_use]
    pub fn activate(
        subscriber_id: SubscriberId,
        plan_id: PlanId,
        cycle: BillingCycle,
        currency: CurrencyCode,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: PeriodId::generate(),
            subscriber_id,
            revision: 1,
            supersedes: None,
            plan_id,
            cycle,
            currency,
            start: now,
            end: cycle.next_period_end(now),
            effective_from: now,
            created_at: now,
        }
    }

    /// The period that replaces this one when the plan or cycle changes at
    /// `now`.
    ///
    /// The new period keeps this period's billing interval; the first
    /// full-price charge for the new plan happens at its end.
    #[must_use]
    pub fn change_plan(&self, plan_id: PlanId, cycle: BillingCycle, now: DateTime<Utc>) -> Self {
        Self {
            id: PeriodId::generate(),
            subscriber_id: self.subscriber_id,
            revision: self.revision + 1,
            supersedes: Some(self.id),
            plan_id,
            cycle,
            currency: self.currency,
            start: self.start,
            end: self.end,
            effective_from: now.max(self.effective_from).min(self.end),
            created_at: now,
        }
    }

    /// The period that follows this one at its renewal boundary.
    #[must_use]
    pub fn renew(&self, now: DateTime<Utc>) -> Self {
        Self {
            id: PeriodId::generate(),
            subscriber_id: self.subscriber_id,
            revision: self.revision + 1,
            supersedes: Some(self.id),
            plan_id: self.plan_id.clone(),
            cycle: self.cycle,
            currency: self.currency,
            start: self.end,
            end: self.cycle.next_period_end(self.end),
            effective_from: self.end,
            created_at: now,
        }
    }

    /// Whether this revision is the one in effect at `now`, i.e. `now` falls
    /// inside `[effective_from, end)`.
    #[must_use]
    pub fn contains(&self, now: DateTime<Utc>) -> bool {
        self.effective_from <= now && now < self.end
    }

    /// Whether the renewal boundary has been reached at `now`.
    #[must_use]
    pub fn is_due_for_renewal(&self, now: DateTime<Utc>) -> bool {
        now >= self.end
    }

    /// Build the proration request for switching this period to another plan.
    ///
    /// The request always spans the whole billing interval, however many
    /// changes it has already seen.
    #[must_use]
    pub fn proration_request(&self, new_plan: PlanId, new_cycle: BillingCycle) -> ProrationRequest {
        ProrationRequest {
            current_plan: self.plan_id.clone(),
            new_plan,
            current_cycle: self.cycle,
            new_cycle,
            currency: self.currency,
            period_start: self.start,
            period_end: self.end,
        }
    }

    /// Reject periods whose end is not after their start, or that take effect
    /// outside their interval.
    ///
    /// # Errors
    ///
    /// Returns `BillingError::InvalidPeriod` for empty or inverted periods.
    pub fn validate(&self) -> Result<()> {
        if self.end <= self.start
            || self.effective_from < self.start
            || self.effective_from > self.end
        {
            return Err(BillingError::InvalidPeriod {
                start: self.start,
                end: self.end,
            });
        }
        Ok(())
    }
}
