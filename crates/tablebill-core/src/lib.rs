//! Core types and utilities for tablebill.
//!
//! This crate provides the foundational types used throughout the tablebill
//! subscription backend:
//!
//! - **Identifiers**: `SubscriberId`, `PeriodId`
//! - **Money**: `CurrencyCode`, `Money`
//! - **Plans**: `PlanId`, `BillingCycle`, `PlanCatalog`
//! - **Periods**: `SubscriptionPeriod`
//! - **Proration**: `ProrationCalculator`, `ProrationRequest`, `ProrationResult`
//!
//! # Amounts
//!
//! Every amount is an `i64` count of the currency's minor unit ($29.00 is
//! `2900` in USD, ¥1000 is `1000` in JPY). Rounding to the minor unit
//! therefore follows the currency's exponent without any special casing.
//!
//! # Example
//!
//! ```
//! use chrono::{TimeZone, Utc};
//! use tablebill_core::{
//!     calculate_proration, BillingCycle, CurrencyCode, PlanCatalog, PlanId, ProrationRequest,
//! };
//!
//! let catalog = PlanCatalog::default();
//! let request = ProrationRequest {
//!     current_plan: PlanId::new("starter"),
//!     new_plan: PlanId::new("pro"),
//!     current_cycle: BillingCycle::Monthly,
//!     new_cycle: BillingCycle::Monthly,
//!     currency: CurrencyCode::USD,
//!     period_start: Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap(),
//!     period_end: Utc.with_ymd_and_hms(2025, 1, 31, 0, 0, 0).unwrap(),
//! };
//! let now = Utc.with_ymd_and_hms(2025, 1, 16, 0, 0, 0).unwrap();
//!
//! let result = calculate_proration(&catalog, &request, now).unwrap();
//! assert_eq!(result.proration_amount, 2500);
//! assert!(result.is_upgrade);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod currency;
pub mod error;
pub mod ids;
pub mod period;
pub mod plan;
pub mod proration;

pub use currency::{CurrencyCode, Money};
pub use error::{BillingError, Result};
pub use ids::{IdError, PeriodId, SubscriberId};
pub use period::SubscriptionPeriod;
pub use plan::{
    BillingCycle, PlanCatalog, PlanId, PlanPrice, PlanPricing, ELITE_MONTHLY_USD_CENTS,
    PRO_MONTHLY_USD_CENTS, STARTER_MONTHLY_USD_CENTS, YEARLY_BILLED_MONTHS,
};
pub use proration::{
    calculate_proration, proration_message, LookupPolicy, ProrationCalculator, ProrationRequest,
    ProrationResult,
};
