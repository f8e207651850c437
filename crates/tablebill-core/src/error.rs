//! Error types for tablebill.

use chrono::{DateTime, Utc};

use crate::ids::IdError;

/// Result type for tablebill operations.
pub type Result<T> = std::result::Result<T, BillingError>;

/// Errors that can occur in tablebill operations.
///
/// Every variant describes a problem with the caller's input; none of them is
/// retryable.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BillingError {
    /// The plan is not present in the catalog.
    #[error("unknown plan: {plan_id}")]
    UnknownPlan {
        /// The plan that was requested.
        plan_id: String,
    },

    /// The plan exists but has no price in the requested currency.
    #[error("plan {plan_id} has no price in {currency}")]
    UnknownCurrency {
        /// The plan that was requested.
        plan_id: String,
        /// The currency that was requested.
        currency: String,
    },

    /// The billing period is empty or inverted.
    #[error("invalid billing period: end {end} is not after start {start}")]
    InvalidPeriod {
        /// Start of the period.
        start: DateTime<Utc>,
        /// End of the period.
        end: DateTime<Utc>,
    },

    /// The input is not a valid ISO-4217 currency code.
    #[error("invalid currency code: {0}")]
    InvalidCurrency(String),

    /// The plan catalog is inconsistent.
    #[error("invalid plan catalog: {0}")]
    InvalidCatalog(String),

    /// Invalid identifier.
    #[error("invalid identifier: {0}")]
    InvalidId(#[from] IdError),
}
