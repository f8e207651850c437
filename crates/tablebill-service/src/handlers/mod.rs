//! API handlers.

pub mod health;
pub mod plans;
pub mod proration;
pub mod subscriptions;

use tablebill_core::{BillingCycle, CurrencyCode, SubscriberId};

use crate::error::ApiError;

/// Parse a subscriber ID from a path segment or request field.
pub(crate) fn parse_subscriber_id(raw: &str) -> Result<SubscriberId, ApiError> {
    raw.parse::<SubscriberId>()
        .map_err(|e| ApiError::Billing(e.into()))
}

/// Parse a currency code, e.g. `"usd"` or `"EUR"`.
pub(crate) fn parse_currency(raw: &str) -> Result<CurrencyCode, ApiError> {
    Ok(raw.parse::<CurrencyCode>()?)
}

/// Parse a billing cycle, e.g. `"monthly"` or `"yearly"`.
pub(crate) fn parse_cycle(raw: &str) -> Result<BillingCycle, ApiError> {
    raw.parse::<BillingCycle>().map_err(ApiError::BadRequest)
}
