//! Client error types.

/// Errors that can occur when using the tablebill client.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Server returned an error response without a more specific variant.
    #[error("API error: {code} - {message}")]
    Api {
        /// Error code.
        code: String,
        /// Error message.
        message: String,
        /// HTTP status code.
        status: u16,
    },

    /// The plan is not in the service's catalog.
    #[error("unknown plan: {plan_id}")]
    UnknownPlan {
        /// The plan that was requested.
        plan_id: String,
    },

    /// The plan has no price in the requested currency.
    #[error("plan {plan_id} has no price in {currency}")]
    UnknownCurrency {
        /// The plan that was requested.
        plan_id: String,
        /// The currency that was requested.
        currency: String,
    },

    /// The billing period is empty or inverted.
    #[error("invalid billing period: {message}")]
    InvalidPeriod {
        /// Server message.
        message: String,
    },

    /// The subscription does not exist.
    #[error("not found: {message}")]
    NotFound {
        /// Server message.
        message: String,
    },

    /// The subscription is not in a state that allows the request, or was
    /// changed concurrently.
    #[error("conflict: {message}")]
    Conflict {
        /// Server message.
        message: String,
    },

    /// The API key was missing or rejected.
    #[error("unauthorized")]
    Unauthorized,

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Invalid configuration.
    #[error("configuration error: {0}")]
    Configuration(String),
}
