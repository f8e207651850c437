//! Tablebill Client SDK.
//!
//! This crate provides a client library for the restaurant dashboard backend
//! to interact with the tablebill API.
//!
//! # Example
//!
//! ```no_run
//! use tablebill_client::{ChangePlanRequest, TablebillClient};
//! use tablebill_core::SubscriberId;
//!
//! # async fn example(subscriber_id: SubscriberId) -> Result<(), tablebill_client::ClientError> {
//! let client = TablebillClient::new(
//!     "http://tablebill.billing.svc:8080",
//!     "your-service-api-key",
//! )?;
//!
//! // Show the subscriber what an upgrade costs before confirming it
//! let request = ChangePlanRequest::to_plan("pro");
//! let preview = client.preview_change(&subscriber_id, &request).await?;
//! println!("{}", preview.result.message);
//!
//! let change = client.change_plan(&subscriber_id, &request).await?;
//! println!("Charged {} today", change.proration.amount());
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

mod client;
mod error;
mod types;

pub use client::{ClientOptions, TablebillClient};
pub use error::ClientError;
pub use types::{
    ActivateSubscriptionRequest, ChangePlanRequest, Period, PeriodPage, PlanChange, PlanInfo,
    PlanPriceInfo, Proration, ProrationPreviewRequest,
};
