//! Tablebill HTTP API Service.
//!
//! This crate provides the HTTP API the restaurant dashboard backend uses to
//! manage subscriptions:
//!
//! - Plan catalog listing
//! - Proration previews for plan and cycle changes
//! - Subscription activation, plan changes and renewals
//!
//! # Authentication
//!
//! Every `/v1` route requires the shared service API key in `x-api-key`.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
// Allow some pedantic lints that are noisy for Axum handler functions
#![allow(clippy::missing_errors_doc)] // Axum handlers all return Result
#![allow(clippy::unused_async)] // Handlers are async for the router even when the store is sync

pub mod auth;
pub mod clock;
pub mod config;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;

pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{ConfigError, ServiceConfig};
pub use error::ApiError;
pub use routes::create_router;
pub use state::AppState;
