//! Subscription period storage for tablebill.
//!
//! Periods are append-only. A plan change or renewal never edits the current
//! period; it appends the next revision. Appends are checked against the
//! subscriber's latest revision so that two concurrent plan changes cannot
//! both supersede the same period.
//!
//! # Backends
//!
//! - [`MemoryStore`]: in-process, used by tests and single-node deployments.
//! - `RocksStore` (feature `rocksdb-backend`): persistent, with column
//!   families `periods` and `periods_by_subscriber`.
//!
//! # Example
//!
//! ```
//! use chrono::Utc;
//! use tablebill_core::{BillingCycle, CurrencyCode, PlanId, SubscriberId, SubscriptionPeriod};
//! use tablebill_store::{MemoryStore, Store};
//!
//! let store = MemoryStore::new();
//! let period = SubscriptionPeriod::activate(
//!     SubscriberId::generate(),
//!     PlanId::new("starter"),
//!     BillingCycle::Monthly,
//!     CurrencyCode::USD,
//!     Utc::now(),
//! );
//! store.append_period(&period).unwrap();
//!
//! let current = store.current_period(&period.subscriber_id).unwrap();
//! assert_eq!(current, Some(period));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod error;
pub mod keys;
pub mod memory;
#[cfg(feature = "rocksdb-backend")]
pub mod rocks;
pub mod schema;

pub use error::{Result, StoreError};
pub use memory::MemoryStore;
#[cfg(feature = "rocksdb-backend")]
pub use rocks::RocksStore;

use tablebill_core::{PeriodId, SubscriberId, SubscriptionPeriod};

/// The storage trait defining all period operations.
pub trait Store: Send + Sync {
    /// Append a period to its subscriber's history.
    ///
    /// # Errors
    ///
    /// - `StoreError::RevisionConflict` unless `period.revision` is exactly one
    ///   past the subscriber's latest revision (1 for a new subscriber).
    /// - `StoreError::Database` if the backend fails.
    fn append_period(&self, period: &SubscriptionPeriod) -> Result<()>;

    /// Get the subscriber's current (latest) period.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn current_period(&self, subscriber_id: &SubscriberId) -> Result<Option<SubscriptionPeriod>>;

    /// List a subscriber's periods, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn list_periods(
        &self,
        subscriber_id: &SubscriberId,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<SubscriptionPeriod>>;

    /// Get a period by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get_period(&self, period_id: &PeriodId) -> Result<Option<SubscriptionPeriod>>;
}

/// Check that `period` may follow `latest`.
pub(crate) fn check_revision(latest: Option<u32>, period: &SubscriptionPeriod) -> Result<()> {
    let expected = latest.map_or(1, |r| r + 1);
    if period.revision != expected {
        return Err(StoreError::RevisionConflict {
            expected,
            actual: period.revision,
        });
    }
    Ok(())
}
