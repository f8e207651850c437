//! In-memory storage implementation.

use std::collections::HashMap;
use std::sync::RwLock;

use tablebill_core::{PeriodId, SubscriberId, SubscriptionPeriod};

use crate::error::{Result, StoreError};
use crate::{check_revision, Store};

/// In-memory `Store`; every subscriber's history is a vector ordered by
/// revision.
#[derive(Debug, Default)]
pub struct MemoryStore {
    histories: RwLock<HashMap<SubscriberId, Vec<SubscriptionPeriod>>>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned<T>(_: T) -> StoreError {
    StoreError::Database("memory store lock poisoned".into())
}

impl Store for MemoryStore {
    fn append_period(&self, period: &SubscriptionPeriod) -> Result<()> {
        let mut histories = self.histories.write().map_err(poisoned)?;
        let history = histories.entry(period.subscriber_id).or_default();

        check_revision(history.last().map(|p| p.revision), period)?;
        history.push(period.clone());

        tracing::debug!(
            subscriber_id = %period.subscriber_id,
            period_id = %period.id,
            revision = period.revision,
            "Period appended"
        );

        Ok(())
    }

    fn current_period(&self, subscriber_id: &SubscriberId) -> Result<Option<SubscriptionPeriod>> {
        let histories = self.histories.read().map_err(poisoned)?;
        Ok(histories
            .get(subscriber_id)
            .and_then(|history| history.last().cloned()))
    }

    fn list_periods(
        &self,
        subscriber_id: &SubscriberId,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<SubscriptionPeriod>> {
        let histories = self.histories.read().map_err(poisoned)?;
        Ok(histories
            .get(subscriber_id)
            .map(|history| {
                history
                    .iter()
                    .rev()
                    .skip(offset)
                    .take(limit)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    fn get_period(&self, period_id: &PeriodId) -> Result<Option<SubscriptionPeriod>> {
        let histories = self.histories.read().map_err(poisoned)?;
        Ok(histories
            .values()
            .flat_map(|history| history.iter())
            .find(|p| p.id == *period_id)
            .cloned())
    }
}
