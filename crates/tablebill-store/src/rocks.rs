//! `RocksDB` storage implementation.
//!
//! This module provides the `RocksStore` implementation of the `Store` trait.

use std::path::Path;
use std::sync::{Arc, Mutex};

use rocksdb::{
    BoundColumnFamily, ColumnFamilyDescriptor, DBWithThreadMode, Direction, IteratorMode,
    MultiThreaded, Options, WriteBatch,
};

use tablebill_core::{PeriodId, SubscriberId, SubscriptionPeriod};

use crate::error::{Result, StoreError};
use crate::keys;
use crate::schema::{all_column_families, cf};
use crate::{check_revision, Store};

/// RocksDB-backed storage implementation.
pub struct RocksStore {
    db: Arc<DBWithThreadMode<MultiThreaded>>,
    /// Serialises the read-check-write of `append_period`.
    append_lock: Mutex<()>,
}

impl RocksStore {
    /// Open or create a `RocksDB` database at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or created.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cf_descriptors: Vec<_> = all_column_families()
            .into_iter()
            .map(|name| ColumnFamilyDescriptor::new(name, Options::default()))
            .collect();

        let db = DBWithThreadMode::open_cf_descriptors(&opts, path, cf_descriptors)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(Self {
            db: Arc::new(db),
            append_lock: Mutex::new(()),
        })
    }

    /// Get a column family handle.
    fn cf(&self, name: &str) -> Result<Arc<BoundColumnFamily<'_>>> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| StoreError::Database(format!("column family not found: {name}")))
    }

    /// Serialize a value using CBOR.
    fn serialize<T: serde::Serialize>(value: &T) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        ciborium::into_writer(value, &mut buf)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        Ok(buf)
    }

    /// Deserialize a value from CBOR.
    fn deserialize<T: serde::de::DeserializeOwned>(data: &[u8]) -> Result<T> {
        ciborium::from_reader(data).map_err(|e| StoreError::Serialization(e.to_string()))
    }

    /// Period IDs of a subscriber, newest first.
    fn period_ids_newest_first(&self, subscriber_id: &SubscriberId) -> Result<Vec<PeriodId>> {
        let cf_index = self.cf(cf::PERIODS_BY_SUBSCRIBER)?;
        let prefix = keys::subscriber_prefix(subscriber_id);
        let upper = keys::subscriber_period_key(subscriber_id, u32::MAX);

        let iter = self
            .db
            .iterator_cf(&cf_index, IteratorMode::From(&upper, Direction::Reverse));

        let mut ids = Vec::new();
        for item in iter {
            let (key, value) = item.map_err(|e| StoreError::Database(e.to_string()))?;
            if !key.starts_with(&prefix) {
                break;
            }
            let id = keys::decode_period_id(&value).ok_or_else(|| {
                StoreError::Serialization("malformed period index entry".into())
            })?;
            ids.push(id);
        }

        Ok(ids)
    }

    /// Latest revision recorded for a subscriber.
    fn latest_revision(&self, subscriber_id: &SubscriberId) -> Result<Option<u32>> {
        let cf_index = self.cf(cf::PERIODS_BY_SUBSCRIBER)?;
        let prefix = keys::subscriber_prefix(subscriber_id);
        let upper = keys::subscriber_period_key(subscriber_id, u32::MAX);

        let mut iter = self
            .db
            .iterator_cf(&cf_index, IteratorMode::From(&upper, Direction::Reverse));

        match iter.next() {
            Some(item) => {
                let (key, _) = item.map_err(|e| StoreError::Database(e.to_string()))?;
                if key.starts_with(&prefix) {
                    Ok(keys::decode_revision(&key))
                } else {
                    Ok(None)
                }
            }
            None => Ok(None),
        }
    }
}

impl Store for RocksStore {
    fn append_period(&self, period: &SubscriptionPeriod) -> Result<()> {
        let _guard = self
            .append_lock
            .lock()
            .map_err(|_| StoreError::Database("append lock poisoned".into()))?;

        check_revision(self.latest_revision(&period.subscriber_id)?, period)?;

        let cf_periods = self.cf(cf::PERIODS)?;
        let cf_index = self.cf(cf::PERIODS_BY_SUBSCRIBER)?;

        let period_key = keys::period_key(&period.id);
        let index_key = keys::subscriber_period_key(&period.subscriber_id, period.revision);
        let value = Self::serialize(period)?;

        // Write atomically
        let mut batch = WriteBatch::default();
        batch.put_cf(&cf_periods, &period_key, &value);
        batch.put_cf(&cf_index, &index_key, &period_key);

        self.db
            .write(batch)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        tracing::debug!(
            subscriber_id = %period.subscriber_id,
            period_id = %period.id,
            revision = period.revision,
            "Period appended"
        );

        Ok(())
    }

    fn current_period(&self, subscriber_id: &SubscriberId) -> Result<Option<SubscriptionPeriod>> {
        match self.period_ids_newest_first(subscriber_id)?.first() {
            Some(id) => self.get_period(id),
            None => Ok(None),
        }
    }

    fn list_periods(
        &self,
        subscriber_id: &SubscriberId,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<SubscriptionPeriod>> {
        let mut periods = Vec::new();
        for id in self
            .period_ids_newest_first(subscriber_id)?
            .into_iter()
            .skip(offset)
            .take(limit)
        {
            if let Some(period) = self.get_period(&id)? {
                periods.push(period);
            }
        }
        Ok(periods)
    }

    fn get_period(&self, period_id: &PeriodId) -> Result<Option<SubscriptionPeriod>> {
        let cf = self.cf(cf::PERIODS)?;
        let key = keys::period_key(period_id);

        self.db
            .get_cf(&cf, key)
            .map_err(|e| StoreError::Database(e.to_string()))?
            .map(|data| Self::deserialize(&data))
            .transpose()
    }
}
