//! Key encoding utilities for `RocksDB`.

use tablebill_core::{PeriodId, SubscriberId};

/// Create a period key from a period ID.
#[must_use]
pub fn period_key(period_id: &PeriodId) -> Vec<u8> {
    period_id.to_bytes().to_vec()
}

/// Create a subscriber-period index key.
///
/// Format: `subscriber_id (16 bytes) || revision (4 bytes, big-endian)`
///
/// Big-endian revisions sort numerically, so the last key under a
/// subscriber's prefix is the current period.
#[must_use]
pub fn subscriber_period_key(subscriber_id: &SubscriberId, revision: u32) -> Vec<u8> {
    let mut key = Vec::with_capacity(20);
    key.extend_from_slice(subscriber_id.as_bytes());
    key.extend_from_slice(&revision.to_be_bytes());
    key
}

/// Create a prefix for iterating all periods of a subscriber.
#[must_use]
pub fn subscriber_prefix(subscriber_id: &SubscriberId) -> Vec<u8> {
    subscriber_id.as_bytes().to_vec()
}

/// Decode a period ID stored as an index value.
#[must_use]
pub fn decode_period_id(value: &[u8]) -> Option<PeriodId> {
    let bytes: [u8; 16] = value.try_into().ok()?;
    Some(PeriodId::from_bytes(bytes))
}

/// Extract the revision from a subscriber-period index key.
#[must_use]
pub fn decode_revision(key: &[u8]) -> Option<u32> {
    let bytes: [u8; 4] = key.get(16..20)?.try_into().ok()?;
    Some(u32::from_be_bytes(bytes))
}
