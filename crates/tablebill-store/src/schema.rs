//! Column families used by the `RocksDB` backend.

/// Column family names for the `RocksDB` database.
pub mod cf {
    /// Subscription periods, keyed by `period_id` (ULID).
    pub const PERIODS: &str = "periods";

    /// Index: periods by subscriber, keyed by `subscriber_id || revision`.
    /// Value is the `period_id`.
    pub const PERIODS_BY_SUBSCRIBER: &str = "periods_by_subscriber";
}

/// Returns all column family names for database initialization.
#[must_use]
pub fn all_column_families() -> Vec<&'static str> {
    vec![cf::PERIODS, cf::PERIODS_BY_SUBSCRIBER]
}
