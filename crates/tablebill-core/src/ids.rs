//! Who is billed, and which stored period a row is.
//!
//! A [`SubscriberId`] is the restaurant account's UUID, minted by the hosted
//! auth backend and only ever parsed here. A [`PeriodId`] is a ULID minted
//! when a period revision is appended; its leading timestamp makes byte order
//! match append order, which the store's key layout relies on.
//!
//! Both travel as their canonical text form in JSON and as raw 16 bytes in
//! store keys.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ulid::Ulid;

/// Text conversions shared by the id newtypes.
macro_rules! text_id {
    ($name:ident) => {
        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                fmt::Display::fmt(&self.0, f)
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!(stringify!($name), "({})"), self.0)
            }
        }

        impl TryFrom<String> for $name {
            type Error = IdError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                value.parse()
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.to_string()
            }
        }
    };
}

/// The restaurant account being billed.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SubscriberId(uuid::Uuid);

impl SubscriberId {
    /// A fresh random account id, for tests and local tooling.
    #[must_use]
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4())
    }

    /// Raw UUID bytes, used as the store's key prefix.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8; 16] {
        self.0.as_bytes()
    }
}

impl FromStr for SubscriberId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        uuid::Uuid::parse_str(s)
            .map(Self)
            .map_err(|_| IdError::InvalidUuid)
    }
}

text_id!(SubscriberId);

/// One revision in a subscriber's period history.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PeriodId(Ulid);

impl PeriodId {
    /// Mint an id stamped with the current time.
    #[must_use]
    pub fn generate() -> Self {
        Self(Ulid::new())
    }

    /// Big-endian ULID bytes; ordering matches [`Ord`].
    #[must_use]
    pub fn to_bytes(&self) -> [u8; 16] {
        self.0.to_bytes()
    }

    /// Inverse of [`PeriodId::to_bytes`]. Every 16-byte value is a valid id.
    #[must_use]
    pub fn from_bytes(bytes: [u8; 16]) -> Self {
        Self(Ulid::from_bytes(bytes))
    }
}

impl FromStr for PeriodId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ulid::from_string(s)
            .map(Self)
            .map_err(|_| IdError::InvalidUlid)
    }
}

text_id!(PeriodId);

/// Rejected id text.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdError {
    /// Subscriber ids must be UUIDs.
    #[error("invalid UUID format")]
    InvalidUuid,

    /// Period ids must be ULIDs.
    #[error("invalid ULID format")]
    InvalidUlid,
}
