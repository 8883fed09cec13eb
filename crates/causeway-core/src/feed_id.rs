//! Feed identity.
//!
//! A [`FeedId`] is the 32-byte public key of a feed's writer. Its canonical
//! string form is lowercase hex, which is also how it serializes.
//!
//! # Examples
//!
//! ```
//! use causeway_core::FeedId;
//!
//! let id = FeedId::derive("alice");
//! let parsed: FeedId = id.to_string().parse().unwrap();
//! assert_eq!(id, parsed);
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Zero-based index of a block within its feed.
pub type Seq = u64;

/// Length of a feed id in bytes.
pub const FEED_ID_LEN: usize = 32;

/// Number of hex characters shown by [`FeedId::short`].
const SHORT_HEX_LEN: usize = 8;

/// Opaque fixed-size identifier of a feed.
///
/// Ordered by raw bytes, so sorting feed ids is deterministic across peers.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FeedId([u8; FEED_ID_LEN]);

/// Error returned when parsing a [`FeedId`] from its hex form fails.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid feed id {input:?}: {reason}")]
pub struct ParseFeedIdError {
    pub input: String,
    pub reason: String,
}

impl FeedId {
    /// Wrap raw key bytes.
    pub const fn from_bytes(bytes: [u8; FEED_ID_LEN]) -> Self {
        Self(bytes)
    }

    /// Deterministically derive an id from a seed string (blake3 of the seed).
    pub fn derive(seed: &str) -> Self {
        Self(*blake3::hash(seed.as_bytes()).as_bytes())
    }

    /// Raw key bytes.
    pub fn as_bytes(&self) -> &[u8; FEED_ID_LEN] {
        &self.0
    }

    /// Full lowercase hex form.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Truncated hex form for log lines.
    pub fn short(&self) -> String {
        let mut s = self.to_hex();
        s.truncate(SHORT_HEX_LEN);
        s
    }
}

impl fmt::Display for FeedId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for FeedId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FeedId({})", self.short())
    }
}

impl FromStr for FeedId {
    type Err = ParseFeedIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = hex::decode(s).map_err(|e| ParseFeedIdError {
            input: s.to_string(),
            reason: e.to_string(),
        })?;
        let bytes: [u8; FEED_ID_LEN] = bytes.try_into().map_err(|v: Vec<u8>| ParseFeedIdError {
            input: s.to_string(),
            reason: format!("expected {FEED_ID_LEN} bytes, got {}", v.len()),
        })?;
        Ok(Self(bytes))
    }
}

impl From<[u8; FEED_ID_LEN]> for FeedId {
    fn from(bytes: [u8; FEED_ID_LEN]) -> Self {
        Self(bytes)
    }
}

impl Serialize for FeedId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for FeedId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
