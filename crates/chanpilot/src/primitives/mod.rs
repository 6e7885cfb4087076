//! Core value types shared across the crate.
//!
//! Everything here is a plain value: identifiers compare by byte content,
//! amounts are denominated in the smallest on-chain unit.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Length in bytes of a compressed public key.
pub const NODE_ID_LEN: usize = 33;

// =============================================================================
// Amount
// =============================================================================

/// A monetary amount in the smallest on-chain unit.
///
/// Amounts are signed: balance deltas may be negative. Budget accounting in
/// the agent only ever uses the checked and saturating forms; the plain
/// operator impls exist for construction convenience.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Amount(i64);

impl Amount {
    /// The zero amount.
    pub const ZERO: Self = Self(0);

    /// One whole coin (10^8 base units).
    pub const COIN: Self = Self(100_000_000);

    /// Creates an amount from a raw base-unit count.
    #[must_use]
    pub const fn from_sat(sat: i64) -> Self {
        Self(sat)
    }

    /// Returns the raw base-unit count.
    #[must_use]
    pub const fn to_sat(self) -> i64 {
        self.0
    }

    /// Returns `true` if the amount is strictly below zero.
    #[must_use]
    pub const fn is_negative(self) -> bool {
        self.0 < 0
    }

    /// Returns `true` if the amount is strictly above zero.
    #[must_use]
    pub const fn is_positive(self) -> bool {
        self.0 > 0
    }

    /// Checked addition. Returns `None` on overflow.
    #[must_use]
    pub const fn checked_add(self, rhs: Self) -> Option<Self> {
        match self.0.checked_add(rhs.0) {
            Some(sum) => Some(Self(sum)),
            None => None,
        }
    }

    /// Checked subtraction. Returns `None` on overflow.
    #[must_use]
    pub const fn checked_sub(self, rhs: Self) -> Option<Self> {
        match self.0.checked_sub(rhs.0) {
            Some(diff) => Some(Self(diff)),
            None => None,
        }
    }

    /// Saturating addition.
    #[must_use]
    pub const fn saturating_add(self, rhs: Self) -> Self {
        Self(self.0.saturating_add(rhs.0))
    }

    /// Saturating subtraction.
    #[must_use]
    pub const fn saturating_sub(self, rhs: Self) -> Self {
        Self(self.0.saturating_sub(rhs.0))
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} sat", self.0)
    }
}

impl std::ops::Add for Amount {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl std::ops::Sub for Amount {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self(self.0 - rhs.0)
    }
}

impl std::ops::Neg for Amount {
    type Output = Self;

    fn neg(self) -> Self {
        Self(-self.0)
    }
}

impl std::ops::Mul<i64> for Amount {
    type Output = Self;

    fn mul(self, rhs: i64) -> Self {
        Self(self.0 * rhs)
    }
}

// =============================================================================
// NodeId
// =============================================================================

/// Identity of a network participant: a compressed public key.
///
/// Equality, ordering, and hashing are by byte value. The textual form is
/// lowercase hex, which is also the serde representation.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId([u8; NODE_ID_LEN]);

impl NodeId {
    /// Wraps a raw compressed-key byte array.
    #[must_use]
    pub const fn new(bytes: [u8; NODE_ID_LEN]) -> Self {
        Self(bytes)
    }

    /// Borrows the underlying bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; NODE_ID_LEN] {
        &self.0
    }

    /// Returns the underlying bytes by value.
    #[must_use]
    pub const fn to_bytes(self) -> [u8; NODE_ID_LEN] {
        self.0
    }
}

impl From<secp256k1::PublicKey> for NodeId {
    fn from(key: secp256k1::PublicKey) -> Self {
        Self(key.serialize())
    }
}

impl From<&secp256k1::PublicKey> for NodeId {
    fn from(key: &secp256k1::PublicKey) -> Self {
        Self(key.serialize())
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeId({self})")
    }
}

/// Failure to parse a [`NodeId`] from its hex form.
#[derive(Debug, Error, PartialEq)]
pub enum ParseNodeIdError {
    /// The decoded key had the wrong length.
    #[error("node id must be {NODE_ID_LEN} bytes, got {0}")]
    InvalidLength(usize),

    /// The input was not valid hex.
    #[error("node id is not valid hex: {0}")]
    InvalidHex(#[from] hex::FromHexError),
}

impl FromStr for NodeId {
    type Err = ParseNodeIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = hex::decode(s)?;
        let bytes: [u8; NODE_ID_LEN] = bytes
            .try_into()
            .map_err(|rest: Vec<u8>| ParseNodeIdError::InvalidLength(rest.len()))?;
        Ok(Self(bytes))
    }
}

impl Serialize for NodeId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&hex::encode(self.0))
    }
}

impl<'de> Deserialize<'de> for NodeId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}

// =============================================================================
// ChannelId
// =============================================================================

/// Opaque identifier the backing node assigns to each local channel.
///
/// Unique for the lifetime of the channel; never shared by two
/// simultaneously open channels.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct ChannelId(u64);

impl ChannelId {
    /// Wraps a raw channel id.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw id.
    #[must_use]
    pub const fn to_u64(self) -> u64 {
        self.0
    }
}

impl From<u64> for ChannelId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// =============================================================================
// Channel
// =============================================================================

/// One channel the local node participates in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Channel {
    /// Identifier assigned by the backing node.
    pub chan_id: ChannelId,

    /// Total capacity, non-negative.
    pub capacity: Amount,

    /// The remote peer.
    pub node: NodeId,
}
