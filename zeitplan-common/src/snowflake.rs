//! Module for generating and taking apart snowflake IDs.
//!
//! Bit layout, most significant first: 42 bits of milliseconds since the
//! [`Epoch`], 10 bits of node id, 12 bits of per-millisecond sequence.

use derive_where::derive_where;
use serde::{
    Deserialize, Deserializer, Serialize,
    de::{Error, Unexpected},
};
use std::{
    fmt::{Display, Formatter},
    marker::PhantomData,
};
use thiserror::Error;
use time::{Duration, UtcDateTime};

pub const TIMESTAMP_OFFSET: u32 = 22;
pub const TIMESTAMP_LENGTH: u32 = 42;
pub const NODE_ID_OFFSET: u32 = 12;
pub const NODE_ID_LENGTH: u32 = 10;
pub const SEQUENCE_LENGTH: u32 = 12;

const fn mask(length: u32) -> u64 {
    (1 << length) - 1
}

pub trait Epoch {
    const EPOCH_TIME: UtcDateTime;
}

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Hash, Error)]
pub enum SnowflakeTimestampError {
    #[error("Specified time was before the snowflake epoch.")]
    TimeBeforeEpoch,
    #[error("Resulting timestamp uses too many bits.")]
    TimestampTooLarge,
}

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash, Error)]
#[error("Node id does not fit into {NODE_ID_LENGTH} bits: {0}")]
pub struct NodeIdOutOfRangeError(pub u16);

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash, Serialize)]
pub struct NodeId(u16);

impl NodeId {
    #[must_use]
    pub fn new(id: u16) -> Option<Self> {
        (u64::from(id) <= mask(NODE_ID_LENGTH)).then_some(Self(id))
    }

    #[must_use]
    pub fn get(self) -> u16 {
        self.0
    }
}

impl TryFrom<u16> for NodeId {
    type Error = NodeIdOutOfRangeError;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        Self::new(value).ok_or(NodeIdOutOfRangeError(value))
    }
}

impl<'de> Deserialize<'de> for NodeId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let inner = u16::deserialize(deserializer)?;
        Self::new(inner)
            .ok_or_else(|| Error::invalid_value(Unexpected::Unsigned(inner.into()), &"NodeId"))
    }
}

#[derive_where(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash)]
pub struct SnowflakeTimestamp<SnowflakeEpoch>(u64, PhantomData<SnowflakeEpoch>);

impl<SnowflakeEpoch> SnowflakeTimestamp<SnowflakeEpoch> {
    #[must_use]
    pub fn new(millis: u64) -> Option<Self> {
        (millis <= mask(TIMESTAMP_LENGTH)).then_some(Self(millis, PhantomData))
    }

    #[must_use]
    pub fn get(self) -> u64 {
        self.0
    }
}

impl<SnowflakeEpoch: Epoch> TryFrom<UtcDateTime> for SnowflakeTimestamp<SnowflakeEpoch> {
    type Error = SnowflakeTimestampError;

    fn try_from(value: UtcDateTime) -> Result<Self, Self::Error> {
        let millis = (value - SnowflakeEpoch::EPOCH_TIME).whole_milliseconds();
        if millis < 0 {
            return Err(Self::Error::TimeBeforeEpoch);
        }
        let millis = u64::try_from(millis).map_err(|_| Self::Error::TimestampTooLarge)?;
        Self::new(millis).ok_or(Self::Error::TimestampTooLarge)
    }
}

impl<SnowflakeEpoch: Epoch> From<SnowflakeTimestamp<SnowflakeEpoch>> for UtcDateTime {
    fn from(value: SnowflakeTimestamp<SnowflakeEpoch>) -> Self {
        // 42 bits always fit into an i64.
        SnowflakeEpoch::EPOCH_TIME + Duration::milliseconds(value.0.cast_signed())
    }
}

#[derive_where(
    Copy,
    Clone,
    Eq,
    PartialEq,
    Ord,
    PartialOrd,
    Debug,
    Default,
    Hash,
    Serialize,
    Deserialize
)]
#[serde(transparent)]
pub struct Snowflake<SnowflakeEpoch>(u64, #[serde(skip)] PhantomData<SnowflakeEpoch>);

impl<SnowflakeEpoch> Snowflake<SnowflakeEpoch> {
    #[must_use]
    pub fn new(inner: u64) -> Self {
        Self(inner, PhantomData)
    }

    #[must_use]
    pub fn from_parts(
        timestamp: SnowflakeTimestamp<SnowflakeEpoch>,
        node_id: NodeId,
        sequence: u16,
    ) -> Self {
        let snowflake = (timestamp.get() << TIMESTAMP_OFFSET)
            | (u64::from(node_id.get()) << NODE_ID_OFFSET)
            | (u64::from(sequence) & mask(SEQUENCE_LENGTH));

        Self::new(snowflake)
    }

    #[must_use]
    pub fn get(self) -> u64 {
        self.0
    }

    #[must_use]
    pub fn timestamp(self) -> SnowflakeTimestamp<SnowflakeEpoch> {
        SnowflakeTimestamp(self.0 >> TIMESTAMP_OFFSET, PhantomData)
    }

    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn node_id(self) -> NodeId {
        NodeId(((self.0 >> NODE_ID_OFFSET) & mask(NODE_ID_LENGTH)) as u16)
    }

    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn sequence(self) -> u16 {
        (self.0 & mask(SEQUENCE_LENGTH)) as u16
    }
}

impl<SnowflakeEpoch> Display for Snowflake<SnowflakeEpoch> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self.0, f)
    }
}

impl<SnowflakeEpoch> From<u64> for Snowflake<SnowflakeEpoch> {
    fn from(value: u64) -> Self {
        Self::new(value)
    }
}

impl<SnowflakeEpoch> From<Snowflake<SnowflakeEpoch>> for u64 {
    fn from(value: Snowflake<SnowflakeEpoch>) -> Self {
        value.get()
    }
}

/// Hands out strictly increasing snowflakes for one node.
///
/// When the sequence of the current millisecond runs out, or the clock goes
/// backwards, the generator keeps counting on the last timestamp it issued so
/// that no snowflake is ever produced twice.
#[derive_where(Clone, Eq, PartialEq, Debug)]
pub struct SnowflakeGenerator<SnowflakeEpoch> {
    node_id: NodeId,
    last_timestamp: u64,
    next_sequence: u16,
    phantom_data: PhantomData<SnowflakeEpoch>,
}

impl<SnowflakeEpoch> SnowflakeGenerator<SnowflakeEpoch> {
    #[must_use]
    pub fn new(node_id: NodeId) -> Self {
        Self {
            node_id,
            last_timestamp: 0,
            next_sequence: 0,
            phantom_data: PhantomData,
        }
    }

    #[must_use]
    pub fn node_id(&self) -> NodeId {
        self.node_id
    }

    pub fn generate_at(&mut self, time: UtcDateTime) -> Snowflake<SnowflakeEpoch>
    where
        SnowflakeEpoch: Epoch,
    {
        let requested = match SnowflakeTimestamp::<SnowflakeEpoch>::try_from(time) {
            Ok(timestamp) => timestamp.get(),
            Err(SnowflakeTimestampError::TimeBeforeEpoch) => 0,
            Err(SnowflakeTimestampError::TimestampTooLarge) => mask(TIMESTAMP_LENGTH),
        };

        if requested > self.last_timestamp {
            self.last_timestamp = requested;
            self.next_sequence = 0;
        } else if u64::from(self.next_sequence) > mask(SEQUENCE_LENGTH) {
            self.last_timestamp += 1;
            self.next_sequence = 0;
        }

        let sequence = self.next_sequence;
        self.next_sequence += 1;

        Snowflake::from_parts(
            SnowflakeTimestamp(self.last_timestamp, PhantomData),
            self.node_id,
            sequence,
        )
    }

    pub fn generate(&mut self) -> Snowflake<SnowflakeEpoch>
    where
        SnowflakeEpoch: Epoch,
    {
        self.generate_at(UtcDateTime::now())
    }
}
