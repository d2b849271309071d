pub mod analytics;
pub mod post;

use crate::{
    model::post::InvalidPostStatusError,
    snowflake::{Epoch, Snowflake, SnowflakeGenerator},
    util::InvalidTimestampError,
};
use serde::{Deserialize, Serialize};
use std::{fmt::Display, marker::PhantomData};
use thiserror::Error;
use time::{UtcDateTime, macros::utc_datetime};

#[derive(Clone, Eq, PartialEq, Debug, Hash, Error)]
pub enum ModelValidationError {
    #[error(transparent)]
    PostStatus(#[from] InvalidPostStatusError),
    #[error(transparent)]
    Timestamp(#[from] InvalidTimestampError),
}

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash)]
pub struct ZeitplanEpoch;
impl Epoch for ZeitplanEpoch {
    const EPOCH_TIME: UtcDateTime = utc_datetime!(2025-01-01 00:00);
}

pub type ZeitplanSnowflake = Snowflake<ZeitplanEpoch>;
pub type ZeitplanSnowflakeGenerator = SnowflakeGenerator<ZeitplanEpoch>;

#[derive(
    Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Id<Marker>(ZeitplanSnowflake, #[serde(skip)] PhantomData<Marker>);

impl<Marker> Id<Marker> {
    #[must_use]
    pub fn new(snowflake: ZeitplanSnowflake) -> Self {
        Self(snowflake, PhantomData)
    }

    #[must_use]
    pub fn snowflake(self) -> ZeitplanSnowflake {
        self.0
    }
}

impl<Marker> Display for Id<Marker> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self.0, f)
    }
}

impl<Marker> From<ZeitplanSnowflake> for Id<Marker> {
    fn from(value: ZeitplanSnowflake) -> Self {
        Self::new(value)
    }
}

impl<Marker> From<u64> for Id<Marker> {
    fn from(value: u64) -> Self {
        Id::new(ZeitplanSnowflake::new(value))
    }
}

impl<Marker> From<Id<Marker>> for u64 {
    fn from(value: Id<Marker>) -> Self {
        value.snowflake().get()
    }
}
