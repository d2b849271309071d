use std::ops::RangeInclusive;
use thiserror::Error;
use time::{
    OffsetDateTime, PrimitiveDateTime, UtcDateTime, UtcOffset, format_description::well_known::Rfc3339,
};

/// Years an RFC 3339 timestamp can carry, read in UTC.
pub const TIMESTAMP_YEARS: RangeInclusive<i32> = 0..=9999;

#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash, Error)]
#[error("The timestamp is not valid RFC 3339: {0}")]
pub struct InvalidTimestampError(String);

#[must_use]
pub fn to_offset_date_time(value: UtcDateTime) -> OffsetDateTime {
    PrimitiveDateTime::new(value.date(), value.time()).assume_utc()
}

/// `None` if the instant lies outside [`TIMESTAMP_YEARS`] in UTC.
#[must_use]
pub fn from_offset_date_time(value: OffsetDateTime) -> Option<UtcDateTime> {
    let utc = value.checked_to_offset(UtcOffset::UTC)?;
    TIMESTAMP_YEARS
        .contains(&utc.year())
        .then(|| UtcDateTime::new(utc.date(), utc.time()))
}

/// Formats an instant as RFC 3339, keeping sub-second precision.
pub fn format_timestamp(value: UtcDateTime) -> Result<String, InvalidTimestampError> {
    to_offset_date_time(value)
        .format(&Rfc3339)
        .map_err(|_| InvalidTimestampError(value.to_string()))
}

/// Parses RFC 3339 with any offset. Instants outside [`TIMESTAMP_YEARS`] once
/// converted to UTC are rejected.
pub fn parse_timestamp(value: &str) -> Result<UtcDateTime, InvalidTimestampError> {
    OffsetDateTime::parse(value, &Rfc3339)
        .ok()
        .and_then(from_offset_date_time)
        .ok_or_else(|| InvalidTimestampError(value.to_owned()))
}

/// Serde adapter storing a [`UtcDateTime`] as an RFC 3339 string.
pub mod rfc3339 {
    use super::{format_timestamp, parse_timestamp};
    use serde::{Deserialize, Deserializer, Serializer, de::Error as _, ser::Error as _};
    use time::UtcDateTime;

    pub fn serialize<S>(value: &UtcDateTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let text = format_timestamp(*value).map_err(S::Error::custom)?;
        serializer.serialize_str(&text)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<UtcDateTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let inner = String::deserialize(deserializer)?;
        parse_timestamp(&inner).map_err(D::Error::custom)
    }
}
