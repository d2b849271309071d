//! On-disk layout of the persisted store.
//!
//! The blob is one JSON document:
//! `{"state": {"posts": [...], "analytics": {...}}, "version": 0}`.
//! Dates are RFC 3339 strings and are validated on the way back in.

use crate::snapshot::StoreSnapshot;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;
use zeitplan_common::{
    model::{ModelValidationError, analytics::AnalyticsData, post::Post},
    util::{format_timestamp, parse_timestamp},
};

pub const STATE_VERSION: u32 = 0;

#[derive(Debug, Error)]
pub enum RecordError {
    #[error("Persisted state is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("A persisted post was invalid: {0}")]
    Data(#[from] ModelValidationError),
    #[error("Persisted state has version {0}, newest supported is {STATE_VERSION}")]
    UnsupportedVersion(u32),
    #[error("Persisted state contains post id {0} more than once")]
    DuplicateId(u64),
}

#[derive(Clone, PartialEq, Debug, Deserialize, Serialize)]
struct EnvelopeRecord {
    state: StateRecord,
    #[serde(default)]
    version: u32,
}

#[derive(Clone, PartialEq, Debug, Deserialize, Serialize)]
struct StateRecord {
    posts: Vec<PostRecord>,
    #[serde(default)]
    analytics: AnalyticsData,
}

#[derive(Clone, Eq, PartialEq, Debug, Hash, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
struct PostRecord {
    id: u64,
    image: String,
    caption: String,
    scheduled_date: String,
    status: String,
    created_at: String,
}

impl TryFrom<&Post> for PostRecord {
    type Error = ModelValidationError;

    fn try_from(value: &Post) -> Result<Self, Self::Error> {
        Ok(Self {
            id: value.id.into(),
            image: value.image.clone(),
            caption: value.caption.clone(),
            scheduled_date: format_timestamp(value.scheduled_date)?,
            status: value.status.to_string(),
            created_at: format_timestamp(value.created_at)?,
        })
    }
}

impl TryFrom<PostRecord> for Post {
    type Error = ModelValidationError;

    fn try_from(value: PostRecord) -> Result<Self, Self::Error> {
        Ok(Self {
            id: value.id.into(),
            image: value.image,
            caption: value.caption,
            scheduled_date: parse_timestamp(&value.scheduled_date)?,
            status: value.status.parse()?,
            created_at: parse_timestamp(&value.created_at)?,
        })
    }
}

pub fn encode_state(snapshot: &StoreSnapshot) -> Result<String, RecordError> {
    let envelope = EnvelopeRecord {
        state: StateRecord {
            posts: snapshot
                .posts()
                .iter()
                .map(PostRecord::try_from)
                .collect::<Result<_, _>>()?,
            analytics: snapshot.analytics(),
        },
        version: STATE_VERSION,
    };

    Ok(serde_json::to_string(&envelope)?)
}

pub fn decode_state(blob: &str) -> Result<StoreSnapshot, RecordError> {
    let envelope: EnvelopeRecord = serde_json::from_str(blob)?;
    if envelope.version > STATE_VERSION {
        return Err(RecordError::UnsupportedVersion(envelope.version));
    }

    let mut seen = HashSet::with_capacity(envelope.state.posts.len());
    let posts = envelope
        .state
        .posts
        .into_iter()
        .map(|record| {
            if !seen.insert(record.id) {
                return Err(RecordError::DuplicateId(record.id));
            }
            Ok(Post::try_from(record)?)
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(StoreSnapshot::new(posts, envelope.state.analytics))
}
