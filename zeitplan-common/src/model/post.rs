use crate::{model::Id, util::rfc3339};
use serde::{Deserialize, Serialize};
use std::{
    fmt::{Display, Formatter},
    str::FromStr,
};
use thiserror::Error;
use time::UtcDateTime;

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash)]
pub struct PostMarker;

#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash, Error)]
#[error("Unknown post status: {0}")]
pub struct InvalidPostStatusError(String);

#[derive(
    Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash, Deserialize, Serialize,
)]
#[serde(rename_all = "lowercase")]
pub enum PostStatus {
    Draft,
    #[default]
    Scheduled,
    Published,
}

impl PostStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            PostStatus::Draft => "draft",
            PostStatus::Scheduled => "scheduled",
            PostStatus::Published => "published",
        }
    }
}

impl Display for PostStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PostStatus {
    type Err = InvalidPostStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(PostStatus::Draft),
            "scheduled" => Ok(PostStatus::Scheduled),
            "published" => Ok(PostStatus::Published),
            other => Err(InvalidPostStatusError(other.to_owned())),
        }
    }
}

#[derive(Clone, Eq, PartialEq, Debug, Hash, Deserialize, Serialize)]
pub struct Post {
    pub id: Id<PostMarker>,
    /// Data URL or remote URL; never inspected by the store.
    pub image: String,
    pub caption: String,
    #[serde(with = "rfc3339")]
    pub scheduled_date: UtcDateTime,
    pub status: PostStatus,
    #[serde(with = "rfc3339")]
    pub created_at: UtcDateTime,
}

/// The caller-supplied part of a [`Post`].
#[derive(Clone, Eq, PartialEq, Debug, Hash, Deserialize, Serialize)]
pub struct NewPost {
    pub image: String,
    pub caption: String,
    #[serde(with = "rfc3339")]
    pub scheduled_date: UtcDateTime,
    pub status: PostStatus,
}

/// A partial update. `None` fields are left untouched.
///
/// `id` and `created_at` cannot be patched; neither changes after creation.
#[derive(Clone, Eq, PartialEq, Debug, Default, Hash, Deserialize, Serialize)]
pub struct PostPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "optional_rfc3339"
    )]
    pub scheduled_date: Option<UtcDateTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<PostStatus>,
}

impl Post {
    #[must_use]
    pub fn from_new(id: Id<PostMarker>, post: NewPost, created_at: UtcDateTime) -> Self {
        let NewPost {
            image,
            caption,
            scheduled_date,
            status,
        } = post;

        Self {
            id,
            image,
            caption,
            scheduled_date,
            status,
            created_at,
        }
    }

    pub fn apply(&mut self, patch: PostPatch) {
        let PostPatch {
            image,
            caption,
            scheduled_date,
            status,
        } = patch;

        if let Some(image) = image {
            self.image = image;
        }
        if let Some(caption) = caption {
            self.caption = caption;
        }
        if let Some(scheduled_date) = scheduled_date {
            self.scheduled_date = scheduled_date;
        }
        if let Some(status) = status {
            self.status = status;
        }
    }
}

impl PostPatch {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.image.is_none()
            && self.caption.is_none()
            && self.scheduled_date.is_none()
            && self.status.is_none()
    }
}

impl From<NewPost> for PostPatch {
    fn from(value: NewPost) -> Self {
        Self {
            image: Some(value.image),
            caption: Some(value.caption),
            scheduled_date: Some(value.scheduled_date),
            status: Some(value.status),
        }
    }
}

mod optional_rfc3339 {
    use crate::util::{format_timestamp, parse_timestamp};
    use serde::{Deserialize, Deserializer, Serializer, de::Error as _, ser::Error as _};
    use time::UtcDateTime;

    #[allow(clippy::ref_option)]
    pub fn serialize<S>(value: &Option<UtcDateTime>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(value) => {
                let text = format_timestamp(*value).map_err(S::Error::custom)?;
                serializer.serialize_some(&text)
            }
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<UtcDateTime>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Option::<String>::deserialize(deserializer)?
            .map(|inner| parse_timestamp(&inner).map_err(D::Error::custom))
            .transpose()
    }
}

#[cfg(test)]
mod tests {
    use crate::model::{
        Id,
        post::{NewPost, Post, PostPatch, PostStatus},
    };
    use time::macros::utc_datetime;

    fn sample() -> Post {
        Post::from_new(
            Id::from(42_u64),
            NewPost {
                image: "https://example.com/a.jpg".to_owned(),
                caption: "Morning coffee".to_owned(),
                scheduled_date: utc_datetime!(2024-01-05 09:00),
                status: PostStatus::Scheduled,
            },
            utc_datetime!(2024-01-01 12:00),
        )
    }

    #[test]
    fn status_strings() {
        for status in [PostStatus::Draft, PostStatus::Scheduled, PostStatus::Published] {
            assert_eq!(status.as_str().parse::<PostStatus>(), Ok(status));
        }
        assert!("archived".parse::<PostStatus>().is_err());
        assert!("Draft".parse::<PostStatus>().is_err());
    }

    #[test]
    fn patch_only_touches_given_fields() {
        let original = sample();
        let mut post = original.clone();

        post.apply(PostPatch {
            caption: Some("x".to_owned()),
            ..PostPatch::default()
        });

        assert_eq!(post.caption, "x");
        assert_eq!(post.id, original.id);
        assert_eq!(post.created_at, original.created_at);
        assert_eq!(post.image, original.image);
        assert_eq!(post.scheduled_date, original.scheduled_date);
        assert_eq!(post.status, original.status);
    }

    #[test]
    fn empty_patch_is_a_no_op() {
        let original = sample();
        let mut post = original.clone();
        let patch = PostPatch::default();

        assert!(patch.is_empty());
        post.apply(patch);
        assert_eq!(post, original);
    }

    #[test]
    fn patch_json_accepts_missing_fields() {
        let patch: PostPatch =
            serde_json::from_str(r#"{"status":"draft","scheduled_date":"2024-01-06T10:00:00Z"}"#)
                .unwrap();

        assert_eq!(patch.status, Some(PostStatus::Draft));
        assert_eq!(patch.scheduled_date, Some(utc_datetime!(2024-01-06 10:00)));
        assert!(patch.caption.is_none());
        assert!(patch.image.is_none());
    }

    #[test]
    fn patch_json_rejects_dates_past_year_9999() {
        let patch = serde_json::from_str::<PostPatch>(
            r#"{"scheduled_date":"9999-12-31T23:30:00-02:00"}"#,
        );

        assert!(patch.is_err());
    }

    #[test]
    fn post_json_uses_text_timestamps() {
        let json = serde_json::to_value(sample()).unwrap();

        assert_eq!(json["scheduled_date"], "2024-01-05T09:00:00Z");
        assert_eq!(json["created_at"], "2024-01-01T12:00:00Z");
        assert_eq!(json["status"], "scheduled");
        assert_eq!(json["id"], 42);
    }
}
