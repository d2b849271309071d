//! The create/edit form and its checks.
//!
//! Validation happens here, before anything reaches the store. Error messages
//! are the ones shown to the user.

use crate::{
    calendar::{calendar_day, local_to_utc},
    model::post::{NewPost, Post, PostStatus},
    util::to_offset_date_time,
};
use base64::{DecodeError, Engine, prelude::BASE64_STANDARD};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use time::{Date, Time, UtcOffset, macros::format_description};

pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;

#[derive(Clone, Eq, PartialEq, Debug, Error)]
pub enum ComposeError {
    #[error("Please upload an image")]
    MissingImage,
    #[error("Please add a caption")]
    MissingCaption,
    #[error("Please upload an image file")]
    NotAnImage,
    #[error("File size should be less than 5MB")]
    ImageTooLarge(usize),
    #[error("Error reading file: {0}")]
    ImageEncoding(#[from] DecodeError),
    #[error("Invalid date, expected YYYY-MM-DD: {0}")]
    InvalidDate(String),
    #[error("Invalid time, expected HH:MM: {0}")]
    InvalidTime(String),
}

/// Statuses a user can pick in the form. `published` is never offered.
#[derive(
    Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash, Deserialize, Serialize,
)]
#[serde(rename_all = "lowercase")]
pub enum FormStatus {
    Draft,
    #[default]
    Scheduled,
}

impl From<FormStatus> for PostStatus {
    fn from(value: FormStatus) -> Self {
        match value {
            FormStatus::Draft => PostStatus::Draft,
            FormStatus::Scheduled => PostStatus::Scheduled,
        }
    }
}

impl From<PostStatus> for FormStatus {
    fn from(value: PostStatus) -> Self {
        match value {
            PostStatus::Draft => FormStatus::Draft,
            PostStatus::Scheduled | PostStatus::Published => FormStatus::Scheduled,
        }
    }
}

#[derive(Clone, Eq, PartialEq, Debug, Default, Hash, Deserialize, Serialize)]
pub struct PostForm {
    pub image: String,
    pub caption: String,
    /// `YYYY-MM-DD` in the reference zone.
    pub date: String,
    /// `HH:MM` in the reference zone.
    pub time: String,
    #[serde(default)]
    pub status: FormStatus,
}

impl PostForm {
    /// Prefills the form for editing an existing post.
    #[must_use]
    pub fn from_post(post: &Post, zone: UtcOffset) -> Self {
        let date = calendar_day(post.scheduled_date, zone)
            .format(format_description!("[year]-[month]-[day]"))
            .unwrap_or_default();
        let time = to_offset_date_time(post.scheduled_date)
            .checked_to_offset(zone)
            .map_or(post.scheduled_date.time(), |local| local.time())
            .format(format_description!("[hour]:[minute]"))
            .unwrap_or_default();

        Self {
            image: post.image.clone(),
            caption: post.caption.clone(),
            date,
            time,
            status: post.status.into(),
        }
    }

    pub fn validate(self, zone: UtcOffset) -> Result<NewPost, ComposeError> {
        if self.image.is_empty() {
            return Err(ComposeError::MissingImage);
        }
        if self.caption.is_empty() {
            return Err(ComposeError::MissingCaption);
        }
        check_image(&self.image)?;

        let date = Date::parse(&self.date, format_description!("[year]-[month]-[day]"))
            .map_err(|_| ComposeError::InvalidDate(self.date.clone()))?;
        let time = Time::parse(&self.time, format_description!("[hour]:[minute]"))
            .map_err(|_| ComposeError::InvalidTime(self.time.clone()))?;

        let scheduled_date = local_to_utc(date, time, zone)
            .map_err(|_| ComposeError::InvalidDate(self.date.clone()))?;

        Ok(NewPost {
            image: self.image,
            caption: self.caption,
            scheduled_date,
            status: self.status.into(),
        })
    }
}

/// Accepts remote URLs as-is and base64 `data:image/*` URLs up to
/// [`MAX_IMAGE_BYTES`] of decoded payload.
pub fn check_image(image: &str) -> Result<(), ComposeError> {
    if image.starts_with("https://") || image.starts_with("http://") {
        return Ok(());
    }

    let (mime, payload) = image
        .strip_prefix("data:")
        .and_then(|rest| rest.split_once(','))
        .and_then(|(header, payload)| Some((header.strip_suffix(";base64")?, payload)))
        .ok_or(ComposeError::NotAnImage)?;
    if !mime.starts_with("image/") {
        return Err(ComposeError::NotAnImage);
    }

    let decoded_len = BASE64_STANDARD.decode(payload)?.len();
    if decoded_len > MAX_IMAGE_BYTES {
        return Err(ComposeError::ImageTooLarge(decoded_len));
    }

    Ok(())
}
