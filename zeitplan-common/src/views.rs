//! Read-only groupings the list and overview pages render.
//!
//! None of these touch the store; they take whatever slice of posts the
//! caller holds and return sorted copies.

use crate::model::post::{Post, PostStatus};
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;

/// Number of posts on the overview page.
pub const RECENT_POSTS: usize = 4;

/// Posts split into the three list tabs.
#[derive(Clone, Eq, PartialEq, Debug, Default, Hash, Deserialize, Serialize)]
pub struct PostBoard {
    /// Earliest due first.
    pub scheduled: Vec<Post>,
    /// Latest first.
    pub published: Vec<Post>,
    /// Most recently created first.
    pub drafts: Vec<Post>,
}

impl PostBoard {
    #[must_use]
    pub fn from_posts(posts: &[Post]) -> Self {
        let mut board = Self::default();
        for post in posts {
            match post.status {
                PostStatus::Scheduled => board.scheduled.push(post.clone()),
                PostStatus::Published => board.published.push(post.clone()),
                PostStatus::Draft => board.drafts.push(post.clone()),
            }
        }

        board.scheduled.sort_by_key(|post| post.scheduled_date);
        board
            .published
            .sort_by_key(|post| Reverse(post.scheduled_date));
        board.drafts.sort_by_key(|post| Reverse(post.created_at));

        board
    }
}

/// The `limit` posts with the latest scheduled date, latest first.
#[must_use]
pub fn recent_posts(posts: &[Post], limit: usize) -> Vec<Post> {
    let mut sorted = posts.to_vec();
    sorted.sort_by_key(|post| Reverse(post.scheduled_date));
    sorted.truncate(limit);
    sorted
}

#[cfg(test)]
mod tests {
    use crate::{
        model::{
            Id,
            post::{NewPost, Post, PostStatus},
        },
        views::{PostBoard, recent_posts},
    };
    use time::{Duration, UtcDateTime, macros::utc_datetime};

    const BASE: UtcDateTime = utc_datetime!(2024-01-01 12:00);

    fn post(id: u64, status: PostStatus, due_in_days: i64, created_in_hours: i64) -> Post {
        Post::from_new(
            Id::from(id),
            NewPost {
                image: format!("https://example.com/{id}.jpg"),
                caption: format!("post {id}"),
                scheduled_date: BASE + Duration::days(due_in_days),
                status,
            },
            BASE + Duration::hours(created_in_hours),
        )
    }

    fn ids(posts: &[Post]) -> Vec<u64> {
        posts.iter().map(|post| post.id.into()).collect()
    }

    #[test]
    fn board_partitions_and_sorts() {
        let posts = [
            post(1, PostStatus::Scheduled, 5, 0),
            post(2, PostStatus::Published, -3, 1),
            post(3, PostStatus::Draft, 9, 2),
            post(4, PostStatus::Scheduled, 1, 3),
            post(5, PostStatus::Published, -1, 4),
            post(6, PostStatus::Draft, 2, 5),
        ];

        let board = PostBoard::from_posts(&posts);

        assert_eq!(ids(&board.scheduled), [4, 1]);
        assert_eq!(ids(&board.published), [5, 2]);
        assert_eq!(ids(&board.drafts), [6, 3]);
    }

    #[test]
    fn empty_board() {
        assert_eq!(PostBoard::from_posts(&[]), PostBoard::default());
    }

    #[test]
    fn recent_posts_are_latest_scheduled() {
        let posts: Vec<_> = (0_i64..6)
            .map(|day| post(day.cast_unsigned(), PostStatus::Scheduled, day, 0))
            .collect();

        assert_eq!(ids(&recent_posts(&posts, 4)), [5, 4, 3, 2]);
        assert_eq!(recent_posts(&posts[..2], 4).len(), 2);
    }
}
