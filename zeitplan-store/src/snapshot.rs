use serde::{Deserialize, Serialize};
use time::{Date, UtcOffset};
use zeitplan_common::{
    calendar::calendar_day,
    model::{
        Id,
        analytics::AnalyticsData,
        post::{Post, PostMarker, PostPatch},
    },
};

/// How `AnalyticsData::scheduled` follows the collection.
#[derive(
    Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash, Deserialize, Serialize,
)]
#[serde(rename_all = "lowercase")]
pub enum ScheduledCounter {
    /// +1 on every add and -1 on every delete, whatever the status and even
    /// for unknown ids. Updates never touch it. Drifts from the real count.
    #[default]
    Incremental,
    /// Recounted from the posts with status `scheduled` after every change.
    Derived,
}

impl ScheduledCounter {
    fn settle(self, analytics: AnalyticsData, posts: &[Post], delta: i64) -> AnalyticsData {
        match self {
            ScheduledCounter::Incremental => {
                analytics.with_scheduled(analytics.scheduled.saturating_add(delta))
            }
            ScheduledCounter::Derived => {
                analytics.with_scheduled(AnalyticsData::count_scheduled(posts))
            }
        }
    }
}

/// One immutable state of the store.
///
/// Mutations never change a snapshot; the `with_*` transitions build the next
/// one, leaving every reader of the old snapshot with a consistent view.
#[derive(Clone, PartialEq, Debug, Default, Deserialize, Serialize)]
pub struct StoreSnapshot {
    posts: Vec<Post>,
    analytics: AnalyticsData,
}

impl StoreSnapshot {
    #[must_use]
    pub fn new(posts: Vec<Post>, analytics: AnalyticsData) -> Self {
        Self { posts, analytics }
    }

    /// A fresh state holding `posts` and the default aggregate.
    #[must_use]
    pub fn seeded(posts: Vec<Post>, counter: ScheduledCounter) -> Self {
        let analytics = counter.settle(AnalyticsData::default(), &posts, 0);
        Self { posts, analytics }
    }

    /// Insertion order.
    #[must_use]
    pub fn posts(&self) -> &[Post] {
        &self.posts
    }

    #[must_use]
    pub fn analytics(&self) -> AnalyticsData {
        self.analytics
    }

    #[must_use]
    pub fn find(&self, id: Id<PostMarker>) -> Option<&Post> {
        self.posts.iter().find(|post| post.id == id)
    }

    /// Posts due on `day` in `zone`, in insertion order.
    #[must_use]
    pub fn posts_on(&self, day: Date, zone: UtcOffset) -> Vec<Post> {
        self.posts
            .iter()
            .filter(|post| calendar_day(post.scheduled_date, zone) == day)
            .cloned()
            .collect()
    }

    #[must_use]
    pub fn with_post_added(&self, post: Post, counter: ScheduledCounter) -> Self {
        let mut posts = self.posts.clone();
        posts.push(post);
        let analytics = counter.settle(self.analytics, &posts, 1);

        Self { posts, analytics }
    }

    /// `None` if no post has `id`.
    #[must_use]
    pub fn with_post_updated(
        &self,
        id: Id<PostMarker>,
        patch: PostPatch,
        counter: ScheduledCounter,
    ) -> Option<(Self, Post)> {
        let index = self.posts.iter().position(|post| post.id == id)?;

        let mut posts = self.posts.clone();
        posts[index].apply(patch);
        let updated = posts[index].clone();
        let analytics = counter.settle(self.analytics, &posts, 0);

        Some((Self { posts, analytics }, updated))
    }

    /// Always yields a next state, since the incremental counter moves even
    /// when `id` is unknown.
    #[must_use]
    pub fn with_post_deleted(
        &self,
        id: Id<PostMarker>,
        counter: ScheduledCounter,
    ) -> (Self, Option<Post>) {
        let mut posts = self.posts.clone();
        let removed = posts
            .iter()
            .position(|post| post.id == id)
            .map(|index| posts.remove(index));
        let analytics = counter.settle(self.analytics, &posts, -1);

        (Self { posts, analytics }, removed)
    }
}
