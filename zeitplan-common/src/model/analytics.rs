use crate::model::post::{Post, PostStatus};
use serde::{Deserialize, Serialize};

/// Summary figures shown next to the post list.
///
/// Only `scheduled` ever changes; the other three are seeded display values.
/// `scheduled` is signed because the incremental counter can be decremented
/// for posts that never existed.
#[derive(Copy, Clone, PartialEq, PartialOrd, Debug, Deserialize, Serialize)]
pub struct AnalyticsData {
    pub scheduled: i64,
    pub published: i64,
    /// Percentage.
    pub engagement: f64,
    /// Percentage, relative to the previous month.
    pub growth: f64,
}

impl Default for AnalyticsData {
    fn default() -> Self {
        Self {
            scheduled: 14,
            published: 28,
            engagement: 8.7,
            growth: 3.2,
        }
    }
}

impl AnalyticsData {
    #[must_use]
    pub fn with_scheduled(self, scheduled: i64) -> Self {
        Self { scheduled, ..self }
    }

    #[must_use]
    pub fn count_scheduled(posts: &[Post]) -> i64 {
        let count = posts
            .iter()
            .filter(|post| post.status == PostStatus::Scheduled)
            .count();
        i64::try_from(count).unwrap_or(i64::MAX)
    }
}
