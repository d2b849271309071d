use time::{Duration, UtcDateTime};
use zeitplan_common::model::{
    ZeitplanSnowflakeGenerator,
    post::{NewPost, Post, PostStatus},
};

pub const SAMPLE_POST_COUNT: usize = 10;

const SAMPLE_IMAGES: [&str; 5] = [
    "https://images.unsplash.com/photo-1513151233558-d860c5398176?q=80&w=500&auto=format&fit=crop",
    "https://images.unsplash.com/photo-1516483638261-f4dbaf036963?q=80&w=500&auto=format&fit=crop",
    "https://images.unsplash.com/photo-1499678329028-101435549a4e?q=80&w=500&auto=format&fit=crop",
    "https://images.unsplash.com/photo-1517760444937-f6397edcbbcd?q=80&w=500&auto=format&fit=crop",
    "https://images.unsplash.com/photo-1534274988757-a28bf1a57c17?q=80&w=500&auto=format&fit=crop",
];

const SAMPLE_CAPTIONS: [&str; 5] = [
    "Enjoying the beautiful sunset view! #sunset #views",
    "Exploring new places today! #travel #adventure",
    "Morning coffee vibes ☕ #coffee #morning",
    "Weekend getaway with friends! #weekend #friends",
    "New product launch coming soon! #newproduct #launch",
];

/// Sample content for a store that has never been saved.
///
/// Post `i` is due `i` days after `now` and is `published` every third index
/// starting at 0, `scheduled` otherwise.
pub fn sample_posts(now: UtcDateTime, ids: &mut ZeitplanSnowflakeGenerator) -> Vec<Post> {
    (0..SAMPLE_POST_COUNT)
        .zip(0_i64..)
        .map(|(index, days)| {
            let status = if index % 3 == 0 {
                PostStatus::Published
            } else {
                PostStatus::Scheduled
            };
            let post = NewPost {
                image: SAMPLE_IMAGES[index % SAMPLE_IMAGES.len()].to_owned(),
                caption: SAMPLE_CAPTIONS[index % SAMPLE_CAPTIONS.len()].to_owned(),
                scheduled_date: now + Duration::days(days),
                status,
            };

            Post::from_new(ids.generate_at(now).into(), post, now)
        })
        .collect()
}
