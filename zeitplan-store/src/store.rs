use crate::{
    record::{RecordError, decode_state, encode_state},
    seed::sample_posts,
    snapshot::{ScheduledCounter, StoreSnapshot},
    storage::{StateStorage, StorageError},
};
use std::{
    fmt::{Debug, Formatter},
    sync::Arc,
};
use thiserror::Error;
use time::{Date, Month, UtcDateTime, UtcOffset};
use tracing::{debug, info, warn};
use zeitplan_common::{
    calendar::{CalendarError, CalendarMonth, calendar_day},
    model::{
        Id, ZeitplanSnowflakeGenerator,
        analytics::AnalyticsData,
        post::{NewPost, Post, PostMarker, PostPatch},
    },
    snowflake::NodeId,
};

pub const DEFAULT_STORAGE_KEY: &str = "instagram-scheduler";

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Record(#[from] RecordError),
}

#[derive(Clone, Eq, PartialEq, Debug, Hash)]
pub struct StoreConfig {
    /// Storage key the whole state is saved under.
    pub key: String,
    /// Zone in which calendar days are cut.
    pub zone: UtcOffset,
    pub scheduled_counter: ScheduledCounter,
    pub node_id: NodeId,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            key: DEFAULT_STORAGE_KEY.to_owned(),
            zone: UtcOffset::UTC,
            scheduled_counter: ScheduledCounter::default(),
            node_id: NodeId::default(),
        }
    }
}

pub trait Clock: Send + Sync {
    fn now(&self) -> UtcDateTime;
}

#[derive(Copy, Clone, Eq, PartialEq, Debug, Default, Hash)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> UtcDateTime {
        UtcDateTime::now()
    }
}

/// A clock stuck at one instant.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Hash)]
pub struct FixedClock(pub UtcDateTime);

impl Clock for FixedClock {
    fn now(&self) -> UtcDateTime {
        self.0
    }
}

type Listener = Box<dyn Fn(&Arc<StoreSnapshot>) + Send + Sync>;

/// The post collection and its analytics aggregate.
///
/// Construct one with [`PostStore::open`] at startup and hand it to whoever
/// needs it. Every mutation swaps in a new [`StoreSnapshot`], writes it through
/// to storage, then notifies subscribers. Storage failures are logged and
/// otherwise ignored; no operation on the store fails.
///
/// If the storage cannot be read at all when opening, the store runs on
/// sample posts and never writes, leaving whatever is stored untouched.
pub struct PostStore {
    config: StoreConfig,
    storage: Box<dyn StateStorage>,
    clock: Box<dyn Clock>,
    ids: ZeitplanSnowflakeGenerator,
    snapshot: Arc<StoreSnapshot>,
    listeners: Vec<Listener>,
    write_through: bool,
}

impl PostStore {
    /// Loads the persisted state, or seeds sample posts if there is none.
    #[must_use]
    pub fn open<S>(storage: S, config: StoreConfig) -> Self
    where
        S: StateStorage + 'static,
    {
        Self::open_with_clock(storage, config, SystemClock)
    }

    #[must_use]
    pub fn open_with_clock<S, C>(storage: S, config: StoreConfig, clock: C) -> Self
    where
        S: StateStorage + 'static,
        C: Clock + 'static,
    {
        let ids = ZeitplanSnowflakeGenerator::new(config.node_id);
        let mut store = Self {
            config,
            storage: Box::new(storage),
            clock: Box::new(clock),
            ids,
            snapshot: Arc::default(),
            listeners: Vec::new(),
            write_through: true,
        };

        match store.load() {
            Ok(Some(snapshot)) => {
                info!(
                    key = %store.config.key,
                    posts = snapshot.posts().len(),
                    "Loaded persisted posts"
                );
                store.snapshot = Arc::new(snapshot);
            }
            Ok(None) => {
                info!(key = %store.config.key, "No persisted state, seeding sample posts");
                store.reset();
            }
            Err(PersistenceError::Storage(error)) => {
                warn!(
                    key = %store.config.key,
                    %error,
                    "Storage unreadable, using sample posts without saving"
                );
                store.write_through = false;
                store.reset();
            }
            Err(PersistenceError::Record(error)) => {
                warn!(
                    key = %store.config.key,
                    %error,
                    "Persisted state invalid, replacing it with sample posts"
                );
                store.reset();
            }
        }

        store
    }

    fn load(&self) -> Result<Option<StoreSnapshot>, PersistenceError> {
        let Some(blob) = self.storage.load(&self.config.key)? else {
            return Ok(None);
        };
        Ok(Some(decode_state(&blob)?))
    }

    fn persist(&self) -> Result<(), PersistenceError> {
        let blob = encode_state(&self.snapshot)?;
        self.storage.save(&self.config.key, &blob)?;
        Ok(())
    }

    fn commit(&mut self, next: StoreSnapshot) {
        self.snapshot = Arc::new(next);

        if self.write_through {
            if let Err(error) = self.persist() {
                warn!(key = %self.config.key, %error, "Failed to persist posts");
            }
        } else {
            debug!(key = %self.config.key, "Storage unreadable, not persisting");
        }
        for listener in &self.listeners {
            listener(&self.snapshot);
        }
    }

    /// Throws away all posts and starts over from the sample set.
    pub fn reset(&mut self) {
        let now = self.clock.now();
        let posts = sample_posts(now, &mut self.ids);
        self.commit(StoreSnapshot::seeded(posts, self.config.scheduled_counter));
    }

    /// Registers a callback run with every new snapshot, after it is saved.
    pub fn subscribe<F>(&mut self, listener: F)
    where
        F: Fn(&Arc<StoreSnapshot>) + Send + Sync + 'static,
    {
        self.listeners.push(Box::new(listener));
    }

    /// `false` once opening failed to read the storage.
    #[must_use]
    pub fn writes_through(&self) -> bool {
        self.write_through
    }

    #[must_use]
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    #[must_use]
    pub fn snapshot(&self) -> Arc<StoreSnapshot> {
        Arc::clone(&self.snapshot)
    }

    #[must_use]
    pub fn get_all_posts(&self) -> &[Post] {
        self.snapshot.posts()
    }

    #[must_use]
    pub fn analytics(&self) -> AnalyticsData {
        self.snapshot.analytics()
    }

    #[must_use]
    pub fn find_post(&self, id: Id<PostMarker>) -> Option<&Post> {
        self.snapshot.find(id)
    }

    /// Posts due on the same calendar day as `date`, whatever its time of day.
    #[must_use]
    pub fn get_posts_by_date(&self, date: UtcDateTime) -> Vec<Post> {
        self.posts_on(calendar_day(date, self.config.zone))
    }

    #[must_use]
    pub fn posts_on(&self, day: Date) -> Vec<Post> {
        self.snapshot.posts_on(day, self.config.zone)
    }

    #[must_use]
    pub fn today(&self) -> Date {
        calendar_day(self.clock.now(), self.config.zone)
    }

    pub fn calendar_month(
        &self,
        year: i32,
        month: Month,
        today: Date,
    ) -> Result<CalendarMonth, CalendarError> {
        CalendarMonth::build(year, month, today, |day| self.posts_on(day))
    }

    /// Stores a new post. Under [`ScheduledCounter::Incremental`] the
    /// scheduled counter goes up by one no matter the post's status.
    pub fn add_post(&mut self, post: NewPost) -> Post {
        let now = self.clock.now();
        let mut id = self.ids.generate_at(now).into();
        while self.snapshot.find(id).is_some() {
            id = self.ids.generate_at(now).into();
        }

        let post = Post::from_new(id, post, now);
        debug!(id = %post.id, status = %post.status, "Adding post");
        let next = self
            .snapshot
            .with_post_added(post.clone(), self.config.scheduled_counter);
        self.commit(next);

        post
    }

    /// Merges `patch` into the post with `id`. Unknown ids are ignored.
    pub fn update_post(&mut self, id: Id<PostMarker>, patch: PostPatch) -> Option<Post> {
        let counter = self.config.scheduled_counter;
        let Some((next, updated)) = self.snapshot.with_post_updated(id, patch, counter) else {
            debug!(%id, "Ignoring update of unknown post");
            return None;
        };

        debug!(%id, "Updated post");
        self.commit(next);
        Some(updated)
    }

    /// Removes the post with `id`. Under [`ScheduledCounter::Incremental`]
    /// the scheduled counter goes down by one even if `id` is unknown.
    pub fn delete_post(&mut self, id: Id<PostMarker>) -> Option<Post> {
        let (next, removed) = self
            .snapshot
            .with_post_deleted(id, self.config.scheduled_counter);
        if removed.is_none() {
            debug!(%id, "Deleting unknown post");
        } else {
            debug!(%id, "Deleted post");
        }
        self.commit(next);

        removed
    }
}

impl Debug for PostStore {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PostStore")
            .field("config", &self.config)
            .field("posts", &self.snapshot.posts().len())
            .field("listeners", &self.listeners.len())
            .field("write_through", &self.write_through)
            .finish_non_exhaustive()
    }
}
