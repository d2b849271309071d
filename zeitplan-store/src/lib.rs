pub mod record;
pub mod seed;
pub mod snapshot;
pub mod storage;
pub mod store;

pub use snapshot::{ScheduledCounter, StoreSnapshot};
pub use storage::{FileStorage, MemoryStorage, StateStorage, StorageError};
pub use store::{PostStore, StoreConfig};
