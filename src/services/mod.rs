// Service exports
pub mod kv;
pub mod postgres;
pub mod profiles;
pub mod relay;
pub mod submissions;

pub use kv::{KeyValueStore, MemoryStore, RedisStore, StoreError};
pub use postgres::{PostgresSubmissionStore, StatusColumn};
pub use profiles::{PersistenceClient, StoreKey};
pub use relay::{RelayError, SubmissionClient};
pub use submissions::{MemorySubmissionStore, SubmissionStore, SubmissionStoreError};
