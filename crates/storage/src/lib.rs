#![forbid(unsafe_code)]

pub mod repository;
pub mod sqlite;

pub use repository::{GoalRecord, InMemoryKvStore, KeyValueStore, StorageError};
pub use sqlite::{SqliteInitError, SqliteKvStore};
