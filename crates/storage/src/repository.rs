use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

use finedu_core::model::{Goal, GoalId, GoalPeriod};

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Namespaced durable scalar storage.
///
/// The contract mirrors a mobile preferences store: typed get/put of
/// strings, integers, and floats, grouped under a namespace per local user.
/// Writes are durable enough that a subsequent read within the same process
/// reflects them.
///
/// The typed accessors have provided implementations over the string ones;
/// backends only need to move strings in and out.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Fetch a string value, or `None` if the key was never written.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be read.
    async fn get_string(&self, namespace: &str, key: &str) -> Result<Option<String>, StorageError>;

    /// Durably write a string value.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the write does not complete; callers must
    /// treat the mutation as uncommitted in that case.
    async fn put_string(
        &self,
        namespace: &str,
        key: &str,
        value: &str,
    ) -> Result<(), StorageError>;

    /// Fetch an integer value, falling back to `default` for absent keys.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Serialization` if a stored value is not an
    /// integer.
    async fn get_i64(&self, namespace: &str, key: &str, default: i64) -> Result<i64, StorageError> {
        match self.get_string(namespace, key).await? {
            None => Ok(default),
            Some(raw) => raw
                .parse()
                .map_err(|_| StorageError::Serialization(format!("{key}: not an integer: {raw}"))),
        }
    }

    /// Fetch a float value, falling back to `default` for absent keys.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Serialization` if a stored value is not a
    /// number.
    async fn get_f64(&self, namespace: &str, key: &str, default: f64) -> Result<f64, StorageError> {
        match self.get_string(namespace, key).await? {
            None => Ok(default),
            Some(raw) => raw
                .parse()
                .map_err(|_| StorageError::Serialization(format!("{key}: not a number: {raw}"))),
        }
    }

    /// Durably write an integer value.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the write does not complete.
    async fn put_i64(&self, namespace: &str, key: &str, value: i64) -> Result<(), StorageError> {
        self.put_string(namespace, key, &value.to_string()).await
    }

    /// Durably write a float value.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the write does not complete.
    async fn put_f64(&self, namespace: &str, key: &str, value: f64) -> Result<(), StorageError> {
        self.put_string(namespace, key, &value.to_string()).await
    }
}

//
// ─── GOAL RECORDS ──────────────────────────────────────────────────────────────
//

/// Persisted shape for a goal.
///
/// Mirrors the domain `Goal` so the serialized form stays decoupled from the
/// domain type; rehydration re-runs domain validation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoalRecord {
    pub id: GoalId,
    pub name: String,
    pub description: String,
    pub target_amount: f64,
    pub current_amount: f64,
    pub period: GoalPeriod,
}

impl GoalRecord {
    #[must_use]
    pub fn from_goal(goal: &Goal) -> Self {
        Self {
            id: goal.id(),
            name: goal.name().to_owned(),
            description: goal.description().to_owned(),
            target_amount: goal.target_amount(),
            current_amount: goal.current_amount(),
            period: goal.period(),
        }
    }

    /// Convert the record back into a domain `Goal`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Serialization` if the persisted fields fail
    /// domain validation.
    pub fn into_goal(self) -> Result<Goal, StorageError> {
        Goal::from_persisted(
            self.id,
            self.name,
            self.description,
            self.target_amount,
            self.current_amount,
            self.period,
        )
        .map_err(|err| StorageError::Serialization(err.to_string()))
    }
}

/// Serialize a goal collection to the JSON form stored in the key-value
/// store.
///
/// # Errors
///
/// Returns `StorageError::Serialization` if encoding fails.
pub fn encode_goals(goals: &[Goal]) -> Result<String, StorageError> {
    let records: Vec<GoalRecord> = goals.iter().map(GoalRecord::from_goal).collect();
    serde_json::to_string(&records).map_err(|err| StorageError::Serialization(err.to_string()))
}

/// Deserialize a goal collection from its stored JSON form, preserving
/// order.
///
/// # Errors
///
/// Returns `StorageError::Serialization` if the JSON is malformed or a
/// record fails domain validation.
pub fn decode_goals(raw: &str) -> Result<Vec<Goal>, StorageError> {
    let records: Vec<GoalRecord> =
        serde_json::from_str(raw).map_err(|err| StorageError::Serialization(err.to_string()))?;
    records.into_iter().map(GoalRecord::into_goal).collect()
}

//
// ─── IN-MEMORY BACKEND ─────────────────────────────────────────────────────────
//

/// Process-local backend for tests and wiring without a database.
#[derive(Clone, Default)]
pub struct InMemoryKvStore {
    entries: Arc<Mutex<HashMap<(String, String), String>>>,
}

impl InMemoryKvStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStore for InMemoryKvStore {
    async fn get_string(&self, namespace: &str, key: &str) -> Result<Option<String>, StorageError> {
        let guard = self
            .entries
            .lock()
            .map_err(|err| StorageError::Connection(err.to_string()))?;
        Ok(guard.get(&(namespace.to_owned(), key.to_owned())).cloned())
    }

    async fn put_string(
        &self,
        namespace: &str,
        key: &str,
        value: &str,
    ) -> Result<(), StorageError> {
        let mut guard = self
            .entries
            .lock()
            .map_err(|err| StorageError::Connection(err.to_string()))?;
        guard.insert((namespace.to_owned(), key.to_owned()), value.to_owned());
        Ok(())
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
