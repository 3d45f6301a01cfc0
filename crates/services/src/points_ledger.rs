use std::sync::Arc;

use log::debug;

use storage::{KeyValueStore, StorageError};

use crate::error::GoalsError;

const KEY_TOTAL_POINTS: &str = "total_points";
const KEY_USER_BALANCE: &str = "user_balance";

/// Score every player starts with.
const POINTS_SEED: i64 = 3400;

/// Cumulative score and user balance bookkeeping, independent of goal
/// identity.
///
/// Points only ever increase; the amount is unsigned so a negative delta is
/// unrepresentable. The balance is the user's overall financial position and
/// is overwritten wholesale, never accumulated.
pub struct PointsLedger {
    store: Arc<dyn KeyValueStore>,
    namespace: String,
    total_points: u32,
    user_balance: f64,
}

impl std::fmt::Debug for PointsLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PointsLedger")
            .field("namespace", &self.namespace)
            .field("total_points", &self.total_points)
            .field("user_balance", &self.user_balance)
            .finish_non_exhaustive()
    }
}

impl PointsLedger {
    /// Load persisted points and balance for `namespace`, applying the seed
    /// defaults for absent keys.
    ///
    /// # Errors
    ///
    /// Returns `GoalsError::Storage` if the store cannot be read or holds a
    /// value outside the expected range.
    pub async fn load(
        store: Arc<dyn KeyValueStore>,
        namespace: impl Into<String>,
    ) -> Result<Self, GoalsError> {
        let namespace = namespace.into();
        let raw_points = store
            .get_i64(&namespace, KEY_TOTAL_POINTS, POINTS_SEED)
            .await?;
        let total_points = u32::try_from(raw_points).map_err(|_| {
            StorageError::Serialization(format!("{KEY_TOTAL_POINTS}: out of range: {raw_points}"))
        })?;
        let user_balance = store.get_f64(&namespace, KEY_USER_BALANCE, 0.0).await?;

        Ok(Self {
            store,
            namespace,
            total_points,
            user_balance,
        })
    }

    /// Add points to the cumulative total.
    ///
    /// # Errors
    ///
    /// Returns `GoalsError::Storage` if the write fails; the total is then
    /// unchanged.
    pub async fn add_points(&mut self, amount: u32) -> Result<(), GoalsError> {
        let next = self.total_points.saturating_add(amount);
        self.store
            .put_i64(&self.namespace, KEY_TOTAL_POINTS, i64::from(next))
            .await?;
        self.total_points = next;
        debug!("total points now {next}");
        Ok(())
    }

    /// Overwrite the user balance. Negative values are allowed.
    ///
    /// # Errors
    ///
    /// Returns `GoalsError::Storage` if the write fails; the balance is then
    /// unchanged.
    pub async fn set_balance(&mut self, value: f64) -> Result<(), GoalsError> {
        self.store
            .put_f64(&self.namespace, KEY_USER_BALANCE, value)
            .await?;
        self.user_balance = value;
        Ok(())
    }

    #[must_use]
    pub fn total_points(&self) -> u32 {
        self.total_points
    }

    #[must_use]
    pub fn user_balance(&self) -> f64 {
        self.user_balance
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use storage::InMemoryKvStore;

    async fn fresh_ledger(store: &InMemoryKvStore) -> PointsLedger {
        PointsLedger::load(Arc::new(store.clone()), "financial_goals")
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn load_applies_seed_defaults() {
        let store = InMemoryKvStore::new();
        let ledger = fresh_ledger(&store).await;
        assert_eq!(ledger.total_points(), 3400);
        assert_eq!(ledger.user_balance(), 0.0);
    }

    #[tokio::test]
    async fn points_accumulate_and_persist() {
        let store = InMemoryKvStore::new();
        let mut ledger = fresh_ledger(&store).await;

        ledger.add_points(10).await.unwrap();
        ledger.add_points(0).await.unwrap();
        ledger.add_points(25).await.unwrap();
        assert_eq!(ledger.total_points(), 3435);

        let reloaded = fresh_ledger(&store).await;
        assert_eq!(reloaded.total_points(), 3435);
    }

    #[tokio::test]
    async fn balance_is_overwritten_wholesale() {
        let store = InMemoryKvStore::new();
        let mut ledger = fresh_ledger(&store).await;

        ledger.set_balance(120.0).await.unwrap();
        ledger.set_balance(-80.5).await.unwrap();
        assert_eq!(ledger.user_balance(), -80.5);

        let reloaded = fresh_ledger(&store).await;
        assert_eq!(reloaded.user_balance(), -80.5);
    }

    #[tokio::test]
    async fn load_rejects_negative_persisted_points() {
        let store = InMemoryKvStore::new();
        store
            .put_i64("financial_goals", "total_points", -5)
            .await
            .unwrap();

        let err = PointsLedger::load(Arc::new(store), "financial_goals")
            .await
            .unwrap_err();
        assert!(matches!(err, GoalsError::Storage(_)));
    }
}
