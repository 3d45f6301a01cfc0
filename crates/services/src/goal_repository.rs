use std::sync::Arc;

use log::{debug, info};

use finedu_core::Clock;
use finedu_core::model::{Goal, GoalId, GoalPeriod};
use storage::repository::{decode_goals, encode_goals};
use storage::KeyValueStore;

use crate::error::GoalsError;

/// Key holding the JSON-serialized goal list.
const KEY_GOALS: &str = "goals";
/// Informational goal count, kept for compatibility with the original app,
/// which persisted only this value.
const KEY_GOALS_COUNT: &str = "goals_count";

/// Seed goal written into every fresh namespace.
const SEED_NAME: &str = "Alimentação no dia-a-dia";
const SEED_DESCRIPTION: &str = "Economizar em refeições fora de casa";
const SEED_TARGET: f64 = 300.0;
const SEED_CURRENT: f64 = 75.0;

/// Authoritative in-memory goal collection with write-through persistence.
///
/// The collection is loaded once per namespace and kept as the single source
/// of truth; every mutation persists the full list before the in-memory
/// commit, so a failed write leaves the repository unchanged. Display order
/// is creation order and goals are never deleted.
pub struct GoalRepository {
    clock: Clock,
    store: Arc<dyn KeyValueStore>,
    namespace: String,
    goals: Vec<Goal>,
    achieved: usize,
}

impl GoalRepository {
    /// Load the goal collection for `namespace`, seeding a default goal when
    /// nothing has been persisted yet.
    ///
    /// # Errors
    ///
    /// Returns `GoalsError::Storage` if the store cannot be read or holds a
    /// malformed goal list.
    pub async fn load(
        clock: Clock,
        store: Arc<dyn KeyValueStore>,
        namespace: impl Into<String>,
    ) -> Result<Self, GoalsError> {
        let namespace = namespace.into();
        let goals = match store.get_string(&namespace, KEY_GOALS).await? {
            Some(raw) => decode_goals(&raw)?,
            None => {
                info!("no goals persisted under {namespace}, seeding default goal");
                vec![seed_goal(&clock)?]
            }
        };

        let achieved = count_achieved(&goals);
        Ok(Self {
            clock,
            store,
            namespace,
            goals,
            achieved,
        })
    }

    /// Create a goal and append it to the collection.
    ///
    /// # Errors
    ///
    /// Returns `GoalsError::Validation` for an empty name or non-positive
    /// target, or `GoalsError::Storage` if the write fails; either way the
    /// collection is unchanged.
    pub async fn create(
        &mut self,
        name: &str,
        description: &str,
        target_amount: f64,
        period: GoalPeriod,
    ) -> Result<Goal, GoalsError> {
        let goal = Goal::new(self.next_id(), name, description, target_amount, period)?;

        let mut next = self.goals.clone();
        next.push(goal.clone());
        self.persist(&next).await?;

        debug!("created goal {} ({})", goal.id(), goal.name());
        self.commit(next);
        Ok(goal)
    }

    /// Add `delta` to a goal's progress.
    ///
    /// An unknown id is a soft no-op returning `None`, not an error.
    ///
    /// # Errors
    ///
    /// Returns `GoalsError::Storage` if the write fails; the collection is
    /// then unchanged.
    pub async fn apply_progress(
        &mut self,
        goal_id: GoalId,
        delta: f64,
    ) -> Result<Option<Goal>, GoalsError> {
        let Some(position) = self.goals.iter().position(|goal| goal.id() == goal_id) else {
            return Ok(None);
        };

        let mut next = self.goals.clone();
        next[position].add_progress(delta);
        let updated = next[position].clone();
        self.persist(&next).await?;

        debug!(
            "goal {} progress now {:.2}/{:.2}",
            updated.id(),
            updated.current_amount(),
            updated.target_amount()
        );
        self.commit(next);
        Ok(Some(updated))
    }

    /// Pure lookup by id.
    #[must_use]
    pub fn find_by_id(&self, goal_id: GoalId) -> Option<&Goal> {
        self.goals.iter().find(|goal| goal.id() == goal_id)
    }

    /// Goals in display (creation) order.
    #[must_use]
    pub fn goals(&self) -> &[Goal] {
        &self.goals
    }

    /// Cached count of achieved goals, recomputed on every mutation.
    #[must_use]
    pub fn achieved_count(&self) -> usize {
        self.achieved
    }

    /// Next goal id: creation time in unix milliseconds, bumped past any
    /// existing id so ids stay unique within a millisecond.
    fn next_id(&self) -> GoalId {
        let millis = u64::try_from(self.clock.now().timestamp_millis()).unwrap_or(0);
        let after_last = self
            .goals
            .iter()
            .map(|goal| goal.id().value() + 1)
            .max()
            .unwrap_or(0);
        GoalId::new(millis.max(after_last))
    }

    async fn persist(&self, goals: &[Goal]) -> Result<(), GoalsError> {
        let encoded = encode_goals(goals)?;
        self.store
            .put_string(&self.namespace, KEY_GOALS, &encoded)
            .await?;
        self.store
            .put_i64(
                &self.namespace,
                KEY_GOALS_COUNT,
                i64::try_from(goals.len()).unwrap_or(i64::MAX),
            )
            .await?;
        Ok(())
    }

    fn commit(&mut self, goals: Vec<Goal>) {
        self.achieved = count_achieved(&goals);
        self.goals = goals;
    }
}

fn count_achieved(goals: &[Goal]) -> usize {
    goals.iter().filter(|goal| goal.is_achieved()).count()
}

fn seed_goal(clock: &Clock) -> Result<Goal, GoalsError> {
    let id = GoalId::new(u64::try_from(clock.now().timestamp_millis()).unwrap_or(0));
    Ok(Goal::from_persisted(
        id,
        SEED_NAME,
        SEED_DESCRIPTION,
        SEED_TARGET,
        SEED_CURRENT,
        GoalPeriod::Month,
    )?)
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
