use std::sync::Arc;

use log::{debug, info};
use tokio::sync::{Mutex, watch};

use finedu_core::Clock;
use finedu_core::model::{Goal, GoalId, GoalPeriod};
use storage::KeyValueStore;

use crate::error::GoalsError;
use crate::goal_repository::GoalRepository;
use crate::points_ledger::PointsLedger;

/// Consistent point-in-time read of everything the goals screen renders.
///
/// Presentation-agnostic: no formatted strings, no clamping; a progress bar
/// clamps `Goal::progress_ratio` itself.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GoalsSnapshot {
    pub goals: Vec<Goal>,
    pub achieved_count: usize,
    pub total_points: u32,
    pub user_balance: f64,
    pub show_new_goal_dialog: bool,
}

struct SessionState {
    namespace: String,
    repo: GoalRepository,
    ledger: PointsLedger,
    show_new_goal_dialog: bool,
}

impl SessionState {
    fn snapshot(&self) -> GoalsSnapshot {
        GoalsSnapshot {
            goals: self.repo.goals().to_vec(),
            achieved_count: self.repo.achieved_count(),
            total_points: self.ledger.total_points(),
            user_balance: self.ledger.user_balance(),
            show_new_goal_dialog: self.show_new_goal_dialog,
        }
    }
}

/// Facade the presentation layer and the quiz-completion flow talk to.
///
/// Owns the goal repository, the points ledger, and the new-goal dialog
/// intent flag, and publishes an immutable snapshot after every successful
/// mutation. Snapshots are only published once the corresponding persistence
/// write has completed, so subscribers always observe committed state.
///
/// One mutex guards the whole session; every mutation appears atomic to
/// callers and to subscribers.
pub struct GoalsService {
    clock: Clock,
    store: Arc<dyn KeyValueStore>,
    state: Mutex<Option<SessionState>>,
    snapshot_tx: watch::Sender<GoalsSnapshot>,
}

impl GoalsService {
    #[must_use]
    pub fn new(clock: Clock, store: Arc<dyn KeyValueStore>) -> Self {
        let (snapshot_tx, _) = watch::channel(GoalsSnapshot::default());
        Self {
            clock,
            store,
            state: Mutex::new(None),
            snapshot_tx,
        }
    }

    /// Load repository and ledger state for `namespace`.
    ///
    /// Idempotent for the namespace already active; initializing for a
    /// different namespace fully replaces the in-memory state (only one
    /// local user is active at a time).
    ///
    /// # Errors
    ///
    /// Returns `GoalsError::Storage` if persisted state cannot be loaded.
    pub async fn initialize(&self, namespace: &str) -> Result<(), GoalsError> {
        let mut guard = self.state.lock().await;
        if let Some(session) = guard.as_ref() {
            if session.namespace == namespace {
                return Ok(());
            }
        }

        info!("initializing goals service for namespace {namespace}");
        let repo =
            GoalRepository::load(self.clock, Arc::clone(&self.store), namespace).await?;
        let ledger = PointsLedger::load(Arc::clone(&self.store), namespace).await?;
        let session = SessionState {
            namespace: namespace.to_owned(),
            repo,
            ledger,
            show_new_goal_dialog: false,
        };
        self.snapshot_tx.send_replace(session.snapshot());
        *guard = Some(session);
        Ok(())
    }

    /// Create a goal from form input and close the new-goal dialog.
    ///
    /// # Errors
    ///
    /// Returns `GoalsError::NotInitialized` before `initialize`,
    /// `GoalsError::Validation` for bad input (including an unknown period
    /// label), or `GoalsError::Storage` on a failed write.
    pub async fn create_goal(
        &self,
        name: &str,
        description: &str,
        target_amount: f64,
        period_label: &str,
    ) -> Result<Goal, GoalsError> {
        let period: GoalPeriod = period_label.parse().map_err(GoalsError::Validation)?;

        let mut guard = self.state.lock().await;
        let session = guard.as_mut().ok_or(GoalsError::NotInitialized)?;
        let goal = session
            .repo
            .create(name, description, target_amount, period)
            .await?;
        session.show_new_goal_dialog = false;
        self.snapshot_tx.send_replace(session.snapshot());
        Ok(goal)
    }

    /// Mark the new-goal dialog as requested.
    ///
    /// # Errors
    ///
    /// Returns `GoalsError::NotInitialized` before `initialize`.
    pub async fn request_new_goal(&self) -> Result<(), GoalsError> {
        self.set_dialog(true).await
    }

    /// Dismiss the new-goal dialog without creating anything.
    ///
    /// # Errors
    ///
    /// Returns `GoalsError::NotInitialized` before `initialize`.
    pub async fn dismiss_new_goal_dialog(&self) -> Result<(), GoalsError> {
        self.set_dialog(false).await
    }

    /// Add progress to a goal; unknown ids are a soft no-op.
    ///
    /// # Errors
    ///
    /// Returns `GoalsError::NotInitialized` before `initialize` or
    /// `GoalsError::Storage` on a failed write.
    pub async fn add_progress(
        &self,
        goal_id: GoalId,
        amount: f64,
    ) -> Result<Option<Goal>, GoalsError> {
        let mut guard = self.state.lock().await;
        let session = guard.as_mut().ok_or(GoalsError::NotInitialized)?;
        let updated = session.repo.apply_progress(goal_id, amount).await?;
        if updated.is_some() {
            self.snapshot_tx.send_replace(session.snapshot());
        }
        Ok(updated)
    }

    /// Overwrite the user balance.
    ///
    /// # Errors
    ///
    /// Returns `GoalsError::NotInitialized` before `initialize` or
    /// `GoalsError::Storage` on a failed write.
    pub async fn set_balance(&self, value: f64) -> Result<(), GoalsError> {
        let mut guard = self.state.lock().await;
        let session = guard.as_mut().ok_or(GoalsError::NotInitialized)?;
        session.ledger.set_balance(value).await?;
        self.snapshot_tx.send_replace(session.snapshot());
        Ok(())
    }

    /// Credit a completed quiz: always add the points; when `goal_id`
    /// resolves, also apply the progress amount. This is the single
    /// integration point between the quiz flow and the goals domain.
    ///
    /// # Errors
    ///
    /// Returns `GoalsError::NotInitialized` before `initialize` or
    /// `GoalsError::Storage` on a failed write. The two writes commit
    /// independently, points first: if the progress write fails, the points
    /// stay credited. Subscribers still only ever see committed state.
    pub async fn record_quiz_reward(
        &self,
        goal_id: Option<GoalId>,
        points: u32,
        progress_amount: f64,
    ) -> Result<(), GoalsError> {
        let mut guard = self.state.lock().await;
        let session = guard.as_mut().ok_or(GoalsError::NotInitialized)?;

        session.ledger.add_points(points).await?;
        if let Some(goal_id) = goal_id {
            session.repo.apply_progress(goal_id, progress_amount).await?;
        }

        debug!("quiz reward recorded: {points} points, goal {goal_id:?}");
        self.snapshot_tx.send_replace(session.snapshot());
        Ok(())
    }

    /// Pure lookup by goal id.
    ///
    /// # Errors
    ///
    /// Returns `GoalsError::NotInitialized` before `initialize`.
    pub async fn find_goal(&self, goal_id: GoalId) -> Result<Option<Goal>, GoalsError> {
        let guard = self.state.lock().await;
        let session = guard.as_ref().ok_or(GoalsError::NotInitialized)?;
        Ok(session.repo.find_by_id(goal_id).cloned())
    }

    /// Current snapshot; the default (empty) snapshot before `initialize`.
    pub async fn snapshot(&self) -> GoalsSnapshot {
        let guard = self.state.lock().await;
        guard
            .as_ref()
            .map_or_else(GoalsSnapshot::default, SessionState::snapshot)
    }

    /// Subscribe to snapshot updates.
    ///
    /// The receiver starts at the latest published snapshot and sees a new
    /// value after every successful mutation.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<GoalsSnapshot> {
        self.snapshot_tx.subscribe()
    }

    async fn set_dialog(&self, visible: bool) -> Result<(), GoalsError> {
        let mut guard = self.state.lock().await;
        let session = guard.as_mut().ok_or(GoalsError::NotInitialized)?;
        if session.show_new_goal_dialog != visible {
            session.show_new_goal_dialog = visible;
            self.snapshot_tx.send_replace(session.snapshot());
        }
        Ok(())
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use finedu_core::fixed_clock;
    use storage::InMemoryKvStore;

    fn service(store: &InMemoryKvStore) -> GoalsService {
        GoalsService::new(fixed_clock(), Arc::new(store.clone()))
    }

    #[tokio::test]
    async fn operations_require_initialization() {
        let store = InMemoryKvStore::new();
        let svc = service(&store);

        assert!(matches!(
            svc.create_goal("Viagem", "", 100.0, "Mês").await,
            Err(GoalsError::NotInitialized)
        ));
        assert!(matches!(
            svc.request_new_goal().await,
            Err(GoalsError::NotInitialized)
        ));
        assert_eq!(svc.snapshot().await, GoalsSnapshot::default());
    }

    #[tokio::test]
    async fn initialize_is_idempotent_for_same_namespace() {
        let store = InMemoryKvStore::new();
        let svc = service(&store);
        svc.initialize("financial_goals").await.unwrap();
        svc.create_goal("Viagem", "", 100.0, "Ano").await.unwrap();

        // Second call for the same namespace must not reload or reset.
        svc.initialize("financial_goals").await.unwrap();
        assert_eq!(svc.snapshot().await.goals.len(), 2);
    }

    #[tokio::test]
    async fn initialize_with_new_namespace_replaces_state() {
        let store = InMemoryKvStore::new();
        let svc = service(&store);
        svc.initialize("maria").await.unwrap();
        svc.create_goal("Viagem", "", 100.0, "Ano").await.unwrap();
        assert_eq!(svc.snapshot().await.goals.len(), 2);

        svc.initialize("joao").await.unwrap();
        let snapshot = svc.snapshot().await;
        // Fresh namespace: just the seed goal and the seed points.
        assert_eq!(snapshot.goals.len(), 1);
        assert_eq!(snapshot.total_points, 3400);
    }

    #[tokio::test]
    async fn create_goal_rejects_unknown_period_label() {
        let store = InMemoryKvStore::new();
        let svc = service(&store);
        svc.initialize("financial_goals").await.unwrap();

        let err = svc
            .create_goal("Viagem", "", 100.0, "Quinzena")
            .await
            .unwrap_err();
        assert!(matches!(err, GoalsError::Validation(_)));
        assert_eq!(svc.snapshot().await.goals.len(), 1);
    }

    #[tokio::test]
    async fn dialog_flag_tracks_request_and_create() {
        let store = InMemoryKvStore::new();
        let svc = service(&store);
        svc.initialize("financial_goals").await.unwrap();
        assert!(!svc.snapshot().await.show_new_goal_dialog);

        svc.request_new_goal().await.unwrap();
        assert!(svc.snapshot().await.show_new_goal_dialog);

        svc.dismiss_new_goal_dialog().await.unwrap();
        assert!(!svc.snapshot().await.show_new_goal_dialog);

        svc.request_new_goal().await.unwrap();
        svc.create_goal("Viagem", "", 100.0, "Dia").await.unwrap();
        assert!(!svc.snapshot().await.show_new_goal_dialog);
    }

    #[tokio::test]
    async fn subscribers_see_snapshot_after_each_mutation() {
        let store = InMemoryKvStore::new();
        let svc = service(&store);
        let mut rx = svc.subscribe();

        svc.initialize("financial_goals").await.unwrap();
        assert!(rx.has_changed().unwrap());
        rx.mark_unchanged();

        let goal = svc
            .create_goal("Viagem", "", 100.0, "Mês")
            .await
            .unwrap();
        assert!(rx.has_changed().unwrap());
        let snapshot = rx.borrow_and_update().clone();
        assert_eq!(snapshot.goals.last().unwrap().id(), goal.id());

        // A no-op progress update publishes nothing.
        svc.add_progress(GoalId::new(999), 5.0).await.unwrap();
        assert!(!rx.has_changed().unwrap());
    }
}
