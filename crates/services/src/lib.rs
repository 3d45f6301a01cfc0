#![forbid(unsafe_code)]

pub mod error;
pub mod goal_repository;
pub mod goals_service;
pub mod points_ledger;

pub use finedu_core::Clock;

pub use error::GoalsError;
pub use goal_repository::GoalRepository;
pub use goals_service::{GoalsService, GoalsSnapshot};
pub use points_ledger::PointsLedger;

/// Persistence namespace for the single local user the app supports.
pub const DEFAULT_NAMESPACE: &str = "financial_goals";
