use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::model::ids::GoalId;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum GoalError {
    #[error("goal name cannot be empty")]
    EmptyName,

    #[error("target amount must be a positive number")]
    InvalidTargetAmount,

    #[error("current amount must be a finite number")]
    InvalidCurrentAmount,

    #[error("unknown goal period: {0}")]
    InvalidPeriod(String),
}

//
// ─── PERIOD ────────────────────────────────────────────────────────────────────
//

/// Analysis window a goal is tracked against.
///
/// Serialized and displayed with the Portuguese labels the app ships with
/// ("Dia", "Semana", "Mês", "Ano").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GoalPeriod {
    #[serde(rename = "Dia")]
    Day,
    #[serde(rename = "Semana")]
    Week,
    #[serde(rename = "Mês")]
    Month,
    #[serde(rename = "Ano")]
    Year,
}

impl GoalPeriod {
    /// All periods in the order the new-goal form offers them.
    pub const ALL: [GoalPeriod; 4] = [
        GoalPeriod::Day,
        GoalPeriod::Week,
        GoalPeriod::Month,
        GoalPeriod::Year,
    ];

    /// Display label for the period.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            GoalPeriod::Day => "Dia",
            GoalPeriod::Week => "Semana",
            GoalPeriod::Month => "Mês",
            GoalPeriod::Year => "Ano",
        }
    }
}

impl fmt::Display for GoalPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for GoalPeriod {
    type Err = GoalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "Dia" => Ok(GoalPeriod::Day),
            "Semana" => Ok(GoalPeriod::Week),
            "Mês" => Ok(GoalPeriod::Month),
            "Ano" => Ok(GoalPeriod::Year),
            other => Err(GoalError::InvalidPeriod(other.to_owned())),
        }
    }
}

//
// ─── GOAL ──────────────────────────────────────────────────────────────────────
//

/// A named savings target with a current progress amount.
///
/// `current_amount` starts at zero and accumulates through progress updates.
/// It is deliberately not clamped to the target: overshoot stays visible and
/// the presentation layer clamps ratios for display.
#[derive(Debug, Clone, PartialEq)]
pub struct Goal {
    id: GoalId,
    name: String,
    description: String,
    target_amount: f64,
    current_amount: f64,
    period: GoalPeriod,
}

impl Goal {
    /// Creates a fresh goal with no progress.
    ///
    /// # Errors
    ///
    /// Returns `GoalError::EmptyName` if the name is empty or whitespace-only,
    /// or `GoalError::InvalidTargetAmount` if the target is not a finite
    /// positive number.
    pub fn new(
        id: GoalId,
        name: impl Into<String>,
        description: impl Into<String>,
        target_amount: f64,
        period: GoalPeriod,
    ) -> Result<Self, GoalError> {
        Self::from_persisted(id, name, description, target_amount, 0.0, period)
    }

    /// Rebuilds a goal from its persisted parts, re-running validation.
    ///
    /// A negative current amount is accepted: backward progress deltas are
    /// permitted and can push a goal below zero, and whatever the repository
    /// wrote must rehydrate.
    ///
    /// # Errors
    ///
    /// Returns `GoalError` if the name is empty, the target is not positive,
    /// or the current amount is not finite.
    pub fn from_persisted(
        id: GoalId,
        name: impl Into<String>,
        description: impl Into<String>,
        target_amount: f64,
        current_amount: f64,
        period: GoalPeriod,
    ) -> Result<Self, GoalError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(GoalError::EmptyName);
        }
        if !target_amount.is_finite() || target_amount <= 0.0 {
            return Err(GoalError::InvalidTargetAmount);
        }
        if !current_amount.is_finite() {
            return Err(GoalError::InvalidCurrentAmount);
        }

        Ok(Self {
            id,
            name: name.trim().to_owned(),
            description: description.into().trim().to_owned(),
            target_amount,
            current_amount,
            period,
        })
    }

    // Accessors
    #[must_use]
    pub fn id(&self) -> GoalId {
        self.id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Free-text description; may be empty.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    #[must_use]
    pub fn target_amount(&self) -> f64 {
        self.target_amount
    }

    #[must_use]
    pub fn current_amount(&self) -> f64 {
        self.current_amount
    }

    #[must_use]
    pub fn period(&self) -> GoalPeriod {
        self.period
    }

    /// A goal is achieved once its progress reaches or exceeds the target.
    #[must_use]
    pub fn is_achieved(&self) -> bool {
        self.current_amount >= self.target_amount
    }

    /// Progress as a fraction of the target, unclamped (may exceed 1.0).
    #[must_use]
    pub fn progress_ratio(&self) -> f64 {
        self.current_amount / self.target_amount
    }

    /// Adds `delta` to the current amount.
    ///
    /// Negative deltas are accepted; the app never sends them, but the
    /// original behavior does not guard against backward progress and that
    /// permissiveness is kept.
    pub fn add_progress(&mut self, delta: f64) {
        self.current_amount += delta;
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
